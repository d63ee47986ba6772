//! Prometheus metrics for scope decisions

use prometheus::{CounterVec, Encoder, HistogramOpts, HistogramVec, Opts, Registry, TextEncoder};
use std::time::Duration;

/// How a scope request ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Allowed,
    Denied,
    /// Scope listing answered
    Resolved,
    /// Directory failed; no decision made
    Indeterminate,
    /// Request rejected before resolution
    Invalid,
    Error,
}

impl Outcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Allowed => "allowed",
            Outcome::Denied => "denied",
            Outcome::Resolved => "resolved",
            Outcome::Indeterminate => "indeterminate",
            Outcome::Invalid => "invalid",
            Outcome::Error => "error",
        }
    }
}

/// Decision counters and latency histograms on a private registry
#[derive(Debug, Clone)]
pub struct ScopeMetrics {
    registry: Registry,
    decisions: CounterVec,
    latency: HistogramVec,
}

impl ScopeMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let decisions = CounterVec::new(
            Opts::new("rota_scope_decisions_total", "Scope decisions by operation and outcome"),
            &["operation", "outcome"],
        )?;
        registry.register(Box::new(decisions.clone()))?;

        let latency = HistogramVec::new(
            HistogramOpts::new(
                "rota_scope_decision_duration_seconds",
                "Scope decision latency including directory calls",
            )
            .buckets(vec![0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0, 5.0]),
            &["operation"],
        )?;
        registry.register(Box::new(latency.clone()))?;

        Ok(Self {
            registry,
            decisions,
            latency,
        })
    }

    pub fn record(&self, operation: &str, outcome: Outcome, elapsed: Duration) {
        self.decisions
            .with_label_values(&[operation, outcome.as_str()])
            .inc();
        self.latency
            .with_label_values(&[operation])
            .observe(elapsed.as_secs_f64());
    }

    pub fn decision_count(&self, operation: &str, outcome: Outcome) -> u64 {
        self.decisions
            .with_label_values(&[operation, outcome.as_str()])
            .get() as u64
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Export metrics in Prometheus text format
    pub fn export(&self) -> Result<String, prometheus::Error> {
        let encoder = TextEncoder::new();
        let mut buffer = Vec::new();
        encoder.encode(&self.registry.gather(), &mut buffer)?;
        String::from_utf8(buffer).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}
