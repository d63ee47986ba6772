use rota_authz::ScopeResolver;
use std::sync::Arc;
use std::time::Instant;

use crate::error::{ApiError, Result};
use crate::metrics::ScopeMetrics;

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    /// Scope resolver over the configured directory
    pub resolver: Arc<ScopeResolver>,

    /// Decision metrics
    pub metrics: ScopeMetrics,

    /// Server start time for uptime calculation
    pub start_time: Instant,

    /// Application version
    pub version: String,
}

impl AppState {
    pub fn new(resolver: ScopeResolver) -> Result<Self> {
        let metrics = ScopeMetrics::new()
            .map_err(|e| ApiError::InternalError(format!("Failed to register metrics: {}", e)))?;

        Ok(Self {
            resolver: Arc::new(resolver),
            metrics,
            start_time: Instant::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        })
    }

    pub fn uptime_seconds(&self) -> u64 {
        self.start_time.elapsed().as_secs()
    }
}
