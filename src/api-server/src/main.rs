//! Rota scope API server
//!
//! Answers department and employee scope questions for scheduling routes.
//!
//! # Usage
//!
//! ```bash
//! # In-memory directory loaded from a snapshot
//! rota-server --directory-file ./directory.json
//!
//! # PostgreSQL directory for one tenant
//! DATABASE_URL=postgresql://rota@localhost/rota rota-server --tenant-id hotel-group-1
//!
//! # Treat assignments without a department as property-wide
//! rota-server --unscoped-department all_departments
//!
//! # Enable debug logging
//! RUST_LOG=debug rota-server
//! ```
//!
//! # Environment Variables
//!
//! - `RUST_LOG`: Log filter (trace, debug, info, warn, error)
//! - `ROTA_HOST` / `ROTA_PORT`: Bind address (default: 0.0.0.0:8080)
//! - `DATABASE_URL`: PostgreSQL organization directory
//! - `ROTA_TENANT_ID`: Tenant whose directory is served (default: default)
//! - `ROTA_DIRECTORY_FILE`: JSON directory snapshot when no database is set
//! - `ROTA_MANAGER_ROLES`: Comma-separated roles that cover a whole property
//! - `ROTA_UNSCOPED_PROPERTY`: `exact_match` or `any_property`
//! - `ROTA_UNSCOPED_DEPARTMENT`: `no_departments` or `all_departments`
//! - `ROTA_HIERARCHY_TIMEOUT_MS`: Bound for one directory call (default: 2000)
//! - `ROTA_HIERARCHY_CACHE_TTL_SECS`: Directory cache lifetime, 0 disables (default: 30)

use anyhow::Result;
use api_server::{AppState, Directory, DirectoryConfig, ServerBuilder};
use clap::Parser;
use rota_authz::{ScopeConfig, ScopeResolver, UnscopedDepartmentPolicy, UnscopedPropertyPolicy};
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Rota scope API server
#[derive(Parser, Debug)]
#[command(
    name = "rota-server",
    version,
    about = "REST API server for scheduling scope checks",
    long_about = None
)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "ROTA_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short = 'p', long, default_value = "8080", env = "ROTA_PORT")]
    port: u16,

    /// Maximum concurrent requests
    #[arg(long, default_value = "10000", env = "ROTA_MAX_CONNECTIONS")]
    max_connections: usize,

    /// Request timeout in seconds
    #[arg(long, default_value = "30", env = "ROTA_REQUEST_TIMEOUT")]
    request_timeout: u64,

    /// PostgreSQL organization directory
    #[arg(long, env = "DATABASE_URL")]
    database_url: Option<String>,

    /// Tenant whose directory is served
    #[arg(long, default_value = "default", env = "ROTA_TENANT_ID")]
    tenant_id: String,

    /// Apply directory migrations at startup
    #[arg(long, env = "ROTA_RUN_MIGRATIONS")]
    run_migrations: bool,

    /// JSON directory snapshot, used when no database is configured
    #[arg(long, env = "ROTA_DIRECTORY_FILE")]
    directory_file: Option<PathBuf>,

    /// Roles that cover the whole property named by the assignment
    #[arg(long, env = "ROTA_MANAGER_ROLES", value_delimiter = ',')]
    manager_roles: Vec<String>,

    /// What an assignment without a property applies to
    #[arg(long, default_value = "exact_match", env = "ROTA_UNSCOPED_PROPERTY")]
    unscoped_property: UnscopedPropertyPolicy,

    /// What an assignment without a department grants
    #[arg(long, default_value = "no_departments", env = "ROTA_UNSCOPED_DEPARTMENT")]
    unscoped_department: UnscopedDepartmentPolicy,

    /// Bound for a single directory call in milliseconds
    #[arg(long, default_value = "2000", env = "ROTA_HIERARCHY_TIMEOUT_MS")]
    hierarchy_timeout_ms: u64,

    /// Directory cache lifetime in seconds, 0 disables caching
    #[arg(long, default_value = "30", env = "ROTA_HIERARCHY_CACHE_TTL_SECS")]
    hierarchy_cache_ttl_secs: u64,

    /// Enable JSON logging format
    #[arg(long, env = "ROTA_JSON_LOGS")]
    json_logs: bool,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, default_value = "info", env = "RUST_LOG")]
    log_level: String,
}

impl Args {
    fn directory_config(&self) -> DirectoryConfig {
        DirectoryConfig {
            database_url: self.database_url.clone(),
            tenant_id: self.tenant_id.clone(),
            directory_file: self.directory_file.clone(),
            manager_roles: self.manager_roles.clone(),
            run_migrations: self.run_migrations,
            timeout: Duration::from_millis(self.hierarchy_timeout_ms),
            cache_ttl: (self.hierarchy_cache_ttl_secs > 0)
                .then(|| Duration::from_secs(self.hierarchy_cache_ttl_secs)),
        }
    }

    fn scope_config(&self) -> ScopeConfig {
        ScopeConfig::default()
            .with_unscoped_property(self.unscoped_property)
            .with_unscoped_department(self.unscoped_department)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args);

    info!(version = env!("CARGO_PKG_VERSION"), "Starting Rota scope API server");

    let directory = Directory::open(&args.directory_config()).await?;

    let scope_config = args.scope_config();
    info!(
        unscoped_property = %scope_config.unscoped_property,
        unscoped_department = %scope_config.unscoped_department,
        "Scope policy"
    );
    let resolver = ScopeResolver::with_config(directory.provider(), scope_config);
    let state = AppState::new(resolver)?;

    let server = ServerBuilder::new()
        .host(&args.host)
        .port(args.port)
        .max_connections(args.max_connections)
        .request_timeout(args.request_timeout)
        .state(state)
        .build()?;

    let result = server.run().await;

    // Release the directory pool only after in-flight requests drained
    directory.close().await;

    if let Err(e) = result {
        error!("Server error: {:#}", e);
        std::process::exit(1);
    }

    Ok(())
}

/// Initialize tracing/logging subsystem
fn init_tracing(args: &Args) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let level = args
            .log_level
            .parse::<tracing::Level>()
            .unwrap_or(tracing::Level::INFO);
        format!(
            "rota_server={level},api_server={level},rota_authz={level},tower_http=info",
            level = level
        )
        .into()
    });

    let registry = tracing_subscriber::registry().with(filter);

    if args.json_logs {
        registry
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_file(true)
                    .with_line_number(true),
            )
            .init();
    }
}
