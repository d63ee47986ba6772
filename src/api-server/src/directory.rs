//! Organization directory wiring for the server process
//!
//! Opens the configured directory once at startup and hands the resulting
//! provider to the resolver. A PostgreSQL pool opened here is closed, and the
//! cache eviction task stopped, by [`Directory::close`] after the server has
//! drained.

use anyhow::{Context, Result};
use rota_authz::hierarchy::PostgresHierarchyOptions;
use rota_authz::{
    CachedHierarchy, HierarchyProvider, InMemoryHierarchy, PostgresHierarchy, TimeoutHierarchy,
};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};

/// Where the directory lives and how calls to it are bounded
#[derive(Debug, Clone)]
pub struct DirectoryConfig {
    /// PostgreSQL connection string; takes precedence over the snapshot file
    pub database_url: Option<String>,
    pub tenant_id: String,
    /// JSON directory snapshot for the in-memory provider
    pub directory_file: Option<PathBuf>,
    /// Roles treated as property-wide on their property
    pub manager_roles: Vec<String>,
    pub run_migrations: bool,
    /// Upper bound for a single directory call
    pub timeout: Duration,
    /// Cache lifetime for structural lookups; `None` disables caching
    pub cache_ttl: Option<Duration>,
}

impl Default for DirectoryConfig {
    fn default() -> Self {
        Self {
            database_url: None,
            tenant_id: "default".to_string(),
            directory_file: None,
            manager_roles: Vec::new(),
            run_migrations: false,
            timeout: Duration::from_millis(2000),
            cache_ttl: Some(Duration::from_secs(30)),
        }
    }
}

/// Opened directory plus the handles needed to shut it down
pub struct Directory {
    provider: Arc<dyn HierarchyProvider>,
    postgres: Option<Arc<PostgresHierarchy>>,
    eviction: Option<JoinHandle<()>>,
}

impl Directory {
    pub async fn open(config: &DirectoryConfig) -> Result<Self> {
        let (base, postgres): (Arc<dyn HierarchyProvider>, _) = match (&config.database_url, &config.directory_file) {
            (Some(url), _) => {
                let directory = PostgresHierarchy::connect(
                    url,
                    &config.tenant_id,
                    PostgresHierarchyOptions::default(),
                )
                .await
                .context("Failed to open organization directory database")?
                .with_manager_roles(config.manager_roles.clone());

                if config.run_migrations {
                    directory
                        .run_migrations()
                        .await
                        .context("Failed to migrate organization directory")?;
                    info!("Organization directory migrations applied");
                }

                let directory = Arc::new(directory);
                (directory.clone() as Arc<dyn HierarchyProvider>, Some(directory))
            }
            (None, Some(path)) => {
                let directory = InMemoryHierarchy::from_json_file(path)
                    .with_context(|| format!("Failed to load directory snapshot {}", path.display()))?;
                for role in &config.manager_roles {
                    directory.add_manager_role(role.clone());
                }
                info!(
                    path = %path.display(),
                    properties = directory.property_count(),
                    "Loaded directory snapshot"
                );
                (Arc::new(directory) as Arc<dyn HierarchyProvider>, None)
            }
            (None, None) => {
                warn!("No organization directory configured; only explicit department assignments will resolve");
                let directory = InMemoryHierarchy::new();
                for role in &config.manager_roles {
                    directory.add_manager_role(role.clone());
                }
                (Arc::new(directory) as Arc<dyn HierarchyProvider>, None)
            }
        };

        let bounded = TimeoutHierarchy::new(base, config.timeout);
        let (provider, eviction): (Arc<dyn HierarchyProvider>, _) = match config.cache_ttl {
            Some(ttl) if !ttl.is_zero() => {
                let cached = Arc::new(CachedHierarchy::with_ttl(bounded, ttl));
                let eviction = cached.spawn_eviction(ttl);
                (cached as Arc<dyn HierarchyProvider>, Some(eviction))
            }
            _ => (Arc::new(bounded) as Arc<dyn HierarchyProvider>, None),
        };

        info!(
            directory = provider.name(),
            timeout_ms = config.timeout.as_millis() as u64,
            cache_ttl_secs = config.cache_ttl.map(|ttl| ttl.as_secs()).unwrap_or(0),
            "Organization directory ready"
        );

        Ok(Self {
            provider,
            postgres,
            eviction,
        })
    }

    pub fn provider(&self) -> Arc<dyn HierarchyProvider> {
        Arc::clone(&self.provider)
    }

    /// Whether structural lookups are cached and swept in the background
    pub fn is_cached(&self) -> bool {
        self.eviction.is_some()
    }

    /// Stop cache eviction and release the database pool, if one was opened
    pub async fn close(self) {
        if let Some(eviction) = self.eviction {
            eviction.abort();
        }
        if let Some(postgres) = self.postgres {
            postgres.close().await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rota_authz::{DepartmentId, EmployeeId, PropertyId};
    use std::io::Write;

    #[tokio::test]
    async fn test_open_snapshot_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"properties": [{{"id": "P1", "departments": [{{"id": "D1", "employees": ["E1"]}}]}}]}}"#
        )
        .unwrap();

        let config = DirectoryConfig {
            directory_file: Some(file.path().to_path_buf()),
            ..Default::default()
        };
        let directory = Directory::open(&config).await.unwrap();

        let department = directory
            .provider()
            .employee_department(&PropertyId::parse("P1").unwrap(), &EmployeeId::parse("E1").unwrap())
            .await
            .unwrap();
        assert_eq!(department, Some(DepartmentId::parse("D1").unwrap()));

        directory.close().await;
    }

    #[tokio::test]
    async fn test_missing_snapshot_file_fails() {
        let config = DirectoryConfig {
            directory_file: Some(PathBuf::from("/nonexistent/rota-directory.json")),
            ..Default::default()
        };
        let err = Directory::open(&config).await.err().unwrap();
        assert!(err.to_string().contains("snapshot"));
    }

    #[tokio::test]
    async fn test_empty_directory_without_cache() {
        let config = DirectoryConfig {
            cache_ttl: None,
            ..Default::default()
        };
        let directory = Directory::open(&config).await.unwrap();
        assert!(!directory.is_cached());
        let departments = directory
            .provider()
            .property_departments(&PropertyId::parse("P1").unwrap())
            .await
            .unwrap();
        assert!(departments.is_empty());
    }

    #[tokio::test]
    async fn test_cached_directory_runs_eviction_until_closed() {
        let directory = Directory::open(&DirectoryConfig::default()).await.unwrap();
        assert!(directory.is_cached());

        let eviction = directory.eviction.as_ref().map(|task| task.abort_handle()).unwrap();
        assert!(!eviction.is_finished());

        directory.close().await;
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert!(eviction.is_finished());
    }
}
