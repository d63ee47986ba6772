//! TTL cache over a hierarchy provider
//!
//! Structural lookups (employee → department, property → departments) change
//! rarely and are cached. Property-wide grants depend on the request's user
//! context and always go to the inner provider. Errors are never cached.
//!
//! Both maps share one TTL. A stale entry is dropped when it is read, a full
//! sweep runs on insert at most once per TTL, and [`CachedHierarchy::spawn_eviction`]
//! sweeps on a timer, so keys that are never read again do not pile up.

use super::HierarchyProvider;
use crate::error::HierarchyResult;
use crate::types::{DepartmentId, EmployeeId, PropertyId, UserContext};
use async_trait::async_trait;
use dashmap::DashMap;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::debug;

/// Directory data is allowed to lag this far behind the store by default
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(30);

/// A directory answer and when it was read from the inner provider
#[derive(Debug, Clone)]
struct Stored<T> {
    value: T,
    read_at: Instant,
}

impl<T> Stored<T> {
    fn now(value: T) -> Self {
        Self {
            value,
            read_at: Instant::now(),
        }
    }

    fn is_fresh(&self, ttl: Duration) -> bool {
        self.read_at.elapsed() <= ttl
    }
}

/// Counters for one [`CachedHierarchy`]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Lookups answered without calling the directory
    pub hits: usize,
    /// Lookups that went to the directory, stale entries included
    pub misses: usize,
    /// Stale entries dropped, on read or by a sweep
    pub evictions: usize,
    /// Employee and department-list entries currently held
    pub entries: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        match self.hits + self.misses {
            0 => 0.0,
            total => self.hits as f64 / total as f64,
        }
    }
}

/// Caching decorator for any [`HierarchyProvider`]
pub struct CachedHierarchy<H> {
    inner: H,
    employees: DashMap<(PropertyId, EmployeeId), Stored<Option<DepartmentId>>>,
    departments: DashMap<PropertyId, Stored<Vec<DepartmentId>>>,
    ttl: Duration,
    created: Instant,
    // Milliseconds after `created` of the last full sweep
    last_sweep_ms: AtomicU64,
    hits: AtomicUsize,
    misses: AtomicUsize,
    evictions: AtomicUsize,
}

impl<H: HierarchyProvider> CachedHierarchy<H> {
    /// Wrap a provider with [`DEFAULT_CACHE_TTL`]
    pub fn new(inner: H) -> Self {
        Self::with_ttl(inner, DEFAULT_CACHE_TTL)
    }

    pub fn with_ttl(inner: H, ttl: Duration) -> Self {
        Self {
            inner,
            employees: DashMap::new(),
            departments: DashMap::new(),
            ttl,
            created: Instant::now(),
            last_sweep_ms: AtomicU64::new(0),
            hits: AtomicUsize::new(0),
            misses: AtomicUsize::new(0),
            evictions: AtomicUsize::new(0),
        }
    }

    pub fn inner(&self) -> &H {
        &self.inner
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Forget every cached answer
    pub fn clear_cache(&self) {
        self.employees.clear();
        self.departments.clear();
    }

    /// Forget cached answers for one property after its directory changed
    pub fn invalidate_property(&self, property: &PropertyId) {
        self.departments.remove(property);
        self.employees.retain(|(p, _), _| p != property);
    }

    /// Drop every stale entry; returns how many were removed
    pub fn evict_expired(&self) -> usize {
        let ttl = self.ttl;
        let mut removed = 0;
        self.employees.retain(|_, stored| {
            let fresh = stored.is_fresh(ttl);
            removed += usize::from(!fresh);
            fresh
        });
        self.departments.retain(|_, stored| {
            let fresh = stored.is_fresh(ttl);
            removed += usize::from(!fresh);
            fresh
        });
        self.last_sweep_ms.store(self.elapsed_ms(), Ordering::Relaxed);
        self.evictions.fetch_add(removed, Ordering::Relaxed);
        removed
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            evictions: self.evictions.load(Ordering::Relaxed),
            entries: self.employees.len() + self.departments.len(),
        }
    }

    pub fn reset_stats(&self) {
        self.hits.store(0, Ordering::Relaxed);
        self.misses.store(0, Ordering::Relaxed);
        self.evictions.store(0, Ordering::Relaxed);
    }

    fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.created.elapsed().as_millis()).unwrap_or(u64::MAX)
    }

    fn lookup<K, T>(&self, cache: &DashMap<K, Stored<T>>, key: &K) -> Option<T>
    where
        K: Eq + Hash,
        T: Clone,
    {
        let stale = match cache.get(key) {
            Some(stored) if stored.is_fresh(self.ttl) => {
                self.hits.fetch_add(1, Ordering::Relaxed);
                return Some(stored.value.clone());
            }
            Some(_) => true,
            None => false,
        };

        if stale && cache.remove_if(key, |_, stored| !stored.is_fresh(self.ttl)).is_some() {
            self.evictions.fetch_add(1, Ordering::Relaxed);
        }
        self.misses.fetch_add(1, Ordering::Relaxed);
        None
    }

    /// Sweeps before an insert when the last sweep is more than one TTL old
    fn sweep_if_due(&self) {
        let now = self.elapsed_ms();
        let last = self.last_sweep_ms.load(Ordering::Relaxed);
        let period = u64::try_from(self.ttl.as_millis()).unwrap_or(u64::MAX);
        if now.saturating_sub(last) < period {
            return;
        }
        // One caller sweeps; the others go straight to their insert
        if self
            .last_sweep_ms
            .compare_exchange(last, now, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            let removed = self.evict_expired();
            if removed > 0 {
                debug!(removed, "Swept stale directory cache entries");
            }
        }
    }
}

impl<H: HierarchyProvider + 'static> CachedHierarchy<H> {
    /// Sweep stale entries every `every` until the cache is dropped
    pub fn spawn_eviction(self: &Arc<Self>, every: Duration) -> JoinHandle<()> {
        let weak: Weak<Self> = Arc::downgrade(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(every);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let Some(cache) = weak.upgrade() else {
                    break;
                };
                let removed = cache.evict_expired();
                debug!(removed, entries = cache.stats().entries, "Directory cache eviction");
            }
        })
    }
}

#[async_trait]
impl<H: HierarchyProvider> HierarchyProvider for CachedHierarchy<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn employee_department(
        &self,
        property: &PropertyId,
        employee: &EmployeeId,
    ) -> HierarchyResult<Option<DepartmentId>> {
        let key = (property.clone(), employee.clone());
        if let Some(department) = self.lookup(&self.employees, &key) {
            return Ok(department);
        }

        let department = self.inner.employee_department(property, employee).await?;
        debug!(property = %property, employee = %employee, "Caching employee department");
        self.sweep_if_due();
        self.employees.insert(key, Stored::now(department.clone()));
        Ok(department)
    }

    async fn property_departments(&self, property: &PropertyId) -> HierarchyResult<Vec<DepartmentId>> {
        if let Some(departments) = self.lookup(&self.departments, property) {
            return Ok(departments);
        }

        let departments = self.inner.property_departments(property).await?;
        self.sweep_if_due();
        self.departments
            .insert(property.clone(), Stored::now(departments.clone()));
        Ok(departments)
    }

    async fn has_property_wide_grant(
        &self,
        user: &UserContext,
        property: &PropertyId,
    ) -> HierarchyResult<bool> {
        self.inner.has_property_wide_grant(user, property).await
    }
}
