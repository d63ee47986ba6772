//! Organizational hierarchy providers
//!
//! The scope resolver never walks the property → department → employee tree
//! itself. Everything beyond flat role-assignment filtering goes through a
//! [`HierarchyProvider`]:
//!
//! - which department an employee belongs to
//! - which departments exist under a property
//! - whether a user holds an implicit property-wide grant (e.g. property manager)
//!
//! Providers compose: [`TimeoutHierarchy`] and [`CachedHierarchy`] wrap any
//! other provider.

mod cached;
mod memory;
#[cfg(feature = "postgres")]
mod postgres;
mod timeout;

pub use cached::{CacheStats, CachedHierarchy, DEFAULT_CACHE_TTL};
pub use memory::{DepartmentSnapshot, DirectorySnapshot, InMemoryHierarchy, PropertySnapshot};
#[cfg(feature = "postgres")]
pub use postgres::{PostgresHierarchy, PostgresHierarchyOptions};
pub use timeout::TimeoutHierarchy;

use crate::error::HierarchyResult;
use crate::types::{DepartmentId, EmployeeId, PropertyId, UserContext};
use async_trait::async_trait;
use std::sync::Arc;

/// Capability resolving structural relationships in the organization directory
///
/// Implementations are expected to perform I/O. Failures must be returned as
/// errors, never folded into "not found" or "no grant".
#[async_trait]
pub trait HierarchyProvider: Send + Sync {
    /// Short provider name for logs
    fn name(&self) -> &str;

    /// Department the employee belongs to within the property, if known
    async fn employee_department(
        &self,
        property: &PropertyId,
        employee: &EmployeeId,
    ) -> HierarchyResult<Option<DepartmentId>>;

    /// Every department that exists under the property
    async fn property_departments(&self, property: &PropertyId) -> HierarchyResult<Vec<DepartmentId>>;

    /// Whether the user implicitly covers the whole property
    ///
    /// The resolver only asks for users holding at least one assignment that
    /// applies to the property.
    async fn has_property_wide_grant(
        &self,
        user: &UserContext,
        property: &PropertyId,
    ) -> HierarchyResult<bool>;
}

#[async_trait]
impl<H: HierarchyProvider + ?Sized> HierarchyProvider for Arc<H> {
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn employee_department(
        &self,
        property: &PropertyId,
        employee: &EmployeeId,
    ) -> HierarchyResult<Option<DepartmentId>> {
        (**self).employee_department(property, employee).await
    }

    async fn property_departments(&self, property: &PropertyId) -> HierarchyResult<Vec<DepartmentId>> {
        (**self).property_departments(property).await
    }

    async fn has_property_wide_grant(
        &self,
        user: &UserContext,
        property: &PropertyId,
    ) -> HierarchyResult<bool> {
        (**self).has_property_wide_grant(user, property).await
    }
}
