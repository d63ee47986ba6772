//! Per-call deadline for hierarchy providers

use super::HierarchyProvider;
use crate::error::{HierarchyError, HierarchyResult};
use crate::types::{DepartmentId, EmployeeId, PropertyId, UserContext};
use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;
use tracing::warn;

/// Bounds every call to the inner provider
///
/// An expired deadline becomes [`HierarchyError::Timeout`]; it is never
/// reported as "no access".
pub struct TimeoutHierarchy<H> {
    inner: H,
    timeout: Duration,
}

impl<H: HierarchyProvider> TimeoutHierarchy<H> {
    pub fn new(inner: H, timeout: Duration) -> Self {
        Self { inner, timeout }
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    async fn bounded<T>(
        &self,
        operation: &'static str,
        call: impl Future<Output = HierarchyResult<T>>,
    ) -> HierarchyResult<T> {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    provider = self.inner.name(),
                    operation,
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Hierarchy provider call timed out"
                );
                Err(HierarchyError::Timeout {
                    operation,
                    after: self.timeout,
                })
            }
        }
    }
}

#[async_trait]
impl<H: HierarchyProvider> HierarchyProvider for TimeoutHierarchy<H> {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn employee_department(
        &self,
        property: &PropertyId,
        employee: &EmployeeId,
    ) -> HierarchyResult<Option<DepartmentId>> {
        self.bounded(
            "employee_department",
            self.inner.employee_department(property, employee),
        )
        .await
    }

    async fn property_departments(&self, property: &PropertyId) -> HierarchyResult<Vec<DepartmentId>> {
        self.bounded("property_departments", self.inner.property_departments(property))
            .await
    }

    async fn has_property_wide_grant(
        &self,
        user: &UserContext,
        property: &PropertyId,
    ) -> HierarchyResult<bool> {
        self.bounded(
            "has_property_wide_grant",
            self.inner.has_property_wide_grant(user, property),
        )
        .await
    }
}
