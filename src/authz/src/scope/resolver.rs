//! Scope resolver over a user's role assignments
//!
//! Performs a single filter-and-project over the assignments it is handed.
//! Anything structural (employee → department, property-wide grants, the
//! department list of a property) is asked of the injected
//! [`HierarchyProvider`].

use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::debug;

use super::types::{AccessDecision, AccessReason, ResolvedScope};
use crate::config::{ScopeConfig, UnscopedDepartmentPolicy, UnscopedPropertyPolicy};
use crate::error::Result;
use crate::hierarchy::HierarchyProvider;
use crate::types::{DepartmentId, EmployeeId, PropertyId, RoleAssignment, UserContext};

/// Grants derived from the assignments alone, without the provider
#[derive(Debug, Default)]
struct FlatGrants {
    /// At least one assignment applies to the property
    applicable: bool,
    departments: BTreeSet<DepartmentId>,
    /// An applicable assignment names no department
    has_unscoped_department: bool,
}

/// Resolves which departments and employees a user may schedule
///
/// The resolver is stateless and cheap to share behind an `Arc`. Every call
/// works on the request-scoped [`UserContext`] it is given.
///
/// # Examples
///
/// ```
/// use rota_authz::{InMemoryHierarchy, RoleAssignment, ScopeResolver, UserContext};
/// use std::sync::Arc;
///
/// # tokio_test::block_on(async {
/// let resolver = ScopeResolver::new(Arc::new(InMemoryHierarchy::new()));
/// let user = UserContext::new("user-1").unwrap()
///     .with_assignment(RoleAssignment::department("P1", "D1").unwrap())
///     .with_assignment(RoleAssignment::department("P2", "D2").unwrap());
///
/// let departments = resolver.accessible_departments(&user, "P1").await.unwrap();
/// assert_eq!(departments.len(), 1);
/// # });
/// ```
#[derive(Clone)]
pub struct ScopeResolver {
    hierarchy: Arc<dyn HierarchyProvider>,
    config: ScopeConfig,
}

impl ScopeResolver {
    /// Creates a resolver with the default (strict) configuration
    pub fn new(hierarchy: Arc<dyn HierarchyProvider>) -> Self {
        Self::with_config(hierarchy, ScopeConfig::default())
    }

    pub fn with_config(hierarchy: Arc<dyn HierarchyProvider>, config: ScopeConfig) -> Self {
        Self { hierarchy, config }
    }

    pub fn config(&self) -> &ScopeConfig {
        &self.config
    }

    pub fn hierarchy(&self) -> &Arc<dyn HierarchyProvider> {
        &self.hierarchy
    }

    /// Departments the user may act on within the property
    ///
    /// Empty when nothing qualifies. Fails only on an empty property id or a
    /// provider failure.
    pub async fn accessible_departments(
        &self,
        user: &UserContext,
        property_id: &str,
    ) -> Result<BTreeSet<DepartmentId>> {
        Ok(self.resolve(user, property_id).await?.departments)
    }

    /// True iff the department is among the user's accessible departments
    pub async fn can_access_department(
        &self,
        user: &UserContext,
        property_id: &str,
        department_id: &str,
    ) -> Result<bool> {
        Ok(self
            .explain_department_access(user, property_id, department_id)
            .await?
            .allowed)
    }

    /// True iff the user covers the whole property, or the employee's
    /// department is accessible
    pub async fn can_access_employee(
        &self,
        user: &UserContext,
        property_id: &str,
        employee_id: &str,
    ) -> Result<bool> {
        Ok(self
            .explain_employee_access(user, property_id, employee_id)
            .await?
            .allowed)
    }

    /// Full scope of the user within one property
    pub async fn resolve(&self, user: &UserContext, property_id: &str) -> Result<ResolvedScope> {
        let property = PropertyId::parse(property_id)?;

        if user.has_no_assignments() {
            debug!(user = %user.user_id, property = %property, "No role assignments");
            return Ok(ResolvedScope::empty(property));
        }

        let grants = self.flat_grants(user, &property);
        let property_wide = self.property_wide_reason(user, &property, &grants).await?;

        let mut departments = grants.departments;
        if property_wide.is_some() {
            departments.extend(self.hierarchy.property_departments(&property).await?);
        }

        debug!(
            user = %user.user_id,
            property = %property,
            property_wide = property_wide.is_some(),
            departments = departments.len(),
            "Resolved scope"
        );

        Ok(ResolvedScope {
            property_id: property,
            property_wide: property_wide.is_some(),
            departments,
        })
    }

    /// Department access decision with its reason
    pub async fn explain_department_access(
        &self,
        user: &UserContext,
        property_id: &str,
        department_id: &str,
    ) -> Result<AccessDecision> {
        let property = PropertyId::parse(property_id)?;
        let department = DepartmentId::parse(department_id)?;

        if user.has_no_assignments() {
            return Ok(AccessDecision::deny(AccessReason::NoAssignments));
        }

        let grants = self.flat_grants(user, &property);
        let decision = if grants.departments.contains(&department) {
            AccessDecision::allow(AccessReason::DepartmentAssignment {
                department_id: department.clone(),
            })
        } else {
            match self.property_wide_reason(user, &property, &grants).await? {
                Some(reason) => {
                    let departments = self.hierarchy.property_departments(&property).await?;
                    if departments.contains(&department) {
                        AccessDecision::allow(reason)
                    } else {
                        AccessDecision::deny(AccessReason::NotInScope)
                    }
                }
                None => AccessDecision::deny(AccessReason::NotInScope),
            }
        };

        debug!(
            user = %user.user_id,
            property = %property,
            department = %department,
            allowed = decision.allowed,
            reason = %decision.reason,
            "Department access decision"
        );
        Ok(decision)
    }

    /// Employee access decision with its reason
    pub async fn explain_employee_access(
        &self,
        user: &UserContext,
        property_id: &str,
        employee_id: &str,
    ) -> Result<AccessDecision> {
        let property = PropertyId::parse(property_id)?;
        let employee = EmployeeId::parse(employee_id)?;

        if user.has_no_assignments() {
            return Ok(AccessDecision::deny(AccessReason::NoAssignments));
        }

        let grants = self.flat_grants(user, &property);
        let decision = if !grants.applicable {
            AccessDecision::deny(AccessReason::NotInScope)
        } else if let Some(reason) = self.local_property_wide_reason(&grants) {
            AccessDecision::allow(reason)
        } else {
            match self.hierarchy.employee_department(&property, &employee).await? {
                Some(department) if grants.departments.contains(&department) => {
                    AccessDecision::allow(AccessReason::DepartmentAssignment {
                        department_id: department,
                    })
                }
                found => {
                    if self.hierarchy.has_property_wide_grant(user, &property).await? {
                        AccessDecision::allow(AccessReason::HierarchyGrant)
                    } else if found.is_none() {
                        AccessDecision::deny(AccessReason::EmployeeNotFound)
                    } else {
                        AccessDecision::deny(AccessReason::NotInScope)
                    }
                }
            }
        };

        debug!(
            user = %user.user_id,
            property = %property,
            employee = %employee,
            allowed = decision.allowed,
            reason = %decision.reason,
            "Employee access decision"
        );
        Ok(decision)
    }

    fn applies_to(&self, assignment: &RoleAssignment, property: &PropertyId) -> bool {
        match &assignment.property_id {
            Some(assigned) => assigned == property,
            None => self.config.unscoped_property == UnscopedPropertyPolicy::AnyProperty,
        }
    }

    fn flat_grants(&self, user: &UserContext, property: &PropertyId) -> FlatGrants {
        user.assignments
            .iter()
            .filter(|assignment| self.applies_to(assignment, property))
            .fold(FlatGrants::default(), |mut grants, assignment| {
                grants.applicable = true;
                match &assignment.department_id {
                    Some(department) => {
                        grants.departments.insert(department.clone());
                    }
                    None => grants.has_unscoped_department = true,
                }
                grants
            })
    }

    /// Property-wide grant that needs no provider call
    fn local_property_wide_reason(&self, grants: &FlatGrants) -> Option<AccessReason> {
        let covers_property = grants.has_unscoped_department
            && self.config.unscoped_department == UnscopedDepartmentPolicy::AllDepartments;
        covers_property.then_some(AccessReason::PropertyWideAssignment)
    }

    /// Local grant first; the provider is asked only when some assignment
    /// applies to the property
    async fn property_wide_reason(
        &self,
        user: &UserContext,
        property: &PropertyId,
        grants: &FlatGrants,
    ) -> Result<Option<AccessReason>> {
        if let Some(reason) = self.local_property_wide_reason(grants) {
            return Ok(Some(reason));
        }

        if grants.applicable && self.hierarchy.has_property_wide_grant(user, property).await? {
            return Ok(Some(AccessReason::HierarchyGrant));
        }

        Ok(None)
    }
}

impl std::fmt::Debug for ScopeResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeResolver")
            .field("hierarchy", &self.hierarchy.name())
            .field("config", &self.config)
            .finish()
    }
}
