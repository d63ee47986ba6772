//! Scope resolution results and access decisions

use crate::types::{DepartmentId, PropertyId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Everything a user may act on within one property
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedScope {
    /// Property the scope was resolved for
    pub property_id: PropertyId,

    /// Whether the user covers the whole property
    pub property_wide: bool,

    /// Accessible departments, deduplicated
    pub departments: BTreeSet<DepartmentId>,
}

impl ResolvedScope {
    /// Scope granting nothing
    pub fn empty(property_id: PropertyId) -> Self {
        Self {
            property_id,
            property_wide: false,
            departments: BTreeSet::new(),
        }
    }

    pub fn contains(&self, department: &DepartmentId) -> bool {
        self.departments.contains(department)
    }

    pub fn is_empty(&self) -> bool {
        !self.property_wide && self.departments.is_empty()
    }
}

/// Why access was granted or refused
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AccessReason {
    /// User holds no role assignments at all
    NoAssignments,
    /// An assignment names this department
    DepartmentAssignment { department_id: DepartmentId },
    /// An applicable assignment without a department covers the property
    PropertyWideAssignment,
    /// The hierarchy provider reported an implicit property-wide grant
    HierarchyGrant,
    /// Nothing the user holds covers the target
    NotInScope,
    /// The directory does not know the employee under this property
    EmployeeNotFound,
}

impl AccessReason {
    /// Stable machine-readable code, identical to the serialized `kind`
    pub fn code(&self) -> &'static str {
        match self {
            Self::NoAssignments => "no_assignments",
            Self::DepartmentAssignment { .. } => "department_assignment",
            Self::PropertyWideAssignment => "property_wide_assignment",
            Self::HierarchyGrant => "hierarchy_grant",
            Self::NotInScope => "not_in_scope",
            Self::EmployeeNotFound => "employee_not_found",
        }
    }
}

impl fmt::Display for AccessReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoAssignments => write!(f, "user has no role assignments"),
            Self::DepartmentAssignment { department_id } => {
                write!(f, "assignment grants department '{}'", department_id)
            }
            Self::PropertyWideAssignment => {
                write!(f, "assignment without department grants the whole property")
            }
            Self::HierarchyGrant => write!(f, "organization directory grants the whole property"),
            Self::NotInScope => write!(f, "target is outside the user's scope"),
            Self::EmployeeNotFound => write!(f, "employee is not known under this property"),
        }
    }
}

/// Authorization decision with its reason
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessDecision {
    /// Whether access is allowed
    pub allowed: bool,

    /// Reason for the decision
    pub reason: AccessReason,
}

impl AccessDecision {
    pub fn allow(reason: AccessReason) -> Self {
        Self {
            allowed: true,
            reason,
        }
    }

    pub fn deny(reason: AccessReason) -> Self {
        Self {
            allowed: false,
            reason,
        }
    }
}
