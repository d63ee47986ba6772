//! Core scope authorization types

use crate::error::{AuthzError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

macro_rules! identifier {
    ($(#[$meta:meta])* $name:ident, $label:literal) => {
        $(#[$meta])*
        #[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(try_from = "String", into = "String")]
        pub struct $name(String);

        impl $name {
            /// Parse an identifier, rejecting empty or blank values
            pub fn parse(value: impl Into<String>) -> Result<Self> {
                let value = value.into();
                if value.trim().is_empty() {
                    return Err(AuthzError::InvalidInput(
                        concat!($label, " is required").to_string(),
                    ));
                }
                Ok(Self(value))
            }

            /// Returns the raw identifier
            pub fn as_str(&self) -> &str {
                &self.0
            }
        }

        impl TryFrom<String> for $name {
            type Error = AuthzError;

            fn try_from(value: String) -> Result<Self> {
                Self::parse(value)
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }

        impl AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

identifier!(
    /// User identity
    UserId,
    "user id"
);
identifier!(
    /// Organizational site or location
    PropertyId,
    "property id"
);
identifier!(
    /// Unit within a property
    DepartmentId,
    "department id"
);
identifier!(
    /// Employee within a property
    EmployeeId,
    "employee id"
);

/// A grant linking a user to an optional property and optional department
///
/// `None` on an axis means the assignment is unscoped on that axis. What an
/// unscoped axis grants is decided by [`crate::ScopeConfig`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleAssignment {
    /// Role name (e.g. "scheduler", "property_manager")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,

    /// Property the grant applies to
    #[serde(default)]
    pub property_id: Option<PropertyId>,

    /// Department the grant applies to
    #[serde(default)]
    pub department_id: Option<DepartmentId>,
}

impl RoleAssignment {
    /// Grant on a single department of a property
    pub fn department(property_id: &str, department_id: &str) -> Result<Self> {
        Ok(Self {
            role: None,
            property_id: Some(PropertyId::parse(property_id)?),
            department_id: Some(DepartmentId::parse(department_id)?),
        })
    }

    /// Grant on a property with no department named
    pub fn property(property_id: &str) -> Result<Self> {
        Ok(Self {
            role: None,
            property_id: Some(PropertyId::parse(property_id)?),
            department_id: None,
        })
    }

    /// Grant with neither axis scoped
    pub fn unscoped() -> Self {
        Self::default()
    }

    /// Attach a role name
    pub fn with_role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    /// Returns true if this assignment names the given role
    pub fn has_role(&self, role: &str) -> bool {
        self.role.as_deref() == Some(role)
    }
}

/// Request-scoped snapshot of a user's identity and role assignments
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserContext {
    /// User identifier
    pub user_id: UserId,

    /// Role assignments; order is irrelevant
    #[serde(default)]
    pub assignments: Vec<RoleAssignment>,
}

impl UserContext {
    /// Create a context with no assignments
    pub fn new(user_id: &str) -> Result<Self> {
        Ok(Self {
            user_id: UserId::parse(user_id)?,
            assignments: Vec::new(),
        })
    }

    /// Add a role assignment
    pub fn with_assignment(mut self, assignment: RoleAssignment) -> Self {
        self.assignments.push(assignment);
        self
    }

    /// Returns true if the user holds no assignments at all
    pub fn has_no_assignments(&self) -> bool {
        self.assignments.is_empty()
    }
}
