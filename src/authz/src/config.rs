//! Scope resolution policy configuration

use crate::error::AuthzError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// How an assignment with no property applies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscopedPropertyPolicy {
    /// Only assignments naming the queried property apply
    #[default]
    ExactMatch,
    /// Assignments with no property apply to every property
    AnyProperty,
}

/// What an applicable assignment with no department grants
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnscopedDepartmentPolicy {
    /// No department access
    #[default]
    NoDepartments,
    /// Property-wide access to every department in the property
    AllDepartments,
}

impl FromStr for UnscopedPropertyPolicy {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "exact_match" | "exact" => Ok(Self::ExactMatch),
            "any_property" | "any" => Ok(Self::AnyProperty),
            other => Err(AuthzError::Config(format!(
                "unknown unscoped property policy '{}'",
                other
            ))),
        }
    }
}

impl FromStr for UnscopedDepartmentPolicy {
    type Err = AuthzError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "no_departments" | "none" => Ok(Self::NoDepartments),
            "all_departments" | "all" => Ok(Self::AllDepartments),
            other => Err(AuthzError::Config(format!(
                "unknown unscoped department policy '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for UnscopedPropertyPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ExactMatch => write!(f, "exact_match"),
            Self::AnyProperty => write!(f, "any_property"),
        }
    }
}

impl fmt::Display for UnscopedDepartmentPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoDepartments => write!(f, "no_departments"),
            Self::AllDepartments => write!(f, "all_departments"),
        }
    }
}

/// Scope resolver configuration
///
/// The defaults grant nothing for unscoped axes: an assignment must name the
/// queried property and a department to contribute access.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScopeConfig {
    /// Treatment of assignments with no property
    pub unscoped_property: UnscopedPropertyPolicy,

    /// Treatment of assignments with no department
    pub unscoped_department: UnscopedDepartmentPolicy,
}

impl ScopeConfig {
    /// Config that treats unscoped axes as "everything"
    pub fn permissive() -> Self {
        Self {
            unscoped_property: UnscopedPropertyPolicy::AnyProperty,
            unscoped_department: UnscopedDepartmentPolicy::AllDepartments,
        }
    }

    pub fn with_unscoped_property(mut self, policy: UnscopedPropertyPolicy) -> Self {
        self.unscoped_property = policy;
        self
    }

    pub fn with_unscoped_department(mut self, policy: UnscopedDepartmentPolicy) -> Self {
        self.unscoped_department = policy;
        self
    }
}
