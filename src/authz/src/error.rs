//! Error types for scope authorization

use std::time::Duration;
use thiserror::Error;

/// Failures raised by an organizational hierarchy provider
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HierarchyError {
    /// Directory could not be reached or refused the request
    #[error("Organization directory unavailable: {0}")]
    Unavailable(String),

    /// Directory did not answer in time
    #[error("Organization directory timed out after {after:?} during {operation}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    /// Backing database failed
    #[error("Organization directory database error: {0}")]
    Database(String),
}

/// Result type for hierarchy provider calls
pub type HierarchyResult<T> = std::result::Result<T, HierarchyError>;

/// Scope authorization errors
///
/// An absent grant is never an error. Callers get `Ok(false)` or an empty set
/// for denials and one of these variants only when the question could not be
/// answered.
#[derive(Debug, Error)]
pub enum AuthzError {
    /// Missing or malformed identifier
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Hierarchy provider failed; the decision is indeterminate
    #[error("Hierarchy provider failure: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Invalid configuration value
    #[error("Configuration error: {0}")]
    Config(String),

    /// Internal error
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AuthzError {
    /// True when the failure came from infrastructure rather than the request.
    ///
    /// Callers must not map these to either allow or deny.
    pub fn is_indeterminate(&self) -> bool {
        matches!(self, AuthzError::Hierarchy(_))
    }

    /// True for caller mistakes such as empty identifiers
    pub fn is_validation(&self) -> bool {
        matches!(self, AuthzError::InvalidInput(_))
    }
}

/// Result type for scope authorization operations
pub type Result<T> = std::result::Result<T, AuthzError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_display() {
        let err = HierarchyError::Timeout {
            operation: "employee_department",
            after: Duration::from_millis(250),
        };
        let msg = err.to_string();
        assert!(msg.contains("timed out"));
        assert!(msg.contains("employee_department"));
    }

    #[test]
    fn test_hierarchy_error_is_indeterminate() {
        let err: AuthzError = HierarchyError::Unavailable("connection refused".into()).into();
        assert!(err.is_indeterminate());
        assert!(!err.is_validation());
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn test_invalid_input_is_validation() {
        let err = AuthzError::InvalidInput("property id is required".into());
        assert!(err.is_validation());
        assert!(!err.is_indeterminate());
    }
}
