//! # Rota Scheduling Scope Authorization
//!
//! Decides which departments and employees a user may act on when working
//! with schedules for a property.
//!
//! ## Features
//!
//! - **Flat role-assignment filtering** over a request-scoped user context
//! - **Pluggable organizational hierarchy** for property-wide grants and
//!   employee-to-department lookups
//! - **Explicit failure kinds**: denial is `Ok(false)`, directory outages are
//!   `Err(AuthzError::Hierarchy(_))`
//! - **Provider decorators** for TTL caching and per-call timeouts
//! - **PostgreSQL directory** behind the `postgres` feature
//!
//! ## Example
//!
//! ```rust
//! use rota_authz::{InMemoryHierarchy, RoleAssignment, ScopeResolver, UserContext};
//! use std::sync::Arc;
//!
//! # async fn example() -> rota_authz::Result<()> {
//! let directory = InMemoryHierarchy::new();
//! directory.add_department("P1", "D1")?;
//! directory.add_employee("P1", "D1", "E1")?;
//!
//! let resolver = ScopeResolver::new(Arc::new(directory));
//! let user = UserContext::new("user-1")?
//!     .with_assignment(RoleAssignment::department("P1", "D1")?);
//!
//! assert!(resolver.can_access_employee(&user, "P1", "E1").await?);
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod hierarchy;
pub mod scope;
pub mod types;

// Re-export commonly used types
pub use config::{ScopeConfig, UnscopedDepartmentPolicy, UnscopedPropertyPolicy};
pub use error::{AuthzError, HierarchyError, HierarchyResult, Result};
pub use hierarchy::{
    CachedHierarchy, DirectorySnapshot, HierarchyProvider, InMemoryHierarchy, TimeoutHierarchy,
};
pub use scope::{AccessDecision, AccessReason, ResolvedScope, ScopeResolver};
pub use types::{DepartmentId, EmployeeId, PropertyId, RoleAssignment, UserContext, UserId};

#[cfg(feature = "postgres")]
pub use hierarchy::PostgresHierarchy;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
