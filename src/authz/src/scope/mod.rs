//! Scheduling scope resolution
//!
//! Answers three questions for a request-scoped user context:
//!
//! - which departments of a property may this user schedule?
//! - may this user act on this department?
//! - may this user act on this employee?
//!
//! # Examples
//!
//! ```
//! use rota_authz::scope::ScopeResolver;
//! use rota_authz::{InMemoryHierarchy, RoleAssignment, UserContext};
//! use std::sync::Arc;
//!
//! # tokio_test::block_on(async {
//! let resolver = ScopeResolver::new(Arc::new(InMemoryHierarchy::new()));
//! let user = UserContext::new("user-1").unwrap()
//!     .with_assignment(RoleAssignment::department("P1", "D1").unwrap());
//!
//! assert!(resolver.can_access_department(&user, "P1", "D1").await.unwrap());
//! assert!(!resolver.can_access_department(&user, "P1", "D9").await.unwrap());
//! # });
//! ```

mod resolver;
mod types;


pub use resolver::ScopeResolver;
pub use types::{AccessDecision, AccessReason, ResolvedScope};
