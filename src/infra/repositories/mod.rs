//! Repository layer - Data access abstraction
//!
//! Repositories run their queries through a request-scoped [`Session`](crate::infra::db::Session),
//! so a handler's reads and writes share one transaction.

pub mod entities;
mod user_repository;

pub use user_repository::{UserRepository, UserStore};

// Export mock for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use user_repository::MockUserRepository;
