//! Infrastructure layer - External systems integration
//!
//! This module handles all external system concerns:
//! - Database engine, sessions and migrations
//! - Repositories over request-scoped sessions
//! - The shared cache client (Redis or in-process)

pub mod cache;
pub mod db;
pub mod repositories;

pub use cache::{CacheBackend, CacheClient, CacheConnector, CacheManager};
pub use db::{Engine, Migrator, Session, SessionOptions};
pub use repositories::{UserRepository, UserStore};

#[cfg(any(test, feature = "test-utils"))]
pub use repositories::MockUserRepository;
