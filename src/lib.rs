//! Users API - a users resource over SeaORM sessions and a lazily
//! initialized cache.
//!
//! # Architecture Layers
//!
//! - **cli**: Command-line interface
//! - **commands**: CLI command implementations
//! - **config**: Application configuration and constants
//! - **domain**: Core business entities
//! - **services**: Application use cases
//! - **infra**: Database engine and sessions, repositories, cache
//! - **api**: HTTP handlers, extractors, and routes
//! - **errors**: Centralized error handling
//!
//! # CLI Usage
//!
//! ```bash
//! # Start the server (applies pending migrations first)
//! cargo run -- serve
//!
//! # Run migrations
//! cargo run -- migrate up
//! ```

pub mod api;
pub mod cli;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod infra;
pub mod services;

// Re-export commonly used types at crate root
pub use api::AppState;
pub use config::Settings;
pub use domain::User;
pub use errors::{AppError, AppResult};
pub use infra::{CacheClient, CacheManager, Engine, Session};
