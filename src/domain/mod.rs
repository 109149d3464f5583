//! Domain layer - Core business entities
//!
//! Domain models are independent of the ORM entities that persist them.

pub mod user;

pub use user::{CreateUser, User, UserResponse};
