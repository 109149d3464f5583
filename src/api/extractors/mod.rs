//! Custom extractors.

mod cache;
mod session;
mod users;
mod validated_json;

pub use validated_json::ValidatedJson;
pub use users::Users;
