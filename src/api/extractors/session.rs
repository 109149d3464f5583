//! One database session per request.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::api::AppState;
use crate::errors::AppError;
use crate::infra::Session;

/// Hands the handler a fresh session; dropping it at the end of the handler
/// rolls back uncommitted work and releases it.
#[async_trait]
impl FromRequestParts<AppState> for Session {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        Ok(state.engine.session())
    }
}
