//! Shared cache client for handlers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::api::AppState;
use crate::errors::AppError;
use crate::infra::CacheClient;

/// Resolves the process-wide client; rejects with `CacheNotInitialized`
/// when no client could be created.
#[async_trait]
impl FromRequestParts<AppState> for CacheClient {
    type Rejection = AppError;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        state.cache_client().await
    }
}
