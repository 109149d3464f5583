//! User use cases wired to the request's session and the shared cache.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::api::AppState;
use crate::errors::AppError;
use crate::infra::{CacheClient, Session, UserStore};
use crate::services::UsersUseCase;

/// `UsersUseCase` over a request-scoped [`UserStore`].
pub struct Users(pub UsersUseCase<UserStore>);

#[async_trait]
impl FromRequestParts<AppState> for Users {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let cache = CacheClient::from_request_parts(parts, state).await?;
        let session = Session::from_request_parts(parts, state).await?;
        Ok(Users(UsersUseCase::new(UserStore::new(session), cache)))
    }
}
