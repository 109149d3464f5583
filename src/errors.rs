//! Centralized error handling.
//!
//! Provides a unified error type for the entire application,
//! with automatic HTTP response conversion.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;
use thiserror::Error;

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Resource errors
    #[error("Resource not found")]
    NotFound,

    #[error("{0} already exists")]
    Conflict(String),

    // Validation
    #[error("{0}")]
    Validation(String),

    // Startup / wiring
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Cache is not initialized")]
    CacheNotInitialized,

    // External service errors
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Database error")]
    Database(#[from] DbErr),

    // Internal
    #[error("Internal server error")]
    Internal(String),
}

/// Error response body
#[derive(Debug, Serialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    code: String,
    message: String,
}

impl AppError {
    /// Get error code for client
    fn code(&self) -> &'static str {
        match self {
            AppError::NotFound => "NOT_FOUND",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Validation(_) => "VALIDATION_ERROR",
            AppError::Config(_) => "CONFIG_ERROR",
            AppError::CacheNotInitialized => "CACHE_NOT_INITIALIZED",
            AppError::Cache(_) => "CACHE_ERROR",
            AppError::Database(_) => "DATABASE_ERROR",
            AppError::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Get HTTP status code
    fn status(&self) -> StatusCode {
        match self {
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_)
            | AppError::CacheNotInitialized
            | AppError::Cache(_)
            | AppError::Database(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get user-facing message (hides internal details)
    fn user_message(&self) -> String {
        match self {
            AppError::Validation(msg) => msg.clone(),
            AppError::Conflict(msg) => format!("{} already exists", msg),

            AppError::Database(e) => {
                tracing::error!("Database error: {:?}", e);
                "A database error occurred".to_string()
            }
            AppError::Cache(msg) => {
                tracing::error!("Cache error: {}", msg);
                "A cache error occurred".to_string()
            }
            AppError::Config(msg) => {
                tracing::error!("Configuration error: {}", msg);
                "An internal error occurred".to_string()
            }
            AppError::CacheNotInitialized => {
                tracing::error!("Cache dependency requested but no client is available");
                "An internal error occurred".to_string()
            }
            AppError::Internal(msg) => {
                tracing::error!("Internal error: {}", msg);
                "An internal error occurred".to_string()
            }

            _ => self.to_string(),
        }
    }

    /// Whether the error is a unique-constraint violation reported by the driver.
    pub fn is_unique_violation(&self) -> bool {
        matches!(
            self,
            AppError::Database(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_)))
        )
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = ErrorResponse {
            error: ErrorBody {
                code: self.code().to_string(),
                message: self.user_message(),
            },
        };

        (status, Json(body)).into_response()
    }
}

/// Result type alias
pub type AppResult<T> = Result<T, AppError>;

/// Extension trait for Option -> AppError conversion
pub trait OptionExt<T> {
    fn ok_or_not_found(self) -> AppResult<T>;
}

impl<T> OptionExt<T> for Option<T> {
    fn ok_or_not_found(self) -> AppResult<T> {
        self.ok_or(AppError::NotFound)
    }
}

/// Convenience constructors
impl AppError {
    pub fn conflict(entity: impl Into<String>) -> Self {
        AppError::Conflict(entity.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        AppError::Validation(msg.into())
    }

    pub fn config(msg: impl Into<String>) -> Self {
        AppError::Config(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        AppError::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(AppError::NotFound.status(), StatusCode::NOT_FOUND);
        assert_eq!(AppError::conflict("email").status(), StatusCode::CONFLICT);
        assert_eq!(AppError::validation("bad").status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            AppError::CacheNotInitialized.status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            AppError::config("x").status(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_internal_details_are_hidden() {
        let err = AppError::config("unsupported database provider: invalid");
        assert_eq!(err.user_message(), "An internal error occurred");
        assert_eq!(AppError::conflict("email").user_message(), "email already exists");
    }

    #[test]
    fn test_cache_not_initialized_message() {
        assert_eq!(
            AppError::CacheNotInitialized.to_string(),
            "Cache is not initialized"
        );
    }

    #[test]
    fn test_ok_or_not_found() {
        let missing: Option<u8> = None;
        assert!(matches!(missing.ok_or_not_found(), Err(AppError::NotFound)));
        assert_eq!(Some(3).ok_or_not_found().unwrap(), 3);
    }

    #[test]
    fn test_plain_db_error_is_not_unique_violation() {
        let err = AppError::from(DbErr::Custom("boom".to_string()));
        assert!(!err.is_unique_violation());
    }
}
