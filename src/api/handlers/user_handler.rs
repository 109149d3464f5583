//! User handlers.

use axum::{
    extract::Path,
    http::StatusCode,
    response::Json,
    routing::get,
    Router,
};
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

use crate::api::extractors::{Users, ValidatedJson};
use crate::api::AppState;
use crate::domain::{CreateUser, UserResponse};
use crate::errors::AppResult;

/// User creation request
#[derive(Debug, Deserialize, Validate, ToSchema)]
pub struct CreateUserRequest {
    /// User email address
    #[validate(email(message = "Invalid email format"))]
    #[schema(example = "user@example.com")]
    pub email: String,
    /// User display name
    #[validate(length(min = 1, max = 255, message = "Name must be 1 to 255 characters"))]
    #[schema(example = "John Doe")]
    pub name: String,
}

impl From<CreateUserRequest> for CreateUser {
    fn from(req: CreateUserRequest) -> Self {
        Self {
            email: req.email,
            name: req.name,
        }
    }
}

/// Create user routes
pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(create_user))
        .route("/:id", get(get_user))
}

/// List all users
#[utoipa::path(
    get,
    path = "/users",
    tag = "Users",
    responses(
        (status = 200, description = "List of users", body = Vec<UserResponse>),
        (status = 500, description = "Database or cache unavailable")
    )
)]
pub async fn list_users(Users(mut users): Users) -> AppResult<Json<Vec<UserResponse>>> {
    let list = users.list().await?;
    Ok(Json(list.into_iter().map(UserResponse::from).collect()))
}

/// Get user by ID
#[utoipa::path(
    get,
    path = "/users/{id}",
    tag = "Users",
    params(
        ("id" = Uuid, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 404, description = "User not found")
    )
)]
pub async fn get_user(
    Users(mut users): Users,
    Path(id): Path<Uuid>,
) -> AppResult<Json<UserResponse>> {
    let user = users.get(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// Create a new user
#[utoipa::path(
    post,
    path = "/users",
    tag = "Users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = UserResponse),
        (status = 400, description = "Validation error"),
        (status = 409, description = "Email already registered")
    )
)]
pub async fn create_user(
    Users(mut users): Users,
    ValidatedJson(payload): ValidatedJson<CreateUserRequest>,
) -> AppResult<(StatusCode, Json<UserResponse>)> {
    let user = users.create(payload.into()).await?;
    Ok((StatusCode::CREATED, Json(UserResponse::from(user))))
}
