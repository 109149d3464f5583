//! OpenAPI documentation configuration.
//!
//! Provides Swagger UI for API exploration and testing.

use utoipa::OpenApi;

use crate::api::handlers::user_handler;
use crate::domain::UserResponse;

/// OpenAPI documentation for the users API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Users API",
        version = "0.1.0",
        description = "Users resource over SeaORM sessions with a lazily initialized cache",
        license(name = "MIT", url = "https://opensource.org/licenses/MIT")
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development server")
    ),
    paths(
        user_handler::list_users,
        user_handler::get_user,
        user_handler::create_user,
    ),
    components(
        schemas(
            UserResponse,
            user_handler::CreateUserRequest,
        )
    ),
    tags(
        (name = "Users", description = "User management operations")
    )
)]
pub struct ApiDoc;
