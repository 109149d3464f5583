//! HTTP tests against the full router with SQLite and the in-process cache.

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::CONTENT_TYPE, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

use users_api::api::{create_router, AppState};
use users_api::config::{CacheSettings, DatabaseSettings, Settings};
use users_api::domain::UserResponse;
use users_api::infra::{CacheManager, Engine};

struct TestApp {
    _dir: TempDir,
    engine: Engine,
    router: Router,
}

async fn test_app_with_cache(backend: &str) -> TestApp {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        db: DatabaseSettings {
            provider: "sqlite".to_string(),
            name: dir.path().join("api.db").to_string_lossy().into_owned(),
            ..DatabaseSettings::default()
        },
        cache: CacheSettings {
            backend: backend.to_string(),
            ..CacheSettings::default()
        },
        ..Settings::default()
    };

    let engine = Engine::connect(&settings.db, false).await.unwrap();
    engine.run_migrations().await.unwrap();

    let state = AppState::new(
        engine.clone(),
        Arc::new(CacheManager::default()),
        Arc::new(settings),
    );

    TestApp {
        _dir: dir,
        engine,
        router: create_router(state),
    }
}

async fn test_app() -> TestApp {
    test_app_with_cache("memory").await
}

impl TestApp {
    async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, body)
    }

    async fn get(&self, uri: &str) -> (StatusCode, Value) {
        self.send(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
    }

    async fn post_json(&self, uri: &str, body: Value) -> (StatusCode, Value) {
        self.send(
            Request::builder()
                .method(Method::POST)
                .uri(uri)
                .header(CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
        )
        .await
    }
}

#[tokio::test]
async fn test_root() {
    let app = test_app().await;
    let response = app
        .router
        .clone()
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_health_reports_database_and_cache() {
    let app = test_app().await;
    let (status, body) = app.get("/health").await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["services"]["database"]["status"], "healthy");
    assert_eq!(body["services"]["cache"]["status"], "healthy");
}

#[tokio::test]
async fn test_create_then_fetch_user() {
    let app = test_app().await;

    let (status, body) = app
        .post_json("/users", json!({"email": "ada@example.com", "name": "Ada"}))
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let created: UserResponse = serde_json::from_value(body).unwrap();
    assert_eq!(created.email, "ada@example.com");

    let (status, body) = app.get(&format!("/users/{}", created.id)).await;
    assert_eq!(status, StatusCode::OK);
    let fetched: UserResponse = serde_json::from_value(body).unwrap();
    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.name, "Ada");

    assert_eq!(app.engine.live_sessions(), 0);
}

#[tokio::test]
async fn test_listing_is_refreshed_after_create() {
    let app = test_app().await;

    let (status, body) = app.get("/users").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().map(Vec::len), Some(0));

    app.post_json("/users", json!({"email": "one@example.com", "name": "One"}))
        .await;

    let (_, body) = app.get("/users").await;
    assert_eq!(body.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn test_unknown_user_is_404() {
    let app = test_app().await;
    let (status, body) = app
        .get("/users/00000000-0000-4000-8000-000000000000")
        .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_duplicate_email_is_409() {
    let app = test_app().await;
    let payload = json!({"email": "dup@example.com", "name": "Dup"});

    let (status, _) = app.post_json("/users", payload.clone()).await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = app.post_json("/users", payload).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"]["code"], "CONFLICT");
    assert_eq!(app.engine.live_sessions(), 0);
}

#[tokio::test]
async fn test_invalid_payload_is_400() {
    let app = test_app().await;
    let (status, body) = app
        .post_json("/users", json!({"email": "not-an-email", "name": ""}))
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
}

#[tokio::test]
async fn test_cache_unavailable_is_500() {
    let app = test_app_with_cache("memcached").await;

    let (status, body) = app.get("/users").await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "CACHE_NOT_INITIALIZED");

    let (status, body) = app.get("/health").await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["services"]["cache"]["status"], "unhealthy");
    assert_eq!(app.engine.live_sessions(), 0);
}
