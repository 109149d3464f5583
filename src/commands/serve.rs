//! Serve command - Starts the HTTP server.

use std::sync::Arc;

use crate::api::{create_router, AppState};
use crate::cli::args::ServeArgs;
use crate::config::Settings;
use crate::errors::{AppError, AppResult};
use crate::infra::cache::{BackendConnector, CacheBackendKind, CacheManager};
use crate::infra::Engine;

/// Execute the serve command
pub async fn execute(args: ServeArgs, mut settings: Settings) -> AppResult<()> {
    tracing::info!("Starting server...");

    if let Some(host) = args.host {
        settings.server_host = host;
    }
    if let Some(port) = args.port {
        settings.server_port = port;
    }

    // The cache connects on first use; only the backend name is checked here.
    let backend: CacheBackendKind = settings.cache.backend.parse()?;

    let engine = Engine::connect(&settings.db, settings.debug).await?;
    if args.skip_migrations {
        tracing::warn!("Skipping migrations");
    } else {
        engine.run_migrations().await?;
        tracing::info!("Migrations applied");
    }

    let cache = Arc::new(CacheManager::new(Arc::new(BackendConnector)));
    tracing::info!(backend = ?backend, "Cache will initialize on first use");

    let addr = settings.server_addr();
    let app_state = AppState::new(engine, cache, Arc::new(settings));

    // Build router
    let app = create_router(app_state);

    // Start server
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| AppError::internal(format!("Failed to bind to {}: {}", addr, e)))?;

    tracing::info!("Server running on http://{}", addr);

    axum::serve(listener, app)
        .await
        .map_err(|e| AppError::internal(format!("Server error: {}", e)))?;

    Ok(())
}
