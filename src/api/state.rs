//! Application state shared by all handlers.

use std::sync::Arc;

use crate::config::Settings;
use crate::errors::AppResult;
use crate::infra::{CacheClient, CacheManager, Engine};

/// Owns the single database engine and cache manager of the process.
#[derive(Clone)]
pub struct AppState {
    /// Database engine (session factory)
    pub engine: Engine,
    /// Lazily initialized cache client
    pub cache: Arc<CacheManager>,
    pub settings: Arc<Settings>,
}

impl AppState {
    pub fn new(engine: Engine, cache: Arc<CacheManager>, settings: Arc<Settings>) -> Self {
        Self {
            engine,
            cache,
            settings,
        }
    }

    /// Resolve the shared cache client, initializing it on first use.
    pub async fn cache_client(&self) -> AppResult<CacheClient> {
        self.cache.resolve(&self.settings.cache).await
    }
}
