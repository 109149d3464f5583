//! Lazy, memoized access to the process-wide cache client.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;

use super::{CacheBackendKind, CacheClient, MemoryCache, RedisCache};
use crate::config::{CacheSettings, MEMORY_CACHE_MAX_CAPACITY};
use crate::errors::{AppError, AppResult};

/// Creates a cache client from settings.
#[async_trait]
pub trait CacheConnector: Send + Sync {
    async fn connect(&self, settings: &CacheSettings) -> AppResult<CacheClient>;
}

/// Connector selecting the backend named by `cache.backend`.
#[derive(Debug, Clone, Copy, Default)]
pub struct BackendConnector;

#[async_trait]
impl CacheConnector for BackendConnector {
    async fn connect(&self, settings: &CacheSettings) -> AppResult<CacheClient> {
        let ttl = settings.default_ttl_seconds;
        let client = match settings.backend.parse::<CacheBackendKind>()? {
            CacheBackendKind::Redis => {
                CacheClient::new(Arc::new(RedisCache::connect(&settings.redis_url).await?), ttl)
            }
            CacheBackendKind::Memory => CacheClient::new(
                Arc::new(MemoryCache::new(MEMORY_CACHE_MAX_CAPACITY)),
                ttl,
            ),
        };
        Ok(client)
    }
}

/// Holds at most one cache client for the life of the process.
///
/// The first successful [`resolve`](CacheManager::resolve) stores the client;
/// every later call returns a clone of that same instance. Concurrent first
/// calls are serialized so the connector runs once. A failed init leaves the
/// slot empty, so the next call tries again.
pub struct CacheManager {
    slot: OnceCell<CacheClient>,
    connector: Arc<dyn CacheConnector>,
}

impl CacheManager {
    pub fn new(connector: Arc<dyn CacheConnector>) -> Self {
        Self {
            slot: OnceCell::new(),
            connector,
        }
    }

    pub fn is_initialized(&self) -> bool {
        self.slot.initialized()
    }

    /// The stored client, without attempting initialization.
    pub fn client(&self) -> Option<CacheClient> {
        self.slot.get().cloned()
    }

    /// Attempt initialization if nothing is stored yet.
    ///
    /// Failures are logged and swallowed.
    pub async fn init(&self, settings: &CacheSettings) {
        let result = self
            .slot
            .get_or_try_init(|| async {
                let client = self.connector.connect(settings).await?;
                tracing::info!(backend = client.backend_name(), "Cache initialized");
                Ok::<_, AppError>(client)
            })
            .await;

        if let Err(e) = result {
            tracing::error!(error = %e, backend = %settings.backend, "Cache initialization failed");
        }
    }

    /// Return the shared client, initializing it on first use.
    ///
    /// Fails with [`AppError::CacheNotInitialized`] when initialization
    /// did not produce a client.
    pub async fn resolve(&self, settings: &CacheSettings) -> AppResult<CacheClient> {
        if !self.is_initialized() {
            self.init(settings).await;
        }
        self.client().ok_or(AppError::CacheNotInitialized)
    }
}

impl Default for CacheManager {
    fn default() -> Self {
        Self::new(Arc::new(BackendConnector))
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("client", &self.slot.get())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Counting {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl CacheConnector for Counting {
        async fn connect(&self, settings: &CacheSettings) -> AppResult<CacheClient> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(AppError::Cache("connection refused".to_string()));
            }
            Ok(CacheClient::new(
                Arc::new(MemoryCache::new(10)),
                settings.default_ttl_seconds,
            ))
        }
    }

    fn memory_settings() -> CacheSettings {
        CacheSettings {
            backend: "memory".to_string(),
            ..CacheSettings::default()
        }
    }

    #[tokio::test]
    async fn test_resolve_memoizes() {
        let connector = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            fail: false,
        });
        let manager = CacheManager::new(connector.clone());

        let first = manager.resolve(&memory_settings()).await.unwrap();
        let second = manager.resolve(&memory_settings()).await.unwrap();

        assert!(first.same_instance(&second));
        assert_eq!(connector.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_failed_init_reports_not_initialized() {
        let connector = Arc::new(Counting {
            calls: AtomicUsize::new(0),
            fail: true,
        });
        let manager = CacheManager::new(connector.clone());

        let err = manager.resolve(&memory_settings()).await.unwrap_err();
        assert!(matches!(err, AppError::CacheNotInitialized));
        assert_eq!(err.to_string(), "Cache is not initialized");
        assert!(!manager.is_initialized());
    }

    #[tokio::test]
    async fn test_unknown_backend_is_not_initialized() {
        let manager = CacheManager::default();
        let settings = CacheSettings {
            backend: "memcached".to_string(),
            ..CacheSettings::default()
        };

        let err = manager.resolve(&settings).await.unwrap_err();
        assert!(matches!(err, AppError::CacheNotInitialized));
    }

    #[tokio::test]
    async fn test_default_connector_builds_memory_backend() {
        let manager = CacheManager::default();
        let client = manager.resolve(&memory_settings()).await.unwrap();
        assert_eq!(client.backend_name(), "memory");
    }
}
