//! Cache layer.
//!
//! Backends implement [`CacheBackend`]; callers hold a [`CacheClient`], a
//! cheap cloneable handle with typed JSON helpers. The process-wide client is
//! created lazily by [`CacheManager`].

use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use serde::{de::DeserializeOwned, Serialize};

use crate::config::MIN_CACHE_TTL_SECONDS;
use crate::errors::{AppError, AppResult};

mod manager;
mod memory;
mod redis;

pub use manager::{BackendConnector, CacheConnector, CacheManager};
pub use memory::MemoryCache;
pub use self::redis::RedisCache;

/// Raw string-valued cache operations.
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Short backend name for logs and health output.
    fn name(&self) -> &'static str;

    async fn get_raw(&self, key: &str) -> AppResult<Option<String>>;

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()>;

    async fn delete(&self, key: &str) -> AppResult<()>;

    async fn exists(&self, key: &str) -> AppResult<bool>;

    /// Round-trip to the backend.
    async fn ping(&self) -> AppResult<()>;
}

/// Available cache backends (`cache.backend`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CacheBackendKind {
    Redis,
    Memory,
}

impl FromStr for CacheBackendKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "redis" => Ok(CacheBackendKind::Redis),
            "memory" => Ok(CacheBackendKind::Memory),
            other => Err(AppError::config(format!("unsupported cache backend: {:?}", other))),
        }
    }
}

/// Shared handle to an initialized cache backend.
///
/// Clones share an invalidation epoch that every [`delete`](CacheClient::delete)
/// advances, so a read-through fill that raced with an invalidation can be
/// detected and discarded.
#[derive(Clone)]
pub struct CacheClient {
    backend: Arc<dyn CacheBackend>,
    default_ttl: u64,
    invalidations: Arc<AtomicU64>,
}

impl CacheClient {
    pub fn new(backend: Arc<dyn CacheBackend>, default_ttl: u64) -> Self {
        Self {
            backend,
            default_ttl: default_ttl.max(MIN_CACHE_TTL_SECONDS),
            invalidations: Arc::new(AtomicU64::new(0)),
        }
    }

    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether both handles point at the same backend instance.
    pub fn same_instance(&self, other: &CacheClient) -> bool {
        std::ptr::eq(
            Arc::as_ptr(&self.backend) as *const (),
            Arc::as_ptr(&other.backend) as *const (),
        )
    }

    /// Get a value from cache.
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> AppResult<Option<T>> {
        match self.backend.get_raw(key).await? {
            Some(json) => {
                let parsed = serde_json::from_str(&json).map_err(|e| {
                    AppError::internal(format!("Cache deserialization error: {}", e))
                })?;
                Ok(Some(parsed))
            }
            None => Ok(None),
        }
    }

    /// Set a value in cache with default TTL.
    pub async fn set<T: Serialize>(&self, key: &str, value: &T) -> AppResult<()> {
        self.set_with_ttl(key, value, self.default_ttl).await
    }

    /// Set a value in cache with custom TTL (in seconds).
    ///
    /// TTLs below one second are raised to one second on every backend.
    pub async fn set_with_ttl<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        ttl_seconds: u64,
    ) -> AppResult<()> {
        let json = serde_json::to_string(value)
            .map_err(|e| AppError::internal(format!("Cache serialization error: {}", e)))?;
        self.backend
            .set_raw(key, json, ttl_seconds.max(MIN_CACHE_TTL_SECONDS))
            .await
    }

    /// Current invalidation epoch; take it before reading the source of a fill.
    pub fn invalidation_epoch(&self) -> u64 {
        self.invalidations.load(Ordering::SeqCst)
    }

    /// Store a read-through value unless an invalidation happened since `epoch`.
    ///
    /// Returns whether the value was kept. The epoch is checked again after
    /// the write, and the entry is removed if an invalidation slipped in.
    pub async fn set_if_current<T: Serialize>(
        &self,
        key: &str,
        value: &T,
        epoch: u64,
    ) -> AppResult<bool> {
        if self.invalidation_epoch() != epoch {
            return Ok(false);
        }
        self.set(key, value).await?;
        if self.invalidation_epoch() != epoch {
            self.backend.delete(key).await?;
            return Ok(false);
        }
        Ok(true)
    }

    /// Delete a value from cache and advance the invalidation epoch.
    pub async fn delete(&self, key: &str) -> AppResult<()> {
        self.invalidations.fetch_add(1, Ordering::SeqCst);
        self.backend.delete(key).await
    }

    /// Check if a key exists in cache.
    pub async fn exists(&self, key: &str) -> AppResult<bool> {
        self.backend.exists(key).await
    }

    pub async fn ping(&self) -> AppResult<()> {
        self.backend.ping().await
    }
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("backend", &self.backend.name())
            .field("default_ttl", &self.default_ttl)
            .field("invalidation_epoch", &self.invalidation_epoch())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, PartialEq, Serialize, Deserialize)]
    struct Point {
        x: i32,
        y: i32,
    }

    fn memory_client() -> CacheClient {
        CacheClient::new(Arc::new(MemoryCache::new(100)), 60)
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("redis".parse::<CacheBackendKind>().unwrap(), CacheBackendKind::Redis);
        assert_eq!("MEMORY".parse::<CacheBackendKind>().unwrap(), CacheBackendKind::Memory);
        assert!(matches!(
            "memcached".parse::<CacheBackendKind>(),
            Err(AppError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_typed_get_set() {
        let client = memory_client();
        client.set("p", &Point { x: 1, y: 2 }).await.unwrap();

        let point: Option<Point> = client.get("p").await.unwrap();
        assert_eq!(point, Some(Point { x: 1, y: 2 }));
        assert!(client.exists("p").await.unwrap());

        client.delete("p").await.unwrap();
        let point: Option<Point> = client.get("p").await.unwrap();
        assert!(point.is_none());
    }

    #[tokio::test]
    async fn test_bad_payload_is_internal_error() {
        let client = memory_client();
        client.set("p", &"not a point").await.unwrap();

        let result: AppResult<Option<Point>> = client.get("p").await;
        assert!(matches!(result, Err(AppError::Internal(_))));
    }

    #[tokio::test]
    async fn test_zero_ttl_is_raised_to_minimum() {
        let client = CacheClient::new(Arc::new(MemoryCache::new(100)), 0);
        client.set("k", &1u8).await.unwrap();
        client.set_with_ttl("j", &2u8, 0).await.unwrap();

        assert_eq!(client.get::<u8>("k").await.unwrap(), Some(1));
        assert_eq!(client.get::<u8>("j").await.unwrap(), Some(2));
    }

    #[tokio::test]
    async fn test_fill_skipped_after_invalidation() {
        let client = memory_client();
        let epoch = client.invalidation_epoch();

        client.delete("list").await.unwrap();
        let kept = client.set_if_current("list", &vec![1, 2], epoch).await.unwrap();

        assert!(!kept);
        assert!(!client.exists("list").await.unwrap());
    }

    #[tokio::test]
    async fn test_fill_kept_without_invalidation() {
        let client = memory_client();
        let epoch = client.invalidation_epoch();

        let kept = client.set_if_current("list", &vec![1, 2], epoch).await.unwrap();

        assert!(kept);
        assert_eq!(client.get::<Vec<i32>>("list").await.unwrap(), Some(vec![1, 2]));
    }

    #[test]
    fn test_same_instance() {
        let a = memory_client();
        let b = a.clone();
        let c = memory_client();
        assert!(a.same_instance(&b));
        assert!(!a.same_instance(&c));
    }
}
