//! In-process cache backend.

use std::time::{Duration, Instant};

use async_trait::async_trait;
use moka::sync::Cache;
use moka::Expiry;

use super::CacheBackend;
use crate::errors::AppResult;

#[derive(Clone)]
struct Entry {
    value: String,
    ttl: Duration,
}

/// Expires each entry after the TTL it was written with.
struct EntryExpiry;

impl Expiry<String, Entry> for EntryExpiry {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        Some(entry.ttl)
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        Some(entry.ttl)
    }
}

/// Bounded in-memory cache, useful for single-node deployments and tests.
#[derive(Clone)]
pub struct MemoryCache {
    store: Cache<String, Entry>,
}

impl MemoryCache {
    /// Entries expire after the TTL they are written with.
    pub fn new(max_capacity: u64) -> Self {
        let store = Cache::builder()
            .max_capacity(max_capacity.max(1))
            .expire_after(EntryExpiry)
            .build();

        Self { store }
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        Ok(self.store.get(key).map(|entry| entry.value))
    }

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let entry = Entry {
            value,
            ttl: Duration::from_secs(ttl_seconds),
        };
        self.store.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        self.store.invalidate(key);
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        Ok(self.store.contains_key(key))
    }

    async fn ping(&self) -> AppResult<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_set_get_delete() {
        let cache = MemoryCache::new(10);
        cache.set_raw("k", "v".to_string(), 60).await.unwrap();
        assert_eq!(cache.get_raw("k").await.unwrap().as_deref(), Some("v"));
        assert!(cache.exists("k").await.unwrap());

        cache.delete("k").await.unwrap();
        assert!(cache.get_raw("k").await.unwrap().is_none());
        assert!(!cache.exists("k").await.unwrap());
    }

    #[tokio::test]
    async fn test_overwrite_replaces_value() {
        let cache = MemoryCache::new(10);
        cache.set_raw("k", "old".to_string(), 60).await.unwrap();
        cache.set_raw("k", "new".to_string(), 60).await.unwrap();
        assert_eq!(cache.get_raw("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_entry_expires_after_its_ttl() {
        let cache = MemoryCache::new(10);
        cache.set_raw("short", "v".to_string(), 1).await.unwrap();
        cache.set_raw("long", "v".to_string(), 60).await.unwrap();

        tokio::time::sleep(Duration::from_millis(1100)).await;

        assert!(cache.get_raw("short").await.unwrap().is_none());
        assert!(cache.get_raw("long").await.unwrap().is_some());
    }
}
