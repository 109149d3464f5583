//! Redis cache backend.

use async_trait::async_trait;
use redis::{aio::ConnectionManager, AsyncCommands, Client, RedisError};

use super::CacheBackend;
use crate::errors::{AppError, AppResult};

/// Redis backend with a multiplexed, auto-reconnecting connection.
#[derive(Clone)]
pub struct RedisCache {
    connection: ConnectionManager,
}

impl RedisCache {
    /// Connect to Redis, returning an error instead of panicking.
    pub async fn connect(redis_url: &str) -> AppResult<Self> {
        let client = Client::open(redis_url).map_err(cache_error)?;
        let connection = ConnectionManager::new(client).await.map_err(cache_error)?;

        tracing::info!("Redis cache connected");

        Ok(Self { connection })
    }
}

#[async_trait]
impl CacheBackend for RedisCache {
    fn name(&self) -> &'static str {
        "redis"
    }

    async fn get_raw(&self, key: &str) -> AppResult<Option<String>> {
        let mut conn = self.connection.clone();
        let value: Option<String> = conn.get(key).await.map_err(cache_error)?;
        Ok(value)
    }

    async fn set_raw(&self, key: &str, value: String, ttl_seconds: u64) -> AppResult<()> {
        let mut conn = self.connection.clone();
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds)
            .await
            .map_err(cache_error)?;
        Ok(())
    }

    async fn delete(&self, key: &str) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: () = conn.del(key).await.map_err(cache_error)?;
        Ok(())
    }

    async fn exists(&self, key: &str) -> AppResult<bool> {
        let mut conn = self.connection.clone();
        let exists: bool = conn.exists(key).await.map_err(cache_error)?;
        Ok(exists)
    }

    async fn ping(&self) -> AppResult<()> {
        let mut conn = self.connection.clone();
        let _: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(cache_error)?;
        Ok(())
    }
}

/// Convert Redis error to AppError.
fn cache_error(e: RedisError) -> AppError {
    tracing::error!("Redis error: {}", e);
    AppError::Cache(e.to_string())
}
