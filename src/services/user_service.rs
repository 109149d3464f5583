//! User use cases - read-through caching over the user repository.
//!
//! Cache failures never fail a request: a read error counts as a miss and a
//! write or invalidation error is logged.
//!
//! A listing fill is dropped when `create` invalidated the listing while the
//! fill was reading the database. The guard is per process; with a shared
//! Redis, a fill racing a create on another node can stay stale for at most
//! one TTL.

use uuid::Uuid;

use crate::config::{CACHE_KEY_USERS_ALL, CACHE_PREFIX_USER};
use crate::domain::{CreateUser, User};
use crate::errors::{AppResult, OptionExt};
use crate::infra::{CacheClient, UserRepository};

/// Cache key for a single user.
pub fn user_cache_key(id: Uuid) -> String {
    format!("{}{}", CACHE_PREFIX_USER, id)
}

/// User use cases for one request.
pub struct UsersUseCase<R: UserRepository> {
    repo: R,
    cache: CacheClient,
}

impl<R: UserRepository> UsersUseCase<R> {
    pub fn new(repo: R, cache: CacheClient) -> Self {
        Self { repo, cache }
    }

    /// List all users (cached under `users:all`).
    pub async fn list(&mut self) -> AppResult<Vec<User>> {
        let epoch = self.cache.invalidation_epoch();
        if let Some(users) = self.cached::<Vec<User>>(CACHE_KEY_USERS_ALL).await {
            return Ok(users);
        }

        let users = self.repo.list().await?;
        match self.cache.set_if_current(CACHE_KEY_USERS_ALL, &users, epoch).await {
            Ok(true) => {}
            Ok(false) => tracing::debug!(key = CACHE_KEY_USERS_ALL, "Listing invalidated during fill"),
            Err(e) => tracing::warn!(error = %e, key = CACHE_KEY_USERS_ALL, "Cache write failed"),
        }
        Ok(users)
    }

    /// Get one user (cached under `user:{id}`).
    pub async fn get(&mut self, id: Uuid) -> AppResult<User> {
        let key = user_cache_key(id);
        if let Some(user) = self.cached::<User>(&key).await {
            return Ok(user);
        }

        let user = self.repo.find_by_id(id).await?.ok_or_not_found()?;
        self.store(&key, &user).await;
        Ok(user)
    }

    /// Insert and commit a user, then drop the cached list.
    pub async fn create(&mut self, input: CreateUser) -> AppResult<User> {
        let user = self.repo.create(input.email, input.name).await?;
        self.repo.commit().await?;

        tracing::info!(user_id = %user.id, "User created");

        if let Err(e) = self.cache.delete(CACHE_KEY_USERS_ALL).await {
            tracing::warn!(error = %e, key = CACHE_KEY_USERS_ALL, "Cache invalidation failed");
        }
        Ok(user)
    }

    async fn cached<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.cache.get::<T>(key).await {
            Ok(hit) => {
                tracing::debug!(key, hit = hit.is_some(), "Cache lookup");
                hit
            }
            Err(e) => {
                tracing::warn!(error = %e, key, "Cache read failed");
                None
            }
        }
    }

    async fn store<T: serde::Serialize>(&self, key: &str, value: &T) {
        if let Err(e) = self.cache.set(key, value).await {
            tracing::warn!(error = %e, key, "Cache write failed");
        }
    }
}
