//! User repository over a request-scoped session.

use async_trait::async_trait;
use sea_orm::{EntityTrait, QueryOrder};
use uuid::Uuid;

use super::entities::user::{self, ActiveModel, Entity as UserEntity};
use crate::domain::User;
use crate::errors::{AppError, AppResult};
use crate::infra::db::Session;

/// User persistence operations.
///
/// Writes stay inside the session's transaction until [`commit`](UserRepository::commit).
#[cfg_attr(any(test, feature = "test-utils"), mockall::automock)]
#[async_trait]
pub trait UserRepository: Send {
    /// All users, oldest first
    async fn list(&mut self) -> AppResult<Vec<User>>;

    async fn find_by_id(&mut self, id: Uuid) -> AppResult<Option<User>>;

    /// Insert a user; the id and creation time are assigned on insert.
    async fn create(&mut self, email: String, name: String) -> AppResult<User>;

    async fn commit(&mut self) -> AppResult<()>;
}

/// [`UserRepository`] backed by a [`Session`].
#[derive(Debug)]
pub struct UserStore {
    session: Session,
}

impl UserStore {
    pub fn new(session: Session) -> Self {
        Self { session }
    }

    /// Roll back anything uncommitted and release the session.
    pub async fn close(self) {
        self.session.close().await;
    }
}

#[async_trait]
impl UserRepository for UserStore {
    async fn list(&mut self) -> AppResult<Vec<User>> {
        let txn = self.session.connection().await?;
        let models = UserEntity::find()
            .order_by_asc(user::Column::CreatedAt)
            .all(txn)
            .await?;

        Ok(models.into_iter().map(User::from).collect())
    }

    async fn find_by_id(&mut self, id: Uuid) -> AppResult<Option<User>> {
        let model = self.session.get::<UserEntity>(id).await?;
        Ok(model.map(User::from))
    }

    async fn create(&mut self, email: String, name: String) -> AppResult<User> {
        let model = self
            .session
            .insert(ActiveModel::from_parts(email, name))
            .await
            .map_err(AppError::from)
            .map_err(|e| {
                if e.is_unique_violation() {
                    AppError::conflict("User")
                } else {
                    e
                }
            })?;

        Ok(User::from(model))
    }

    async fn commit(&mut self) -> AppResult<()> {
        self.session.commit().await?;
        Ok(())
    }
}
