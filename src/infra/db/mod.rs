//! Database engine and session factory.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use sea_orm::{ConnectionTrait, Database as SeaDatabase, DatabaseConnection, DbErr, Statement};
use sea_orm_migration::MigratorTrait;

use crate::config::DatabaseSettings;
use crate::errors::AppResult;

pub mod base;
pub mod migrations;
pub mod naming;
mod provider;
mod session;

pub use base::{EntityBase, IdPolicy};
pub use migrations::Migrator;
pub use provider::{DatabaseProvider, EngineOptions};
pub use session::{Session, SessionOptions};

/// Process-wide handle to the configured backend and its connection pool.
///
/// Cloning is cheap and shares the same pool.
#[derive(Clone)]
pub struct Engine {
    connection: Arc<DatabaseConnection>,
    provider: DatabaseProvider,
    live_sessions: Arc<AtomicUsize>,
}

impl Engine {
    /// Build the engine from `db.*` settings.
    ///
    /// The provider is validated before anything is opened: an unknown
    /// discriminator yields `AppError::Config` and no connection attempt.
    pub async fn connect(settings: &DatabaseSettings, debug: bool) -> AppResult<Self> {
        let options = EngineOptions::from_settings(settings, debug)?;
        Self::connect_with(options).await
    }

    /// Build the engine from already validated options.
    pub async fn connect_with(options: EngineOptions) -> AppResult<Self> {
        let connection = SeaDatabase::connect(options.connect_options()).await?;

        tracing::info!(
            provider = %options.provider,
            search_path = ?options.search_path,
            echo = options.echo,
            "Database engine created"
        );

        Ok(Self {
            connection: Arc::new(connection),
            provider: options.provider,
            live_sessions: Arc::new(AtomicUsize::new(0)),
        })
    }

    pub fn provider(&self) -> DatabaseProvider {
        self.provider
    }

    /// Get a reference to the pooled connection.
    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }

    /// Acquire a session with default options (no autoflush).
    ///
    /// Never fails: the pooled connection is taken on first use.
    pub fn session(&self) -> Session {
        self.session_with(SessionOptions::default())
    }

    pub fn session_with(&self, options: SessionOptions) -> Session {
        Session::new(self.clone(), options)
    }

    /// Run `f` with a fresh session and close it afterwards, whatever `f` returns.
    ///
    /// Uncommitted work is rolled back on close, so `f` commits explicitly.
    pub async fn scope<F, T>(&self, f: F) -> AppResult<T>
    where
        F: for<'s> FnOnce(&'s mut Session) -> BoxFuture<'s, AppResult<T>>,
    {
        let mut session = self.session();
        let result = f(&mut session).await;
        session.close().await;
        result
    }

    /// Sessions currently held by callers.
    pub fn live_sessions(&self) -> usize {
        self.live_sessions.load(Ordering::SeqCst)
    }

    pub(crate) fn live_counter(&self) -> Arc<AtomicUsize> {
        self.live_sessions.clone()
    }

    /// Run pending migrations.
    pub async fn run_migrations(&self) -> Result<(), DbErr> {
        Migrator::up(self.connection(), None).await
    }

    /// Rollback the last migration.
    pub async fn rollback_migration(&self) -> Result<(), DbErr> {
        Migrator::down(self.connection(), Some(1)).await
    }

    /// Get migration status (list all migrations with applied status).
    pub async fn migration_status(&self) -> Result<Vec<(String, bool)>, DbErr> {
        use sea_orm::{EntityTrait, QueryOrder};
        use sea_orm_migration::seaql_migrations;

        let applied: std::collections::HashSet<String> = seaql_migrations::Entity::find()
            .order_by_asc(seaql_migrations::Column::Version)
            .all(self.connection())
            .await?
            .into_iter()
            .map(|m| m.version)
            .collect();

        let migrations: Vec<(String, bool)> = Migrator::migrations()
            .iter()
            .map(|m| {
                let name = m.name().to_string();
                let is_applied = applied.contains(&name);
                (name, is_applied)
            })
            .collect();

        Ok(migrations)
    }

    /// Reset database and run all migrations fresh.
    pub async fn fresh_migrations(&self) -> Result<(), DbErr> {
        Migrator::fresh(self.connection()).await
    }

    /// Check database connectivity by executing a simple query.
    pub async fn ping(&self) -> Result<(), DbErr> {
        self.connection
            .execute(Statement::from_string(
                self.connection.get_database_backend(),
                "SELECT 1".to_string(),
            ))
            .await?;
        Ok(())
    }
}

impl std::fmt::Debug for Engine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine")
            .field("provider", &self.provider)
            .field("live_sessions", &self.live_sessions())
            .finish()
    }
}
