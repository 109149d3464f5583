//! Request-scoped unit of work.
//!
//! A `Session` never autocommits: every statement runs inside a transaction
//! that is begun lazily on first use and only made durable by [`Session::commit`].
//! Writes queued with [`Session::add`] are not sent to the backend until the
//! session is flushed (explicitly or by `commit`). Models returned by the
//! session are plain values, so they stay readable after a commit.
//!
//! Release is tied to `Drop`: whatever path the owner takes out of its scope,
//! the open transaction is rolled back and the session is released exactly once.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, IsolationLevel, PrimaryKeyTrait, TransactionTrait,
};
use uuid::Uuid;

use super::Engine;

/// Per-session behaviour.
#[derive(Debug, Clone, Copy, Default)]
pub struct SessionOptions {
    /// Flush queued writes before every read through the session
    pub autoflush: bool,
    /// Isolation level for transactions begun by the session
    pub isolation_level: Option<IsolationLevel>,
}

/// A queued write, applied on flush.
trait PendingWrite: Send + Sync {
    fn apply<'t>(self: Box<Self>, txn: &'t DatabaseTransaction) -> BoxFuture<'t, Result<(), DbErr>>;
}

struct PendingInsert<A>(A);

impl<A> PendingWrite for PendingInsert<A>
where
    A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
    <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
{
    fn apply<'t>(self: Box<Self>, txn: &'t DatabaseTransaction) -> BoxFuture<'t, Result<(), DbErr>> {
        Box::pin(async move { self.0.insert(txn).await.map(|_| ()) })
    }
}

/// Accounts for one live session on its engine.
struct SessionLease {
    id: Uuid,
    live: Arc<AtomicUsize>,
}

impl SessionLease {
    fn new(live: Arc<AtomicUsize>) -> Self {
        live.fetch_add(1, Ordering::SeqCst);
        let id = Uuid::new_v4();
        tracing::trace!(session = %id, "Session acquired");
        Self { id, live }
    }
}

impl Drop for SessionLease {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
        tracing::debug!(session = %self.id, "Session released");
    }
}

/// Unit of work bound to a single request.
pub struct Session {
    engine: Engine,
    options: SessionOptions,
    txn: Option<DatabaseTransaction>,
    pending: Vec<Box<dyn PendingWrite>>,
    // Declared last: released after the transaction has been dropped.
    lease: SessionLease,
}

impl Session {
    pub(super) fn new(engine: Engine, options: SessionOptions) -> Self {
        let lease = SessionLease::new(engine.live_counter());
        Self {
            engine,
            options,
            txn: None,
            pending: Vec::new(),
            lease,
        }
    }

    /// Identifier used in log lines.
    pub fn id(&self) -> Uuid {
        self.lease.id
    }

    pub fn options(&self) -> SessionOptions {
        self.options
    }

    /// Number of queued writes not yet flushed.
    pub fn pending_writes(&self) -> usize {
        self.pending.len()
    }

    /// Whether a transaction is currently open.
    pub fn in_transaction(&self) -> bool {
        self.txn.is_some()
    }

    /// Queue an insert. Nothing reaches the backend until the next flush.
    pub fn add<A>(&mut self, model: A)
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        self.pending.push(Box::new(PendingInsert(model)));
    }

    /// Flush queued writes, then insert `model` immediately and return the stored row.
    pub async fn insert<A>(&mut self, model: A) -> Result<<A::Entity as EntityTrait>::Model, DbErr>
    where
        A: ActiveModelTrait + ActiveModelBehavior + Send + Sync + 'static,
        <A::Entity as EntityTrait>::Model: IntoActiveModel<A>,
    {
        self.flush().await?;
        let txn = self.begin().await?;
        model.insert(txn).await
    }

    /// Look up a row by primary key.
    pub async fn get<E>(
        &mut self,
        id: <E::PrimaryKey as PrimaryKeyTrait>::ValueType,
    ) -> Result<Option<E::Model>, DbErr>
    where
        E: EntityTrait,
    {
        let txn = self.connection().await?;
        E::find_by_id(id).one(txn).await
    }

    /// The session's open transaction, begun on demand.
    pub async fn connection(&mut self) -> Result<&DatabaseTransaction, DbErr> {
        if self.options.autoflush {
            self.flush().await?;
        }
        self.begin().await
    }

    /// Send queued writes inside the current transaction.
    ///
    /// If a write fails the remaining queued writes are discarded and the
    /// error is returned; the transaction should then be rolled back.
    pub async fn flush(&mut self) -> Result<(), DbErr> {
        if self.pending.is_empty() {
            return Ok(());
        }

        let pending = std::mem::take(&mut self.pending);
        let count = pending.len();
        let txn = self.begin().await?;
        for write in pending {
            write.apply(txn).await?;
        }

        tracing::trace!(writes = count, "Session flushed");
        Ok(())
    }

    /// Flush and commit. The session stays usable; the next operation opens
    /// a new transaction.
    pub async fn commit(&mut self) -> Result<(), DbErr> {
        self.flush().await?;
        if let Some(txn) = self.txn.take() {
            txn.commit().await?;
            tracing::debug!(session = %self.lease.id, "Session committed");
        }
        Ok(())
    }

    /// Discard queued writes and roll back the open transaction.
    pub async fn rollback(&mut self) -> Result<(), DbErr> {
        self.pending.clear();
        if let Some(txn) = self.txn.take() {
            txn.rollback().await?;
        }
        Ok(())
    }

    /// Roll back anything uncommitted and release the session.
    pub async fn close(mut self) {
        if let Err(e) = self.rollback().await {
            tracing::warn!(session = %self.lease.id, error = %e, "Rollback on close failed");
        }
    }

    async fn begin(&mut self) -> Result<&DatabaseTransaction, DbErr> {
        let txn = match self.txn.take() {
            Some(txn) => txn,
            None => {
                self.engine
                    .connection()
                    .begin_with_config(self.options.isolation_level, None)
                    .await?
            }
        };
        Ok(&*self.txn.insert(txn))
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.lease.id)
            .field("options", &self.options)
            .field("in_transaction", &self.txn.is_some())
            .field("pending_writes", &self.pending.len())
            .finish()
    }
}
