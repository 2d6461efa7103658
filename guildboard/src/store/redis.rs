//! Redis-backed ephemeral store
//!
//! Uses a deadpool-redis pool. The claim primitive is Redis `GETDEL`, a
//! single server-side command, so single-use semantics hold across every
//! process instance sharing the same Redis deployment.

use std::time::Duration;

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands;
use deadpool_redis::{Config as RedisConfig, Connection, Pool, Runtime};

use super::{EphemeralStore, StoreError};

/// [`EphemeralStore`] implementation backed by a shared Redis deployment.
///
/// Every operation is bounded by the configured per-operation timeout; a
/// timed-out call surfaces as [`StoreError::Unavailable`].
#[derive(Clone)]
pub struct RedisEphemeralStore {
    pool: Pool,
    op_timeout: Duration,
}

impl RedisEphemeralStore {
    /// Create a store from an existing connection pool.
    #[must_use]
    pub const fn new(pool: Pool, op_timeout: Duration) -> Self {
        Self { pool, op_timeout }
    }

    /// Create a store from a Redis URL (e.g. `redis://127.0.0.1:6379`).
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the pool cannot be constructed
    /// from the URL.
    pub fn connect(url: &str, op_timeout: Duration) -> Result<Self, StoreError> {
        let pool = RedisConfig::from_url(url)
            .create_pool(Some(Runtime::Tokio1))
            .map_err(StoreError::unavailable)?;
        Ok(Self::new(pool, op_timeout))
    }

    async fn conn(&self) -> Result<Connection, StoreError> {
        self.pool.get().await.map_err(StoreError::unavailable)
    }

    /// Bound `fut` by the per-operation timeout, mapping both the timeout and
    /// the underlying Redis error to [`StoreError::Unavailable`].
    async fn bounded<T>(
        &self,
        op: &'static str,
        fut: impl std::future::Future<Output = deadpool_redis::redis::RedisResult<T>> + Send,
    ) -> Result<T, StoreError> {
        match tokio::time::timeout(self.op_timeout, fut).await {
            Ok(result) => result.map_err(StoreError::unavailable),
            Err(_) => Err(StoreError::Unavailable {
                reason: format!("{op} timed out after {:?}", self.op_timeout),
            }),
        }
    }
}

#[async_trait]
impl EphemeralStore for RedisEphemeralStore {
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        // SET key value EX seconds. Sub-second TTLs round up to 1s.
        let secs = ttl.as_secs().max(1);
        self.bounded("SET EX", conn.set_ex::<_, _, ()>(key, value, secs))
            .await
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        self.bounded("GET", conn.get::<_, Option<String>>(key))
            .await
    }

    async fn claim(&self, key: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        // GETDEL is the single correctness-critical primitive: read and
        // delete happen server-side as one command.
        self.bounded("GETDEL", conn.get_del::<_, Option<String>>(key))
            .await
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        self.bounded("DEL", conn.del::<_, ()>(key)).await
    }
}
