//! Ephemeral key-value store capability
//!
//! Both single-use token managers ([`crate::auth`]) coordinate exclusively
//! through this trait. All mutable state lives in the shared store, which may
//! be accessed concurrently by many request tasks across many process
//! instances; correctness therefore rests on the store's atomic [`claim`]
//! primitive, never on an in-process lock.
//!
//! [`claim`]: EphemeralStore::claim

use std::time::Duration;

use async_trait::async_trait;
use thiserror::Error;

mod memory;
mod redis;

pub use memory::InMemoryEphemeralStore;
pub use redis::RedisEphemeralStore;

/// Errors surfaced by an [`EphemeralStore`] implementation.
///
/// Callers must treat any store error as fatal for the in-flight
/// authentication attempt (fail closed). In particular, a timed-out operation
/// is reported as [`StoreError::Unavailable`] and is never reinterpreted as
/// "key was absent".
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached, or an operation timed out.
    #[error("ephemeral store unavailable: {reason}")]
    Unavailable {
        /// Human-readable cause, logged server-side only.
        reason: String,
    },
}

impl StoreError {
    /// Build an [`StoreError::Unavailable`] from any displayable cause.
    #[must_use]
    pub fn unavailable(cause: impl std::fmt::Display) -> Self {
        Self::Unavailable {
            reason: cause.to_string(),
        }
    }
}

/// Shared, eventually-expiring key-value store.
///
/// Implementations must guarantee that [`claim`](Self::claim) is genuinely
/// atomic as provided by the store (e.g. Redis `GETDEL`), not emulated as a
/// client-side get-then-delete sequence — the latter admits a race window in
/// which two callers both read a still-present value before either deletes
/// it.
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    /// Store `value` under `key`, to be unconditionally purged once `ttl`
    /// elapses even if no caller ever reads it.
    ///
    /// Overwrites any existing value at `key`; callers must use
    /// collision-resistant keys.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached or
    /// the operation times out.
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError>;

    /// Non-destructive read.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached or
    /// the operation times out.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Atomic get-and-delete.
    ///
    /// If the key exists, returns its value and guarantees the key is gone
    /// from the perspective of every other concurrent or subsequent caller,
    /// anywhere in the distributed store, before this call returns. If the
    /// key is absent, returns `None` and performs no mutation.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached or
    /// the operation times out. A timeout is never reported as `None`.
    async fn claim(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Best-effort explicit removal.
    ///
    /// Used for administrative revocation, not for the consume path.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError::Unavailable`] if the store cannot be reached or
    /// the operation times out.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;
}
