//! In-process ephemeral store
//!
//! A single-instance implementation of the same atomic-claim contract as the
//! Redis store, used by the test suite and for single-process development
//! runs. Claim atomicity comes from performing the read-and-remove under one
//! mutex acquisition.
//!
//! Deadlines are tracked with [`tokio::time::Instant`] so tests can drive
//! expiry with a paused clock.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::time::Instant;

use super::{EphemeralStore, StoreError};

#[derive(Debug, Clone)]
struct Entry {
    value: String,
    expires_at: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant) -> bool {
        now >= self.expires_at
    }
}

/// [`EphemeralStore`] implementation backed by an in-process map.
///
/// Suitable for tests and single-instance deployments only; it provides no
/// cross-process coordination.
#[derive(Debug, Default)]
pub struct InMemoryEphemeralStore {
    entries: Mutex<HashMap<String, Entry>>,
}

impl InMemoryEphemeralStore {
    /// Create an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of live (unexpired) entries. Test helper.
    #[must_use]
    pub fn len(&self) -> usize {
        let now = Instant::now();
        self.entries
            .lock()
            .values()
            .filter(|e| !e.is_expired(now))
            .count()
    }

    /// Whether the store holds no live entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl EphemeralStore for InMemoryEphemeralStore {
    async fn set_with_expiry(
        &self,
        key: &str,
        value: &str,
        ttl: Duration,
    ) -> Result<(), StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        // Opportunistic sweep keeps long-running processes bounded.
        entries.retain(|_, e| !e.is_expired(now));
        entries.insert(
            key.to_owned(),
            Entry {
                value: value.to_owned(),
                expires_at: now + ttl,
            },
        );
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let entries = self.entries.lock();
        Ok(entries
            .get(key)
            .filter(|e| !e.is_expired(now))
            .map(|e| e.value.clone()))
    }

    async fn claim(&self, key: &str) -> Result<Option<String>, StoreError> {
        let now = Instant::now();
        let mut entries = self.entries.lock();
        // Remove-then-inspect under one lock acquisition: no interleaving in
        // which two callers both observe the value.
        match entries.remove(key) {
            Some(entry) if !entry.is_expired(now) => Ok(Some(entry.value)),
            _ => Ok(None),
        }
    }

    async fn delete(&self, key: &str) -> Result<(), StoreError> {
        self.entries.lock().remove(key);
        Ok(())
    }
}
