//! CSRF state token manager
//!
//! Issues and single-use-validates the opaque anti-forgery tokens that
//! protect the redirect leg of the OAuth flow. A token is created by
//! [`CsrfStateManager::issue`], consumed at most once by
//! [`CsrfStateManager::consume`], and otherwise self-destructs when its store
//! TTL elapses. There is no update operation; a consumed or expired token
//! cannot be resurrected.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::token;
use crate::error::AuthFlowError;
use crate::store::EphemeralStore;

const KEY_PREFIX: &str = "oauth:state:";

/// Record stored per state token.
#[derive(Debug, Serialize, Deserialize)]
struct StateRecord {
    issued_at: DateTime<Utc>,
}

/// Issues and single-use-validates CSRF state tokens.
///
/// Holds no in-process mutable state; all coordination happens through the
/// injected [`EphemeralStore`], so the single-use invariant holds across
/// horizontally scaled process instances.
#[derive(Clone)]
pub struct CsrfStateManager {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
    token_bytes: usize,
}

impl CsrfStateManager {
    /// Create a manager over `store` with the given token TTL and byte
    /// length (defaults per configuration: 600 s, 32 bytes).
    #[must_use]
    pub fn new(store: Arc<dyn EphemeralStore>, ttl: Duration, token_bytes: usize) -> Self {
        Self {
            store,
            ttl,
            token_bytes,
        }
    }

    fn key(token: &str) -> String {
        format!("{KEY_PREFIX}{token}")
    }

    /// Generate, store, and return a fresh state token.
    ///
    /// # Errors
    ///
    /// Fails only with [`AuthFlowError::StoreUnavailable`] (or
    /// [`AuthFlowError::Internal`] on a record serialization fault).
    pub async fn issue(&self) -> Result<String, AuthFlowError> {
        let state = token::generate(self.token_bytes);
        let record = StateRecord {
            issued_at: Utc::now(),
        };
        let payload = serde_json::to_string(&record)
            .map_err(|e| AuthFlowError::Internal(format!("state record serialization: {e}")))?;

        self.store
            .set_with_expiry(&Self::key(&state), &payload, self.ttl)
            .await?;

        tracing::debug!(ttl_secs = self.ttl.as_secs(), "issued csrf state token");
        Ok(state)
    }

    /// Consume a state token, succeeding at most once per token even under
    /// concurrent calls across process instances.
    ///
    /// # Errors
    ///
    /// [`AuthFlowError::InvalidState`] if the token is malformed, was never
    /// issued, was already consumed, or has expired — deliberately
    /// indistinguishable. [`AuthFlowError::StoreUnavailable`] if the store
    /// cannot be reached; never silently downgraded to an invalid-token
    /// outcome.
    pub async fn consume(&self, state: &str) -> Result<(), AuthFlowError> {
        // Cheap rejection of malformed input, no store round-trip.
        if !token::is_well_formed(state, self.token_bytes) {
            tracing::warn!("malformed state token rejected before store access");
            return Err(AuthFlowError::InvalidState);
        }

        let payload = self
            .store
            .claim(&Self::key(state))
            .await?
            .ok_or(AuthFlowError::InvalidState)?;

        let record: StateRecord = serde_json::from_str(&payload).map_err(|e| {
            // A corrupt record fails closed like any other invalid token.
            tracing::warn!(error = %e, "undecodable state record");
            AuthFlowError::InvalidState
        })?;

        // The store TTL is authoritative; this age re-check is a
        // redundant-by-design guard against clock skew between store and
        // application hosts.
        if Self::is_stale(&record, self.ttl) {
            tracing::warn!("state token outlived its ttl");
            return Err(AuthFlowError::InvalidState);
        }

        Ok(())
    }

    /// Administratively revoke a token before its TTL elapses.
    ///
    /// Best effort; the consume path never relies on this.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::StoreUnavailable`] if the store cannot be
    /// reached.
    pub async fn revoke(&self, state: &str) -> Result<(), AuthFlowError> {
        self.store.delete(&Self::key(state)).await?;
        Ok(())
    }

    fn is_stale(record: &StateRecord, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(record.issued_at);
        chrono::Duration::from_std(ttl).is_ok_and(|max_age| age > max_age)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryEphemeralStore;

    fn manager() -> CsrfStateManager {
        CsrfStateManager::new(
            Arc::new(InMemoryEphemeralStore::new()),
            Duration::from_secs(600),
            32,
        )
    }

    #[tokio::test]
    async fn issue_then_consume_succeeds_once() {
        let manager = manager();
        let state = manager.issue().await.unwrap();

        manager.consume(&state).await.unwrap();
        assert!(matches!(
            manager.consume(&state).await,
            Err(AuthFlowError::InvalidState)
        ));
    }

    #[tokio::test]
    async fn unknown_well_formed_token_is_invalid() {
        let manager = manager();
        let never_issued = token::generate(32);
        assert!(matches!(
            manager.consume(&never_issued).await,
            Err(AuthFlowError::InvalidState)
        ));
    }

    #[tokio::test]
    async fn malformed_token_is_invalid() {
        let manager = manager();
        assert!(matches!(
            manager.consume("definitely not base64url").await,
            Err(AuthFlowError::InvalidState)
        ));
    }

    #[tokio::test]
    async fn revoked_token_cannot_be_consumed() {
        let manager = manager();
        let state = manager.issue().await.unwrap();
        manager.revoke(&state).await.unwrap();
        assert!(matches!(
            manager.consume(&state).await,
            Err(AuthFlowError::InvalidState)
        ));
    }

    #[test]
    fn stale_record_detection() {
        let record = StateRecord {
            issued_at: Utc::now() - chrono::Duration::seconds(601),
        };
        assert!(CsrfStateManager::is_stale(&record, Duration::from_secs(600)));

        let fresh = StateRecord {
            issued_at: Utc::now(),
        };
        assert!(!CsrfStateManager::is_stale(&fresh, Duration::from_secs(600)));
    }
}
