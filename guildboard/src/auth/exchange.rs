//! Session exchange manager
//!
//! After a successful OAuth callback the freshly minted local session tokens
//! are parked here under an opaque one-time handle; the browser is redirected
//! with only that handle in the URL and trades it for the tokens over a
//! back-channel request. A leaked or proxy-logged redirect URL therefore
//! cannot be replayed to obtain a second copy of the credentials: returning
//! the payload and deleting the record are one store operation.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::auth::token;
use crate::error::AuthFlowError;
use crate::store::EphemeralStore;

const KEY_PREFIX: &str = "oauth:exchange:";

/// Local session credentials parked for a single redemption.
///
/// The token fields are opaque blobs to this subsystem; they are application
/// session tokens, not the third-party provider's tokens.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionTokens {
    /// Local access token.
    pub access_token: String,
    /// Local refresh token.
    pub refresh_token: String,
    /// Identifier of the authenticated principal.
    pub subject_id: String,
}

/// Record stored per exchange handle.
#[derive(Debug, Serialize, Deserialize)]
struct ExchangeRecord {
    #[serde(flatten)]
    tokens: SessionTokens,
    issued_at: DateTime<Utc>,
}

/// Issues and single-use-redeems opaque session exchange handles.
///
/// Same coordination model as [`crate::auth::CsrfStateManager`]: no
/// in-process state, all mutual exclusion delegated to the store's atomic
/// claim.
#[derive(Clone)]
pub struct SessionExchangeManager {
    store: Arc<dyn EphemeralStore>,
    ttl: Duration,
    token_bytes: usize,
}

impl SessionExchangeManager {
    /// Create a manager over `store` with the given handle TTL and byte
    /// length (defaults per configuration: 300 s, 32 bytes).
    #[must_use]
    pub fn new(store: Arc<dyn EphemeralStore>, ttl: Duration, token_bytes: usize) -> Self {
        Self {
            store,
            ttl,
            token_bytes,
        }
    }

    fn key(session_id: &str) -> String {
        format!("{KEY_PREFIX}{session_id}")
    }

    /// Park `tokens` under a fresh opaque handle and return the handle.
    ///
    /// Called once, immediately after the OAuth callback authenticates a
    /// principal. The handle — never the raw tokens — is what reaches the
    /// browser.
    ///
    /// # Errors
    ///
    /// Fails only with [`AuthFlowError::StoreUnavailable`] (or
    /// [`AuthFlowError::Internal`] on a record serialization fault).
    pub async fn issue(&self, tokens: SessionTokens) -> Result<String, AuthFlowError> {
        let session_id = token::generate(self.token_bytes);
        let record = ExchangeRecord {
            tokens,
            issued_at: Utc::now(),
        };
        let payload = serde_json::to_string(&record)
            .map_err(|e| AuthFlowError::Internal(format!("exchange record serialization: {e}")))?;

        self.store
            .set_with_expiry(&Self::key(&session_id), &payload, self.ttl)
            .await?;

        tracing::debug!(
            ttl_secs = self.ttl.as_secs(),
            "issued session exchange handle"
        );
        Ok(session_id)
    }

    /// Redeem a handle for its parked credentials, at most once per handle.
    ///
    /// # Errors
    ///
    /// [`AuthFlowError::InvalidSession`] if the handle is malformed, was
    /// never issued, was already redeemed, or has expired — deliberately
    /// indistinguishable. [`AuthFlowError::StoreUnavailable`] if the store
    /// cannot be reached (fail closed, never treated as absent).
    pub async fn redeem(&self, session_id: &str) -> Result<SessionTokens, AuthFlowError> {
        if !token::is_well_formed(session_id, self.token_bytes) {
            tracing::warn!("malformed session handle rejected before store access");
            return Err(AuthFlowError::InvalidSession);
        }

        let payload = self
            .store
            .claim(&Self::key(session_id))
            .await?
            .ok_or(AuthFlowError::InvalidSession)?;

        let record: ExchangeRecord = serde_json::from_str(&payload).map_err(|e| {
            tracing::warn!(error = %e, "undecodable exchange record");
            AuthFlowError::InvalidSession
        })?;

        // Store TTL is authoritative; redundant-by-design clock-skew guard.
        if Self::is_stale(&record, self.ttl) {
            tracing::warn!("session exchange handle outlived its ttl");
            return Err(AuthFlowError::InvalidSession);
        }

        Ok(record.tokens)
    }

    /// Administratively revoke a parked handle before its TTL elapses.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::StoreUnavailable`] if the store cannot be
    /// reached.
    pub async fn revoke(&self, session_id: &str) -> Result<(), AuthFlowError> {
        self.store.delete(&Self::key(session_id)).await?;
        Ok(())
    }

    fn is_stale(record: &ExchangeRecord, ttl: Duration) -> bool {
        let age = Utc::now().signed_duration_since(record.issued_at);
        chrono::Duration::from_std(ttl).is_ok_and(|max_age| age > max_age)
    }
}
