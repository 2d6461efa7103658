//! Error types and error handling
//!
//! The authentication-flow taxonomy deliberately merges sub-conditions:
//! a state token that was never issued, already consumed, or expired all
//! surface as [`AuthFlowError::InvalidState`], and likewise for session
//! handles. Error specificity would otherwise give an external caller an
//! oracle for probing token validity and expiry boundaries. Detailed
//! diagnostics stay server-side in the logs.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::store::StoreError;

/// Authentication-flow error type.
#[derive(Debug, Error)]
pub enum AuthFlowError {
    /// CSRF state token malformed, unknown, already consumed, or expired.
    ///
    /// The sub-conditions are intentionally indistinguishable.
    #[error("invalid state token")]
    InvalidState,

    /// Session exchange handle malformed, unknown, already redeemed, or
    /// expired. The sub-conditions are intentionally indistinguishable.
    #[error("invalid session handle")]
    InvalidSession,

    /// The coordination store could not be reached or timed out.
    ///
    /// Terminal for the in-flight request (fail closed), but logged
    /// distinctly from the two invalid-token kinds so operators can tell
    /// replay noise from an infrastructure outage.
    #[error("coordination store unavailable")]
    StoreUnavailable(#[from] StoreError),

    /// Token exchange with the external provider failed.
    #[error("provider token exchange failed: {0}")]
    ProviderExchange(String),

    /// A flow collaborator (principal resolution, session minting) failed.
    #[error("authentication collaborator failed: {0}")]
    Collaborator(String),

    /// Internal fault (record serialization, invalid configuration).
    #[error("internal error: {0}")]
    Internal(String),
}

impl AuthFlowError {
    /// Log this failure with severity appropriate to its kind.
    ///
    /// Invalid tokens are expected noise (possible replay attempts) and log
    /// at `warn`; store outages and internal faults are operational problems
    /// and log at `error`. The externally visible outcome is identical for
    /// all of them.
    pub fn log(&self) {
        match self {
            Self::InvalidState => tracing::warn!("state token rejected"),
            Self::InvalidSession => tracing::warn!("session handle rejected"),
            Self::StoreUnavailable(source) => {
                tracing::error!(%source, "coordination store unavailable");
            }
            Self::ProviderExchange(detail) => {
                tracing::error!(%detail, "provider token exchange failed");
            }
            Self::Collaborator(detail) => {
                tracing::error!(%detail, "authentication collaborator failed");
            }
            Self::Internal(detail) => tracing::error!(%detail, "internal auth-flow error"),
        }
    }
}

impl IntoResponse for AuthFlowError {
    /// Every variant maps to the same generic authentication failure; the
    /// response body never reveals which merged sub-condition occurred.
    fn into_response(self) -> Response {
        self.log();
        (
            StatusCode::UNAUTHORIZED,
            Json(serde_json::json!({ "error": "authentication_failed" })),
        )
            .into_response()
    }
}
