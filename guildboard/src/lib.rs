//! guildboard: admin dashboard backend for chat-community servers
//!
//! The dashboard proper (UI, platform-proxying CRUD, statistics views) lives
//! elsewhere; this crate is the authentication spine that bridges the
//! platform's OAuth authorization-code flow to local session issuance with
//! precise single-use guarantees:
//!
//! - [`store`] — the shared ephemeral key-value capability whose atomic
//!   get-and-delete (`claim`) is the sole coordination primitive.
//! - [`auth`] — [`auth::CsrfStateManager`] (anti-forgery state tokens) and
//!   [`auth::SessionExchangeManager`] (one-time handles traded for local
//!   session tokens over a back channel).
//! - [`oauth`] — the provider client and the flow coordinator gluing the
//!   managers to the collaborator seams.
//! - [`handlers`] — the axum routes exposing the flow.
//!
//! # Security model
//!
//! Every token is 256 bits of CSPRNG randomness, time-bounded by a store
//! TTL, and consumable exactly once even under concurrent requests across
//! horizontally scaled instances — the store's atomic claim totally orders
//! all consumption attempts per token. Any store ambiguity (timeout,
//! unreachability) fails closed. Externally, every failure is the same
//! generic "authentication failed"; only server-side logs distinguish replay
//! noise from outages.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use guildboard::auth::{CsrfStateManager, SessionExchangeManager};
//! use guildboard::store::{EphemeralStore, RedisEphemeralStore};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let store: Arc<dyn EphemeralStore> = Arc::new(RedisEphemeralStore::connect(
//!     "redis://127.0.0.1:6379",
//!     std::time::Duration::from_secs(2),
//! )?);
//!
//! let states = CsrfStateManager::new(store.clone(), std::time::Duration::from_secs(600), 32);
//! let state = states.issue().await?;
//! states.consume(&state).await?; // succeeds exactly once
//! # Ok(())
//! # }
//! ```

// Lint configuration is handled at the workspace level in Cargo.toml
// Additional crate-specific allows:
#![allow(clippy::module_name_repetitions)] // StoreError, ProviderClient, etc.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod oauth;
pub mod observability;
pub mod state;
pub mod store;

pub mod prelude {
    //! Convenience re-exports for common types and traits

    pub use crate::auth::{CsrfStateManager, SessionExchangeManager, SessionTokens};
    pub use crate::config::GuildboardConfig;
    pub use crate::error::AuthFlowError;
    pub use crate::oauth::{
        HttpProviderClient, OAuthFlowCoordinator, OpaqueSessionMinter, PrincipalResolver,
        ProviderClient, ProviderIdentityResolver, SessionMinter,
    };
    pub use crate::state::AppState;
    pub use crate::store::{EphemeralStore, InMemoryEphemeralStore, RedisEphemeralStore, StoreError};
}
