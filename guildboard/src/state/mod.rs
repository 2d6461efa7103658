//! Application state
//!
//! The `Clone`-able state shared across axum handlers: configuration plus
//! the flow coordinator, both behind `Arc`s. The managers themselves are
//! stateless; everything mutable lives in the ephemeral store.

use std::sync::Arc;

use crate::config::GuildboardConfig;
use crate::oauth::OAuthFlowCoordinator;

/// Shared application state for guildboard handlers.
#[derive(Clone)]
pub struct AppState {
    config: Arc<GuildboardConfig>,
    coordinator: Arc<OAuthFlowCoordinator>,
}

impl AppState {
    /// Assemble state from configuration and a composed coordinator.
    #[must_use]
    pub fn new(config: Arc<GuildboardConfig>, coordinator: Arc<OAuthFlowCoordinator>) -> Self {
        Self {
            config,
            coordinator,
        }
    }

    /// Configuration reference.
    #[must_use]
    pub fn config(&self) -> &GuildboardConfig {
        &self.config
    }

    /// Flow coordinator reference.
    #[must_use]
    pub fn coordinator(&self) -> &OAuthFlowCoordinator {
        &self.coordinator
    }
}
