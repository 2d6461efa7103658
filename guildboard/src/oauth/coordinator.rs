//! OAuth flow coordinator
//!
//! Thin glue composing the two single-use managers with the provider client
//! and the collaborator seams for principal resolution and local session
//! minting. The ordering contract is strict: the CSRF state is consumed
//! before any code exchange is attempted, and on any failure the flow aborts
//! with no partial progress.

use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::auth::{CsrfStateManager, SessionExchangeManager, SessionTokens};
use crate::error::AuthFlowError;
use crate::oauth::provider::{ProviderClient, ProviderTokens};

/// Locally resolved principal.
#[derive(Debug, Clone)]
pub struct Principal {
    /// Stable identifier of the authenticated principal.
    pub subject_id: String,
    /// Display name, if known.
    pub display_name: Option<String>,
}

/// Locally minted session credentials for a principal.
#[derive(Debug, Clone)]
pub struct MintedSession {
    /// Local access token.
    pub access_token: String,
    /// Local refresh token.
    pub refresh_token: String,
}

/// Resolves (and typically upserts) the local principal for a provider
/// login. Persistence of the user profile lives behind this seam.
#[async_trait]
pub trait PrincipalResolver: Send + Sync {
    /// Resolve the local principal for the given provider tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Collaborator`] (or a provider error) if
    /// resolution fails; the flow aborts.
    async fn resolve(&self, tokens: &ProviderTokens) -> Result<Principal, AuthFlowError>;
}

/// Mints local session credentials for a resolved principal.
#[async_trait]
pub trait SessionMinter: Send + Sync {
    /// Mint fresh local tokens for `principal`.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Collaborator`] if minting fails; the flow
    /// aborts.
    async fn mint(&self, principal: &Principal) -> Result<MintedSession, AuthFlowError>;
}

/// [`PrincipalResolver`] that adopts the provider identity as the local
/// principal, with no persistence.
pub struct ProviderIdentityResolver {
    provider: Arc<dyn ProviderClient>,
}

impl ProviderIdentityResolver {
    /// Create a resolver over the given provider client.
    #[must_use]
    pub fn new(provider: Arc<dyn ProviderClient>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl PrincipalResolver for ProviderIdentityResolver {
    async fn resolve(&self, tokens: &ProviderTokens) -> Result<Principal, AuthFlowError> {
        let identity = self.provider.fetch_identity(&tokens.access_token).await?;
        Ok(Principal {
            subject_id: identity.id,
            display_name: identity.username,
        })
    }
}

/// [`SessionMinter`] issuing unstructured random bearer tokens.
///
/// Stands in for a real token service in development and tests; the exchange
/// subsystem treats whatever it mints as an opaque blob either way.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpaqueSessionMinter;

#[async_trait]
impl SessionMinter for OpaqueSessionMinter {
    async fn mint(&self, _principal: &Principal) -> Result<MintedSession, AuthFlowError> {
        Ok(MintedSession {
            access_token: crate::auth::token::generate(32),
            refresh_token: crate::auth::token::generate(32),
        })
    }
}

/// Orchestrates the authorization-code flow end to end.
#[derive(Clone)]
pub struct OAuthFlowCoordinator {
    states: CsrfStateManager,
    exchanges: SessionExchangeManager,
    provider: Arc<dyn ProviderClient>,
    resolver: Arc<dyn PrincipalResolver>,
    minter: Arc<dyn SessionMinter>,
    frontend_complete_url: String,
}

impl OAuthFlowCoordinator {
    /// Compose a coordinator from its parts.
    #[must_use]
    pub fn new(
        states: CsrfStateManager,
        exchanges: SessionExchangeManager,
        provider: Arc<dyn ProviderClient>,
        resolver: Arc<dyn PrincipalResolver>,
        minter: Arc<dyn SessionMinter>,
        frontend_complete_url: impl Into<String>,
    ) -> Self {
        Self {
            states,
            exchanges,
            provider,
            resolver,
            minter,
            frontend_complete_url: frontend_complete_url.into(),
        }
    }

    /// Begin a login: issue a state token and return the provider
    /// authorization URL embedding it.
    ///
    /// # Errors
    ///
    /// Fails only if the state token cannot be written to the store.
    pub async fn begin(&self) -> Result<String, AuthFlowError> {
        let state = self.states.issue().await?;
        Ok(self.provider.authorization_url(&state))
    }

    /// Complete the flow on the provider callback; returns the frontend
    /// redirect URL carrying only the opaque session handle.
    ///
    /// # Errors
    ///
    /// [`AuthFlowError::InvalidState`] aborts the flow before the code
    /// exchange is attempted; any later collaborator failure aborts with no
    /// session issued.
    pub async fn complete(&self, code: &str, state: &str) -> Result<String, AuthFlowError> {
        // State must be consumed before anything is done with the code.
        self.states.consume(state).await?;

        let provider_tokens = self.provider.exchange_code(code).await?;
        let principal = self.resolver.resolve(&provider_tokens).await?;
        let minted = self.minter.mint(&principal).await?;

        let session_id = self
            .exchanges
            .issue(SessionTokens {
                access_token: minted.access_token,
                refresh_token: minted.refresh_token,
                subject_id: principal.subject_id.clone(),
            })
            .await?;

        tracing::info!(subject_id = %principal.subject_id, "login completed");
        self.complete_redirect(&session_id)
    }

    /// Redeem a session handle over the back channel.
    ///
    /// # Errors
    ///
    /// See [`SessionExchangeManager::redeem`].
    pub async fn redeem(&self, session_id: &str) -> Result<SessionTokens, AuthFlowError> {
        self.exchanges.redeem(session_id).await
    }

    fn complete_redirect(&self, session_id: &str) -> Result<String, AuthFlowError> {
        let mut url = Url::parse(&self.frontend_complete_url)
            .map_err(|e| AuthFlowError::Internal(format!("bad frontend_complete_url: {e}")))?;
        url.query_pairs_mut().append_pair("session_id", session_id);
        Ok(url.into())
    }
}
