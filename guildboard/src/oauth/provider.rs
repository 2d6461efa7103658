//! Third-party platform OAuth provider client
//!
//! Thin collaborator around the provider's three endpoints: the
//! authorization URL the browser is redirected to, the token endpoint that
//! exchanges an authorization code for provider tokens (one form-encoded
//! POST), and the identity endpoint that resolves the authenticated account.
//! Nothing here inspects or retains the tokens beyond the in-flight request.

use async_trait::async_trait;
use serde::Deserialize;
use url::Url;

use crate::config::ProviderSettings;
use crate::error::AuthFlowError;

/// Tokens returned by the provider's code exchange.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderTokens {
    /// Provider access token.
    pub access_token: String,
    /// Provider refresh token.
    #[serde(default)]
    pub refresh_token: String,
}

/// Account identity as reported by the provider.
#[derive(Debug, Clone, Deserialize)]
pub struct ProviderIdentity {
    /// Provider-side account identifier.
    pub id: String,
    /// Display name, if the provider reports one.
    #[serde(default)]
    pub username: Option<String>,
}

/// Provider-facing operations needed by the flow coordinator.
#[async_trait]
pub trait ProviderClient: Send + Sync {
    /// Build the authorization URL embedding `state` verbatim.
    fn authorization_url(&self, state: &str) -> String;

    /// Exchange an authorization code for provider tokens.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::ProviderExchange`] on any transport or
    /// protocol failure.
    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, AuthFlowError>;

    /// Fetch the authenticated account's identity.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::ProviderExchange`] on any transport or
    /// protocol failure.
    async fn fetch_identity(
        &self,
        access_token: &str,
    ) -> Result<ProviderIdentity, AuthFlowError>;
}

/// [`ProviderClient`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpProviderClient {
    http: reqwest::Client,
    settings: ProviderSettings,
    authorize_url: Url,
}

impl HttpProviderClient {
    /// Create a client from provider settings.
    ///
    /// # Errors
    ///
    /// Returns [`AuthFlowError::Internal`] if the configured authorization
    /// URL is unparseable or the HTTP client cannot be constructed.
    pub fn new(settings: ProviderSettings) -> Result<Self, AuthFlowError> {
        let authorize_url = Url::parse(&settings.authorize_url)
            .map_err(|e| AuthFlowError::Internal(format!("bad authorize_url: {e}")))?;
        let http = reqwest::Client::builder()
            .timeout(settings.http_timeout())
            .build()
            .map_err(|e| AuthFlowError::Internal(format!("http client: {e}")))?;
        Ok(Self {
            http,
            settings,
            authorize_url,
        })
    }
}

#[async_trait]
impl ProviderClient for HttpProviderClient {
    fn authorization_url(&self, state: &str) -> String {
        let mut url = self.authorize_url.clone();
        url.query_pairs_mut()
            .append_pair("response_type", "code")
            .append_pair("client_id", &self.settings.client_id)
            .append_pair("redirect_uri", &self.settings.redirect_uri)
            .append_pair("scope", &self.settings.scopes.join(" "))
            .append_pair("state", state);
        url.into()
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, AuthFlowError> {
        let response = self
            .http
            .post(&self.settings.token_url)
            .form(&[
                ("grant_type", "authorization_code"),
                ("code", code),
                ("redirect_uri", &self.settings.redirect_uri),
                ("client_id", &self.settings.client_id),
                ("client_secret", &self.settings.client_secret),
            ])
            .send()
            .await
            .map_err(|e| AuthFlowError::ProviderExchange(format!("token request: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthFlowError::ProviderExchange(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<ProviderTokens>()
            .await
            .map_err(|e| AuthFlowError::ProviderExchange(format!("token response: {e}")))
    }

    async fn fetch_identity(
        &self,
        access_token: &str,
    ) -> Result<ProviderIdentity, AuthFlowError> {
        let response = self
            .http
            .get(&self.settings.identity_url)
            .bearer_auth(access_token)
            .send()
            .await
            .map_err(|e| AuthFlowError::ProviderExchange(format!("identity request: {e}")))?;

        if !response.status().is_success() {
            return Err(AuthFlowError::ProviderExchange(format!(
                "identity endpoint returned {}",
                response.status()
            )));
        }

        response
            .json::<ProviderIdentity>()
            .await
            .map_err(|e| AuthFlowError::ProviderExchange(format!("identity response: {e}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings() -> ProviderSettings {
        ProviderSettings {
            client_id: "client-123".to_string(),
            scopes: vec!["identify".to_string(), "guilds".to_string()],
            ..ProviderSettings::default()
        }
    }

    #[test]
    fn authorization_url_embeds_state_verbatim() {
        let client = HttpProviderClient::new(settings()).unwrap();
        let url = client.authorization_url("STATE-TOKEN");

        let parsed = Url::parse(&url).unwrap();
        let pairs: Vec<(String, String)> = parsed
            .query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect();

        assert!(pairs.contains(&("state".to_string(), "STATE-TOKEN".to_string())));
        assert!(pairs.contains(&("client_id".to_string(), "client-123".to_string())));
        assert!(pairs.contains(&("response_type".to_string(), "code".to_string())));
        assert!(pairs.contains(&("scope".to_string(), "identify guilds".to_string())));
    }

    #[test]
    fn bad_authorize_url_is_rejected_at_construction() {
        let bad = ProviderSettings {
            authorize_url: "not a url".to_string(),
            ..ProviderSettings::default()
        };
        assert!(matches!(
            HttpProviderClient::new(bad),
            Err(AuthFlowError::Internal(_))
        ));
    }

    #[test]
    fn token_response_tolerates_missing_refresh_token() {
        let tokens: ProviderTokens =
            serde_json::from_str(r#"{"access_token":"at"}"#).unwrap();
        assert_eq!(tokens.access_token, "at");
        assert!(tokens.refresh_token.is_empty());
    }
}
