//! End-to-end flow tests: coordinator ordering guarantees and the HTTP
//! surface.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use axum::http::StatusCode;
use axum_test::TestServer;
use mockall::predicate::eq;
use url::Url;

use guildboard::auth::{CsrfStateManager, SessionExchangeManager};
use guildboard::config::GuildboardConfig;
use guildboard::error::AuthFlowError;
use guildboard::handlers::{self, RedeemRequest, RedeemResponse};
use guildboard::oauth::{
    MintedSession, OAuthFlowCoordinator, Principal, PrincipalResolver, ProviderClient,
    ProviderIdentity, ProviderTokens, SessionMinter,
};
use guildboard::state::AppState;
use guildboard::store::{EphemeralStore, InMemoryEphemeralStore};

mockall::mock! {
    Provider {}

    #[async_trait]
    impl ProviderClient for Provider {
        fn authorization_url(&self, state: &str) -> String;
        async fn exchange_code(&self, code: &str) -> Result<ProviderTokens, AuthFlowError>;
        async fn fetch_identity(
            &self,
            access_token: &str,
        ) -> Result<ProviderIdentity, AuthFlowError>;
    }
}

/// Resolver adopting a fixed subject, standing in for the user-upsert
/// collaborator.
struct StaticResolver;

#[async_trait]
impl PrincipalResolver for StaticResolver {
    async fn resolve(&self, _tokens: &ProviderTokens) -> Result<Principal, AuthFlowError> {
        Ok(Principal {
            subject_id: "U1".to_string(),
            display_name: Some("admin".to_string()),
        })
    }
}

/// Minter issuing fixed tokens so assertions can match exact payloads.
struct StaticMinter;

#[async_trait]
impl SessionMinter for StaticMinter {
    async fn mint(&self, _principal: &Principal) -> Result<MintedSession, AuthFlowError> {
        Ok(MintedSession {
            access_token: "local-access".to_string(),
            refresh_token: "local-refresh".to_string(),
        })
    }
}

fn coordinator_with(provider: MockProvider) -> OAuthFlowCoordinator {
    let store: Arc<dyn EphemeralStore> = Arc::new(InMemoryEphemeralStore::new());
    OAuthFlowCoordinator::new(
        CsrfStateManager::new(store.clone(), Duration::from_secs(600), 32),
        SessionExchangeManager::new(store, Duration::from_secs(300), 32),
        Arc::new(provider),
        Arc::new(StaticResolver),
        Arc::new(StaticMinter),
        "http://localhost:5173/auth/complete",
    )
}

fn query_param(url: &str, name: &str) -> Option<String> {
    Url::parse(url).ok().and_then(|u| {
        u.query_pairs()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.into_owned())
    })
}

#[tokio::test]
async fn full_flow_parks_and_redeems_local_tokens() {
    let mut provider = MockProvider::new();
    provider
        .expect_authorization_url()
        .returning(|state| format!("https://platform.example/oauth2/authorize?state={state}"));
    provider
        .expect_exchange_code()
        .with(eq("auth-code"))
        .times(1)
        .returning(|_| {
            Ok(ProviderTokens {
                access_token: "provider-access".to_string(),
                refresh_token: "provider-refresh".to_string(),
            })
        });

    let coordinator = coordinator_with(provider);

    let authorize_url = coordinator.begin().await.unwrap();
    let state = query_param(&authorize_url, "state").unwrap();

    let redirect = coordinator.complete("auth-code", &state).await.unwrap();
    let session_id = query_param(&redirect, "session_id").unwrap();
    assert_ne!(session_id, state, "handle must be fresh randomness");

    let tokens = coordinator.redeem(&session_id).await.unwrap();
    assert_eq!(tokens.access_token, "local-access");
    assert_eq!(tokens.refresh_token, "local-refresh");
    assert_eq!(tokens.subject_id, "U1");

    // The redirect URL is now worthless to anyone who logged it.
    assert!(matches!(
        coordinator.redeem(&session_id).await,
        Err(AuthFlowError::InvalidSession)
    ));
}

#[tokio::test]
async fn invalid_state_aborts_before_the_code_exchange() {
    let mut provider = MockProvider::new();
    provider.expect_exchange_code().never();
    provider.expect_fetch_identity().never();

    let coordinator = coordinator_with(provider);

    let never_issued = guildboard::auth::token::generate(32);
    assert!(matches!(
        coordinator.complete("auth-code", &never_issued).await,
        Err(AuthFlowError::InvalidState)
    ));
}

#[tokio::test]
async fn replayed_state_aborts_the_second_flow() {
    let mut provider = MockProvider::new();
    provider
        .expect_authorization_url()
        .returning(|state| format!("https://platform.example/oauth2/authorize?state={state}"));
    // First completion consumes the state; the replay must not reach the
    // provider a second time.
    provider.expect_exchange_code().times(1).returning(|_| {
        Ok(ProviderTokens {
            access_token: "provider-access".to_string(),
            refresh_token: "provider-refresh".to_string(),
        })
    });

    let coordinator = coordinator_with(provider);

    let authorize_url = coordinator.begin().await.unwrap();
    let state = query_param(&authorize_url, "state").unwrap();

    coordinator.complete("auth-code", &state).await.unwrap();
    assert!(matches!(
        coordinator.complete("auth-code", &state).await,
        Err(AuthFlowError::InvalidState)
    ));
}

fn test_server(provider: MockProvider) -> TestServer {
    let config = Arc::new(GuildboardConfig::default());
    let state = AppState::new(config, Arc::new(coordinator_with(provider)));
    TestServer::new(handlers::router(state)).unwrap()
}

#[tokio::test]
async fn login_redirects_to_the_provider_with_a_state() {
    let mut provider = MockProvider::new();
    provider
        .expect_authorization_url()
        .returning(|state| format!("https://platform.example/oauth2/authorize?state={state}"));

    let server = test_server(provider);

    let response = server.get("/auth/login").await;
    response.assert_status(StatusCode::SEE_OTHER);

    let location = response.header("location");
    let location = location.to_str().unwrap();
    assert!(location.starts_with("https://platform.example/oauth2/authorize"));
    assert_eq!(query_param(location, "state").unwrap().len(), 43);
}

#[tokio::test]
async fn callback_then_back_channel_redeem_is_single_use() {
    let mut provider = MockProvider::new();
    provider
        .expect_authorization_url()
        .returning(|state| format!("https://platform.example/oauth2/authorize?state={state}"));
    provider.expect_exchange_code().times(1).returning(|_| {
        Ok(ProviderTokens {
            access_token: "provider-access".to_string(),
            refresh_token: "provider-refresh".to_string(),
        })
    });

    let server = test_server(provider);

    let login = server.get("/auth/login").await;
    login.assert_status(StatusCode::SEE_OTHER);
    let state = query_param(login.header("location").to_str().unwrap(), "state").unwrap();

    let callback = server
        .get("/auth/callback")
        .add_query_param("code", "auth-code")
        .add_query_param("state", &state)
        .await;
    callback.assert_status(StatusCode::SEE_OTHER);

    let location = callback.header("location");
    let location = location.to_str().unwrap();
    assert!(location.starts_with("http://localhost:5173/auth/complete"));
    let session_id = query_param(location, "session_id").unwrap();

    let redeemed = server
        .post("/auth/session")
        .json(&RedeemRequest {
            session_id: session_id.clone(),
        })
        .await;
    redeemed.assert_status_ok();
    let body: RedeemResponse = redeemed.json();
    assert_eq!(body.access_token, "local-access");
    assert_eq!(body.subject_id, "U1");

    // Second redemption of the same handle is a generic failure.
    let replay = server
        .post("/auth/session")
        .json(&RedeemRequest { session_id })
        .await;
    replay.assert_status_unauthorized();
}

#[tokio::test]
async fn callback_with_tampered_state_lands_on_the_error_page() {
    let mut provider = MockProvider::new();
    provider.expect_exchange_code().never();

    let server = test_server(provider);

    let callback = server
        .get("/auth/callback")
        .add_query_param("code", "auth-code")
        .add_query_param("state", &guildboard::auth::token::generate(32))
        .await;
    callback.assert_status(StatusCode::SEE_OTHER);

    let location = callback.header("location");
    assert_eq!(
        location.to_str().unwrap(),
        GuildboardConfig::default().service.frontend_error_url
    );
}

#[tokio::test]
async fn provider_error_short_circuits_the_callback() {
    let mut provider = MockProvider::new();
    provider.expect_exchange_code().never();

    let server = test_server(provider);

    let callback = server
        .get("/auth/callback")
        .add_query_param("error", "access_denied")
        .add_query_param("error_description", "user declined")
        .await;
    callback.assert_status(StatusCode::SEE_OTHER);

    let location = callback.header("location");
    assert_eq!(
        location.to_str().unwrap(),
        GuildboardConfig::default().service.frontend_error_url
    );
}
