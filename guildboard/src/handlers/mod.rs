//! HTTP handlers for the login flow
//!
//! Three routes:
//! - `GET /auth/login` — issue a state token and redirect to the provider.
//! - `GET /auth/callback` — provider redirect target; consumes the state,
//!   completes the flow, and redirects the browser to the frontend with only
//!   the opaque session handle.
//! - `POST /auth/session` — back-channel redemption of the handle for the
//!   local session tokens. The handle arrives in the request body, never as
//!   a durable query parameter logged by proxies.
//!
//! On any callback failure the browser lands on a generic error page; no
//! response distinguishes a replayed state from an expired one or from a
//! store outage.

use axum::extract::{Query, State};
use axum::response::Redirect;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::{Deserialize, Serialize};

use crate::auth::SessionTokens;
use crate::error::AuthFlowError;
use crate::state::AppState;

/// Query parameters delivered by the provider callback.
#[derive(Debug, Deserialize)]
pub struct CallbackParams {
    /// Authorization code.
    pub code: Option<String>,
    /// CSRF state token, echoed verbatim.
    pub state: Option<String>,
    /// Error code, if the provider aborted the flow.
    pub error: Option<String>,
    /// Error description, if the provider supplied one.
    pub error_description: Option<String>,
}

/// Back-channel redemption request body.
#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemRequest {
    /// Opaque session exchange handle.
    pub session_id: String,
}

/// Back-channel redemption response body.
#[derive(Debug, Serialize, Deserialize)]
pub struct RedeemResponse {
    /// Local access token.
    pub access_token: String,
    /// Local refresh token.
    pub refresh_token: String,
    /// Identifier of the authenticated principal.
    pub subject_id: String,
}

impl From<SessionTokens> for RedeemResponse {
    fn from(tokens: SessionTokens) -> Self {
        Self {
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            subject_id: tokens.subject_id,
        }
    }
}

/// Build the auth router over shared state.
#[must_use]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/auth/login", get(begin_login))
        .route("/auth/callback", get(oauth_callback))
        .route("/auth/session", post(redeem_session))
        .with_state(state)
}

/// Initiate a login by redirecting to the provider's authorization endpoint.
async fn begin_login(State(app): State<AppState>) -> Result<Redirect, AuthFlowError> {
    let authorize_url = app.coordinator().begin().await?;
    Ok(Redirect::to(&authorize_url))
}

/// Complete the flow on the provider callback.
///
/// Always redirects: to the frontend completion URL with the opaque handle
/// on success, to the generic error URL otherwise.
async fn oauth_callback(
    State(app): State<AppState>,
    Query(params): Query<CallbackParams>,
) -> Redirect {
    match complete_callback(&app, params).await {
        Ok(url) => Redirect::to(&url),
        Err(err) => {
            err.log();
            Redirect::to(&app.config().service.frontend_error_url)
        }
    }
}

async fn complete_callback(
    app: &AppState,
    params: CallbackParams,
) -> Result<String, AuthFlowError> {
    if let Some(error) = params.error {
        let description = params.error_description.unwrap_or_default();
        tracing::warn!(%error, %description, "provider aborted the flow");
        return Err(AuthFlowError::ProviderExchange(error));
    }

    let (Some(code), Some(state)) = (params.code, params.state) else {
        // Missing parameters are treated like any other invalid state.
        return Err(AuthFlowError::InvalidState);
    };

    app.coordinator().complete(&code, &state).await
}

/// Redeem a session handle for the local session tokens (single use).
async fn redeem_session(
    State(app): State<AppState>,
    Json(request): Json<RedeemRequest>,
) -> Result<Json<RedeemResponse>, AuthFlowError> {
    let tokens = app.coordinator().redeem(&request.session_id).await?;
    Ok(Json(tokens.into()))
}
