use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::response::{IntoResponse, Redirect, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use axum_extra::extract::PrivateCookieJar;
use serde_json::{Value, json};

use super::config::{AppConfig, ExchangeMode};
use super::cookies::{self, BACKEND_SESSION_COOKIE, PENDING_COOKIE, SESSION_COOKIE};
use super::error::{AuthError, FailureReason};
use super::pages;
use super::state::AppState;
use super::types::{
    AuthorizeRequest, AuthorizeResponse, CallbackParams, ExchangeRequest, LoginParams,
    ValidatedCallback, is_internal_path, validate_callback,
};
use crate::backend::BackendSession;
use crate::oauth::AuthorizationParams;
use crate::types::PendingExchange;

/// Build the application router: auth flow, gated page and data API.
pub fn router(config: AppConfig) -> Router {
    app_routes(AppState::new(config))
}

/// Same as [`router`] for an already-built state.
pub fn app_routes(state: AppState) -> Router {
    let gated_path = state.settings.gated_path.clone();

    Router::new()
        .route("/api/auth/authorize", post(authorize))
        .route("/api/auth/login", get(login))
        .route("/auth/callback", get(callback))
        .route("/api/auth/callback", post(exchange_json))
        .route("/api/auth/logout", get(logout).post(logout))
        .route(&gated_path, get(pages::gated))
        .route("/", get(pages::home))
        .route("/list", get(pages::list))
        .route("/assignment-2", get(pages::assignment_2))
        .route("/api/tables", get(pages::tables))
        .route("/api/rows", get(pages::rows))
        .route("/api/vote", post(pages::vote))
        .with_state(state)
}

// ── Authorize ──────────────────────────────────────────────────────

async fn authorize(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    body: Result<Json<AuthorizeRequest>, JsonRejection>,
) -> Result<(PrivateCookieJar, Json<AuthorizeResponse>), AuthError> {
    let Json(body) = body.map_err(|e| AuthError::Validation(e.body_text()))?;
    let request = body.validate()?;

    let client = state.require_sign_in()?;
    let redirect_uri = state.resolve_redirect_uri(request.redirect_uri)?;

    let auth_url = client.authorization_url(&AuthorizationParams {
        code_challenge: &request.code_challenge,
        state: &request.state,
        redirect_uri: &redirect_uri,
        redirect_to: request.redirect_to.as_deref(),
    });

    let pending = PendingExchange {
        code_verifier: request.code_verifier,
        state: request.state,
        redirect_uri: redirect_uri.clone(),
        redirect_to: request.redirect_to.clone(),
    };
    let cookie = cookies::pending_cookie(pending.encode()?, state.settings.secure_cookies);

    Ok((
        jar.add(cookie),
        Json(AuthorizeResponse {
            auth_url: auth_url.into(),
            redirect_uri_used: redirect_uri,
            redirect_to_used: request.redirect_to,
        }),
    ))
}

// ── Login ──────────────────────────────────────────────────────────

async fn login(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<LoginParams>,
) -> Result<(PrivateCookieJar, Redirect), AuthError> {
    let client = state.require_sign_in()?;
    let redirect_uri = state.resolve_redirect_uri(None)?;
    let redirect_to = params.redirect_to.filter(|p| is_internal_path(p));

    let auth_req = client.begin_authorization(&redirect_uri, None)?;

    let pending = PendingExchange {
        code_verifier: auth_req.code_verifier,
        state: auth_req.state,
        redirect_uri,
        redirect_to,
    };
    let cookie = cookies::pending_cookie(pending.encode()?, state.settings.secure_cookies);

    Ok((jar.add(cookie), Redirect::to(auth_req.url.as_str())))
}

// ── Callback ───────────────────────────────────────────────────────

async fn callback(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    Query(params): Query<CallbackParams>,
) -> Response {
    let gated_path = state.settings.gated_path.as_str();

    if let Some(error) = params.error.as_deref() {
        tracing::warn!(
            error,
            description = params.error_description.as_deref().unwrap_or_default(),
            "OAuth2 error from identity provider"
        );
    }

    let validated = match validate_callback(&params, cookies::get_pending(&jar).as_deref()) {
        Ok(validated) => validated,
        Err(reason) => {
            tracing::warn!(%reason, "OAuth callback rejected");
            let jar = if reason == FailureReason::InvalidState {
                jar.remove(cookies::removal(PENDING_COOKIE))
            } else {
                jar
            };
            return (jar, reason.redirect(gated_path)).into_response();
        }
    };

    let backend_session = match exchange(&state, &validated).await {
        Ok(session) => session,
        Err(e) => {
            tracing::error!(error = %e, "Token exchange failed");
            return (jar, FailureReason::ExchangeFailed.redirect(gated_path)).into_response();
        }
    };

    let secure = state.settings.secure_cookies;
    let mut jar = jar
        .add(cookies::session_cookie(secure))
        .remove(cookies::removal(PENDING_COOKIE));
    if let Some(session) = backend_session {
        jar = jar.add(cookies::backend_session_cookie(
            &session.access_token,
            session.expires_in,
            secure,
        ));
    }

    let target = validated
        .pending
        .redirect_to
        .filter(|p| is_internal_path(p))
        .unwrap_or_else(|| state.settings.default_redirect.clone());

    tracing::info!(mode = ?state.settings.exchange_mode, "OAuth sign-in successful");

    (jar, Redirect::to(&target)).into_response()
}

/// Redeem the code with whichever party the deployment delegates to.
async fn exchange(
    state: &AppState,
    validated: &ValidatedCallback,
) -> Result<Option<BackendSession>, AuthError> {
    let pending = &validated.pending;
    match state.settings.exchange_mode {
        ExchangeMode::Direct => {
            let tokens = state
                .require_oauth()?
                .exchange_code(&validated.code, &pending.code_verifier, &pending.redirect_uri)
                .await?;
            tracing::debug!(expires_in = ?tokens.expires_in, "Token endpoint accepted code");
            Ok(None)
        }
        ExchangeMode::Backend => {
            let session = state
                .require_backend()?
                .exchange_code_for_session(&validated.code, &pending.code_verifier)
                .await?;
            Ok(Some(session))
        }
    }
}

/// JSON variant of the callback: the client kept the verifier and posts it
/// with the code. Always a direct exchange with the token endpoint.
async fn exchange_json(
    State(state): State<AppState>,
    jar: PrivateCookieJar,
    body: Result<Json<ExchangeRequest>, JsonRejection>,
) -> Result<(PrivateCookieJar, Json<Value>), AuthError> {
    let Json(body) = body.map_err(|e| AuthError::Validation(e.body_text()))?;
    let request = body.validate()?;

    state
        .require_oauth()?
        .exchange_code(&request.code, &request.code_verifier, &request.redirect_uri)
        .await
        .map_err(|e| AuthError::Exchange(e.to_string()))?;

    tracing::info!("OAuth sign-in successful via JSON callback");
    let jar = jar.add(cookies::session_cookie(state.settings.secure_cookies));
    Ok((jar, Json(json!({ "ok": true }))))
}

// ── Logout ─────────────────────────────────────────────────────────

async fn logout(State(state): State<AppState>, jar: PrivateCookieJar) -> (PrivateCookieJar, Redirect) {
    let jar = jar
        .remove(cookies::removal(SESSION_COOKIE))
        .remove(cookies::removal(BACKEND_SESSION_COOKIE));
    (jar, Redirect::to(&state.settings.gated_path))
}
