use std::sync::Arc;

use axum::extract::FromRef;
use axum_extra::extract::cookie::Key;

use super::config::{AppConfig, AppSettings, ExchangeMode};
use super::error::AuthError;
use crate::backend::BackendClient;
use crate::oauth::AuthClient;

/// Shared state for every route handler.
///
/// Clients are built once from [`AppConfig`] and passed in explicitly.
#[derive(Clone)]
pub struct AppState {
    pub(super) oauth: Option<Arc<AuthClient>>,
    pub(super) backend: Option<Arc<BackendClient>>,
    pub(super) settings: Arc<AppSettings>,
}

impl AppState {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self {
            oauth: config.oauth.map(|c| Arc::new(AuthClient::new(c))),
            backend: config.backend.map(|c| Arc::new(BackendClient::new(c))),
            settings: Arc::new(config.settings),
        }
    }

    pub(super) fn require_oauth(&self) -> Result<&AuthClient, AuthError> {
        self.oauth
            .as_deref()
            .ok_or_else(|| AuthError::Config("GOOGLE_CLIENT_ID not configured".into()))
    }

    pub(super) fn require_backend(&self) -> Result<&BackendClient, AuthError> {
        self.backend
            .as_deref()
            .ok_or_else(|| AuthError::Config("SUPABASE_URL not configured".into()))
    }

    /// Configuration the sign-in flow needs before anything is stored.
    pub(super) fn require_sign_in(&self) -> Result<&AuthClient, AuthError> {
        let client = self.require_oauth()?;
        if self.settings.exchange_mode == ExchangeMode::Backend {
            self.require_backend()?;
        }
        Ok(client)
    }

    /// Redirect URI sent to Google: the request's, else the configured one,
    /// else the backend's own callback in the delegation variant.
    pub(super) fn resolve_redirect_uri(
        &self,
        requested: Option<String>,
    ) -> Result<String, AuthError> {
        if let Some(uri) = requested {
            return Ok(uri);
        }
        if let Some(uri) = self.oauth.as_deref().and_then(|c| c.config().redirect_uri()) {
            return Ok(uri.to_string());
        }
        if self.settings.exchange_mode == ExchangeMode::Backend {
            let backend = self.require_backend()?;
            return Ok(backend.config().auth_callback_url()?.to_string());
        }
        Err(AuthError::Config("OAUTH_REDIRECT_URI not configured".into()))
    }
}

// PrivateCookieJar requires Key to be extractable from state
impl FromRef<AppState> for Key {
    fn from_ref(state: &AppState) -> Self {
        state.settings.cookie_key.clone()
    }
}
