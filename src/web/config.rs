use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use axum_extra::extract::cookie::Key;
use url::Url;

use super::error::AuthError;
use crate::backend::BackendConfig;
use crate::oauth::{DEFAULT_EXCHANGE_TIMEOUT, OAuthConfig};
use crate::tables::{DEFAULT_TABLE, TableCatalog};

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
const DEFAULT_GATED_PATH: &str = "/assignment-3";

/// Who redeems the authorization code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeMode {
    /// Server-to-server call to Google's token endpoint.
    Direct,
    /// Delegated to the backend's PKCE session exchange.
    Backend,
}

impl FromStr for ExchangeMode {
    type Err = AuthError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "direct" => Ok(Self::Direct),
            "backend" => Ok(Self::Backend),
            other => Err(AuthError::Config(format!(
                "AUTH_EXCHANGE must be `direct` or `backend`, got `{other}`"
            ))),
        }
    }
}

/// Runtime settings shared by every handler.
#[derive(Clone)]
pub(crate) struct AppSettings {
    pub(crate) cookie_key: Key,
    pub(crate) secure_cookies: bool,
    pub(crate) exchange_mode: ExchangeMode,
    pub(crate) gated_path: String,
    pub(crate) default_redirect: String,
    pub(crate) tables: TableCatalog,
}

impl AppSettings {
    fn defaults() -> Self {
        Self {
            cookie_key: Key::generate(),
            secure_cookies: true,
            exchange_mode: ExchangeMode::Direct,
            gated_path: DEFAULT_GATED_PATH.into(),
            default_redirect: DEFAULT_GATED_PATH.into(),
            tables: TableCatalog::default(),
        }
    }
}

/// Application configuration.
///
/// The Google client and the backend are optional so that the listing pages keep
/// working on a half-configured deployment; the auth endpoints report a
/// configuration error instead.
///
/// Use [`from_env()`](AppConfig::from_env) for convention-based setup,
/// or [`new()`](AppConfig::new) with `with_*` methods for full control.
pub struct AppConfig {
    pub(super) oauth: Option<OAuthConfig>,
    pub(super) backend: Option<BackendConfig>,
    pub(super) settings: AppSettings,
    pub(super) bind_addr: SocketAddr,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl AppConfig {
    #[must_use]
    pub fn new() -> Self {
        Self {
            oauth: None,
            backend: None,
            settings: AppSettings::defaults(),
            bind_addr: SocketAddr::from(([0, 0, 0, 0], 3000)),
        }
    }

    /// Create config from environment variables.
    ///
    /// # Env vars (all optional)
    /// - `GOOGLE_CLIENT_ID`: Google OAuth client ID (auth endpoints need it)
    /// - `OAUTH_REDIRECT_URI`: redirect URI registered with Google
    /// - `GOOGLE_AUTH_URL` / `GOOGLE_TOKEN_URL`: endpoint overrides
    /// - `OAUTH_SCOPES`: comma-separated scopes
    /// - `OAUTH_EXCHANGE_TIMEOUT_SECS`: bound on the code exchange and backend calls (default 5)
    /// - `SUPABASE_URL` + `SUPABASE_ANON_KEY`: backend project
    /// - `AUTH_EXCHANGE`: `direct` or `backend` (default: `backend` when a backend is configured)
    /// - `APP_ENV`: `development` disables secure cookies
    /// - `COOKIE_KEY`: cookie encryption key bytes (at least 64)
    /// - `ALLOWED_TABLES` (comma-separated) / `DEFAULT_TABLE`
    /// - `BIND_ADDR`: listen address (default `0.0.0.0:3000`)
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AuthError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Same as [`from_env`](Self::from_env) with an injectable variable source.
    ///
    /// # Errors
    ///
    /// Returns [`AuthError::Config`] if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AuthError> {
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let timeout = match var("OAUTH_EXCHANGE_TIMEOUT_SECS") {
            Some(secs) => Duration::from_secs(
                secs.trim()
                    .parse()
                    .map_err(|e| AuthError::Config(format!("OAUTH_EXCHANGE_TIMEOUT_SECS: {e}")))?,
            ),
            None => DEFAULT_EXCHANGE_TIMEOUT,
        };

        let mut config = Self::new();

        if let Some(client_id) = var("GOOGLE_CLIENT_ID") {
            let mut oauth = OAuthConfig::new(client_id).with_exchange_timeout(timeout);
            if let Some(url) = var("OAUTH_REDIRECT_URI") {
                oauth = oauth.with_redirect_uri(parse_url("OAUTH_REDIRECT_URI", &url)?);
            }
            if let Some(url) = var("GOOGLE_AUTH_URL") {
                oauth = oauth.with_auth_url(parse_url("GOOGLE_AUTH_URL", &url)?);
            }
            if let Some(url) = var("GOOGLE_TOKEN_URL") {
                oauth = oauth.with_token_url(parse_url("GOOGLE_TOKEN_URL", &url)?);
            }
            if let Some(scopes) = var("OAUTH_SCOPES") {
                oauth = oauth.with_scopes(split_list(&scopes));
            }
            config = config.with_oauth(oauth);
        }

        match (var("SUPABASE_URL"), var("SUPABASE_ANON_KEY")) {
            (Some(url), Some(key)) => {
                let backend = BackendConfig::new(parse_url("SUPABASE_URL", &url)?, key)
                    .with_request_timeout(timeout);
                config = config.with_backend(backend);
            }
            (None, None) => {}
            _ => {
                return Err(AuthError::Config(
                    "SUPABASE_URL and SUPABASE_ANON_KEY must be set together".into(),
                ));
            }
        }

        let mode = match var("AUTH_EXCHANGE") {
            Some(mode) => mode.parse()?,
            None if config.backend.is_some() => ExchangeMode::Backend,
            None => ExchangeMode::Direct,
        };

        let development = var("APP_ENV").is_some_and(|env| env.trim().eq_ignore_ascii_case("development"));

        if let Some(key) = var("COOKIE_KEY") {
            let key = Key::try_from(key.as_bytes()).map_err(|_| {
                AuthError::Config(
                    "COOKIE_KEY is set but invalid (must be at least 64 bytes). \
                     Remove the env var to use an ephemeral key, or provide a valid key."
                        .into(),
                )
            })?;
            config = config.with_cookie_key(key);
        } else {
            tracing::warn!("COOKIE_KEY not set; sessions will not survive a restart");
        }

        if var("ALLOWED_TABLES").is_some() || var("DEFAULT_TABLE").is_some() {
            let allowed = var("ALLOWED_TABLES")
                .map(|list| split_list(&list))
                .unwrap_or_else(|| config.settings.tables.allowed().to_vec());
            let default = var("DEFAULT_TABLE").unwrap_or_else(|| DEFAULT_TABLE.to_string());
            config = config.with_tables(TableCatalog::new(allowed, default.trim()));
        }

        if let Some(addr) = var("BIND_ADDR") {
            let addr = addr
                .trim()
                .parse()
                .map_err(|e| AuthError::Config(format!("BIND_ADDR: {e}")))?;
            config = config.with_bind_addr(addr);
        }

        Ok(config
            .with_exchange_mode(mode)
            .with_secure_cookies(!development))
    }

    #[must_use]
    pub fn with_oauth(mut self, oauth: OAuthConfig) -> Self {
        self.oauth = Some(oauth);
        self
    }

    #[must_use]
    pub fn with_backend(mut self, backend: BackendConfig) -> Self {
        self.backend = Some(backend);
        self
    }

    #[must_use]
    pub fn with_exchange_mode(mut self, mode: ExchangeMode) -> Self {
        self.settings.exchange_mode = mode;
        self
    }

    #[must_use]
    pub fn with_cookie_key(mut self, key: Key) -> Self {
        self.settings.cookie_key = key;
        self
    }

    #[must_use]
    pub fn with_secure_cookies(mut self, secure: bool) -> Self {
        self.settings.secure_cookies = secure;
        self
    }

    /// Path of the sign-in gated page; callback failures redirect here.
    #[must_use]
    pub fn with_gated_path(mut self, path: impl Into<String>) -> Self {
        self.settings.gated_path = path.into();
        self
    }

    /// Post-sign-in destination when the attempt did not name one.
    #[must_use]
    pub fn with_default_redirect(mut self, path: impl Into<String>) -> Self {
        self.settings.default_redirect = path.into();
        self
    }

    #[must_use]
    pub fn with_tables(mut self, tables: TableCatalog) -> Self {
        self.settings.tables = tables;
        self
    }

    #[must_use]
    pub fn with_bind_addr(mut self, addr: SocketAddr) -> Self {
        self.bind_addr = addr;
        self
    }

    #[must_use]
    pub fn bind_addr(&self) -> SocketAddr {
        self.bind_addr
    }

    #[must_use]
    pub fn exchange_mode(&self) -> ExchangeMode {
        self.settings.exchange_mode
    }
}

fn parse_url(name: &str, value: &str) -> Result<Url, AuthError> {
    value
        .trim()
        .parse()
        .map_err(|e| AuthError::Config(format!("{name}: {e}")))
}

fn split_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect()
}
