//! Client for the hosted backend (Supabase): PKCE session exchange, auth user
//! lookup, and the PostgREST table/vote endpoints.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use url::Url;

use crate::error::Error;
use crate::oauth::{DEFAULT_EXCHANGE_TIMEOUT, ensure_success};
use crate::types::{CaptionId, Row, UserId, Vote, VoteValue};

const VOTES_TABLE: &str = "caption_votes";

/// Backend project location and public (anon) API key.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct BackendConfig {
    pub(crate) base_url: Url,
    pub(crate) anon_key: String,
    pub(crate) request_timeout: Duration,
}

impl BackendConfig {
    /// Create a backend configuration. The base URL is normalised to end in `/`.
    #[must_use]
    pub fn new(mut base_url: Url, anon_key: impl Into<String>) -> Self {
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Self {
            base_url,
            anon_key: anon_key.into(),
            request_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    #[must_use]
    /// Bound on every backend call, the session exchange included.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// The backend's own OAuth callback, registered with Google in the delegation variant.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Url`] if the base URL cannot be joined.
    pub fn auth_callback_url(&self) -> Result<Url, Error> {
        Ok(self.base_url.join("auth/v1/callback")?)
    }
}

/// Session issued by the backend after a successful code exchange.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct BackendSession {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub user: Option<BackendUser>,
}

/// Auth user as reported by the backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[non_exhaustive]
pub struct BackendUser {
    pub id: UserId,
    #[serde(default)]
    pub email: Option<String>,
}

#[derive(Serialize)]
struct PkceGrant<'a> {
    auth_code: &'a str,
    code_verifier: &'a str,
}

#[derive(Serialize)]
struct VoteRow<'a> {
    caption_id: &'a CaptionId,
    profile_id: &'a UserId,
    vote_value: VoteValue,
    #[serde(with = "time::serde::rfc3339")]
    created_datetime_utc: OffsetDateTime,
}

/// Backend client. Constructed once at start-up and shared through router state.
pub struct BackendClient {
    config: BackendConfig,
    http: reqwest::Client,
}

impl BackendClient {
    #[must_use]
    pub fn new(config: BackendConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    /// Use a custom HTTP client (for connection pool reuse or testing).
    #[must_use]
    pub fn with_http_client(mut self, client: reqwest::Client) -> Self {
        self.http = client;
        self
    }

    #[must_use]
    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    fn endpoint(&self, path: &str) -> Result<Url, Error> {
        Ok(self.config.base_url.join(path)?)
    }

    /// Trade an authorization code plus verifier for a backend session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure or timeout, or
    /// [`Error::Upstream`] if the backend rejects the code.
    pub async fn exchange_code_for_session(
        &self,
        code: &str,
        code_verifier: &str,
    ) -> Result<BackendSession, Error> {
        let mut url = self.endpoint("auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "pkce");

        let response = self
            .http
            .post(url)
            .timeout(self.config.request_timeout)
            .header("apikey", &self.config.anon_key)
            .json(&PkceGrant {
                auth_code: code,
                code_verifier,
            })
            .send()
            .await?;

        let response = ensure_success(response, "session exchange").await?;
        response.json::<BackendSession>().await.map_err(Into::into)
    }

    /// Resolve the user owning a backend access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] if the token is rejected, or [`Error::Http`]
    /// on network failure or timeout.
    pub async fn current_user(&self, access_token: &str) -> Result<BackendUser, Error> {
        let response = self
            .http
            .get(self.endpoint("auth/v1/user")?)
            .timeout(self.config.request_timeout)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        let response = ensure_success(response, "user lookup").await?;
        response.json::<BackendUser>().await.map_err(Into::into)
    }

    /// Fetch every row of `table`, ordered by `id`.
    ///
    /// The caller is responsible for allow-listing `table`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] if the query fails.
    pub async fn list_rows(&self, table: &str) -> Result<Vec<Row>, Error> {
        let mut url = self.endpoint(&format!("rest/v1/{table}"))?;
        url.query_pairs_mut()
            .append_pair("select", "*")
            .append_pair("order", "id.asc");

        let response = self
            .http
            .get(url)
            .timeout(self.config.request_timeout)
            .header("apikey", &self.config.anon_key)
            .bearer_auth(&self.config.anon_key)
            .send()
            .await?;

        let response = ensure_success(response, "list rows").await?;
        response.json::<Vec<Row>>().await.map_err(Into::into)
    }

    /// Insert a vote on behalf of `user_id`, authorised by the user's own token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Upstream`] if the insert is rejected.
    pub async fn record_vote(
        &self,
        access_token: &str,
        user_id: &UserId,
        vote: &Vote,
    ) -> Result<(), Error> {
        let row = VoteRow {
            caption_id: &vote.caption_id,
            profile_id: user_id,
            vote_value: vote.value,
            created_datetime_utc: OffsetDateTime::now_utc(),
        };

        let response = self
            .http
            .post(self.endpoint(&format!("rest/v1/{VOTES_TABLE}"))?)
            .timeout(self.config.request_timeout)
            .header("apikey", &self.config.anon_key)
            .header("Prefer", "return=minimal")
            .bearer_auth(access_token)
            .json(&row)
            .send()
            .await?;

        ensure_success(response, "record vote").await?;
        Ok(())
    }
}
