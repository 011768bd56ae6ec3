use std::time::Duration;

use serde::Deserialize;
use url::Url;

use crate::error::Error;
use crate::pkce::PkcePair;

pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";

/// Upper bound on the server-to-server token exchange round trip.
pub const DEFAULT_EXCHANGE_TIMEOUT: Duration = Duration::from_secs(5);

/// Google `OAuth2` configuration for a public (secret-less) PKCE client.
///
/// ```rust,ignore
/// use humor_project::OAuthConfig;
///
/// let config = OAuthConfig::new("1234.apps.googleusercontent.com")
///     .with_redirect_uri("https://project.supabase.co/auth/v1/callback".parse()?);
/// ```
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct OAuthConfig {
    pub(crate) client_id: String,
    pub(crate) auth_url: Url,
    pub(crate) token_url: Url,
    pub(crate) redirect_uri: Option<Url>,
    pub(crate) scopes: Vec<String>,
    pub(crate) exchange_timeout: Duration,
}

impl OAuthConfig {
    /// Create a configuration pointing at Google's public endpoints.
    #[must_use]
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            auth_url: GOOGLE_AUTH_URL.parse().expect("valid default URL"),
            token_url: GOOGLE_TOKEN_URL.parse().expect("valid default URL"),
            redirect_uri: None,
            scopes: vec!["email".into(), "profile".into()],
            exchange_timeout: DEFAULT_EXCHANGE_TIMEOUT,
        }
    }

    /// Override the authorization endpoint.
    #[must_use]
    pub fn with_auth_url(mut self, url: Url) -> Self {
        self.auth_url = url;
        self
    }

    /// Override the token endpoint.
    #[must_use]
    pub fn with_token_url(mut self, url: Url) -> Self {
        self.token_url = url;
        self
    }

    /// Redirect URI registered with Google, used when a request does not name one.
    #[must_use]
    pub fn with_redirect_uri(mut self, url: Url) -> Self {
        self.redirect_uri = Some(url);
        self
    }

    /// Override the requested scopes (default: `["email", "profile"]`).
    #[must_use]
    pub fn with_scopes(mut self, scopes: Vec<String>) -> Self {
        self.scopes = scopes;
        self
    }

    #[must_use]
    pub fn with_exchange_timeout(mut self, timeout: Duration) -> Self {
        self.exchange_timeout = timeout;
        self
    }

    #[must_use]
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    #[must_use]
    pub fn auth_url(&self) -> &Url {
        &self.auth_url
    }

    #[must_use]
    pub fn token_url(&self) -> &Url {
        &self.token_url
    }

    #[must_use]
    pub fn redirect_uri(&self) -> Option<&Url> {
        self.redirect_uri.as_ref()
    }

    #[must_use]
    pub fn scopes(&self) -> &[String] {
        &self.scopes
    }

    #[must_use]
    pub fn exchange_timeout(&self) -> Duration {
        self.exchange_timeout
    }
}

/// Inputs to the authorization URL, all supplied by the caller.
#[derive(Debug, Clone, Copy)]
pub struct AuthorizationParams<'a> {
    pub code_challenge: &'a str,
    pub state: &'a str,
    pub redirect_uri: &'a str,
    pub redirect_to: Option<&'a str>,
}

/// Authorization URL plus the PKCE values that must be kept for the callback.
#[non_exhaustive]
pub struct AuthorizationRequest {
    pub url: Url,
    pub state: String,
    pub code_verifier: String,
}

/// Token response from Google's token endpoint.
#[derive(Debug, Clone, Deserialize)]
#[non_exhaustive]
pub struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<u64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub id_token: Option<String>,
}

/// Google `OAuth2` client: builds authorization URLs and exchanges codes.
pub struct AuthClient {
    config: OAuthConfig,
    http: reqwest::Client,
}

impl AuthClient {
    #[must_use]
    pub fn new(config: OAuthConfig) -> Self {
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
    pub fn config(&self) -> &OAuthConfig {
        &self.config
    }

    /// Build the authorization endpoint URL for caller-provided PKCE values.
    #[must_use]
    pub fn authorization_url(&self, params: &AuthorizationParams<'_>) -> Url {
        let scope = self.config.scopes.join(" ");

        let mut url = self.config.auth_url.clone();
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("client_id", &self.config.client_id)
                .append_pair("redirect_uri", params.redirect_uri);
            if let Some(redirect_to) = params.redirect_to {
                query.append_pair("redirect_to", redirect_to);
            }
            query
                .append_pair("response_type", "code")
                .append_pair("scope", &scope)
                .append_pair("code_challenge", params.code_challenge)
                .append_pair("code_challenge_method", "S256")
                .append_pair("state", params.state);
        }
        url
    }

    /// Generate fresh PKCE material and the matching authorization URL.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Entropy`] if no secure random source is available.
    pub fn begin_authorization(
        &self,
        redirect_uri: &str,
        redirect_to: Option<&str>,
    ) -> Result<AuthorizationRequest, Error> {
        let pair = PkcePair::generate()?;
        let url = self.authorization_url(&AuthorizationParams {
            code_challenge: &pair.code_challenge,
            state: &pair.state,
            redirect_uri,
            redirect_to,
        });

        Ok(AuthorizationRequest {
            url,
            state: pair.state,
            code_verifier: pair.code_verifier,
        })
    }

    /// Exchange an authorization code for tokens using PKCE.
    ///
    /// The request is bounded by the configured exchange timeout.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Http`] on network failure or timeout, or
    /// [`Error::Upstream`] if the token endpoint rejects the exchange.
    pub async fn exchange_code(
        &self,
        code: &str,
        code_verifier: &str,
        redirect_uri: &str,
    ) -> Result<TokenResponse, Error> {
        let params = [
            ("client_id", self.config.client_id.as_str()),
            ("code", code),
            ("code_verifier", code_verifier),
            ("redirect_uri", redirect_uri),
            ("grant_type", "authorization_code"),
        ];

        let response = self
            .http
            .post(self.config.token_url.clone())
            .timeout(self.config.exchange_timeout)
            .form(&params)
            .send()
            .await?;

        let response = ensure_success(response, "token exchange").await?;
        response.json::<TokenResponse>().await.map_err(Into::into)
    }
}

/// Checks HTTP response status; returns the response on success or an error with details.
pub(crate) async fn ensure_success(
    response: reqwest::Response,
    operation: &'static str,
) -> Result<reqwest::Response, Error> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let detail = response.text().await.unwrap_or_default();
    Err(Error::Upstream {
        operation,
        status: Some(status),
        detail,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const REDIRECT: &str = "https://project.supabase.co/auth/v1/callback";

    fn test_client() -> AuthClient {
        AuthClient::new(OAuthConfig::new("test-client"))
    }

    fn query_of(url: &Url) -> Vec<(String, String)> {
        url.query_pairs()
            .map(|(k, v)| (k.into_owned(), v.into_owned()))
            .collect()
    }

    #[test]
    fn test_authorization_url_contains_pkce() {
        let client = test_client();
        let url = client.authorization_url(&AuthorizationParams {
            code_challenge: "challenge-1",
            state: "state-1",
            redirect_uri: REDIRECT,
            redirect_to: Some("https://app.example.com/auth/callback"),
        });

        assert!(url.as_str().starts_with(GOOGLE_AUTH_URL));
        let query = query_of(&url);
        let get = |k: &str| {
            query
                .iter()
                .find(|(key, _)| key == k)
                .map(|(_, v)| v.as_str())
        };
        assert_eq!(get("client_id"), Some("test-client"));
        assert_eq!(get("redirect_uri"), Some(REDIRECT));
        assert_eq!(
            get("redirect_to"),
            Some("https://app.example.com/auth/callback")
        );
        assert_eq!(get("response_type"), Some("code"));
        assert_eq!(get("scope"), Some("email profile"));
        assert_eq!(get("code_challenge"), Some("challenge-1"));
        assert_eq!(get("code_challenge_method"), Some("S256"));
        assert_eq!(get("state"), Some("state-1"));
    }

    #[test]
    fn test_authorization_url_omits_absent_redirect_to() {
        let url = test_client().authorization_url(&AuthorizationParams {
            code_challenge: "c",
            state: "s",
            redirect_uri: REDIRECT,
            redirect_to: None,
        });
        assert!(query_of(&url).iter().all(|(k, _)| k != "redirect_to"));
    }

    #[test]
    fn test_begin_authorization_unique_per_call() {
        let client = test_client();
        let req1 = client.begin_authorization(REDIRECT, None).unwrap();
        let req2 = client.begin_authorization(REDIRECT, None).unwrap();

        assert_ne!(req1.state, req2.state);
        assert_ne!(req1.code_verifier, req2.code_verifier);
        let challenge = crate::pkce::compute_code_challenge(&req1.code_verifier);
        assert!(req1.url.as_str().contains(&format!("code_challenge={challenge}")));
    }

    #[test]
    fn test_config_with_overrides() {
        let config = OAuthConfig::new("my-app")
            .with_auth_url("https://custom.example.com/authorize".parse().unwrap())
            .with_scopes(vec!["openid".into()])
            .with_exchange_timeout(Duration::from_secs(2));

        assert_eq!(
            config.auth_url().as_str(),
            "https://custom.example.com/authorize"
        );
        assert_eq!(config.token_url().as_str(), GOOGLE_TOKEN_URL);
        assert_eq!(config.scopes(), &["openid"]);
        assert_eq!(config.exchange_timeout(), Duration::from_secs(2));
        assert!(config.redirect_uri().is_none());
    }

    #[tokio::test]
    async fn test_exchange_code_posts_form() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("POST", "/token")
            .match_body(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("client_id".into(), "test-client".into()),
                mockito::Matcher::UrlEncoded("code".into(), "the-code".into()),
                mockito::Matcher::UrlEncoded("code_verifier".into(), "the-verifier".into()),
                mockito::Matcher::UrlEncoded("redirect_uri".into(), REDIRECT.into()),
                mockito::Matcher::UrlEncoded(
                    "grant_type".into(),
                    "authorization_code".into(),
                ),
            ]))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"access_token":"ya29.token","token_type":"Bearer","expires_in":3599}"#)
            .create_async()
            .await;

        let config = OAuthConfig::new("test-client")
            .with_token_url(format!("{}/token", server.url()).parse().unwrap());
        let tokens = AuthClient::new(config)
            .exchange_code("the-code", "the-verifier", REDIRECT)
            .await
            .unwrap();

        assert_eq!(tokens.access_token, "ya29.token");
        assert_eq!(tokens.expires_in, Some(3599));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_exchange_code_rejected() {
        let mut server = mockito::Server::new_async().await;
        server
            .mock("POST", "/token")
            .with_status(400)
            .with_body(r#"{"error":"invalid_grant"}"#)
            .create_async()
            .await;

        let config = OAuthConfig::new("test-client")
            .with_token_url(format!("{}/token", server.url()).parse().unwrap());
        let err = AuthClient::new(config)
            .exchange_code("bad", "verifier", REDIRECT)
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            Error::Upstream {
                status: Some(400),
                ..
            }
        ));
    }
}
