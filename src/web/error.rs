use std::fmt;
use std::str::FromStr;

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde_json::json;

/// Errors returned as JSON by the API endpoints.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// Missing or malformed request fields.
    #[error("{0}")]
    Validation(String),

    /// Missing or invalid server configuration.
    #[error("{0}")]
    Config(String),

    /// No usable session for an endpoint that needs one.
    #[error("Unauthorized. Sign in to continue.")]
    Unauthenticated,

    /// The token endpoint refused or failed to redeem a code.
    #[error("Token exchange failed: {0}")]
    Exchange(String),

    /// The identity provider or backend rejected a request.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Local failure that is not the caller's fault.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Unauthenticated => (StatusCode::UNAUTHORIZED, self.to_string()),
            Self::Config(msg) => {
                tracing::error!(error = %msg, "Server misconfigured");
                (StatusCode::INTERNAL_SERVER_ERROR, msg.clone())
            }
            Self::Exchange(detail) => {
                tracing::warn!(error = %detail, "Token exchange failed");
                (StatusCode::BAD_REQUEST, "Token exchange failed".to_string())
            }
            Self::Upstream(detail) => {
                tracing::error!(error = %detail, "Upstream request failed");
                (StatusCode::BAD_GATEWAY, "Upstream service error".to_string())
            }
            Self::Internal(detail) => {
                tracing::error!(error = %detail, "Internal error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal error".to_string(),
                )
            }
        };
        (status, Json(json!({ "error": message }))).into_response()
    }
}

impl From<crate::error::Error> for AuthError {
    fn from(e: crate::error::Error) -> Self {
        use crate::error::Error;
        match e {
            Error::Upstream { .. } | Error::Http(_) => Self::Upstream(e.to_string()),
            Error::InvalidVote(_) => Self::Validation(e.to_string()),
            _ => Self::Internal(e.to_string()),
        }
    }
}

/// Why a callback did not produce a session. Sent to the browser as `?error=<code>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    MissingParams,
    SessionExpired,
    InvalidCookie,
    InvalidState,
    ExchangeFailed,
}

impl FailureReason {
    pub const ALL: [Self; 5] = [
        Self::MissingParams,
        Self::SessionExpired,
        Self::InvalidCookie,
        Self::InvalidState,
        Self::ExchangeFailed,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::MissingParams => "missing_params",
            Self::SessionExpired => "session_expired",
            Self::InvalidCookie => "invalid_cookie",
            Self::InvalidState => "invalid_state",
            Self::ExchangeFailed => "exchange_failed",
        }
    }

    /// Message shown on the sign-in prompt.
    #[must_use]
    pub fn message(self) -> &'static str {
        match self {
            Self::MissingParams => "No authorization code received.",
            Self::SessionExpired => "Session expired. Please try signing in again.",
            Self::InvalidCookie => "Sign-in data was unreadable. Please try again.",
            Self::InvalidState => "Invalid state. Please try again.",
            Self::ExchangeFailed => "Sign-in failed. Please try again.",
        }
    }

    /// Redirect to `target` carrying this reason as the `error` query parameter.
    #[must_use]
    pub fn redirect(self, target: &str) -> Redirect {
        Redirect::to(&format!("{target}?error={}", self.as_str()))
    }
}

impl fmt::Display for FailureReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FailureReason {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|r| r.as_str() == s).ok_or(())
    }
}
