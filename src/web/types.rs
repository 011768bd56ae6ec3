use serde::{Deserialize, Serialize};

use super::error::{AuthError, FailureReason};
use crate::types::{CaptionId, PendingExchange, Row, Vote, VoteValue};

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Body of `POST /api/auth/authorize`, as received.
#[derive(Debug, Default, Deserialize)]
pub struct AuthorizeRequest {
    pub code_challenge: Option<String>,
    pub state: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
    pub redirect_to: Option<String>,
}

/// An authorize request whose required fields are all present.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ValidAuthorize {
    pub(super) code_challenge: String,
    pub(super) state: String,
    pub(super) code_verifier: String,
    pub(super) redirect_uri: Option<String>,
    pub(super) redirect_to: Option<String>,
}

impl AuthorizeRequest {
    pub(super) fn validate(self) -> Result<ValidAuthorize, AuthError> {
        let missing = || {
            AuthError::Validation(
                "Missing code_challenge, state, code_verifier, or redirect_uri/redirect_to".into(),
            )
        };
        let redirect_uri = present(self.redirect_uri);
        let redirect_to = present(self.redirect_to);
        if redirect_uri.is_none() && redirect_to.is_none() {
            return Err(missing());
        }
        Ok(ValidAuthorize {
            code_challenge: present(self.code_challenge).ok_or_else(missing)?,
            state: present(self.state).ok_or_else(missing)?,
            code_verifier: present(self.code_verifier).ok_or_else(missing)?,
            redirect_uri,
            redirect_to,
        })
    }
}

/// Response of `POST /api/auth/authorize`.
#[derive(Debug, Serialize, Deserialize)]
pub struct AuthorizeResponse {
    #[serde(rename = "authUrl")]
    pub auth_url: String,
    pub redirect_uri_used: String,
    pub redirect_to_used: Option<String>,
}

/// Body of `POST /api/auth/callback`, for clients that handle the redirect themselves.
#[derive(Debug, Default, Deserialize)]
pub struct ExchangeRequest {
    pub code: Option<String>,
    pub code_verifier: Option<String>,
    pub redirect_uri: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ValidExchange {
    pub(super) code: String,
    pub(super) code_verifier: String,
    pub(super) redirect_uri: String,
}

impl ExchangeRequest {
    pub(super) fn validate(self) -> Result<ValidExchange, AuthError> {
        let missing =
            || AuthError::Validation("Missing code, code_verifier, or redirect_uri".into());
        Ok(ValidExchange {
            code: present(self.code).ok_or_else(missing)?,
            code_verifier: present(self.code_verifier).ok_or_else(missing)?,
            redirect_uri: present(self.redirect_uri).ok_or_else(missing)?,
        })
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct LoginParams {
    pub(super) redirect_to: Option<String>,
}

/// Query parameters of the identity provider's redirect.
#[derive(Debug, Default, Deserialize)]
pub(super) struct CallbackParams {
    pub(super) code: Option<String>,
    pub(super) state: Option<String>,
    pub(super) error: Option<String>,
    pub(super) error_description: Option<String>,
}

/// A callback that passed every local check and may be exchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) struct ValidatedCallback {
    pub(super) code: String,
    pub(super) pending: PendingExchange,
}

/// Local checks of a callback, in order, before any network call.
pub(super) fn validate_callback(
    params: &CallbackParams,
    pending_cookie: Option<&str>,
) -> Result<ValidatedCallback, FailureReason> {
    let code = present(params.code.clone()).ok_or(FailureReason::MissingParams)?;
    let received_state = present(params.state.clone()).ok_or(FailureReason::MissingParams)?;

    let raw = pending_cookie.ok_or(FailureReason::SessionExpired)?;
    let pending = PendingExchange::decode(raw).map_err(|_| FailureReason::InvalidCookie)?;

    if received_state != pending.state {
        return Err(FailureReason::InvalidState);
    }

    Ok(ValidatedCallback { code, pending })
}

/// True for same-origin paths like `/assignment-3`; rejects `//host` and absolute URLs.
pub(super) fn is_internal_path(path: &str) -> bool {
    path.starts_with('/') && !path.starts_with("//") && !path.contains('\\')
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct GatedParams {
    pub(super) error: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct RowsParams {
    pub(super) table: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct RowsResponse {
    pub(super) table: String,
    pub(super) rows: Vec<Row>,
}

#[derive(Debug, Serialize)]
pub(super) struct TablesResponse {
    pub(super) tables: Vec<String>,
    pub(super) default: String,
}

/// Body of `POST /api/vote`, as received.
#[derive(Debug, Default, Deserialize)]
pub struct VoteRequest {
    pub caption_id: Option<String>,
    pub vote_value: Option<i64>,
}

impl VoteRequest {
    pub(super) fn validate(self) -> Result<Vote, AuthError> {
        let caption_id = present(self.caption_id)
            .ok_or_else(|| AuthError::Validation("Missing or invalid caption_id".into()))?;
        let value = self
            .vote_value
            .and_then(|v| VoteValue::try_from(v).ok())
            .ok_or_else(|| {
                AuthError::Validation("vote_value must be 1 (upvote) or -1 (downvote)".into())
            })?;
        Ok(Vote {
            caption_id: CaptionId::from(caption_id),
            value,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pending(state: &str) -> String {
        PendingExchange {
            code_verifier: "verifier".into(),
            state: state.into(),
            redirect_uri: "https://project.supabase.co/auth/v1/callback".into(),
            redirect_to: None,
        }
        .encode()
        .unwrap()
    }

    fn params(code: Option<&str>, state: Option<&str>) -> CallbackParams {
        CallbackParams {
            code: code.map(Into::into),
            state: state.map(Into::into),
            ..Default::default()
        }
    }

    #[test]
    fn callback_missing_code_or_state() {
        let cookie = pending("s1");
        for p in [
            params(None, None),
            params(Some("x"), None),
            params(None, Some("s1")),
            params(Some(""), Some("s1")),
        ] {
            assert_eq!(
                validate_callback(&p, Some(&cookie)),
                Err(FailureReason::MissingParams)
            );
        }
    }

    #[test]
    fn callback_missing_params_is_repeatable() {
        for _ in 0..3 {
            assert_eq!(
                validate_callback(&params(None, None), None),
                Err(FailureReason::MissingParams)
            );
        }
    }

    #[test]
    fn callback_without_cookie_is_expired() {
        assert_eq!(
            validate_callback(&params(Some("x"), Some("s1")), None),
            Err(FailureReason::SessionExpired)
        );
    }

    #[test]
    fn callback_with_garbage_cookie() {
        assert_eq!(
            validate_callback(&params(Some("x"), Some("s1")), Some("%%%")),
            Err(FailureReason::InvalidCookie)
        );
    }

    #[test]
    fn callback_state_mismatch() {
        let cookie = pending("s2");
        assert_eq!(
            validate_callback(&params(Some("x"), Some("s1")), Some(&cookie)),
            Err(FailureReason::InvalidState)
        );
    }

    #[test]
    fn callback_provider_denial_is_missing_params() {
        for error in ["access_denied", ""] {
            let p = CallbackParams {
                error: Some(error.into()),
                ..params(None, None)
            };
            assert_eq!(
                validate_callback(&p, Some(&pending("s1"))),
                Err(FailureReason::MissingParams)
            );
        }
    }

    #[test]
    fn callback_valid() {
        let validated = validate_callback(&params(Some("x"), Some("s1")), Some(&pending("s1")))
            .unwrap();
        assert_eq!(validated.code, "x");
        assert_eq!(validated.pending.code_verifier, "verifier");
    }

    #[test]
    fn authorize_requires_all_fields() {
        let full = || AuthorizeRequest {
            code_challenge: Some("c".into()),
            state: Some("s".into()),
            code_verifier: Some("v".into()),
            redirect_uri: None,
            redirect_to: Some("/assignment-3".into()),
        };
        assert!(full().validate().is_ok());

        for broken in [
            AuthorizeRequest { code_challenge: None, ..full() },
            AuthorizeRequest { state: Some(" ".into()), ..full() },
            AuthorizeRequest { code_verifier: None, ..full() },
            AuthorizeRequest { redirect_to: None, ..full() },
        ] {
            assert!(matches!(broken.validate(), Err(AuthError::Validation(_))));
        }
    }

    #[test]
    fn exchange_request_requires_all_fields() {
        let full = || ExchangeRequest {
            code: Some("code".into()),
            code_verifier: Some("verifier".into()),
            redirect_uri: Some("https://app.example.com/auth/callback".into()),
        };
        assert_eq!(full().validate().unwrap().code, "code");

        for broken in [
            ExchangeRequest { code: None, ..full() },
            ExchangeRequest { code_verifier: Some("".into()), ..full() },
            ExchangeRequest { redirect_uri: None, ..full() },
        ] {
            assert!(matches!(broken.validate(), Err(AuthError::Validation(_))));
        }
    }

    #[test]
    fn internal_paths_only() {
        assert!(is_internal_path("/assignment-3"));
        assert!(is_internal_path("/list?table=captions"));
        assert!(!is_internal_path("//evil.example.com"));
        assert!(!is_internal_path("https://evil.example.com/"));
        assert!(!is_internal_path("/\\evil.example.com"));
        assert!(!is_internal_path(""));
    }

    #[test]
    fn vote_request_validation() {
        let vote = VoteRequest {
            caption_id: Some("cap-1".into()),
            vote_value: Some(-1),
        }
        .validate()
        .unwrap();
        assert_eq!(vote.value, VoteValue::Down);

        for bad in [
            VoteRequest { caption_id: None, vote_value: Some(1) },
            VoteRequest { caption_id: Some("cap-1".into()), vote_value: Some(0) },
            VoteRequest { caption_id: Some("cap-1".into()), vote_value: None },
        ] {
            assert!(matches!(bad.validate(), Err(AuthError::Validation(_))));
        }
    }
}
