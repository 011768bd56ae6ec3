use std::convert::Infallible;

use axum::extract::{FromRequestParts, OptionalFromRequestParts};
use axum::http::request::Parts;
use axum_extra::extract::PrivateCookieJar;

use super::cookies;
use super::error::AuthError;
use super::state::AppState;

fn jar(parts: &Parts, state: &AppState) -> PrivateCookieJar {
    PrivateCookieJar::from_headers(&parts.headers, state.settings.cookie_key.clone())
}

/// Proof that the request carries a valid application session marker.
///
/// Rejects with `401 Unauthorized`; use `Option<SignedIn>` to branch instead.
///
/// ```rust,ignore
/// async fn page(session: Option<SignedIn>) -> Html<&'static str> {
///     match session {
///         Some(_) => Html("protected"),
///         None => Html("sign in"),
///     }
/// }
/// ```
#[derive(Debug, Clone, Copy)]
pub struct SignedIn;

impl FromRequestParts<AppState> for SignedIn {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        if cookies::has_session(&jar(parts, state)) {
            Ok(Self)
        } else {
            Err(AuthError::Unauthenticated)
        }
    }
}

impl OptionalFromRequestParts<AppState> for SignedIn {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Option<Self>, Self::Rejection> {
        Ok(cookies::has_session(&jar(parts, state)).then_some(Self))
    }
}

/// Backend access token from the backend session cookie.
///
/// Independent of [`SignedIn`]: the vote endpoint identifies the user through
/// the backend, not through the application marker.
#[derive(Debug, Clone)]
pub struct BackendAccess {
    pub access_token: String,
}

impl FromRequestParts<AppState> for BackendAccess {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        cookies::get_backend_token(&jar(parts, state))
            .map(|access_token| Self { access_token })
            .ok_or(AuthError::Unauthenticated)
    }
}
