use axum_extra::extract::PrivateCookieJar;
use axum_extra::extract::cookie::{Cookie, SameSite};
use time::Duration;

/// Pending-exchange cookie (PKCE verifier, state and redirect targets).
pub const PENDING_COOKIE: &str = "ak_oauth_pkce";
/// Application session marker.
pub const SESSION_COOKIE: &str = "ak_oauth_session";
/// Backend access token, present only after a delegated exchange.
pub const BACKEND_SESSION_COOKIE: &str = "ak_backend_session";

pub const PENDING_MAX_AGE: Duration = Duration::minutes(10);
pub const SESSION_MAX_AGE: Duration = Duration::days(7);
const BACKEND_DEFAULT_MAX_AGE: Duration = Duration::hours(1);

const SESSION_MARKER: &str = "1";

fn http_only(name: &'static str, value: String, secure: bool, max_age: Duration) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Create the pending-exchange cookie from an encoded payload.
pub(super) fn pending_cookie(payload: String, secure: bool) -> Cookie<'static> {
    http_only(PENDING_COOKIE, payload, secure, PENDING_MAX_AGE)
}

/// Create the session marker cookie. Carries no claims.
pub(super) fn session_cookie(secure: bool) -> Cookie<'static> {
    http_only(SESSION_COOKIE, SESSION_MARKER.to_string(), secure, SESSION_MAX_AGE)
}

/// Create the backend session cookie, living no longer than the token (capped at the session age).
pub(super) fn backend_session_cookie(
    access_token: &str,
    expires_in: Option<u64>,
    secure: bool,
) -> Cookie<'static> {
    let max_age = expires_in
        .map_or(BACKEND_DEFAULT_MAX_AGE, |secs| {
            Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX))
        })
        .min(SESSION_MAX_AGE);
    http_only(BACKEND_SESSION_COOKIE, access_token.to_string(), secure, max_age)
}

/// Removal cookie matching the path the named cookie was set on.
pub(super) fn removal(name: &'static str) -> Cookie<'static> {
    Cookie::build(name).path("/").build()
}

/// Raw pending-exchange payload, if the cookie decrypted.
pub(super) fn get_pending(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(PENDING_COOKIE).map(|c| c.value().to_string())
}

/// True when a valid (decryptable, non-empty) session marker is present.
pub(super) fn has_session(jar: &PrivateCookieJar) -> bool {
    jar.get(SESSION_COOKIE)
        .is_some_and(|c| !c.value().is_empty())
}

pub(super) fn get_backend_token(jar: &PrivateCookieJar) -> Option<String> {
    jar.get(BACKEND_SESSION_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|v| !v.is_empty())
}
