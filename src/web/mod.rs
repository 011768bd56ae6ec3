//! Axum surface of the application.
//!
//! # Routes
//!
//! | Method | Path | Purpose |
//! |---|---|---|
//! | `POST` | `/api/auth/authorize` | store client-generated PKCE values, return the Google URL |
//! | `GET` | `/api/auth/login` | server-generated PKCE, redirect to Google |
//! | `GET` | `/auth/callback` | validate state, exchange the code, set the session marker |
//! | `POST` | `/api/auth/callback` | JSON code exchange for client-held verifiers |
//! | `GET`/`POST` | `/api/auth/logout` | clear session cookies |
//! | `GET` | `/assignment-3` | gated page |
//! | `GET` | `/`, `/list`, `/assignment-2?table=` | HTML table listings |
//! | `GET` | `/api/tables`, `/api/rows?table=` | allow-listed table listing |
//! | `POST` | `/api/vote` | record a caption vote for the backend user |
//!
//! ```rust,ignore
//! use humor_project::web::{AppConfig, router};
//!
//! let config = AppConfig::from_env()?;
//! let listener = tokio::net::TcpListener::bind(config.bind_addr()).await?;
//! axum::serve(listener, router(config)).await?;
//! ```

mod config;
mod cookies;
mod error;
mod extractor;
mod html;
mod pages;
mod routes;
mod state;
mod types;

pub use config::{AppConfig, DEFAULT_BIND_ADDR, ExchangeMode};
pub use cookies::{
    BACKEND_SESSION_COOKIE, PENDING_COOKIE, PENDING_MAX_AGE, SESSION_COOKIE, SESSION_MAX_AGE,
};
pub use error::{AuthError, FailureReason};
pub use extractor::{BackendAccess, SignedIn};
pub use routes::{app_routes, router};
pub use state::AppState;
pub use types::{AuthorizeRequest, AuthorizeResponse, ExchangeRequest, VoteRequest};

/// Re-export cookie key type for builder API.
pub use axum_extra::extract::cookie::Key as CookieKey;
