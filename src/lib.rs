//! Humor Project web application: allow-listed table listings, caption voting,
//! and a Google sign-in flow using PKCE, optionally delegated to a Supabase
//! backend, that gates one page.
//!
//! The library exposes the building blocks ([`pkce`], [`oauth`], [`backend`])
//! and the assembled Axum application in [`web`].

pub mod backend;
pub mod error;
pub mod oauth;
pub mod pkce;
pub mod tables;
pub mod types;
pub mod web;

// Re-exports for convenient access
pub use backend::{BackendClient, BackendConfig, BackendSession, BackendUser};
pub use error::Error;
pub use oauth::{AuthClient, AuthorizationParams, AuthorizationRequest, OAuthConfig, TokenResponse};
pub use pkce::{PkcePair, compute_code_challenge, generate_code_verifier, generate_state};
pub use tables::TableCatalog;
pub use types::{CaptionId, PendingExchange, Row, UserId, Vote, VoteValue};
