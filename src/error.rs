#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// A remote endpoint (identity provider or backend) answered with a non-success status.
    #[error("{operation} failed (status {status:?}): {detail}")]
    Upstream {
        operation: &'static str,
        status: Option<u16>,
        detail: String,
    },
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("secure random source unavailable: {0}")]
    Entropy(String),
    #[error("malformed pending exchange: {0}")]
    Payload(String),
    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),
    #[error("vote value must be 1 or -1, got {0}")]
    InvalidVote(i64),
}
