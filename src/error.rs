//! Crate error types
//!
//! One taxonomy for everything the upstream-facing layers can fail with.
//! The route/page layer maps these onto error pages or JSON envelopes;
//! nothing in this crate retries automatically.

use thiserror::Error;

use crate::cache::CacheError;

#[derive(Error, Debug)]
pub enum ApiError {
    /// Required configuration is missing or invalid (e.g. credential
    /// environment variables). Raised by the first operation that needs
    /// the value, not at process start.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// The login endpoint rejected the credentials, was unreachable, or
    /// returned a response that is not a token.
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The request never produced an HTTP response (connect failure,
    /// timeout, protocol error).
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// An authenticated call returned a non-2xx status.
    #[error("upstream returned HTTP {status}: {body}")]
    Http { status: u16, body: String },

    /// The response body was not the JSON shape the endpoint promises.
    /// `body` carries the raw text for diagnostics.
    #[error("invalid response from {url}: {message}")]
    Parse {
        url: String,
        message: String,
        body: String,
    },

    /// A dependent call ran before the school prerequisite resolved.
    #[error("school resolution incomplete: {0}")]
    Resolution(String),

    #[error(transparent)]
    Cache(#[from] CacheError),
}
