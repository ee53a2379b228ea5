//! Error types for the evaluation and dispatch phases.
//!
//! None of these are fatal: a `FetchError` drops one location from the
//! current cycle, while `RegistryError` and `TransportError` abort only the
//! dispatch step. An `AuthError` surfaces through whichever of the two
//! needed the token.

use thiserror::Error;

/// Failure to obtain usable wave data for a single location.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("weather request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("weather request timed out")]
    Timeout,

    #[error("weather provider returned status {status}")]
    Status { status: u16 },

    #[error("failed to decode weather response: {0}")]
    Decode(String),

    #[error(
        "mismatched series lengths: {times} timestamps, {heights} heights, {periods} periods"
    )]
    LengthMismatch {
        times: usize,
        heights: usize,
        periods: usize,
    },

    #[error("invalid timestamp {value:?}: {reason}")]
    InvalidTimestamp { value: String, reason: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout
        } else if e.is_decode() {
            FetchError::Decode(e.to_string())
        } else {
            FetchError::Http(e)
        }
    }
}

/// Failure to obtain a Google API access token.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("token request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode token response: {0}")]
    Decode(String),
}

/// Failure to read the recipient tokens.
#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("token registry request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("token registry returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode token registry response: {0}")]
    Decode(String),

    #[error("token registry credentials unavailable: {0}")]
    Auth(#[from] AuthError),
}

/// Failure of the push transport call as a whole.
#[derive(Error, Debug)]
pub enum TransportError {
    #[error("push request failed: {0}")]
    Http(#[source] reqwest::Error),

    #[error("push request timed out")]
    Timeout,

    #[error("push endpoint returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to decode push response: {0}")]
    Decode(String),

    #[error("push credentials unavailable: {0}")]
    Auth(#[from] AuthError),
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            TransportError::Timeout
        } else if e.is_decode() {
            TransportError::Decode(e.to_string())
        } else {
            TransportError::Http(e)
        }
    }
}
