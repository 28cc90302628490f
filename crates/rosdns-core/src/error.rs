//! Error types for the rosdns system
//!
//! This module defines all error types used throughout the crate.

use crate::endpoint::AppliedRecord;
use thiserror::Error;

/// Result type alias for rosdns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the rosdns system
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input (malformed target, unsupported record kind)
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The remote API answered with a status outside 200..=299
    ///
    /// The response body is kept for diagnostics only; it is never parsed.
    #[error("Request failed: {method} {path} returned {status}")]
    Request {
        /// HTTP method of the failed request
        method: String,
        /// Path relative to the REST root
        path: String,
        /// HTTP status code
        status: u16,
        /// Raw response body
        body: String,
    },

    /// Network-level failures (unreachable host, TLS, timeout)
    #[error("HTTP error: {0}")]
    Http(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A multi-target apply stopped at the first failing record
    ///
    /// Records in `created` exist on the remote side; nothing is rolled back.
    #[error("Created {} of {total} records before failure: {source}", .created.len())]
    PartialApply {
        /// Records created before the failure
        created: Vec<AppliedRecord>,
        /// Number of records the endpoint asked for
        total: usize,
        /// The failure that stopped the pipeline
        source: Box<Error>,
    },

    /// Provider-specific error
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Generic error with context
    #[error("{0}")]
    Other(String),
}

impl Error {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create a request failure for a non-2xx response
    pub fn request(
        method: impl Into<String>,
        path: impl Into<String>,
        status: u16,
        body: impl Into<String>,
    ) -> Self {
        Self::Request {
            method: method.into(),
            path: path.into(),
            status,
            body: body.into(),
        }
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// HTTP status of a failed request, if this error carries one
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request { status, .. } => Some(*status),
            Self::PartialApply { source, .. } => source.status(),
            _ => None,
        }
    }

    /// Records that were created before a partial apply failed
    pub fn partially_created(&self) -> &[AppliedRecord] {
        match self {
            Self::PartialApply { created, .. } => created,
            _ => &[],
        }
    }
}

/// Helper for converting anyhow::Error to our Error type
impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Self::Other(err.to_string())
    }
}
