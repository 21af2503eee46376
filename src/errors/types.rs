//! Error type definitions for the avatar proxy
//!
//! This module defines all error types used throughout the application,
//! providing a hierarchical error system that maps cleanly onto the HTTP
//! status codes the web layer surfaces.

use thiserror::Error;

/// Result alias used by the service layer.
pub type AppResult<T> = Result<T, AppError>;

/// Top-level application error type
///
/// This enum represents all possible failures a single request can hit.
/// It uses `thiserror` to provide automatic error trait implementations and
/// proper error chaining. A failure here is scoped to one request; it never
/// takes down the process or other in-flight requests.
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing user identifier
    #[error("Bad request: {message}")]
    BadRequest { message: String },

    /// Admission control rejected the request for this window
    #[error("Rate limited")]
    RateLimited,

    /// The client key could not be determined; admission fails closed
    #[error("Client could not be identified")]
    ClientUnidentified,

    /// Upstream confirms the identifier does not exist
    #[error("Not found: user {user_id}")]
    NotFound { user_id: String },

    /// Upstream directory errors
    #[error("Upstream error: {0}")]
    Upstream(#[from] UpstreamError),

    /// Configuration errors
    #[error("Configuration error: {message}")]
    Configuration { message: String },

    /// Generic internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Upstream directory client specific errors
#[derive(Error, Debug)]
pub enum UpstreamError {
    /// Request exceeded its bounded timeout
    #[error("Connection timeout: {url}")]
    Timeout { url: String },

    /// Non-success HTTP status from the upstream
    #[error("HTTP error: {status}")]
    Http { status: u16 },

    /// Transport-level failures (DNS, TLS, connection reset, ...)
    #[error("Transport error: {0}")]
    Transport(#[source] reqwest::Error),

    /// Response body did not match the expected shape
    #[error("Malformed upstream response: {message}")]
    Decode { message: String },

    /// Upstream reports no such user; mapped to `AppError::NotFound` by the
    /// pipeline, never cached
    #[error("User not present upstream")]
    MissingUser,
}

/// Convenience methods for creating common error types
impl AppError {
    /// Create a bad request error with a custom message
    pub fn bad_request<S: Into<String>>(message: S) -> Self {
        Self::BadRequest {
            message: message.into(),
        }
    }

    /// Create a not found error for a specific user
    pub fn not_found<S: Into<String>>(user_id: S) -> Self {
        Self::NotFound {
            user_id: user_id.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration<S: Into<String>>(message: S) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an internal error
    pub fn internal<S: Into<String>>(message: S) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }
}

impl UpstreamError {
    /// Classify a `reqwest` failure, folding timeouts into their own variant.
    pub fn from_request_error(error: reqwest::Error, url: &str) -> Self {
        if error.is_timeout() {
            Self::Timeout {
                url: url.to_string(),
            }
        } else {
            Self::Transport(error)
        }
    }

    /// Create a decode error
    pub fn decode<S: Into<String>>(message: S) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }
}
