//! API Error Types
//!
//! Errors surfaced by the HTTP client. A failed call is handed back to the
//! caller exactly as the transport produced it; interceptors may observe it
//! but never rewrite it.

use thiserror::Error;

/// HTTP status signalling a rejected credential
pub const UNAUTHORIZED: u16 = 401;

/// Errors that can occur when issuing a call
#[derive(Error, Debug)]
pub enum ApiError {
    /// The server answered with a non-2xx status
    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    /// The call never produced a response (connect, timeout, protocol)
    #[error("Request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The request could not be assembled (bad URL, bad header value)
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// The response body could not be decoded
    #[error("Decode error: {0}")]
    Decode(String),
}

impl ApiError {
    /// Status code carried by the failure, if the server answered at all
    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            ApiError::Transport(e) => e.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Whether this is an authentication-rejected failure
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Status { status, .. } if *status == UNAUTHORIZED)
    }
}

impl From<serde_json::Error> for ApiError {
    fn from(err: serde_json::Error) -> Self {
        ApiError::Decode(err.to_string())
    }
}

/// Result type alias for API calls
pub type ApiResult<T> = Result<T, ApiError>;
