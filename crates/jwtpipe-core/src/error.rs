//! Error types for jwtpipe.
//!
//! This module provides a unified error type with explicit variants for
//! transport failures, API errors, session loss, cancellation, and input
//! validation errors.

use std::fmt;

use serde_json::Value;
use thiserror::Error;

/// Fallback message when an error response carries nothing usable.
pub const GENERIC_API_ERROR: &str = "API request failed";

/// The unified error type for jwtpipe operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Transport-level failure (unreachable host, timeout, malformed response).
    #[error("network error: {0}")]
    Network(#[from] NetworkError),

    /// The server answered with a non-success status.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Renewal was attempted and failed, or there was nothing to renew with.
    ///
    /// When this is returned the session the request was made under is gone
    /// from the credential store: cleared, or replaced by a newer login.
    #[error("session expired")]
    SessionExpired,

    /// The caller's cancellation token fired before the exchange completed.
    #[error("request cancelled")]
    Cancelled,

    /// Input validation errors (bad URL, header value, body shape).
    #[error("invalid input: {0}")]
    InvalidInput(#[from] InvalidInputError),
}

impl Error {
    /// Returns true if this error means the user has to log in again.
    pub fn is_session_expired(&self) -> bool {
        matches!(self, Error::SessionExpired)
    }
}

/// Transport-level errors.
#[derive(Debug, Error)]
pub enum NetworkError {
    /// Network connection failed.
    #[error("connection failed: {message}")]
    Connection { message: String },

    /// Request timed out.
    #[error("request timed out: {message}")]
    Timeout { message: String },

    /// Generic HTTP error.
    #[error("HTTP error: {message}")]
    Http { message: String },

    /// The server's response could not be decoded.
    #[error("malformed response: {message}")]
    MalformedResponse { message: String },
}

/// A non-success response from the API.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// HTTP status code.
    pub status: u16,
    /// Human readable message (`detail`, then `message`, else a generic label).
    pub message: String,
    /// The decoded error body, preserved verbatim when it was JSON.
    pub payload: Option<Value>,
}

impl ApiError {
    /// Build an error from a decoded JSON error body.
    pub fn from_payload(status: u16, payload: Value) -> Self {
        let message = payload
            .get("detail")
            .and_then(message_text)
            .or_else(|| payload.get("message").and_then(message_text))
            .unwrap_or_else(|| GENERIC_API_ERROR.to_string());

        Self {
            status,
            message,
            payload: Some(payload),
        }
    }

    /// Build an error for a response whose body could not be decoded.
    pub fn generic(status: u16) -> Self {
        Self {
            status,
            message: GENERIC_API_ERROR.to_string(),
            payload: None,
        }
    }

    /// Check if this is a 401 response.
    pub fn is_unauthorized(&self) -> bool {
        self.status == 401
    }
}

fn message_text(value: &Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::String(s) if s.is_empty() => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HTTP {}: {}", self.status, self.message)
    }
}

impl std::error::Error for ApiError {}

/// Input validation errors.
#[derive(Debug, Error)]
pub enum InvalidInputError {
    /// Invalid API base URL.
    #[error("invalid API URL '{value}': {reason}")]
    ApiUrl { value: String, reason: String },

    /// A header name or value that cannot be sent.
    #[error("invalid header '{name}': {reason}")]
    Header { name: String, reason: String },

    /// A request or response body did not match the expected shape.
    #[error("body does not match expected type: {message}")]
    Body { message: String },

    /// Generic invalid input.
    #[error("invalid input: {message}")]
    Other { message: String },
}

impl From<serde_json::Error> for InvalidInputError {
    fn from(err: serde_json::Error) -> Self {
        InvalidInputError::Body {
            message: err.to_string(),
        }
    }
}
