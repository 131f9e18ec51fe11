//! Mapping of reqwest failures onto the jwtpipe error taxonomy.

use jwtpipe_core::error::NetworkError;

/// Classify a reqwest error as a [`NetworkError`].
pub fn network_error(err: reqwest::Error) -> NetworkError {
    if err.is_timeout() {
        NetworkError::Timeout {
            message: err.to_string(),
        }
    } else if err.is_connect() {
        NetworkError::Connection {
            message: err.to_string(),
        }
    } else if err.is_decode() || err.is_body() {
        NetworkError::MalformedResponse {
            message: err.to_string(),
        }
    } else {
        NetworkError::Http {
            message: err.to_string(),
        }
    }
}
