//! Response decoding shared by the pipeline and the renewal exchange.

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::trace;

use jwtpipe_core::error::{ApiError, Error, NetworkError};
use jwtpipe_core::{HttpResponse, Result};

use crate::pipeline::Payload;

/// Status the API answers with when a bearer token is missing, invalid or expired.
pub(crate) const UNAUTHORIZED: u16 = 401;

/// Turn a response into the final result of the request that issued it.
///
/// A 401 reaching this point is an ordinary [`ApiError`]; whether it may be
/// renewed instead is the caller's decision.
pub(crate) fn settle(response: HttpResponse) -> Result<Payload> {
    trace!(status = response.status, "settling response");

    if response.is_success() {
        decode_payload(response)
    } else {
        Err(Error::Api(api_error(&response)))
    }
}

/// Decode a successful body: JSON when announced, text otherwise.
pub(crate) fn decode_payload(response: HttpResponse) -> Result<Payload> {
    if response.body.is_empty() {
        return Ok(Payload::Empty);
    }

    if response.is_json() {
        return serde_json::from_slice::<Value>(&response.body)
            .map(Payload::Json)
            .map_err(|e| malformed(format!("invalid JSON body: {}", e)));
    }

    String::from_utf8(response.body)
        .map(Payload::Text)
        .map_err(|e| malformed(format!("body is not UTF-8: {}", e)))
}

/// Decode a successful JSON body straight into `T`.
///
/// Non-success statuses become [`ApiError`]s; bodies of the wrong shape are
/// malformed responses.
pub(crate) fn decode_json<T: DeserializeOwned>(response: HttpResponse) -> Result<T> {
    if !response.is_success() {
        return Err(Error::Api(api_error(&response)));
    }

    serde_json::from_slice(&response.body)
        .map_err(|e| malformed(format!("unexpected response body: {}", e)))
}

/// Build the error for a non-success response.
pub(crate) fn api_error(response: &HttpResponse) -> ApiError {
    if response.is_json()
        && let Ok(payload) = serde_json::from_slice::<Value>(&response.body)
    {
        return ApiError::from_payload(response.status, payload);
    }
    ApiError::generic(response.status)
}

fn malformed(message: String) -> Error {
    Error::Network(NetworkError::MalformedResponse { message })
}
