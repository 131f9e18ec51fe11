//! HTTP transport trait.

use async_trait::async_trait;

use crate::Result;
use crate::exchange::{HttpRequest, HttpResponse};

/// Performs a single HTTP request/response exchange.
///
/// Implementations own timeouts, TLS and connection pooling. Any response
/// that arrives, whatever its status, is `Ok`; only failures to complete the
/// exchange are errors (typically [`crate::Error::Network`]).
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse>;
}

