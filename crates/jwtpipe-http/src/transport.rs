//! reqwest transport implementation.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, instrument, trace};

use jwtpipe_core::error::{Error, NetworkError};
use jwtpipe_core::{HttpRequest, HttpResponse, Result, Transport};

use crate::error::network_error;

/// Timeout applied to every exchange unless configured otherwise.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// User agent sent with every exchange unless configured otherwise.
pub const DEFAULT_USER_AGENT: &str = concat!("jwtpipe/", env!("CARGO_PKG_VERSION"));

/// HTTP transport backed by a pooled [`reqwest::Client`].
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    /// Create a transport with the default timeout and user agent.
    pub fn new() -> Result<Self> {
        Self::with_options(DEFAULT_TIMEOUT, DEFAULT_USER_AGENT)
    }

    /// Create a transport with a custom timeout and user agent.
    pub fn with_options(timeout: Duration, user_agent: &str) -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .map_err(|e| Error::Network(network_error(e)))?;

        Ok(Self { client })
    }

    /// Wrap an existing client, keeping its configuration.
    pub fn from_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, request), fields(method = %request.method, url = %request.url))]
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        debug!("HTTP exchange");

        let mut builder = self
            .client
            .request(request.method, &request.url)
            .headers(request.headers);
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(network_error(e)))?;

        let status = response.status().as_u16();
        let headers = response.headers().clone();

        let body = response.bytes().await.map_err(|e| {
            Error::Network(NetworkError::MalformedResponse {
                message: format!("failed to read response body: {}", e),
            })
        })?;

        trace!(status, bytes = body.len(), "HTTP response");

        Ok(HttpResponse {
            status,
            headers,
            body: body.to_vec(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jwtpipe_core::header::CONTENT_TYPE;
    use jwtpipe_core::{HeaderValue, Method};
    use serde_json::json;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn sends_method_headers_and_body() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/api/auth/login/"))
            .and(header("content-type", "application/json"))
            .and(header("x-trace", "abc"))
            .and(body_json(json!({"username": "alice", "password": "pw"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"ok": true})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let mut request = HttpRequest::new(Method::POST, format!("{}/api/auth/login/", server.uri()));
        request
            .headers
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request
            .headers
            .insert("x-trace", HeaderValue::from_static("abc"));
        request.body = Some(br#"{"username":"alice","password":"pw"}"#.to_vec());

        let response = transport.send(request).await.unwrap();
        assert_eq!(response.status, 200);
        assert!(response.is_json());
        let body: serde_json::Value = serde_json::from_slice(&response.body).unwrap();
        assert_eq!(body, json!({"ok": true}));
    }

    #[tokio::test]
    async fn error_statuses_are_responses_not_errors() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/missing"))
            .respond_with(ResponseTemplate::new(404).set_body_string("not here"))
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(HttpRequest::new(Method::GET, format!("{}/missing", server.uri())))
            .await
            .unwrap();

        assert_eq!(response.status, 404);
        assert_eq!(response.body, b"not here");
    }

    #[tokio::test]
    async fn unreachable_host_is_network_error() {
        // Bind and drop a listener so the port is almost certainly closed.
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let transport = ReqwestTransport::new().unwrap();
        let result = transport
            .send(HttpRequest::new(Method::GET, format!("http://127.0.0.1:{}/", port)))
            .await;

        assert!(matches!(result, Err(Error::Network(_))));
    }

    #[tokio::test]
    async fn timeout_is_reported() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let transport =
            ReqwestTransport::with_options(Duration::from_millis(50), DEFAULT_USER_AGENT).unwrap();
        let result = transport
            .send(HttpRequest::new(Method::GET, server.uri()))
            .await;

        assert!(matches!(
            result,
            Err(Error::Network(NetworkError::Timeout { .. }))
        ));
    }

    #[tokio::test]
    async fn response_headers_arrive_intact() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(204)
                    .append_header("set-cookie", "a=1")
                    .append_header("set-cookie", "b=2")
                    .insert_header("x-opaque", &b"\xfe\xff"[..]),
            )
            .mount(&server)
            .await;

        let transport = ReqwestTransport::new().unwrap();
        let response = transport
            .send(HttpRequest::new(Method::GET, server.uri()))
            .await
            .unwrap();

        assert_eq!(response.headers.get_all("set-cookie").iter().count(), 2);
        assert_eq!(response.headers["x-opaque"].as_bytes(), b"\xfe\xff");
    }
}
