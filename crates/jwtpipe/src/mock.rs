//! Scripted transport for unit tests.

use std::future::Future;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures_util::future::{BoxFuture, FutureExt};

use jwtpipe_core::{HttpRequest, HttpResponse, Result, Transport};

type Handler = Box<dyn Fn(HttpRequest) -> BoxFuture<'static, Result<HttpResponse>> + Send + Sync>;

/// Answers every exchange with `handler` and records what was sent.
pub(crate) struct MockTransport {
    handler: Handler,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub(crate) fn new<F, Fut>(handler: F) -> Arc<Self>
    where
        F: Fn(HttpRequest) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<HttpResponse>> + Send + 'static,
    {
        Arc::new(Self {
            handler: Box::new(move |request| handler(request).boxed()),
            requests: Mutex::new(Vec::new()),
        })
    }

    /// A transport that must never be used.
    pub(crate) fn unused() -> Arc<Self> {
        Self::new(|request: HttpRequest| -> std::future::Ready<Result<HttpResponse>> {
            panic!("unexpected exchange: {:?}", request)
        })
    }

    /// All requests sent so far, in order.
    pub(crate) fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Requests sent to URLs ending with `path` (query string ignored).
    pub(crate) fn requests_to(&self, path: &str) -> Vec<HttpRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.url.split('?').next().unwrap_or_default().ends_with(path))
            .collect()
    }

    pub(crate) fn count(&self, path: &str) -> usize {
        self.requests_to(path).len()
    }

    pub(crate) fn total(&self) -> usize {
        self.requests.lock().unwrap().len()
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn send(&self, request: HttpRequest) -> Result<HttpResponse> {
        self.requests.lock().unwrap().push(request.clone());
        (self.handler)(request).await
    }
}
