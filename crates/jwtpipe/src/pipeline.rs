//! The authenticated request pipeline.
//!
//! Each call moves through `Building -> Sent -> (Success | Expired)`. An
//! expired first attempt is renewed through the [`RenewalCoordinator`] and
//! retried exactly once; a second 401 is final.

use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument};

use jwtpipe_core::error::{Error, InvalidInputError};
use jwtpipe_core::header::{AUTHORIZATION, CONTENT_TYPE};
use jwtpipe_core::{
    AccessToken, ApiUrl, CredentialStore, HeaderMap, HeaderName, HeaderValue, HttpRequest,
    HttpResponse, Method, Result, Transport,
};

use crate::classify::{UNAUTHORIZED, settle};
use crate::renewal::{RenewalCoordinator, RenewalOutcome};

const JSON: &str = "application/json";

/// A decoded success body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Body announced as JSON.
    Json(Value),
    /// Any other body, as text.
    Text(String),
    /// No body at all.
    Empty,
}

impl Payload {
    /// Deserialize the payload. Text becomes a JSON string, empty becomes null.
    pub fn decode<T: DeserializeOwned>(self) -> Result<T> {
        serde_json::from_value(self.into_json())
            .map_err(|e| Error::InvalidInput(InvalidInputError::from(e)))
    }

    pub fn into_json(self) -> Value {
        match self {
            Payload::Json(value) => value,
            Payload::Text(text) => Value::String(text),
            Payload::Empty => Value::Null,
        }
    }
}

/// Per-call options.
#[derive(Debug, Clone, Default)]
pub struct RequestOptions {
    /// Extra headers, layered over the `Content-Type` default.
    ///
    /// `Authorization` is owned by the pipeline and is always dropped.
    pub headers: HeaderMap,
    /// Cancels the first attempt, the wait for renewal and the retry.
    pub cancel: Option<CancellationToken>,
}

impl RequestOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set a header, replacing any value set earlier under the same name.
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    pub fn cancel_on(mut self, token: CancellationToken) -> Self {
        self.cancel = Some(token);
        self
    }
}

/// Sends requests with the stored access token and renews it on expiry.
///
/// Cheap to clone; clones share the store, transport and renewal state.
#[derive(Clone)]
pub struct RequestPipeline {
    inner: Arc<PipelineInner>,
}

struct PipelineInner {
    api: ApiUrl,
    transport: Arc<dyn Transport>,
    store: Arc<dyn CredentialStore>,
    renewal: RenewalCoordinator,
}

impl RequestPipeline {
    pub fn new(
        api: ApiUrl,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        let renewal = RenewalCoordinator::new(&api, Arc::clone(&transport), Arc::clone(&store));
        Self {
            inner: Arc::new(PipelineInner {
                api,
                transport,
                store,
                renewal,
            }),
        }
    }

    /// Returns the base URL requests are sent to.
    pub fn api(&self) -> &ApiUrl {
        &self.inner.api
    }

    /// Returns the credential store shared with the renewal coordinator.
    pub fn store(&self) -> &Arc<dyn CredentialStore> {
        &self.inner.store
    }

    pub fn renewal(&self) -> &RenewalCoordinator {
        &self.inner.renewal
    }

    /// Send an authenticated request.
    ///
    /// # Errors
    ///
    /// - [`Error::Network`] when an exchange could not complete
    /// - [`Error::Api`] for non-success responses, including a 401 on the retry
    ///   or on a request that carried no token
    /// - [`Error::SessionExpired`] when the token expired and renewal failed;
    ///   the session the request was made under is gone from the store
    /// - [`Error::Cancelled`] when `options.cancel` fired
    #[instrument(skip_all, fields(%method, path = %path))]
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
        options: RequestOptions,
    ) -> Result<Payload> {
        let url = self.inner.api.endpoint(path);
        let sent_with = self.inner.store.access_token();

        let request = build(
            method.clone(),
            &url,
            body.as_deref(),
            &options.headers,
            sent_with.as_ref(),
        )?;
        let response = self.dispatch(request, options.cancel.as_ref()).await?;

        // A 401 is renewable only when the request carried a token.
        let stale = match sent_with {
            Some(stale) if response.status == UNAUTHORIZED => stale,
            _ => return settle(response),
        };

        debug!("Access token rejected");
        let token = self.renewed_token(&stale, options.cancel.as_ref()).await?;

        debug!("Retrying with renewed access token");
        let retry = build(method, &url, body.as_deref(), &options.headers, Some(&token))?;
        let response = self.dispatch(retry, options.cancel.as_ref()).await?;

        settle(response)
    }

    /// Send a request without a bearer token and without renewal.
    ///
    /// Used for login and registration.
    #[instrument(skip_all, fields(%method, path = %path))]
    pub async fn request_anonymous(
        &self,
        method: Method,
        path: &str,
        body: Option<Vec<u8>>,
    ) -> Result<Payload> {
        let url = self.inner.api.endpoint(path);
        let request = build(method, &url, body.as_deref(), &HeaderMap::new(), None)?;
        let response = self.dispatch(request, None).await?;

        settle(response)
    }

    /// Send a request with a JSON body and deserialize the response.
    pub async fn request_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
        options: RequestOptions,
    ) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = body.map(encode).transpose()?;
        self.request(method, path, body, options).await?.decode()
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json::<(), T>(Method::GET, path, None, RequestOptions::default())
            .await
    }

    pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(Method::POST, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        self.request_json(Method::PUT, path, Some(body), RequestOptions::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        self.request_json::<(), T>(Method::DELETE, path, None, RequestOptions::default())
            .await
    }

    /// The token to retry with after `stale` was rejected.
    async fn renewed_token(
        &self,
        stale: &AccessToken,
        cancel: Option<&CancellationToken>,
    ) -> Result<AccessToken> {
        let outcome = match cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                outcome = self.inner.renewal.renew_after(stale) => outcome,
            },
            None => self.inner.renewal.renew_after(stale).await,
        };

        match outcome {
            RenewalOutcome::Renewed(token) => Ok(token),
            RenewalOutcome::Failed => Err(Error::SessionExpired),
        }
    }

    async fn dispatch(
        &self,
        request: HttpRequest,
        cancel: Option<&CancellationToken>,
    ) -> Result<HttpResponse> {
        match cancel {
            Some(cancel) => tokio::select! {
                biased;
                _ = cancel.cancelled() => Err(Error::Cancelled),
                response = self.inner.transport.send(request) => response,
            },
            None => self.inner.transport.send(request).await,
        }
    }
}

impl std::fmt::Debug for RequestPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestPipeline")
            .field("api", &self.inner.api)
            .field("authenticated", &self.inner.store.is_authenticated())
            .finish()
    }
}

/// Build the outgoing request.
///
/// Caller headers override the content type default; the bearer header is
/// always the pipeline's own and is absent without a token.
fn build(
    method: Method,
    url: &str,
    body: Option<&[u8]>,
    caller: &HeaderMap,
    token: Option<&AccessToken>,
) -> Result<HttpRequest> {
    let mut headers = HeaderMap::with_capacity(caller.len() + 2);
    headers.insert(CONTENT_TYPE, HeaderValue::from_static(JSON));
    // Replaces the defaults name by name and keeps repeated caller values.
    headers.extend(caller.clone());
    headers.remove(AUTHORIZATION);
    if let Some(token) = token {
        let mut bearer =
            HeaderValue::from_str(&token.bearer()).map_err(|e| InvalidInputError::Header {
                name: AUTHORIZATION.as_str().to_string(),
                reason: e.to_string(),
            })?;
        bearer.set_sensitive(true);
        headers.insert(AUTHORIZATION, bearer);
    }

    Ok(HttpRequest {
        method,
        url: url.to_string(),
        headers,
        body: body.map(<[u8]>::to_vec),
    })
}

fn encode<B: Serialize + ?Sized>(body: &B) -> Result<Vec<u8>> {
    serde_json::to_vec(body).map_err(|e| Error::InvalidInput(InvalidInputError::from(e)))
}
