//! Login, logout and registration on top of the request pipeline.

use std::sync::Arc;

use tracing::{debug, info, instrument, warn};

use jwtpipe_core::{
    ApiUrl, CredentialStore, Credentials, Error, Method, Result, TokenPair, Transport,
};
use jwtpipe_http::ReqwestTransport;

use crate::api::{AccountsApi, WeatherApi};
use crate::config::ClientConfig;
use crate::endpoints::{
    LOGIN, LOGOUT, LoginRequest, LoginResponse, NewAccount, REGISTER, RegisterResponse,
};
use crate::pipeline::{RequestOptions, RequestPipeline};

/// An authenticated API client.
///
/// Owns the [`RequestPipeline`] every call goes through. Cheap to clone;
/// clones share credentials and renewal state.
///
/// # Example
///
/// ```no_run
/// use std::sync::Arc;
/// use jwtpipe::{ApiUrl, AuthSession, ClientConfig, Credentials, MemoryStore};
///
/// # async fn example() -> Result<(), jwtpipe::Error> {
/// let config = ClientConfig::new(ApiUrl::new("http://localhost:8000/api")?);
/// let session = AuthSession::connect(&config, Arc::new(MemoryStore::new()))?;
///
/// session.login(&Credentials::new("alice", "pw")).await?;
/// assert!(session.is_authenticated());
/// # Ok(())
/// # }
/// ```
#[derive(Clone, Debug)]
pub struct AuthSession {
    pipeline: RequestPipeline,
}

impl AuthSession {
    pub fn new(
        api: ApiUrl,
        transport: Arc<dyn Transport>,
        store: Arc<dyn CredentialStore>,
    ) -> Self {
        Self {
            pipeline: RequestPipeline::new(api, transport, store),
        }
    }

    /// Build a session over a reqwest transport configured from `config`.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn connect(config: &ClientConfig, store: Arc<dyn CredentialStore>) -> Result<Self> {
        let transport = ReqwestTransport::with_options(config.timeout, &config.user_agent)?;
        Ok(Self::new(config.base_url.clone(), Arc::new(transport), store))
    }

    /// Exchange a username and password for a token pair.
    ///
    /// On failure the store is left exactly as it was.
    ///
    /// # Errors
    ///
    /// - [`Error::Api`] when the server rejects the credentials
    /// - [`Error::Network`] when the server is unreachable
    #[instrument(skip(self, credentials), fields(username = %credentials.username()))]
    pub async fn login(&self, credentials: &Credentials) -> Result<()> {
        info!("Logging in");

        let body = serde_json::to_vec(&LoginRequest {
            username: credentials.username(),
            password: credentials.password(),
        })
        .map_err(|e| Error::InvalidInput(e.into()))?;

        let response: LoginResponse = self
            .pipeline
            .request_anonymous(Method::POST, LOGIN, Some(body))
            .await?
            .decode()?;

        self.pipeline
            .store()
            .set_pair(TokenPair::new(response.access, response.refresh));

        debug!("Login succeeded");
        Ok(())
    }

    /// Create an account. Does not log in.
    #[instrument(skip(self, account), fields(username = %account.username))]
    pub async fn register(&self, account: &NewAccount) -> Result<RegisterResponse> {
        info!("Registering account");

        let body = serde_json::to_vec(account).map_err(|e| Error::InvalidInput(e.into()))?;
        self.pipeline
            .request_anonymous(Method::POST, REGISTER, Some(body))
            .await?
            .decode()
    }

    /// End the session.
    ///
    /// The server is told on a best-effort basis; its answer is ignored.
    /// Credentials are cleared in every case, including when this future is
    /// dropped before it completes.
    pub async fn logout(&self) {
        self.logout_with(RequestOptions::default()).await;
    }

    /// [`logout`](Self::logout) with per-call options such as a cancellation token.
    #[instrument(skip_all)]
    pub async fn logout_with(&self, options: RequestOptions) {
        let _clear = ClearOnDrop(Arc::clone(self.pipeline.store()));

        if !self.is_authenticated() {
            debug!("Not logged in, clearing local credentials only");
            return;
        }

        info!("Logging out");
        if let Err(err) = self
            .pipeline
            .request(Method::POST, LOGOUT, None, options)
            .await
        {
            warn!(error = %err, "Logout request failed, clearing credentials anyway");
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.pipeline.store().is_authenticated()
    }

    /// The pipeline for requests not covered by the typed services.
    pub fn pipeline(&self) -> &RequestPipeline {
        &self.pipeline
    }

    pub fn accounts(&self) -> AccountsApi<'_> {
        AccountsApi::new(&self.pipeline)
    }

    pub fn weather(&self) -> WeatherApi<'_> {
        WeatherApi::new(&self.pipeline)
    }
}

/// Clears the store when dropped.
struct ClearOnDrop(Arc<dyn CredentialStore>);

impl Drop for ClearOnDrop {
    fn drop(&mut self) {
        self.0.clear();
        debug!("Credentials cleared");
    }
}
