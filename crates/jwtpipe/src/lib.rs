//! jwtpipe - authenticated HTTP client with transparent token renewal.
//!
//! Every request flows through a [`RequestPipeline`], which attaches the
//! stored access token, notices when the server rejects it (HTTP 401),
//! renews it once from the refresh token and retries the request. Concurrent
//! requests that expire together share a single renewal exchange. When
//! renewal is impossible the credentials are cleared and callers receive
//! [`Error::SessionExpired`].
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use jwtpipe::{ApiUrl, AuthSession, ClientConfig, Credentials, MemoryStore};
//!
//! # async fn example() -> Result<(), jwtpipe::Error> {
//! let config = ClientConfig::new(ApiUrl::new("http://localhost:8000/api")?);
//! let session = AuthSession::connect(&config, Arc::new(MemoryStore::new()))?;
//!
//! session.login(&Credentials::new("alice", "pw")).await?;
//! let weather = session.weather().current("London").await?;
//! println!("{}: {}°C", weather.city, weather.temperature);
//!
//! session.logout().await;
//! # Ok(())
//! # }
//! ```

pub mod api;
mod classify;
pub mod config;
pub mod endpoints;
pub mod pipeline;
pub mod renewal;
pub mod session;
pub mod store;

#[cfg(test)]
mod mock;

pub use config::ClientConfig;
pub use pipeline::{Payload, RequestOptions, RequestPipeline};
pub use renewal::{RenewalCoordinator, RenewalOutcome};
pub use session::AuthSession;
pub use store::MemoryStore;

pub use jwtpipe_core::error;
pub use jwtpipe_core::{
    AccessToken, ApiUrl, CredentialStore, Credentials, Error, HeaderMap, HeaderName, HeaderValue,
    HttpRequest, HttpResponse, Method, RefreshToken, Result, TokenKind, TokenPair, Transport,
    header,
};
pub use tokio_util::sync::CancellationToken;
