//! jwtpipe-core - Core types and traits for the jwtpipe client.

pub mod credentials;
pub mod error;
pub mod exchange;
pub mod tokens;
pub mod traits;
pub mod types;

pub use credentials::Credentials;
pub use error::Error;
pub use exchange::{HttpRequest, HttpResponse};
pub use http::{HeaderMap, HeaderName, HeaderValue, Method, header};
pub use tokens::{AccessToken, RefreshToken, TokenKind, TokenPair};
pub use traits::{CredentialStore, Transport};
pub use types::ApiUrl;

/// Result type alias using the crate's Error type.
pub type Result<T> = std::result::Result<T, Error>;
