//! jwtpipe-http - reqwest-backed [`Transport`](jwtpipe_core::Transport).

mod error;
mod transport;

pub use error::network_error;
pub use transport::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, ReqwestTransport};
