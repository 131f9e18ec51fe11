//! Client configuration.

use std::time::Duration;

use jwtpipe_core::ApiUrl;
use jwtpipe_http::{DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};

/// Settings for a client built with [`AuthSession::connect`](crate::AuthSession::connect).
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Base URL every endpoint path is appended to.
    pub base_url: ApiUrl,
    /// Per-exchange timeout enforced by the transport.
    pub timeout: Duration,
    /// User agent sent with every exchange.
    pub user_agent: String,
}

impl ClientConfig {
    pub fn new(base_url: ApiUrl) -> Self {
        Self {
            base_url,
            timeout: DEFAULT_TIMEOUT,
            user_agent: DEFAULT_USER_AGENT.to_string(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }
}
