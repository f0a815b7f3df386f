//! Client configuration

use std::time::Duration;

/// Client configuration for connecting to the order server
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Server base URL (e.g., "http://localhost:8080")
    pub base_url: String,

    /// JWT token for authentication
    pub token: Option<String>,

    /// Request timeout in seconds
    pub timeout: u64,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            token: None,
            timeout: 30,
        }
    }

    /// Set the JWT token
    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    /// Set the request timeout
    pub fn with_timeout(mut self, seconds: u64) -> Self {
        self.timeout = seconds;
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("http://localhost:8080")
    }
}

/// Polling interval per consuming view
///
/// | View | Default |
/// |------|---------|
/// | customer tracker | 3s |
/// | kitchen queue | 15s |
/// | server dashboard | 30s |
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollIntervals {
    pub customer: Duration,
    pub kitchen: Duration,
    pub server: Duration,
}

impl Default for PollIntervals {
    fn default() -> Self {
        Self {
            customer: Duration::from_secs(3),
            kitchen: Duration::from_secs(15),
            server: Duration::from_secs(30),
        }
    }
}
