//! Configuration for the CloudSave client.

use std::time::Duration;

/// Default prefix for structured record keys.
pub const DEFAULT_RECORD_PREFIX: &str = "book_";

/// Configuration for a client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Project the client belongs to.
    pub project_id: String,
    /// Environment name.
    pub environment: String,
    /// Service base URL, read by [`HttpBackend::from_config`](crate::HttpBackend::from_config).
    pub base_url: String,
    /// Request timeout handed to the HTTP client. The stores never enforce it.
    pub request_timeout: Duration,
    /// Prefix for structured record keys.
    pub record_prefix: String,
}

impl ClientConfig {
    /// Creates a new client configuration.
    pub fn new(project_id: impl Into<String>, base_url: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            environment: "production".into(),
            base_url: base_url.into(),
            request_timeout: Duration::from_secs(30),
            record_prefix: DEFAULT_RECORD_PREFIX.into(),
        }
    }

    /// Sets the environment name.
    pub fn with_environment(mut self, environment: impl Into<String>) -> Self {
        self.environment = environment.into();
        self
    }

    /// Sets the request timeout.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    /// Sets the record key prefix.
    pub fn with_record_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.record_prefix = prefix.into();
        self
    }
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self::new("", "")
    }
}
