//! Server configuration.

use std::collections::BTreeSet;
use std::time::Duration;

/// Configuration for the CloudSave server.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Projects served. Empty accepts any non-empty project id.
    pub projects: BTreeSet<String>,
    /// Maximum entries in one key-value batch.
    pub max_batch_items: usize,
    /// Maximum key and file name length in bytes.
    pub max_key_len: usize,
    /// Maximum file size in bytes.
    pub max_file_bytes: usize,
    /// Secret key for access tokens.
    pub auth_secret: Vec<u8>,
    /// Access token lifetime.
    pub token_expiry: Duration,
}

impl ServerConfig {
    /// Creates a configuration signing tokens with `secret`.
    pub fn new(secret: Vec<u8>) -> Self {
        Self {
            projects: BTreeSet::new(),
            max_batch_items: 20,
            max_key_len: 255,
            max_file_bytes: 10 * 1024 * 1024,
            auth_secret: secret,
            token_expiry: Duration::from_secs(60 * 60),
        }
    }

    /// Restricts the server to a project. May be called repeatedly.
    pub fn with_project(mut self, project_id: impl Into<String>) -> Self {
        self.projects.insert(project_id.into());
        self
    }

    /// Sets the maximum batch size.
    pub fn with_max_batch_items(mut self, max: usize) -> Self {
        self.max_batch_items = max;
        self
    }

    /// Sets the maximum key length.
    pub fn with_max_key_len(mut self, max: usize) -> Self {
        self.max_key_len = max;
        self
    }

    /// Sets the maximum file size.
    pub fn with_max_file_bytes(mut self, max: usize) -> Self {
        self.max_file_bytes = max;
        self
    }

    /// Sets the token lifetime.
    pub fn with_token_expiry(mut self, expiry: Duration) -> Self {
        self.token_expiry = expiry;
        self
    }

    /// Returns true if `project_id` is served.
    pub fn accepts_project(&self, project_id: &str) -> bool {
        !project_id.is_empty() && (self.projects.is_empty() || self.projects.contains(project_id))
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self::new(b"cloudsave-development-secret".to_vec())
    }
}
