//! Entry point bundling one session with the stores that share it.

use crate::backend::RemoteBackend;
use crate::config::ClientConfig;
use crate::error::StoreResult;
use crate::files::BlobFileStore;
use crate::kv::KeyValueStore;
use crate::records::RecordStore;
use crate::session::SessionManager;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;

/// A cloud save client for one player.
///
/// Owns the [`SessionManager`] and hands out stores that check its readiness
/// before every call. Cloning is cheap and shares the session.
pub struct CloudSave<B: RemoteBackend> {
    session: Arc<SessionManager<B>>,
}

impl<B: RemoteBackend> Clone for CloudSave<B> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<B: RemoteBackend> CloudSave<B> {
    /// Creates a client. No network call is made until [`initialize`](Self::initialize).
    pub fn new(config: ClientConfig, backend: B) -> Self {
        Self {
            session: Arc::new(SessionManager::new(config, backend)),
        }
    }

    /// Returns the shared session.
    pub fn session(&self) -> &Arc<SessionManager<B>> {
        &self.session
    }

    /// Initializes the service connection.
    pub async fn initialize(&self) -> StoreResult<()> {
        self.session.initialize().await
    }

    /// Signs in anonymously and returns the player id.
    pub async fn sign_in_anonymously(&self) -> StoreResult<String> {
        self.session.sign_in_anonymously().await
    }

    /// Initializes, then signs in.
    pub async fn connect(&self) -> StoreResult<String> {
        self.initialize().await?;
        self.sign_in_anonymously().await
    }

    /// Returns true once the stores may be used.
    pub fn is_ready(&self) -> bool {
        self.session.is_ready()
    }

    /// Returns the key-value store.
    pub fn key_values(&self) -> KeyValueStore<B> {
        KeyValueStore::new(Arc::clone(&self.session))
    }

    /// Returns a record store using the configured prefix.
    pub fn records<R>(&self) -> RecordStore<B, R>
    where
        R: Serialize + DeserializeOwned,
    {
        let prefix = self.session.config().record_prefix.clone();
        self.records_with_prefix(prefix)
    }

    /// Returns a record store using `prefix`.
    pub fn records_with_prefix<R>(&self, prefix: impl Into<String>) -> RecordStore<B, R>
    where
        R: Serialize + DeserializeOwned,
    {
        RecordStore::new(self.key_values(), prefix)
    }

    /// Returns the file store.
    pub fn files(&self) -> BlobFileStore<B> {
        BlobFileStore::new(Arc::clone(&self.session))
    }
}
