//! Key-value store over the player's flat namespace.

use crate::backend::RemoteBackend;
use crate::error::{StoreError, StoreResult};
use crate::session::SessionManager;
use cloudsave_protocol::{DeleteItemRequest, LoadItemsRequest, SaveItemsRequest, Scalar};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::debug;

/// Rejects empty keys before any network call.
pub(crate) fn require_key(key: &str, what: &str) -> StoreResult<()> {
    if key.is_empty() {
        return Err(StoreError::validation(format!("{} must not be empty", what)));
    }
    Ok(())
}

/// Reads and writes scalar values under string keys.
///
/// Every call checks the session gate first, then validates input locally,
/// then issues exactly one remote call.
pub struct KeyValueStore<B: RemoteBackend> {
    session: Arc<SessionManager<B>>,
}

impl<B: RemoteBackend> Clone for KeyValueStore<B> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<B: RemoteBackend> KeyValueStore<B> {
    /// Creates a store sharing the given session.
    pub fn new(session: Arc<SessionManager<B>>) -> Self {
        Self { session }
    }

    /// Returns the session this store checks before every call.
    pub fn session(&self) -> &Arc<SessionManager<B>> {
        &self.session
    }

    /// Writes a batch of entries in one remote call.
    ///
    /// Existing keys are overwritten, new keys are created. The batch
    /// succeeds or fails as a unit.
    pub async fn save<I, K, V>(&self, entries: I) -> StoreResult<()>
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Scalar>,
    {
        let credentials = self.session.credentials()?;

        let items: BTreeMap<String, Scalar> = entries
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        if items.is_empty() {
            return Err(StoreError::validation("nothing to save"));
        }
        for key in items.keys() {
            require_key(key, "key")?;
        }

        debug!(count = items.len(), "saving key-value entries");
        let request = SaveItemsRequest { items };
        self.session
            .backend()
            .save_items(credentials.access_token(), &request)
            .await
            .map_err(|e| e.into_store(&joined_keys(request.items.keys())))
    }

    /// Writes a single entry.
    pub async fn save_one(
        &self,
        key: impl Into<String>,
        value: impl Into<Scalar>,
    ) -> StoreResult<()> {
        self.save([(key.into(), value.into())]).await
    }

    /// Reads a batch of keys in one remote call.
    ///
    /// Keys that do not exist remotely are absent from the result. An empty
    /// key set yields an empty map without a network call.
    pub async fn load<I, K>(&self, keys: I) -> StoreResult<BTreeMap<String, Scalar>>
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        let credentials = self.session.credentials()?;

        let keys: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
        for key in &keys {
            require_key(key, "key")?;
        }
        if keys.is_empty() {
            return Ok(BTreeMap::new());
        }

        debug!(count = keys.len(), "loading key-value entries");
        let request = LoadItemsRequest { keys };
        let mut response = self
            .session
            .backend()
            .load_items(credentials.access_token(), &request)
            .await
            .map_err(|e| e.into_store(&joined_keys(request.keys.iter())))?;

        response.items.retain(|key, _| request.keys.contains(key));
        Ok(response.items)
    }

    /// Reads a single key.
    pub async fn load_one(&self, key: impl Into<String>) -> StoreResult<Option<Scalar>> {
        let key = key.into();
        let mut items = self.load([key.clone()]).await?;
        Ok(items.remove(&key))
    }

    /// Deletes a key. Deleting an absent key fails with `NotFound`.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let credentials = self.session.credentials()?;
        require_key(key, "key")?;

        debug!(key, "deleting key-value entry");
        let request = DeleteItemRequest {
            key: key.to_string(),
        };
        self.session
            .backend()
            .delete_item(credentials.access_token(), &request)
            .await
            .map_err(|e| e.into_store(key))
    }
}

fn joined_keys<'a>(keys: impl Iterator<Item = &'a String>) -> String {
    keys.map(String::as_str).collect::<Vec<_>>().join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::Operation;
    use crate::config::ClientConfig;
    use crate::error::{BackendError, ErrorKind};
    use crate::memory::MemoryBackend;
    use cloudsave_protocol::{RemoteError, RemoteErrorCode};

    async fn ready_store() -> (KeyValueStore<Arc<MemoryBackend>>, Arc<MemoryBackend>) {
        let backend = Arc::new(MemoryBackend::new());
        let session = Arc::new(SessionManager::new(
            ClientConfig::new("project-1", "memory://"),
            Arc::clone(&backend),
        ));
        session.initialize().await.unwrap();
        session.sign_in_anonymously().await.unwrap();
        (KeyValueStore::new(session), backend)
    }

    #[tokio::test]
    async fn save_then_load() {
        let (store, _) = ready_store().await;

        store
            .save([("playerName", Scalar::from("Paul")), ("alias", Scalar::from("Muad'Dib"))])
            .await
            .unwrap();

        let loaded = store.load(["playerName", "alias"]).await.unwrap();
        assert_eq!(loaded.get("playerName"), Some(&Scalar::from("Paul")));
        assert_eq!(loaded.get("alias"), Some(&Scalar::from("Muad'Dib")));
    }

    #[tokio::test]
    async fn save_is_one_batched_call() {
        let (store, backend) = ready_store().await;
        store.save([("a", 1), ("b", 2), ("c", 3)]).await.unwrap();
        assert_eq!(backend.calls(Operation::SaveItems), 1);
    }

    #[tokio::test]
    async fn save_overwrites() {
        let (store, _) = ready_store().await;
        store.save_one("level", 3).await.unwrap();
        store.save_one("level", 4).await.unwrap();

        assert_eq!(store.load_one("level").await.unwrap(), Some(Scalar::from(4)));
    }

    #[tokio::test]
    async fn missing_keys_are_omitted() {
        let (store, _) = ready_store().await;
        store.save_one("present", true).await.unwrap();

        let loaded = store.load(["present", "absent"]).await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert!(!loaded.contains_key("absent"));
        assert_eq!(store.load_one("absent").await.unwrap(), None);
    }

    #[tokio::test]
    async fn empty_load_skips_network() {
        let (store, backend) = ready_store().await;
        let loaded = store.load(Vec::<String>::new()).await.unwrap();
        assert!(loaded.is_empty());
        assert_eq!(backend.calls(Operation::LoadItems), 0);
    }

    #[tokio::test]
    async fn empty_key_is_validation() {
        let (store, backend) = ready_store().await;

        let err = store.save_one("", "x").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = store.load([""]).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = store.delete("").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        let err = store
            .save(Vec::<(String, Scalar)>::new())
            .await
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Validation);

        assert_eq!(backend.calls(Operation::SaveItems), 0);
        assert_eq!(backend.calls(Operation::LoadItems), 0);
        assert_eq!(backend.calls(Operation::DeleteItem), 0);
    }

    #[tokio::test]
    async fn delete_absent_is_not_found() {
        let (store, _) = ready_store().await;
        let err = store.delete("ghost").await.unwrap_err();
        assert_eq!(err, StoreError::not_found("ghost"));
    }

    #[tokio::test]
    async fn delete_removes_entry() {
        let (store, _) = ready_store().await;
        store.save_one("alias", "Usul").await.unwrap();
        store.delete("alias").await.unwrap();
        assert_eq!(store.load_one("alias").await.unwrap(), None);
    }

    #[tokio::test]
    async fn gate_blocks_before_network() {
        let backend = Arc::new(MemoryBackend::new());
        let session = Arc::new(SessionManager::new(
            ClientConfig::new("project-1", "memory://"),
            Arc::clone(&backend),
        ));
        let store = KeyValueStore::new(Arc::clone(&session));

        assert_eq!(
            store.save_one("k", 1).await.unwrap_err(),
            StoreError::NotInitialized
        );

        session.initialize().await.unwrap();
        assert_eq!(store.load(["k"]).await.unwrap_err(), StoreError::NotAuthenticated);
        assert_eq!(store.delete("k").await.unwrap_err(), StoreError::NotAuthenticated);

        assert_eq!(backend.calls(Operation::SaveItems), 0);
        assert_eq!(backend.calls(Operation::LoadItems), 0);
        assert_eq!(backend.calls(Operation::DeleteItem), 0);
    }

    #[tokio::test]
    async fn service_failure_leaves_session_ready() {
        let (store, backend) = ready_store().await;
        backend.fail_next(
            Operation::SaveItems,
            BackendError::Remote(RemoteError::new(RemoteErrorCode::RateLimited, "too many writes")),
        );

        let err = store.save_one("k", 1).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Transport);
        assert_eq!(err.reason(), Some("rate_limited"));
        assert!(store.session.is_ready());
    }
}
