//! In-memory backend for tests and offline development.

use crate::backend::{Operation, RemoteBackend};
use crate::error::{BackendError, BackendResult};
use async_trait::async_trait;
use bytes::Bytes;
use cloudsave_protocol::{
    BootstrapRequest, BootstrapResponse, DeleteFileRequest, DeleteItemRequest, FileMetadata,
    FileMetadataRequest, ListFilesResponse, LoadFileRequest, LoadFileResponse, LoadItemsRequest,
    LoadItemsResponse, RemoteError, RemoteErrorCode, SaveFileRequest, SaveItemsRequest, Scalar,
    SignInRequest, SignInResponse, PROTOCOL_VERSION,
};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::SystemTime;

/// An in-memory backend for a single anonymous player.
///
/// Counts every call per [`Operation`] and lets tests queue failures for
/// specific operations. Scoped calls must present the token issued by the
/// most recent sign-in.
#[derive(Debug)]
pub struct MemoryBackend {
    connected: AtomicBool,
    state: Mutex<MemoryState>,
    calls: Mutex<HashMap<Operation, u64>>,
    failures: Mutex<HashMap<Operation, VecDeque<BackendError>>>,
    stalled: Mutex<HashSet<Operation>>,
}

#[derive(Debug, Default)]
struct MemoryState {
    sign_ins: u64,
    player_id: Option<String>,
    token: Option<String>,
    items: BTreeMap<String, Scalar>,
    files: BTreeMap<String, (Bytes, SystemTime)>,
}

impl MemoryBackend {
    /// Creates a new, connected, empty backend.
    pub fn new() -> Self {
        Self {
            connected: AtomicBool::new(true),
            state: Mutex::new(MemoryState::default()),
            calls: Mutex::new(HashMap::new()),
            failures: Mutex::new(HashMap::new()),
            stalled: Mutex::new(HashSet::new()),
        }
    }

    /// Sets the connected state. A disconnected backend fails every call with
    /// a transport error.
    pub fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::SeqCst);
    }

    /// Queues a failure for the next call of `operation`.
    pub fn fail_next(&self, operation: Operation, error: BackendError) {
        self.failures
            .lock()
            .entry(operation)
            .or_default()
            .push_back(error);
    }

    /// Makes calls of `operation` hang until they are dropped.
    ///
    /// Calls already stalled stay stalled after [`resume`](Self::resume).
    pub fn stall(&self, operation: Operation) {
        self.stalled.lock().insert(operation);
    }

    /// Lets new calls of `operation` complete again.
    pub fn resume(&self, operation: Operation) {
        self.stalled.lock().remove(&operation);
    }

    /// Returns the number of calls made for `operation`.
    pub fn calls(&self, operation: Operation) -> u64 {
        self.calls.lock().get(&operation).copied().unwrap_or(0)
    }

    /// Returns the number of calls made across all operations.
    pub fn total_calls(&self) -> u64 {
        self.calls.lock().values().sum()
    }

    /// Returns the identity issued by the most recent sign-in.
    pub fn player_id(&self) -> Option<String> {
        self.state.lock().player_id.clone()
    }

    /// Returns a copy of the stored key-value entries.
    pub fn items(&self) -> BTreeMap<String, Scalar> {
        self.state.lock().items.clone()
    }

    /// Returns the stored file names.
    pub fn file_keys(&self) -> Vec<String> {
        self.state.lock().files.keys().cloned().collect()
    }

    async fn enter(&self, operation: Operation) -> BackendResult<()> {
        *self.calls.lock().entry(operation).or_insert(0) += 1;

        let stalled = self.stalled.lock().contains(&operation);
        if stalled {
            std::future::pending::<()>().await;
        }

        if !self.connected.load(Ordering::SeqCst) {
            return Err(BackendError::Transport("not connected".into()));
        }

        match self
            .failures
            .lock()
            .get_mut(&operation)
            .and_then(VecDeque::pop_front)
        {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    async fn authorize(&self, operation: Operation, token: &str) -> BackendResult<()> {
        self.enter(operation).await?;
        match self.state.lock().token.as_deref() {
            Some(issued) if issued == token => Ok(()),
            _ => Err(RemoteError::unauthorized("invalid access token").into()),
        }
    }
}

impl Default for MemoryBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl RemoteBackend for MemoryBackend {
    async fn bootstrap(&self, request: &BootstrapRequest) -> BackendResult<BootstrapResponse> {
        self.enter(Operation::Bootstrap).await?;
        if request.project_id.is_empty() {
            return Err(
                RemoteError::new(RemoteErrorCode::ProjectNotFound, "project id is empty").into(),
            );
        }
        Ok(BootstrapResponse {
            protocol_version: PROTOCOL_VERSION,
        })
    }

    async fn sign_in_anonymously(&self, _request: &SignInRequest) -> BackendResult<SignInResponse> {
        self.enter(Operation::SignIn).await?;
        let mut state = self.state.lock();
        state.sign_ins += 1;
        let player_id = format!("player-{}", state.sign_ins);
        let access_token = format!("token-{}", player_id);
        state.player_id = Some(player_id.clone());
        state.token = Some(access_token.clone());
        Ok(SignInResponse {
            player_id,
            access_token,
        })
    }

    async fn save_items(&self, token: &str, request: &SaveItemsRequest) -> BackendResult<()> {
        self.authorize(Operation::SaveItems, token).await?;
        let mut state = self.state.lock();
        for (key, value) in &request.items {
            state.items.insert(key.clone(), value.clone());
        }
        Ok(())
    }

    async fn load_items(
        &self,
        token: &str,
        request: &LoadItemsRequest,
    ) -> BackendResult<LoadItemsResponse> {
        self.authorize(Operation::LoadItems, token).await?;
        let state = self.state.lock();
        let items = request
            .keys
            .iter()
            .filter_map(|key| state.items.get(key).map(|v| (key.clone(), v.clone())))
            .collect();
        Ok(LoadItemsResponse { items })
    }

    async fn delete_item(&self, token: &str, request: &DeleteItemRequest) -> BackendResult<()> {
        self.authorize(Operation::DeleteItem, token).await?;
        match self.state.lock().items.remove(&request.key) {
            Some(_) => Ok(()),
            None => Err(RemoteError::not_found(format!("key '{}' not found", request.key)).into()),
        }
    }

    async fn save_file(&self, token: &str, request: &SaveFileRequest) -> BackendResult<()> {
        self.authorize(Operation::SaveFile, token).await?;
        self.state.lock().files.insert(
            request.key.clone(),
            (request.data.clone(), SystemTime::now()),
        );
        Ok(())
    }

    async fn load_file(
        &self,
        token: &str,
        request: &LoadFileRequest,
    ) -> BackendResult<LoadFileResponse> {
        self.authorize(Operation::LoadFile, token).await?;
        match self.state.lock().files.get(&request.key) {
            Some((data, _)) => Ok(LoadFileResponse { data: data.clone() }),
            None => Err(RemoteError::not_found(format!("file '{}' not found", request.key)).into()),
        }
    }

    async fn file_metadata(
        &self,
        token: &str,
        request: &FileMetadataRequest,
    ) -> BackendResult<FileMetadata> {
        self.authorize(Operation::FileMetadata, token).await?;
        match self.state.lock().files.get(&request.key) {
            Some((data, modified)) => Ok(FileMetadata {
                key: request.key.clone(),
                size_bytes: data.len() as u64,
                last_modified: Some(*modified),
            }),
            None => Err(RemoteError::not_found(format!("file '{}' not found", request.key)).into()),
        }
    }

    async fn list_files(&self, token: &str) -> BackendResult<ListFilesResponse> {
        self.authorize(Operation::ListFiles, token).await?;
        let files = self
            .state
            .lock()
            .files
            .iter()
            .map(|(key, (data, modified))| FileMetadata {
                key: key.clone(),
                size_bytes: data.len() as u64,
                last_modified: Some(*modified),
            })
            .collect();
        Ok(ListFilesResponse { files })
    }

    async fn delete_file(&self, token: &str, request: &DeleteFileRequest) -> BackendResult<()> {
        self.authorize(Operation::DeleteFile, token).await?;
        match self.state.lock().files.remove(&request.key) {
            Some(_) => Ok(()),
            None => Err(RemoteError::not_found(format!("file '{}' not found", request.key)).into()),
        }
    }
}
