//! Opaque binary files with server-computed metadata.

use crate::backend::RemoteBackend;
use crate::error::{StoreError, StoreResult};
use crate::kv::require_key;
use crate::session::SessionManager;
use bytes::Bytes;
use cloudsave_protocol::{
    DeleteFileRequest, FileMetadata, FileMetadataRequest, LoadFileRequest, SaveFileRequest,
};
use std::sync::Arc;
use tracing::debug;

/// Uploads, downloads, lists and deletes player files.
///
/// Files live in their own namespace, separate from key-value entries.
pub struct BlobFileStore<B: RemoteBackend> {
    session: Arc<SessionManager<B>>,
}

impl<B: RemoteBackend> Clone for BlobFileStore<B> {
    fn clone(&self) -> Self {
        Self {
            session: Arc::clone(&self.session),
        }
    }
}

impl<B: RemoteBackend> BlobFileStore<B> {
    /// Creates a file store sharing the given session.
    pub fn new(session: Arc<SessionManager<B>>) -> Self {
        Self { session }
    }

    /// Uploads `data` under `key`, replacing any previous contents.
    pub async fn upload(&self, key: &str, data: impl Into<Bytes>) -> StoreResult<()> {
        let credentials = self.session.credentials()?;
        require_key(key, "file name")?;
        let data = data.into();
        if data.is_empty() {
            return Err(StoreError::validation("file contents must not be empty"));
        }

        debug!(key, bytes = data.len(), "uploading file");
        let request = SaveFileRequest {
            key: key.to_string(),
            data,
        };
        self.session
            .backend()
            .save_file(credentials.access_token(), &request)
            .await
            .map_err(|e| e.into_store(key))
    }

    /// Downloads the full contents of a file.
    pub async fn download(&self, key: &str) -> StoreResult<Bytes> {
        let credentials = self.session.credentials()?;
        require_key(key, "file name")?;

        debug!(key, "downloading file");
        let request = LoadFileRequest {
            key: key.to_string(),
        };
        let response = self
            .session
            .backend()
            .load_file(credentials.access_token(), &request)
            .await
            .map_err(|e| e.into_store(key))?;
        Ok(response.data)
    }

    /// Reads the metadata of one file.
    pub async fn metadata(&self, key: &str) -> StoreResult<FileMetadata> {
        let credentials = self.session.credentials()?;
        require_key(key, "file name")?;

        let request = FileMetadataRequest {
            key: key.to_string(),
        };
        self.session
            .backend()
            .file_metadata(credentials.access_token(), &request)
            .await
            .map_err(|e| e.into_store(key))
    }

    /// Lists the metadata of every file. No files yields an empty vector.
    pub async fn list_all_metadata(&self) -> StoreResult<Vec<FileMetadata>> {
        let credentials = self.session.credentials()?;

        let response = self
            .session
            .backend()
            .list_files(credentials.access_token())
            .await
            .map_err(|e| e.into_store(""))?;
        debug!(count = response.files.len(), "listed files");
        Ok(response.files)
    }

    /// Deletes a file. The call returns once the service accepted it.
    pub async fn delete(&self, key: &str) -> StoreResult<()> {
        let credentials = self.session.credentials()?;
        require_key(key, "file name")?;

        debug!(key, "deleting file");
        let request = DeleteFileRequest {
            key: key.to_string(),
        };
        self.session
            .backend()
            .delete_file(credentials.access_token(), &request)
            .await
            .map_err(|e| e.into_store(key))
    }
}
