//! Remote backend abstraction.

use crate::error::BackendResult;
use async_trait::async_trait;
use cloudsave_protocol::{
    BootstrapRequest, BootstrapResponse, DeleteFileRequest, DeleteItemRequest, FileMetadata,
    FileMetadataRequest, ListFilesResponse, LoadFileRequest, LoadFileResponse, LoadItemsRequest,
    LoadItemsResponse, SaveFileRequest, SaveItemsRequest, SignInRequest, SignInResponse,
};
use std::fmt;
use std::sync::Arc;

/// A remote backend handles communication with the cloud save service.
///
/// This trait abstracts the network layer, allowing for different
/// implementations (HTTP, in-memory for testing, etc.). Scoped calls take
/// the access token issued by [`sign_in_anonymously`](Self::sign_in_anonymously).
#[async_trait]
pub trait RemoteBackend: Send + Sync {
    /// Bootstraps the service connection.
    async fn bootstrap(&self, request: &BootstrapRequest) -> BackendResult<BootstrapResponse>;

    /// Signs in with a fresh anonymous identity.
    async fn sign_in_anonymously(&self, request: &SignInRequest) -> BackendResult<SignInResponse>;

    /// Writes a batch of key-value entries.
    async fn save_items(&self, token: &str, request: &SaveItemsRequest) -> BackendResult<()>;

    /// Reads a batch of key-value entries.
    async fn load_items(
        &self,
        token: &str,
        request: &LoadItemsRequest,
    ) -> BackendResult<LoadItemsResponse>;

    /// Deletes a key-value entry.
    async fn delete_item(&self, token: &str, request: &DeleteItemRequest) -> BackendResult<()>;

    /// Uploads a file, replacing any existing contents.
    async fn save_file(&self, token: &str, request: &SaveFileRequest) -> BackendResult<()>;

    /// Downloads a file.
    async fn load_file(
        &self,
        token: &str,
        request: &LoadFileRequest,
    ) -> BackendResult<LoadFileResponse>;

    /// Reads metadata of one file.
    async fn file_metadata(
        &self,
        token: &str,
        request: &FileMetadataRequest,
    ) -> BackendResult<FileMetadata>;

    /// Lists metadata of every file.
    async fn list_files(&self, token: &str) -> BackendResult<ListFilesResponse>;

    /// Deletes a file.
    async fn delete_file(&self, token: &str, request: &DeleteFileRequest) -> BackendResult<()>;
}

#[async_trait]
impl<B: RemoteBackend + ?Sized> RemoteBackend for Arc<B> {
    async fn bootstrap(&self, request: &BootstrapRequest) -> BackendResult<BootstrapResponse> {
        (**self).bootstrap(request).await
    }

    async fn sign_in_anonymously(&self, request: &SignInRequest) -> BackendResult<SignInResponse> {
        (**self).sign_in_anonymously(request).await
    }

    async fn save_items(&self, token: &str, request: &SaveItemsRequest) -> BackendResult<()> {
        (**self).save_items(token, request).await
    }

    async fn load_items(
        &self,
        token: &str,
        request: &LoadItemsRequest,
    ) -> BackendResult<LoadItemsResponse> {
        (**self).load_items(token, request).await
    }

    async fn delete_item(&self, token: &str, request: &DeleteItemRequest) -> BackendResult<()> {
        (**self).delete_item(token, request).await
    }

    async fn save_file(&self, token: &str, request: &SaveFileRequest) -> BackendResult<()> {
        (**self).save_file(token, request).await
    }

    async fn load_file(
        &self,
        token: &str,
        request: &LoadFileRequest,
    ) -> BackendResult<LoadFileResponse> {
        (**self).load_file(token, request).await
    }

    async fn file_metadata(
        &self,
        token: &str,
        request: &FileMetadataRequest,
    ) -> BackendResult<FileMetadata> {
        (**self).file_metadata(token, request).await
    }

    async fn list_files(&self, token: &str) -> BackendResult<ListFilesResponse> {
        (**self).list_files(token).await
    }

    async fn delete_file(&self, token: &str, request: &DeleteFileRequest) -> BackendResult<()> {
        (**self).delete_file(token, request).await
    }
}

/// Names of the remote operations, used for call accounting and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Operation {
    /// Service bootstrap.
    Bootstrap,
    /// Anonymous sign-in.
    SignIn,
    /// Batched key-value write.
    SaveItems,
    /// Batched key-value read.
    LoadItems,
    /// Key-value delete.
    DeleteItem,
    /// File upload.
    SaveFile,
    /// File download.
    LoadFile,
    /// Single file metadata.
    FileMetadata,
    /// Metadata listing.
    ListFiles,
    /// File delete.
    DeleteFile,
}

impl Operation {
    /// All operations, in declaration order.
    pub const ALL: [Operation; 10] = [
        Operation::Bootstrap,
        Operation::SignIn,
        Operation::SaveItems,
        Operation::LoadItems,
        Operation::DeleteItem,
        Operation::SaveFile,
        Operation::LoadFile,
        Operation::FileMetadata,
        Operation::ListFiles,
        Operation::DeleteFile,
    ];

    /// Returns the operation name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Bootstrap => "bootstrap",
            Operation::SignIn => "sign_in",
            Operation::SaveItems => "save_items",
            Operation::LoadItems => "load_items",
            Operation::DeleteItem => "delete_item",
            Operation::SaveFile => "save_file",
            Operation::LoadFile => "load_file",
            Operation::FileMetadata => "file_metadata",
            Operation::ListFiles => "list_files",
            Operation::DeleteFile => "delete_file",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
