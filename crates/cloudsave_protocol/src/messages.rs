//! Request and response bodies for the CloudSave service.
//!
//! Every response body travels as a [`Reply`], i.e. an encoded
//! `Result<T, RemoteError>`, so a client can always tell a service-side
//! rejection apart from a transport failure.

use crate::value::Scalar;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::time::SystemTime;

/// Protocol version spoken by this crate.
pub const PROTOCOL_VERSION: u16 = 1;

/// Endpoint paths, relative to the service base URL.
pub mod endpoints {
    /// Service bootstrap.
    pub const BOOTSTRAP: &str = "/v1/bootstrap";
    /// Anonymous sign-in.
    pub const SIGN_IN_ANONYMOUS: &str = "/v1/auth/anonymous";
    /// Batched key-value write.
    pub const SAVE_ITEMS: &str = "/v1/data/save";
    /// Batched key-value read.
    pub const LOAD_ITEMS: &str = "/v1/data/load";
    /// Key-value delete.
    pub const DELETE_ITEM: &str = "/v1/data/delete";
    /// File upload.
    pub const SAVE_FILE: &str = "/v1/files/save";
    /// File download.
    pub const LOAD_FILE: &str = "/v1/files/load";
    /// Metadata of a single file.
    pub const FILE_METADATA: &str = "/v1/files/metadata";
    /// Metadata of every file.
    pub const LIST_FILES: &str = "/v1/files/list";
    /// File delete.
    pub const DELETE_FILE: &str = "/v1/files/delete";
}

/// Reply wrapper for every response body.
pub type Reply<T> = Result<T, RemoteError>;

/// Reason code attached to a service-side rejection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RemoteErrorCode {
    /// The addressed key or file does not exist.
    NotFound,
    /// The request was malformed or violated a service limit.
    InvalidArgument,
    /// The access token is missing, invalid or expired.
    Unauthorized,
    /// The project is unknown or misconfigured.
    ProjectNotFound,
    /// Too many requests.
    RateLimited,
    /// The service is temporarily unavailable.
    Unavailable,
    /// The service failed internally.
    Internal,
}

impl RemoteErrorCode {
    /// Returns the stable snake_case name of this code.
    pub fn as_str(&self) -> &'static str {
        match self {
            RemoteErrorCode::NotFound => "not_found",
            RemoteErrorCode::InvalidArgument => "invalid_argument",
            RemoteErrorCode::Unauthorized => "unauthorized",
            RemoteErrorCode::ProjectNotFound => "project_not_found",
            RemoteErrorCode::RateLimited => "rate_limited",
            RemoteErrorCode::Unavailable => "unavailable",
            RemoteErrorCode::Internal => "internal",
        }
    }
}

impl fmt::Display for RemoteErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejection returned by the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RemoteError {
    /// Reason code.
    pub code: RemoteErrorCode,
    /// Human-readable message from the service.
    pub message: String,
}

impl RemoteError {
    /// Creates a new remote error.
    pub fn new(code: RemoteErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    /// Creates a `NotFound` error.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::NotFound, message)
    }

    /// Creates an `InvalidArgument` error.
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::InvalidArgument, message)
    }

    /// Creates an `Unauthorized` error.
    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(RemoteErrorCode::Unauthorized, message)
    }
}

impl fmt::Display for RemoteError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} (reason: {})", self.message, self.code)
    }
}

/// A request body scoped to a signed-in player.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Authorized<T> {
    /// Access token issued at sign-in.
    pub access_token: String,
    /// The request body.
    pub body: T,
}

impl<T> Authorized<T> {
    /// Wraps a body with an access token.
    pub fn new(access_token: impl Into<String>, body: T) -> Self {
        Self {
            access_token: access_token.into(),
            body,
        }
    }
}

/// Bootstrap request, sent once per process before sign-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapRequest {
    /// Project the client belongs to.
    pub project_id: String,
    /// Environment name (e.g. "production").
    pub environment: String,
    /// Protocol version spoken by the client.
    pub protocol_version: u16,
}

impl BootstrapRequest {
    /// Creates a bootstrap request for the current protocol version.
    pub fn new(project_id: impl Into<String>, environment: impl Into<String>) -> Self {
        Self {
            project_id: project_id.into(),
            environment: environment.into(),
            protocol_version: PROTOCOL_VERSION,
        }
    }
}

/// Bootstrap response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BootstrapResponse {
    /// Protocol version spoken by the service.
    pub protocol_version: u16,
}

/// Anonymous sign-in request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInRequest {
    /// Project the client belongs to.
    pub project_id: String,
}

/// Anonymous sign-in response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SignInResponse {
    /// Opaque player identity.
    pub player_id: String,
    /// Token to attach to every scoped request.
    pub access_token: String,
}

/// Batched key-value write.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveItemsRequest {
    /// Entries to write.
    pub items: BTreeMap<String, Scalar>,
}

/// Batched key-value read.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadItemsRequest {
    /// Keys to read.
    pub keys: BTreeSet<String>,
}

/// Batched key-value read response. Absent keys are omitted.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LoadItemsResponse {
    /// Entries found.
    pub items: BTreeMap<String, Scalar>,
}

/// Key-value delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteItemRequest {
    /// Key to delete.
    pub key: String,
}

/// File upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveFileRequest {
    /// File name.
    pub key: String,
    /// File contents.
    pub data: Bytes,
}

/// File download.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFileRequest {
    /// File name.
    pub key: String,
}

/// File download response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadFileResponse {
    /// File contents.
    pub data: Bytes,
}

/// Metadata of a single file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadataRequest {
    /// File name.
    pub key: String,
}

/// Metadata of every file owned by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListFilesRequest;

/// Response to [`ListFilesRequest`].
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListFilesResponse {
    /// Metadata ordered by key.
    pub files: Vec<FileMetadata>,
}

/// File delete.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteFileRequest {
    /// File name.
    pub key: String,
}

/// Server-computed file metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileMetadata {
    /// File name.
    pub key: String,
    /// Size of the stored contents in bytes.
    pub size_bytes: u64,
    /// Last time the file was written, if the service tracks it.
    pub last_modified: Option<SystemTime>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{decode, encode};

    #[test]
    fn bootstrap_request_uses_current_version() {
        let request = BootstrapRequest::new("project-1", "production");
        assert_eq!(request.protocol_version, PROTOCOL_VERSION);
    }

    #[test]
    fn authorized_body_roundtrip() {
        let mut items = BTreeMap::new();
        items.insert("playerName".to_string(), Scalar::from("Paul"));
        items.insert("level".to_string(), Scalar::from(7));

        let request = Authorized::new("token", SaveItemsRequest { items });
        let decoded: Authorized<SaveItemsRequest> = decode(&encode(&request).unwrap()).unwrap();
        assert_eq!(decoded, request);
    }

    #[test]
    fn file_bytes_encode_as_byte_string() {
        let request = SaveFileRequest {
            key: "avatar.png".into(),
            data: Bytes::from_static(&[0x89, 0x50, 0x4e, 0x47]),
        };
        let bytes = encode(&request).unwrap();
        let decoded: SaveFileRequest = decode(&bytes).unwrap();
        assert_eq!(decoded.data.as_ref(), &[0x89, 0x50, 0x4e, 0x47]);
    }

    #[test]
    fn metadata_without_timestamp() {
        let meta = FileMetadata {
            key: "save.dat".into(),
            size_bytes: 12,
            last_modified: None,
        };
        let decoded: FileMetadata = decode(&encode(&meta).unwrap()).unwrap();
        assert_eq!(decoded, meta);
    }

    #[test]
    fn error_display_includes_reason() {
        let err = RemoteError::not_found("no such file");
        assert_eq!(err.to_string(), "no such file (reason: not_found)");
    }
}
