//! # CloudSave Protocol
//!
//! Wire types and CBOR codec shared by the CloudSave client and the
//! reference service.
//!
//! This crate provides:
//! - `Scalar` values stored under key-value keys
//! - `FileMetadata` for player files
//! - Request and response bodies for every remote operation
//! - `RemoteError` with a closed set of reason codes
//! - Endpoint paths and CBOR encoding/decoding
//!
//! This is a pure protocol crate with no I/O operations.

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod codec;
mod error;
mod messages;
mod value;

pub use codec::{decode, encode};
pub use error::{ProtocolError, ProtocolResult};
pub use messages::{
    endpoints, Authorized, BootstrapRequest, BootstrapResponse, DeleteFileRequest,
    DeleteItemRequest, FileMetadata, FileMetadataRequest, ListFilesRequest, ListFilesResponse,
    LoadFileRequest, LoadFileResponse, LoadItemsRequest, LoadItemsResponse, RemoteError,
    RemoteErrorCode, Reply, SaveFileRequest, SaveItemsRequest, SignInRequest, SignInResponse,
    PROTOCOL_VERSION,
};
pub use value::Scalar;
