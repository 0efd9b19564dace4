//! # CloudSave Client
//!
//! Client-side persistence against an account-scoped cloud store.
//!
//! This crate provides:
//! - Session state machine (initialize → sign in → ready)
//! - Key-value store for scalar values
//! - Structured record store (JSON payloads under derived keys)
//! - Blob file store with server-computed metadata
//! - A closed error taxonomy shared by every operation
//! - HTTP backend abstraction plus an in-memory backend
//!
//! ## Architecture
//!
//! Every store holds the same [`SessionManager`] and checks its readiness
//! before anything else, so a store call on a session that is not signed in
//! never reaches the network. The remote side is reached through the
//! [`RemoteBackend`] trait.
//!
//! ## Key Invariants
//!
//! - Signed in implies initialized
//! - Only the session manager mutates session state
//! - Local validation happens without a network round trip
//! - The remote store is the single authority; nothing is cached locally

#![deny(unsafe_code)]
#![warn(missing_docs)]

mod backend;
mod cloud;
mod config;
mod error;
mod files;
mod http;
mod kv;
mod memory;
mod records;
mod session;
mod status;

pub use backend::{Operation, RemoteBackend};
pub use cloud::CloudSave;
pub use config::{ClientConfig, DEFAULT_RECORD_PREFIX};
pub use error::{
    BackendError, BackendResult, ErrorKind, StoreError, StoreResult, MALFORMED_RESPONSE,
};
pub use files::BlobFileStore;
pub use http::{HttpBackend, HttpClient, LoopbackClient, LoopbackServer};
pub use kv::KeyValueStore;
pub use memory::MemoryBackend;
pub use records::{Book, RecordId, RecordStore};
pub use session::{AuthState, Credentials, InitState, Session, SessionManager};
pub use status::{Severity, StatusLine, StatusReporter};

pub use bytes::Bytes;
pub use cloudsave_protocol::{FileMetadata, Scalar, PROTOCOL_VERSION};
