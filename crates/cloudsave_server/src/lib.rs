//! # CloudSave Server
//!
//! Reference CloudSave service for tests and local development.
//!
//! This crate provides:
//! - Request routing for every protocol endpoint
//! - Per-player key-value and file storage
//! - Anonymous sign-in with HMAC-SHA256 access tokens
//! - Request validation (batch size, key length, file size)
//!
//! # Architecture
//!
//! The server is transport-agnostic: [`CloudSaveServer::handle_post`] takes
//! an endpoint path and a CBOR body and returns the CBOR reply. An HTTP
//! front end or an in-process loopback client calls it.
//!
//! # Authentication
//!
//! Sign-in creates a fresh player and returns a signed token:
//!
//! ```rust,ignore
//! use cloudsave_server::{AuthConfig, TokenValidator};
//!
//! let validator = TokenValidator::new(AuthConfig::new(secret));
//! let token = validator.create_token(player_id)?;
//! let player = validator.validate_token(&token)?;
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

mod auth;
mod config;
mod error;
mod handler;
mod server;
mod store;

pub use auth::{AuthConfig, TokenValidator};
pub use config::ServerConfig;
pub use error::{ServerError, ServerResult};
pub use handler::{HandlerContext, RequestHandler};
pub use server::CloudSaveServer;
pub use store::PlayerStore;
