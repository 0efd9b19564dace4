//! # CloudSave Testkit
//!
//! Test utilities for CloudSave.
//!
//! This crate provides:
//! - Ready clients over the in-memory backend or the reference server
//! - Property-based test generators using proptest
//! - Golden test utilities for the record payload format
//!
//! ## Usage
//!
//! ```rust,ignore
//! use cloudsave_testkit::prelude::*;
//!
//! #[tokio::test]
//! async fn saves_a_name() {
//!     let fixture = LoopbackCloud::ready().await;
//!     fixture.cloud.key_values().save_one("playerName", "Paul").await.unwrap();
//! }
//! ```

#![deny(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod generators;
pub mod golden;

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::fixtures::*;
    pub use crate::generators::*;
    pub use crate::golden::*;
}

pub use fixtures::*;
pub use generators::*;
pub use golden::*;
