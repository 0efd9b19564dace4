//! Property-based test generators using proptest.
//!
//! Provides strategies for generating random test data
//! that the stores and the reference server accept.

use bytes::Bytes;
use cloudsave_client::Book;
use cloudsave_protocol::Scalar;
use proptest::prelude::*;
use std::collections::BTreeMap;

/// Strategy for generating valid key-value keys.
pub fn key_strategy() -> impl Strategy<Value = String> {
    "[a-zA-Z][a-zA-Z0-9_]{0,31}"
}

/// Strategy for generating valid file names.
pub fn file_name_strategy() -> impl Strategy<Value = String> {
    "[a-z][a-z0-9_-]{0,15}\\.(png|bin|json)"
}

/// Strategy for generating scalar values.
///
/// Numbers are finite so that equality after a round trip is meaningful.
pub fn scalar_strategy() -> impl Strategy<Value = Scalar> {
    prop_oneof![
        ".{0,64}".prop_map(Scalar::Text),
        (-1.0e12f64..1.0e12).prop_map(Scalar::Number),
        any::<i32>().prop_map(Scalar::from),
        any::<bool>().prop_map(Scalar::Bool),
    ]
}

/// Strategy for generating a non-empty key-value batch within the
/// reference server's batch limit.
pub fn kv_batch_strategy() -> impl Strategy<Value = BTreeMap<String, Scalar>> {
    prop::collection::btree_map(key_strategy(), scalar_strategy(), 1..20)
}

/// Strategy for generating books, including ones without authors.
pub fn book_strategy() -> impl Strategy<Value = Book> {
    (
        any::<u32>(),
        ".{0,48}",
        "[0-9]{0,13}",
        prop::collection::vec(".{0,24}", 0..5),
    )
        .prop_map(|(id, title, isbn, authors)| Book {
            id,
            title,
            isbn,
            authors,
        })
}

/// Strategy for generating non-empty blob contents of `min..max` bytes.
pub fn blob_strategy(min: usize, max: usize) -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), min.max(1)..max.max(2)).prop_map(Bytes::from)
}

/// A single key-value operation for model-based tests.
#[derive(Debug, Clone)]
pub enum KvOperation {
    /// Save one entry
    Save {
        /// Key
        key: String,
        /// Value
        value: Scalar,
    },
    /// Delete an entry
    Delete {
        /// Key
        key: String,
    },
    /// Load an entry
    Load {
        /// Key
        key: String,
    },
}

/// Strategy for generating key-value operations over a small key space, so
/// deletes and loads often hit existing keys.
pub fn kv_operation_strategy() -> impl Strategy<Value = KvOperation> {
    let key = "[a-d]";
    prop_oneof![
        3 => (key, scalar_strategy()).prop_map(|(key, value)| KvOperation::Save { key, value }),
        1 => key.prop_map(|key| KvOperation::Delete { key }),
        2 => key.prop_map(|key| KvOperation::Load { key }),
    ]
}

/// Strategy for generating a sequence of operations.
pub fn kv_operation_sequence_strategy(
    min_ops: usize,
    max_ops: usize,
) -> impl Strategy<Value = Vec<KvOperation>> {
    prop::collection::vec(kv_operation_strategy(), min_ops..max_ops)
}

/// Configuration for property tests.
#[derive(Debug, Clone)]
pub struct PropTestConfig {
    /// Number of test cases to run.
    pub cases: u32,
    /// Maximum shrink iterations.
    pub max_shrink_iters: u32,
}

impl Default for PropTestConfig {
    fn default() -> Self {
        Self {
            cases: 256,
            max_shrink_iters: 1000,
        }
    }
}

impl PropTestConfig {
    /// Creates a configuration for quick tests.
    #[must_use]
    pub fn quick() -> Self {
        Self {
            cases: 32,
            max_shrink_iters: 100,
        }
    }

    /// Converts to proptest config.
    #[must_use]
    pub fn to_proptest_config(&self) -> ProptestConfig {
        ProptestConfig {
            cases: self.cases,
            max_shrink_iters: self.max_shrink_iters,
            ..ProptestConfig::default()
        }
    }
}
