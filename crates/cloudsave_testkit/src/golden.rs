//! Golden test utilities for format verification.
//!
//! Record payloads are the only persisted format, so their JSON text is
//! pinned in golden files under `docs/test_vectors`.

use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};

/// A golden test that compares output against expected files.
pub struct GoldenTest {
    name: String,
    golden_dir: PathBuf,
    update_mode: bool,
}

impl GoldenTest {
    /// Creates a new golden test.
    ///
    /// # Arguments
    ///
    /// * `name` - Name of the test (used for file naming)
    /// * `golden_dir` - Directory containing golden files
    pub fn new(name: impl Into<String>, golden_dir: impl AsRef<Path>) -> Self {
        Self {
            name: name.into(),
            golden_dir: golden_dir.as_ref().to_path_buf(),
            update_mode: std::env::var("UPDATE_GOLDEN").is_ok(),
        }
    }

    /// Creates a golden test using the workspace test vectors directory.
    pub fn with_default_dir(name: impl Into<String>) -> Self {
        let golden_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .parent()
            .and_then(|p| p.parent())
            .map(|p| p.join("docs").join("test_vectors"))
            .unwrap_or_else(|| PathBuf::from("test_vectors"));

        Self::new(name, golden_dir)
    }

    /// Asserts that the given string matches the golden file.
    ///
    /// If `UPDATE_GOLDEN` environment variable is set, updates the golden file instead.
    pub fn assert_text(&self, suffix: &str, actual: &str) {
        let path = self.file_path(suffix);

        if self.update_mode {
            self.update_golden_file(&path, actual.as_bytes());
            return;
        }

        if !path.exists() {
            panic!(
                "Golden file not found: {:?}\n\
                 Run with UPDATE_GOLDEN=1 to create it.\n\
                 Actual:\n{}",
                path, actual
            );
        }

        let expected = fs::read_to_string(&path).expect("Failed to read golden file");

        if actual != expected.trim_end() {
            panic!(
                "Golden test '{}' failed for '{}':\n\
                 --- Expected ---\n{}\n\
                 --- Actual ---\n{}\n\
                 Run with UPDATE_GOLDEN=1 to update.",
                self.name, suffix, expected, actual
            );
        }
    }

    /// Asserts that the compact JSON form of `value` matches the golden file.
    pub fn assert_json<T: Serialize>(&self, suffix: &str, value: &T) {
        let actual = serde_json::to_string(value).expect("Failed to serialize value");
        self.assert_text(suffix, &actual);
    }

    fn file_path(&self, suffix: &str) -> PathBuf {
        let filename = if suffix.is_empty() {
            format!("{}.golden", self.name)
        } else {
            format!("{}_{}.golden", self.name, suffix)
        };
        self.golden_dir.join(filename)
    }

    fn update_golden_file(&self, path: &Path, data: &[u8]) {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).expect("Failed to create golden directory");
        }
        fs::write(path, data).expect("Failed to write golden file");
        println!("Updated golden file: {:?}", path);
    }
}

/// Record payloads written by earlier clients that must stay readable.
pub mod record_vectors {
    /// A stored payload and the fields it must decode to.
    #[derive(Debug, Clone)]
    pub struct RecordVector {
        /// Description of the test case
        pub description: &'static str,
        /// Stored JSON payload
        pub payload: &'static str,
        /// Expected id
        pub id: u32,
        /// Expected title
        pub title: &'static str,
        /// Expected author count
        pub authors: usize,
    }

    /// Returns the book payload vectors.
    #[must_use]
    pub fn book_vectors() -> Vec<RecordVector> {
        vec![
            RecordVector {
                description: "Full record",
                payload: r#"{"Id":42,"Title":"Dune","ISBN":"0441013597","BookAuthors":["Frank Herbert"]}"#,
                id: 42,
                title: "Dune",
                authors: 1,
            },
            RecordVector {
                description: "No authors field",
                payload: r#"{"Id":7,"Title":"Emma","ISBN":"9780141439587"}"#,
                id: 7,
                title: "Emma",
                authors: 0,
            },
            RecordVector {
                description: "Empty fields",
                payload: r#"{"Id":1,"Title":"","ISBN":"","BookAuthors":[]}"#,
                id: 1,
                title: "",
                authors: 0,
            },
            RecordVector {
                description: "Unknown extra field",
                payload: r#"{"Id":3,"Title":"Ubik","ISBN":"","BookAuthors":["Philip K. Dick"],"Shelf":"B2"}"#,
                id: 3,
                title: "Ubik",
                authors: 1,
            },
            RecordVector {
                description: "Multiple authors",
                payload: r#"{"Id":11,"Title":"Good Omens","ISBN":"0060853980","BookAuthors":["Terry Pratchett","Neil Gaiman"]}"#,
                id: 11,
                title: "Good Omens",
                authors: 2,
            },
        ]
    }
}
