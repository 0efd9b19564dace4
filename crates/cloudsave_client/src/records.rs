//! Structured records stored as JSON strings under derived keys.
//!
//! A record with id `42` under the default prefix lives at the key-value key
//! `book_42`. The payload is a single [`Scalar::Text`] holding the JSON form
//! of the record, so records ride on the same batched key-value calls as
//! plain entries.

use crate::backend::RemoteBackend;
use crate::error::{StoreError, StoreResult, MALFORMED_RESPONSE};
use crate::kv::KeyValueStore;
use cloudsave_protocol::Scalar;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use tracing::debug;

/// Non-negative integer identifying a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RecordId(u32);

impl RecordId {
    /// Creates a record id.
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the numeric value.
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u32> for RecordId {
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl FromStr for RecordId {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            return Err(StoreError::validation("record id must not be empty"));
        }
        trimmed.parse::<u32>().map(Self).map_err(|_| {
            StoreError::validation(format!("'{}' is not a non-negative integer", s))
        })
    }
}

impl TryFrom<&str> for RecordId {
    type Error = StoreError;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<&String> for RecordId {
    type Error = StoreError;

    fn try_from(s: &String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<String> for RecordId {
    type Error = StoreError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl TryFrom<i32> for RecordId {
    type Error = StoreError;

    fn try_from(id: i32) -> Result<Self, Self::Error> {
        Self::try_from(i64::from(id))
    }
}

impl TryFrom<i64> for RecordId {
    type Error = StoreError;

    fn try_from(id: i64) -> Result<Self, Self::Error> {
        u32::try_from(id)
            .map(Self)
            .map_err(|_| StoreError::validation(format!("{} is not a valid record id", id)))
    }
}

/// Example record: a book with its authors.
///
/// Field names on the wire are `Id`, `Title`, `ISBN` and `BookAuthors`.
/// Missing fields fall back to their defaults and unknown fields are
/// ignored.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Book {
    /// Record id, expected to match the id in the key.
    #[serde(rename = "Id")]
    pub id: u32,
    /// Title.
    #[serde(rename = "Title")]
    pub title: String,
    /// ISBN, kept as text.
    #[serde(rename = "ISBN")]
    pub isbn: String,
    /// Author names in order.
    #[serde(rename = "BookAuthors")]
    pub authors: Vec<String>,
}

impl Book {
    /// Creates a book without authors.
    pub fn new(id: u32, title: impl Into<String>, isbn: impl Into<String>) -> Self {
        Self {
            id,
            title: title.into(),
            isbn: isbn.into(),
            authors: Vec::new(),
        }
    }

    /// Appends an author.
    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.authors.push(author.into());
        self
    }
}

/// Stores records of type `R` under `<prefix><id>` keys.
pub struct RecordStore<B: RemoteBackend, R> {
    kv: KeyValueStore<B>,
    prefix: String,
    _record: PhantomData<fn() -> R>,
}

impl<B: RemoteBackend, R> Clone for RecordStore<B, R> {
    fn clone(&self) -> Self {
        Self {
            kv: self.kv.clone(),
            prefix: self.prefix.clone(),
            _record: PhantomData,
        }
    }
}

impl<B, R> RecordStore<B, R>
where
    B: RemoteBackend,
    R: Serialize + DeserializeOwned,
{
    /// Creates a record store on top of a key-value store.
    pub fn new(kv: KeyValueStore<B>, prefix: impl Into<String>) -> Self {
        Self {
            kv,
            prefix: prefix.into(),
            _record: PhantomData,
        }
    }

    /// Returns the key prefix.
    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    /// Returns the key-value key a record id maps to.
    pub fn record_key(&self, id: RecordId) -> String {
        format!("{}{}", self.prefix, id)
    }

    /// Serializes and saves a record.
    ///
    /// The id is validated after the session gate and before any network
    /// call.
    pub async fn save_record<I>(&self, id: I, record: &R) -> StoreResult<()>
    where
        I: TryInto<RecordId>,
        StoreError: From<I::Error>,
    {
        let key = self.prepare(id)?;
        let payload = serde_json::to_string(record)
            .map_err(|e| StoreError::validation(format!("record is not serializable: {}", e)))?;

        debug!(%key, bytes = payload.len(), "saving record");
        self.kv.save([(key, Scalar::Text(payload))]).await
    }

    /// Loads a record, or `None` if nothing is stored under its key.
    pub async fn load_record<I>(&self, id: I) -> StoreResult<Option<R>>
    where
        I: TryInto<RecordId>,
        StoreError: From<I::Error>,
    {
        let key = self.prepare(id)?;

        debug!(%key, "loading record");
        match self.kv.load_one(key.clone()).await? {
            None => Ok(None),
            Some(Scalar::Text(payload)) => serde_json::from_str(&payload)
                .map(Some)
                .map_err(|e| malformed(&key, &e.to_string())),
            Some(other) => Err(malformed(
                &key,
                &format!("expected text payload, found {}", other.kind()),
            )),
        }
    }

    /// Deletes a record. Deleting an absent record fails with `NotFound`.
    pub async fn delete_record<I>(&self, id: I) -> StoreResult<()>
    where
        I: TryInto<RecordId>,
        StoreError: From<I::Error>,
    {
        let key = self.prepare(id)?;

        debug!(%key, "deleting record");
        self.kv.delete(&key).await
    }

    fn prepare<I>(&self, id: I) -> StoreResult<String>
    where
        I: TryInto<RecordId>,
        StoreError: From<I::Error>,
    {
        self.kv.session().credentials()?;
        let id = id.try_into()?;
        Ok(self.record_key(id))
    }
}

fn malformed(key: &str, detail: &str) -> StoreError {
    StoreError::transport(
        format!("record '{}' is malformed: {}", key, detail),
        Some(MALFORMED_RESPONSE.to_string()),
    )
}
