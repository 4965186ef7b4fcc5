//! Store Module
//!
//! Interface to the persistent indexed document store the cache sits on,
//! plus the in-memory and JSON-file implementations shipped with the crate.
//!
//! A store holds named collections ("soups") of JSON records. Each
//! collection declares the attributes it indexes; exact-match queries are
//! only allowed on indexed attributes.

mod clock;
mod collections;
mod factory;
mod file;
mod memory;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StoreResult;

pub use clock::{Clock, ManualClock, SystemClock};
pub use factory::{JsonFileStoreFactory, MemoryStoreFactory, StoreFactory};
pub use file::JsonFileStore;
pub use memory::MemoryStore;

// == Entry Id ==
/// Store-assigned internal identifier of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub i64);

// == Index Spec ==
/// Value type of an indexed attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IndexKind {
    String,
    Integer,
}

/// Declares one indexed attribute of a collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexSpec {
    /// Top-level attribute name
    pub path: String,
    pub kind: IndexKind,
}

impl IndexSpec {
    pub fn string(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: IndexKind::String,
        }
    }

    pub fn integer(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            kind: IndexKind::Integer,
        }
    }
}

// == Stored Record ==
/// A record as held by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredRecord {
    pub id: EntryId,
    /// Unix milliseconds of the last insert or replace
    pub last_modified: i64,
    /// The JSON object supplied by the writer
    pub body: Value,
}

// == Query Spec ==
/// Exact-match filter on one indexed attribute.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExactMatch {
    pub attribute: String,
    pub value: String,
}

/// Query over a single collection, paged by `page_size`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuerySpec {
    pub collection: String,
    pub filter: Option<ExactMatch>,
    pub page_size: usize,
}

impl QuerySpec {
    /// Every record of `collection`.
    pub fn all(collection: impl Into<String>, page_size: usize) -> Self {
        Self {
            collection: collection.into(),
            filter: None,
            page_size,
        }
    }

    /// Records of `collection` whose `attribute` equals `value`.
    pub fn exact(
        collection: impl Into<String>,
        attribute: impl Into<String>,
        value: impl Into<String>,
        page_size: usize,
    ) -> Self {
        Self {
            collection: collection.into(),
            filter: Some(ExactMatch {
                attribute: attribute.into(),
                value: value.into(),
            }),
            page_size,
        }
    }
}

// == Indexed Store ==
/// Operations the cache manager needs from a persistent indexed store.
///
/// Implementations serialize their own writes; no atomicity is promised
/// across separate calls.
pub trait IndexedStore: Send + Sync {
    /// Creates `name` with the given indexes. No-op if it already exists.
    fn register_collection(&self, name: &str, indexes: &[IndexSpec]) -> StoreResult<()>;

    fn collection_exists(&self, name: &str) -> bool;

    /// Inserts `record`, or replaces the record whose `key_attribute` value
    /// matches when a key attribute is given.
    fn upsert(
        &self,
        name: &str,
        record: Value,
        key_attribute: Option<&str>,
    ) -> StoreResult<StoredRecord>;

    /// Returns page `page_index` of the records matching `spec`, in entry id order.
    fn query(&self, spec: &QuerySpec, page_index: usize) -> StoreResult<Vec<StoredRecord>>;

    /// Number of records matching `spec`, ignoring paging.
    fn count(&self, spec: &QuerySpec) -> StoreResult<i64>;

    /// Internal id of the first record whose `attribute` equals `value`.
    fn lookup_entry_id(
        &self,
        name: &str,
        attribute: &str,
        value: &str,
    ) -> StoreResult<Option<EntryId>>;

    fn delete(&self, name: &str, ids: &[EntryId]) -> StoreResult<()>;

    /// Drops `name` and all its records. No-op if it does not exist.
    fn drop_collection(&self, name: &str) -> StoreResult<()>;

    fn drop_all(&self) -> StoreResult<()>;

    /// The store's notion of "now", in Unix milliseconds.
    fn current_time_millis(&self) -> i64;

    /// Exact-match query limited to `limit` results.
    fn query_exact(
        &self,
        name: &str,
        attribute: &str,
        value: &str,
        limit: usize,
    ) -> StoreResult<Vec<StoredRecord>> {
        self.query(&QuerySpec::exact(name, attribute, value, limit), 0)
    }
}
