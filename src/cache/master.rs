//! Master Collection Module
//!
//! Bookkeeping for the reserved collection that lists every collection the
//! cache manager has created, so they can be enumerated and dropped.

use std::sync::Arc;

use serde_json::{json, Value};

use super::{COLLECTION_NAME_KEY, MASTER_COLLECTION};
use crate::error::StoreResult;
use crate::store::{IndexSpec, IndexedStore, QuerySpec};

/// Registry rows live in [`MASTER_COLLECTION`], one `{soup_names: <name>}`
/// object per tracked collection.
pub(crate) struct MasterRegistry {
    store: Arc<dyn IndexedStore>,
}

impl MasterRegistry {
    pub(crate) fn new(store: Arc<dyn IndexedStore>) -> Self {
        Self { store }
    }

    /// Registers the master collection itself if it is missing.
    pub(crate) fn ensure_registered(&self) -> StoreResult<()> {
        if self.store.collection_exists(MASTER_COLLECTION) {
            return Ok(());
        }
        self.store
            .register_collection(MASTER_COLLECTION, &[IndexSpec::string(COLLECTION_NAME_KEY)])
    }

    // == Names ==
    /// Every collection name recorded in the registry, in insertion order.
    ///
    /// Counts the rows first, then reads them as a single page.
    pub(crate) fn names(&self) -> StoreResult<Vec<String>> {
        if !self.store.collection_exists(MASTER_COLLECTION) {
            return Ok(Vec::new());
        }
        let count = self.store.count(&QuerySpec::all(MASTER_COLLECTION, 1))?;
        if count <= 0 {
            return Ok(Vec::new());
        }

        let rows = self
            .store
            .query(&QuerySpec::all(MASTER_COLLECTION, count as usize), 0)?;
        Ok(rows
            .iter()
            .filter_map(|row| row.body.get(COLLECTION_NAME_KEY).and_then(Value::as_str))
            .map(str::to_string)
            .collect())
    }

    pub(crate) fn contains(&self, name: &str) -> StoreResult<bool> {
        Ok(self.names()?.iter().any(|n| n == name))
    }

    // == Add ==
    /// Appends a row for `name` unless one exists. Rows are inserted, never
    /// replaced.
    pub(crate) fn add(&self, name: &str) -> StoreResult<()> {
        if self.contains(name)? {
            return Ok(());
        }
        self.ensure_registered()?;
        self.store
            .upsert(MASTER_COLLECTION, json!({ COLLECTION_NAME_KEY: name }), None)?;
        Ok(())
    }

    // == Remove ==
    /// Deletes the row for `name`, if present.
    pub(crate) fn remove(&self, name: &str) -> StoreResult<()> {
        if !self.contains(name)? {
            return Ok(());
        }
        if let Some(id) = self
            .store
            .lookup_entry_id(MASTER_COLLECTION, COLLECTION_NAME_KEY, name)?
        {
            self.store.delete(MASTER_COLLECTION, &[id])?;
        }
        Ok(())
    }

    /// Drops the master collection and every row in it.
    pub(crate) fn drop_collection(&self) -> StoreResult<()> {
        self.store.drop_collection(MASTER_COLLECTION)
    }
}
