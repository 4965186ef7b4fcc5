//! In-process store implementation.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::collections::Collections;
use super::{Clock, EntryId, IndexSpec, IndexedStore, QuerySpec, StoredRecord, SystemClock};
use crate::error::StoreResult;

// == Memory Store ==
/// Indexed store that keeps every collection in process memory.
///
/// Durable for the lifetime of the process, which is what the cache layer
/// needs when no store directory is configured.
#[derive(Debug)]
pub struct MemoryStore {
    state: Mutex<Collections>,
    clock: Arc<dyn Clock>,
}

impl MemoryStore {
    /// Creates an empty store stamped by the system clock.
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    /// Creates an empty store stamped by `clock`.
    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            state: Mutex::new(Collections::default()),
            clock,
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl IndexedStore for MemoryStore {
    fn register_collection(&self, name: &str, indexes: &[IndexSpec]) -> StoreResult<()> {
        self.state.lock().register(name, indexes)
    }

    fn collection_exists(&self, name: &str) -> bool {
        self.state.lock().exists(name)
    }

    fn upsert(
        &self,
        name: &str,
        record: Value,
        key_attribute: Option<&str>,
    ) -> StoreResult<StoredRecord> {
        let now = self.clock.current_time_millis();
        self.state.lock().upsert(name, record, key_attribute, now)
    }

    fn query(&self, spec: &QuerySpec, page_index: usize) -> StoreResult<Vec<StoredRecord>> {
        self.state.lock().query(spec, page_index)
    }

    fn count(&self, spec: &QuerySpec) -> StoreResult<i64> {
        self.state.lock().count(spec)
    }

    fn lookup_entry_id(
        &self,
        name: &str,
        attribute: &str,
        value: &str,
    ) -> StoreResult<Option<EntryId>> {
        self.state.lock().lookup_entry_id(name, attribute, value)
    }

    fn delete(&self, name: &str, ids: &[EntryId]) -> StoreResult<()> {
        self.state.lock().delete(name, ids)
    }

    fn drop_collection(&self, name: &str) -> StoreResult<()> {
        self.state.lock().drop_collection(name);
        Ok(())
    }

    fn drop_all(&self) -> StoreResult<()> {
        self.state.lock().drop_all();
        Ok(())
    }

    fn current_time_millis(&self) -> i64 {
        self.clock.current_time_millis()
    }
}
