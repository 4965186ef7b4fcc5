//! JSON-file store implementation.
//!
//! Keeps the whole store in memory and rewrites `store.json` after every
//! mutation. A mutation that cannot be written leaves both the file and the
//! in-memory state untouched.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;
use tracing::debug;

use super::collections::Collections;
use super::{Clock, EntryId, IndexSpec, IndexedStore, QuerySpec, StoredRecord, SystemClock};
use crate::error::StoreResult;

const STATE_FILE: &str = "store.json";
const STATE_TMP_FILE: &str = "store.json.tmp";

// == JSON File Store ==
/// Durable indexed store backed by a single JSON file in `dir`.
#[derive(Debug)]
pub struct JsonFileStore {
    dir: PathBuf,
    state: Mutex<Collections>,
    clock: Arc<dyn Clock>,
}

impl JsonFileStore {
    /// Opens (or creates) the store in `dir`.
    pub fn open(dir: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with_clock(dir, Arc::new(SystemClock::new()))
    }

    /// Opens (or creates) the store in `dir`, stamping records with `clock`.
    pub fn open_with_clock(dir: impl AsRef<Path>, clock: Arc<dyn Clock>) -> StoreResult<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;

        let path = dir.join(STATE_FILE);
        let state = if path.exists() {
            let bytes = fs::read(&path)?;
            serde_json::from_slice(&bytes)?
        } else {
            Collections::default()
        };
        debug!("Opened JSON file store at {}", dir.display());

        Ok(Self {
            dir,
            state: Mutex::new(state),
            clock,
        })
    }

    /// Directory holding the store file.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn persist(&self, state: &Collections) -> StoreResult<()> {
        let tmp = self.dir.join(STATE_TMP_FILE);
        fs::write(&tmp, serde_json::to_vec(state)?)?;
        fs::rename(&tmp, self.dir.join(STATE_FILE))?;
        Ok(())
    }

    /// Applies `f` to a copy of the state, persists it, then publishes it.
    fn mutate<R>(&self, f: impl FnOnce(&mut Collections) -> StoreResult<R>) -> StoreResult<R> {
        let mut guard = self.state.lock();
        let mut next = guard.clone();
        let result = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        Ok(result)
    }
}

impl IndexedStore for JsonFileStore {
    fn register_collection(&self, name: &str, indexes: &[IndexSpec]) -> StoreResult<()> {
        if self.state.lock().exists(name) {
            return Ok(());
        }
        self.mutate(|state| state.register(name, indexes))
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
        self.mutate(|state| state.upsert(name, record, key_attribute, now))
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
        self.mutate(|state| state.delete(name, ids))
    }

    fn drop_collection(&self, name: &str) -> StoreResult<()> {
        if !self.state.lock().exists(name) {
            return Ok(());
        }
        self.mutate(|state| {
            state.drop_collection(name);
            Ok(())
        })
    }

    fn drop_all(&self) -> StoreResult<()> {
        self.mutate(|state| {
            state.drop_all();
            Ok(())
        })
    }

    fn current_time_millis(&self) -> i64 {
        self.clock.current_time_millis()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use serde_json::json;

    #[test]
    fn test_file_store_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        {
            let store = JsonFileStore::open(dir.path()).unwrap();
            store
                .register_collection("Account", &[IndexSpec::string("cache_key")])
                .unwrap();
            store
                .upsert("Account", json!({"cache_key": "k1", "v": 1}), Some("cache_key"))
                .unwrap();
        }

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert!(reopened.collection_exists("Account"));
        let rows = reopened.query_exact("Account", "cache_key", "k1", 1).unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].body["v"], 1);
    }

    #[test]
    fn test_failed_mutation_leaves_state_untouched() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();

        let result = store.upsert("Missing", json!({"cache_key": "k1"}), None);
        assert!(matches!(result, Err(StoreError::CollectionNotFound(_))));
        assert!(!dir.path().join(STATE_FILE).exists());
    }

    #[test]
    fn test_drop_all_is_persisted() {
        let dir = tempfile::tempdir().unwrap();
        let store = JsonFileStore::open(dir.path()).unwrap();
        store.register_collection("Account", &[]).unwrap();
        store.register_collection("Contact", &[]).unwrap();
        store.drop_all().unwrap();
        drop(store);

        let reopened = JsonFileStore::open(dir.path()).unwrap();
        assert!(!reopened.collection_exists("Account"));
        assert!(!reopened.collection_exists("Contact"));
    }

    #[test]
    fn test_corrupt_state_file_fails_open() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(STATE_FILE), b"{not json").unwrap();

        let result = JsonFileStore::open(dir.path());
        assert!(matches!(result, Err(StoreError::Serialization(_))));
    }
}
