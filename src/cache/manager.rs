//! Cache Manager Module
//!
//! Layered read/write path: memory overlay first, persistent store second.
//! Store failures never escape this type; they are logged and the operation
//! degrades to "no data" or "not persisted".

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};
use tracing::{debug, info, warn};

use super::master::MasterRegistry;
use super::{CacheStats, MemoryOverlay, CACHE_DATA, CACHE_KEY};
use crate::config::DEFAULT_STALE_AFTER_MS;
use crate::error::{StoreError, StoreResult};
use crate::models::{CachePayload, CachedObject, ObjectLayout, ObjectType};
use crate::policy::{needs_reload_at, CachePolicy};
use crate::store::{IndexSpec, IndexedStore, StoredRecord};

fn is_blank(s: &str) -> bool {
    s.trim().is_empty()
}

// == Write Outcome ==
/// What a write actually achieved.
///
/// The overlay is updated for every outcome except `Skipped`, whether or not
/// persistence succeeds.
#[derive(Debug)]
pub enum WriteOutcome {
    /// Input rejected (no values, blank key or type); nothing changed
    Skipped,
    /// Overlay updated, but no value had a persistable form
    MemoryOnly,
    /// Overlay updated and record upserted
    Persisted,
    /// Overlay updated, store write failed
    PersistFailed(StoreError),
}

impl WriteOutcome {
    /// True if the record reached the store.
    pub fn is_persisted(&self) -> bool {
        matches!(self, WriteOutcome::Persisted)
    }
}

// == Cache Manager ==
/// Cache manager for one identity: owns one store handle and one overlay.
pub struct CacheManager {
    store: Arc<dyn IndexedStore>,
    master: MasterRegistry,
    overlay: MemoryOverlay,
    stats: Mutex<CacheStats>,
    default_stale_after_ms: i64,
}

impl CacheManager {
    // == Constructor ==
    /// Creates a manager over `store` with an empty overlay.
    pub fn new(store: Arc<dyn IndexedStore>) -> Self {
        Self {
            master: MasterRegistry::new(store.clone()),
            store,
            overlay: MemoryOverlay::new(),
            stats: Mutex::new(CacheStats::new()),
            default_stale_after_ms: DEFAULT_STALE_AFTER_MS,
        }
    }

    /// Sets the staleness threshold used by [`Self::should_reload`] when the
    /// caller passes none.
    pub fn with_default_stale_after(mut self, stale_after_ms: i64) -> Self {
        self.default_stale_after_ms = stale_after_ms;
        self
    }

    /// Returns the backing store handle.
    pub fn store(&self) -> &dyn IndexedStore {
        self.store.as_ref()
    }

    /// Returns the in-memory overlay.
    pub fn overlay(&self) -> &MemoryOverlay {
        &self.overlay
    }

    /// Snapshot of this instance's counters.
    pub fn stats(&self) -> CacheStats {
        self.stats.lock().clone()
    }

    // == Existence ==
    /// True if `cache_type` names an existing collection.
    pub fn does_cache_exist(&self, cache_type: &str) -> bool {
        !is_blank(cache_type) && self.store.collection_exists(cache_type)
    }

    // == Reload Decisions ==
    /// Policy decision evaluated against the store's clock.
    pub fn needs_reload(
        &self,
        cache_exists: bool,
        policy: CachePolicy,
        last_cached_ms: i64,
        stale_after_ms: i64,
    ) -> bool {
        needs_reload_at(
            self.store.current_time_millis(),
            cache_exists,
            policy,
            last_cached_ms,
            stale_after_ms,
        )
    }

    /// Policy decision for a concrete cache record, looking up whether the
    /// collection exists and when the record was last written.
    pub fn should_reload(
        &self,
        policy: CachePolicy,
        cache_type: &str,
        cache_key: &str,
        stale_after_ms: Option<i64>,
    ) -> bool {
        let cache_exists = self.does_cache_exist(cache_type);
        let last_cached = self.last_cache_update_time(cache_type, cache_key);
        self.needs_reload(
            cache_exists,
            policy,
            last_cached,
            stale_after_ms.unwrap_or(self.default_stale_after_ms),
        )
    }

    /// Looks up the persisted record for `cache_key`, if there is one.
    fn find_record(&self, cache_type: &str, cache_key: &str) -> StoreResult<Option<StoredRecord>> {
        let mut rows = self.store.query_exact(cache_type, CACHE_KEY, cache_key, 1)?;
        Ok(if rows.is_empty() {
            None
        } else {
            Some(rows.swap_remove(0))
        })
    }

    /// Last-modified time of the record for `cache_key`, or 0 when there is
    /// none or it cannot be read.
    pub fn last_cache_update_time(&self, cache_type: &str, cache_key: &str) -> i64 {
        if is_blank(cache_type) || is_blank(cache_key) || !self.does_cache_exist(cache_type) {
            return 0;
        }
        match self.find_record(cache_type, cache_key) {
            Ok(record) => record.map_or(0, |r| r.last_modified),
            Err(e) => {
                warn!(
                    "Failed to read last update time of {}/{}: {}",
                    cache_type, cache_key, e
                );
                0
            }
        }
    }

    // == Read ==
    /// Reads the values cached under `cache_key` in collection `cache_type`.
    ///
    /// Returns the overlay entry when present; otherwise decodes the
    /// persisted record, dropping entries that fail to decode, and fills the
    /// overlay when at least one value survives. Blank arguments, a missing
    /// collection and store failures all yield an empty list.
    pub fn read<T: CachePayload>(&self, cache_type: &str, cache_key: &str) -> Vec<T> {
        if is_blank(cache_type) || is_blank(cache_key) || !self.does_cache_exist(cache_type) {
            return Vec::new();
        }

        if let Some(values) = self.overlay.get::<T>(cache_key) {
            debug!("Overlay hit for {} {}/{}", T::DOMAIN, cache_type, cache_key);
            self.stats.lock().record_overlay_hit();
            return values;
        }

        let record = match self.find_record(cache_type, cache_key) {
            Ok(record) => record,
            Err(e) => {
                warn!(
                    "Failed to read cached {} data for {}/{}: {}",
                    T::DOMAIN, cache_type, cache_key, e
                );
                None
            }
        };

        let values: Vec<T> = record
            .as_ref()
            .and_then(|r| r.body.get(CACHE_DATA))
            .and_then(Value::as_array)
            .map(|entries| entries.iter().filter_map(T::decode).collect())
            .unwrap_or_default();

        if values.is_empty() {
            self.stats.lock().record_miss();
        } else {
            debug!(
                "Loaded {} {} value(s) for {}/{} from store",
                values.len(),
                T::DOMAIN,
                cache_type,
                cache_key
            );
            self.overlay.put(cache_key, values.clone());
            self.stats.lock().record_store_hit();
        }
        values
    }

    /// Reads cached object records.
    pub fn read_objects(&self, cache_type: &str, cache_key: &str) -> Vec<CachedObject> {
        self.read(cache_type, cache_key)
    }

    /// Reads cached object type descriptors.
    pub fn read_object_types(&self, cache_type: &str, cache_key: &str) -> Vec<ObjectType> {
        self.read(cache_type, cache_key)
    }

    /// Reads cached layout descriptors.
    pub fn read_object_layouts(&self, cache_type: &str, cache_key: &str) -> Vec<ObjectLayout> {
        self.read(cache_type, cache_key)
    }

    // == Write ==
    /// Caches `values` under `cache_key` in collection `cache_type`.
    ///
    /// The overlay entry is replaced first and stays replaced even if
    /// persisting fails; the returned outcome says how far the write got.
    pub fn write<T: CachePayload>(
        &self,
        values: &[T],
        cache_key: &str,
        cache_type: &str,
    ) -> WriteOutcome {
        if values.is_empty() || is_blank(cache_key) || is_blank(cache_type) {
            return WriteOutcome::Skipped;
        }

        self.overlay.put(cache_key, values.to_vec());

        let payloads: Vec<Value> = values.iter().filter_map(T::encode).collect();
        if payloads.is_empty() {
            return WriteOutcome::MemoryOnly;
        }

        let record = json!({ CACHE_KEY: cache_key, CACHE_DATA: payloads });
        match self.upsert_record(cache_type, record) {
            Ok(()) => WriteOutcome::Persisted,
            Err(e) => {
                warn!(
                    "Failed to persist {} data for {}/{}: {}",
                    T::DOMAIN, cache_type, cache_key, e
                );
                self.stats.lock().record_persist_failure();
                WriteOutcome::PersistFailed(e)
            }
        }
    }

    /// Caches object records.
    ///
    /// # Arguments
    /// * `objects` - Records to cache; an empty list is skipped
    /// * `cache_key` - Key identifying the dataset
    /// * `cache_type` - Collection holding the dataset
    pub fn write_objects(
        &self,
        objects: &[CachedObject],
        cache_key: &str,
        cache_type: &str,
    ) -> WriteOutcome {
        self.write(objects, cache_key, cache_type)
    }

    /// Caches object type descriptors.
    pub fn write_object_types(
        &self,
        object_types: &[ObjectType],
        cache_key: &str,
        cache_type: &str,
    ) -> WriteOutcome {
        self.write(object_types, cache_key, cache_type)
    }

    /// Caches layout descriptors. Layouts without a type are kept in memory
    /// only.
    pub fn write_object_layouts(
        &self,
        layouts: &[ObjectLayout],
        cache_key: &str,
        cache_type: &str,
    ) -> WriteOutcome {
        self.write(layouts, cache_key, cache_type)
    }

    /// Registers the master collection, then `cache_type`, then upserts.
    fn register_collection(&self, cache_type: &str) -> StoreResult<()> {
        self.master.ensure_registered()?;
        if !self.store.collection_exists(cache_type) {
            self.store
                .register_collection(cache_type, &[IndexSpec::string(CACHE_KEY)])?;
        }
        Ok(())
    }

    fn upsert_record(&self, cache_type: &str, record: Value) -> StoreResult<()> {
        self.register_collection(cache_type)?;
        self.store.upsert(cache_type, record, Some(CACHE_KEY))?;

        // The record is durable at this point; a bookkeeping failure only
        // means hard reset will not find the collection.
        if let Err(e) = self.master.add(cache_type) {
            warn!("Failed to record collection {} in master registry: {}", cache_type, e);
        }
        Ok(())
    }

    // == Registry Bookkeeping ==
    /// Names of every collection recorded in the master registry.
    pub fn collection_names(&self) -> Vec<String> {
        self.master.names().unwrap_or_else(|e| {
            warn!("Failed to enumerate cache collections: {}", e);
            Vec::new()
        })
    }

    /// True if `name` is recorded in the master registry.
    pub fn collection_exists_in_registry(&self, name: &str) -> bool {
        self.master.contains(name).unwrap_or_else(|e| {
            warn!("Failed to look up {} in master registry: {}", name, e);
            false
        })
    }

    // == Remove Collection ==
    /// Drops `name`, removes it from the master registry and resets the
    /// whole overlay. Returns false if there was nothing to remove.
    pub fn remove_collection(&self, name: &str) -> bool {
        if !self.does_cache_exist(name) {
            return false;
        }
        if let Err(e) = self.store.drop_collection(name) {
            warn!("Failed to drop collection {}: {}", name, e);
            return false;
        }
        if let Err(e) = self.master.remove(name) {
            warn!("Failed to remove {} from master registry: {}", name, e);
        }
        self.reset_in_memory_cache();
        info!("Removed cache collection {}", name);
        true
    }

    // == Drop Everything ==
    /// Drops every registered collection and then the master collection
    /// itself. Returns how many registered collections were dropped.
    pub fn drop_everything(&self) -> usize {
        let mut dropped = 0;
        for name in self.collection_names() {
            match self.store.drop_collection(&name) {
                Ok(()) => dropped += 1,
                Err(e) => warn!("Failed to drop collection {}: {}", name, e),
            }
        }
        if let Err(e) = self.master.drop_collection() {
            warn!("Failed to drop master registry: {}", e);
        }
        dropped
    }

    /// Clears the overlay and purges every collection this manager created.
    pub(crate) fn clean(&self) {
        self.reset_in_memory_cache();
        let dropped = self.drop_everything();
        info!("Purged {} cache collection(s)", dropped);
    }

    // == Reset ==
    /// Clears all three overlay domains. Persisted data is untouched.
    pub fn reset_in_memory_cache(&self) {
        self.overlay.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MASTER_COLLECTION;
    use crate::store::{ManualClock, MemoryStore};
    use serde_json::Map;

    const NOW: i64 = 1_700_000_000_000;

    fn manager() -> (Arc<ManualClock>, CacheManager) {
        let clock = Arc::new(ManualClock::new(NOW));
        let store = Arc::new(MemoryStore::with_clock(clock.clone()));
        (clock, CacheManager::new(store))
    }

    fn account(id: &str, name: &str) -> CachedObject {
        let value = json!({"attributes": {"type": "Account"}, "Id": id, "Name": name});
        CachedObject::decode(&value).unwrap()
    }

    #[test]
    fn test_read_unknown_collection_is_empty() {
        let (_, manager) = manager();
        assert!(manager.read_objects("Account", "k1").is_empty());
        assert!(!manager.store().collection_exists("Account"));
        assert!(!manager.store().collection_exists(MASTER_COLLECTION));
    }

    #[test]
    fn test_write_then_read() {
        let (_, manager) = manager();
        let values = vec![account("001A", "Acme"), account("001B", "Globex")];

        let outcome = manager.write_objects(&values, "recent", "Account");
        assert!(outcome.is_persisted());
        assert_eq!(manager.read_objects("Account", "recent"), values);
    }

    #[test]
    fn test_write_validation() {
        let (_, manager) = manager();
        let values = vec![account("001A", "Acme")];

        assert!(matches!(manager.write::<CachedObject>(&[], "k", "Account"), WriteOutcome::Skipped));
        assert!(matches!(manager.write(&values, " ", "Account"), WriteOutcome::Skipped));
        assert!(matches!(manager.write(&values, "k", ""), WriteOutcome::Skipped));
        assert!(manager.overlay().is_empty());
        assert!(!manager.store().collection_exists("Account"));
    }

    #[test]
    fn test_unencodable_values_stay_in_memory() {
        let (_, manager) = manager();
        let layouts = vec![ObjectLayout::new("", Map::new())];

        let outcome = manager.write_object_layouts(&layouts, "k1", "Layouts");
        assert!(matches!(outcome, WriteOutcome::MemoryOnly));
        assert!(manager.overlay().contains::<ObjectLayout>("k1"));
        assert!(!manager.store().collection_exists("Layouts"));
    }

    #[test]
    fn test_write_registers_collection_once() {
        let (_, manager) = manager();
        manager.write_objects(&[account("001A", "Acme")], "k1", "Account");
        manager.write_objects(&[account("001B", "Globex")], "k2", "Account");

        assert_eq!(manager.collection_names(), vec!["Account"]);
        assert!(manager.collection_exists_in_registry("Account"));
    }

    #[test]
    fn test_read_drops_malformed_layouts() {
        let (_, manager) = manager();
        manager
            .store()
            .register_collection("Layouts", &[IndexSpec::string(CACHE_KEY)])
            .unwrap();
        manager
            .store()
            .upsert(
                "Layouts",
                json!({
                    CACHE_KEY: "k1",
                    CACHE_DATA: [
                        {"type": "Account", "rawData": {"layoutType": "Full"}},
                        {"type": "", "rawData": {}},
                        {"rawData": {}},
                        "garbage"
                    ]
                }),
                Some(CACHE_KEY),
            )
            .unwrap();

        let layouts = manager.read_object_layouts("Layouts", "k1");
        assert_eq!(layouts.len(), 1);
        assert_eq!(layouts[0].object_type(), "Account");
    }

    #[test]
    fn test_fully_malformed_record_does_not_populate_overlay() {
        let (_, manager) = manager();
        manager
            .store()
            .register_collection("Account", &[IndexSpec::string(CACHE_KEY)])
            .unwrap();
        manager
            .store()
            .upsert(
                "Account",
                json!({ CACHE_KEY: "k1", CACHE_DATA: ["a", 1, null] }),
                Some(CACHE_KEY),
            )
            .unwrap();

        assert!(manager.read_objects("Account", "k1").is_empty());
        assert!(!manager.overlay().contains::<CachedObject>("k1"));
        assert_eq!(manager.stats().misses, 1);
    }

    #[test]
    fn test_last_update_time_and_should_reload() {
        let (clock, manager) = manager();
        assert_eq!(manager.last_cache_update_time("Account", "k1"), 0);
        assert!(manager.should_reload(CachePolicy::ReloadIfExpiredAndReturnCache, "Account", "k1", Some(5_000)));

        manager.write_objects(&[account("001A", "Acme")], "k1", "Account");
        assert_eq!(manager.last_cache_update_time("Account", "k1"), NOW);

        clock.advance(4_000);
        assert!(!manager.should_reload(CachePolicy::ReloadIfExpiredAndReturnCache, "Account", "k1", Some(5_000)));

        clock.advance(2_000);
        assert!(manager.should_reload(CachePolicy::ReloadIfExpiredAndReturnCache, "Account", "k1", Some(5_000)));
        assert!(!manager.should_reload(CachePolicy::ReturnCacheDontReload, "Account", "k1", Some(5_000)));
    }

    #[test]
    fn test_should_reload_uses_default_threshold() {
        let (clock, manager) = manager();
        let manager = manager.with_default_stale_after(1_000);
        manager.write_objects(&[account("001A", "Acme")], "k1", "Account");

        clock.advance(999);
        assert!(!manager.should_reload(CachePolicy::ReloadIfExpiredAndReturnCache, "Account", "k1", None));
        clock.advance(2);
        assert!(manager.should_reload(CachePolicy::ReloadIfExpiredAndReturnCache, "Account", "k1", None));
    }

    #[test]
    fn test_remove_collection_drops_existing_collection() {
        // A non-blank, existing name must reach the drop; guarding on the
        // wrong condition here turns removal into a silent no-op.
        let (_, manager) = manager();
        manager.write_objects(&[account("001A", "Acme")], "k1", "Account");
        manager.write_objects(&[account("003A", "Jane")], "k1", "Contact");

        assert!(manager.remove_collection("Account"));
        assert!(!manager.does_cache_exist("Account"));
        assert_eq!(manager.collection_names(), vec!["Contact"]);
        // Global invalidation: the Contact entry is gone from memory too.
        assert!(manager.overlay().is_empty());
        assert_eq!(manager.read_objects("Contact", "k1").len(), 1);
    }

    #[test]
    fn test_remove_collection_missing_or_blank() {
        let (_, manager) = manager();
        manager.write_objects(&[account("001A", "Acme")], "k1", "Account");

        assert!(!manager.remove_collection("Nope"));
        assert!(!manager.remove_collection("  "));
        assert!(manager.overlay().contains::<CachedObject>("k1"));
    }

    #[test]
    fn test_drop_everything() {
        let (_, manager) = manager();
        manager.write_objects(&[account("001A", "Acme")], "k1", "Account");
        manager.write_objects(&[account("003A", "Jane")], "k1", "Contact");

        assert_eq!(manager.drop_everything(), 2);
        assert!(!manager.does_cache_exist("Account"));
        assert!(!manager.does_cache_exist("Contact"));
        assert!(!manager.store().collection_exists(MASTER_COLLECTION));
        assert!(manager.collection_names().is_empty());
    }
}
