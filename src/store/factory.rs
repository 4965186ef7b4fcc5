//! Store factories: one store handle per identity key.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::info;

use super::{Clock, IndexedStore, JsonFileStore, MemoryStore, SystemClock};
use crate::error::StoreResult;
use crate::identity::IdentityKey;

// == Store Factory ==
/// Opens the persistent store belonging to an identity.
///
/// Opening the same key twice must yield a handle onto the same data, so a
/// cache manager rebuilt after a soft reset sees what its predecessor wrote.
pub trait StoreFactory: Send + Sync {
    fn open(&self, key: &IdentityKey) -> StoreResult<Arc<dyn IndexedStore>>;
}

// == Memory Store Factory ==
/// Hands out one [`MemoryStore`] per identity key for the life of the factory.
#[derive(Debug)]
pub struct MemoryStoreFactory {
    stores: Mutex<HashMap<IdentityKey, Arc<MemoryStore>>>,
    clock: Arc<dyn Clock>,
}

impl MemoryStoreFactory {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock::new()))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self {
            stores: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl Default for MemoryStoreFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl StoreFactory for MemoryStoreFactory {
    fn open(&self, key: &IdentityKey) -> StoreResult<Arc<dyn IndexedStore>> {
        let store: Arc<dyn IndexedStore> = self
            .stores
            .lock()
            .entry(key.clone())
            .or_insert_with(|| Arc::new(MemoryStore::with_clock(self.clock.clone())))
            .clone();
        Ok(store)
    }
}

// == JSON File Store Factory ==
/// Opens a [`JsonFileStore`] under `<root>/<hex(identity key)>`.
#[derive(Debug)]
pub struct JsonFileStoreFactory {
    root: PathBuf,
    stores: Mutex<HashMap<IdentityKey, Arc<JsonFileStore>>>,
    clock: Arc<dyn Clock>,
}

impl JsonFileStoreFactory {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self::with_clock(root, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(root: impl Into<PathBuf>, clock: Arc<dyn Clock>) -> Self {
        Self {
            root: root.into(),
            stores: Mutex::new(HashMap::new()),
            clock,
        }
    }
}

impl StoreFactory for JsonFileStoreFactory {
    fn open(&self, key: &IdentityKey) -> StoreResult<Arc<dyn IndexedStore>> {
        let mut stores = self.stores.lock();
        if let Some(store) = stores.get(key) {
            let store: Arc<dyn IndexedStore> = store.clone();
            return Ok(store);
        }

        let dir = self.root.join(key.to_hex());
        let store = Arc::new(JsonFileStore::open_with_clock(&dir, self.clock.clone())?);
        info!("Opened store for identity {} at {}", key, dir.display());
        stores.insert(key.clone(), store.clone());
        let store: Arc<dyn IndexedStore> = store;
        Ok(store)
    }
}
