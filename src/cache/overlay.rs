//! Memory Overlay Module
//!
//! In-process layer holding already-decoded values per cache key.

use std::collections::HashMap;

use parking_lot::RwLock;

use crate::models::{CachePayload, CachedObject, ObjectLayout, ObjectType};

/// One domain's mapping from cache key to decoded values.
pub type OverlaySlot<T> = RwLock<HashMap<String, Vec<T>>>;

// == Memory Overlay ==
/// Three typed mappings, one per payload domain, each behind its own lock.
///
/// Entries are only ever replaced wholesale, never merged.
#[derive(Debug, Default)]
pub struct MemoryOverlay {
    pub(crate) objects: OverlaySlot<CachedObject>,
    pub(crate) object_types: OverlaySlot<ObjectType>,
    pub(crate) layouts: OverlaySlot<ObjectLayout>,
}

impl MemoryOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    // == Get ==
    /// Returns a copy of the values cached under `key`, if any.
    pub fn get<T: CachePayload>(&self, key: &str) -> Option<Vec<T>> {
        T::slot(self).read().get(key).cloned()
    }

    // == Put ==
    /// Replaces whatever is cached under `key`.
    pub fn put<T: CachePayload>(&self, key: &str, values: Vec<T>) {
        T::slot(self).write().insert(key.to_string(), values);
    }

    pub fn contains<T: CachePayload>(&self, key: &str) -> bool {
        T::slot(self).read().contains_key(key)
    }

    // == Reset ==
    /// Empties all three domains.
    pub fn reset(&self) {
        self.objects.write().clear();
        self.object_types.write().clear();
        self.layouts.write().clear();
    }

    /// Total number of cached keys across domains.
    pub fn len(&self) -> usize {
        self.objects.read().len() + self.object_types.read().len() + self.layouts.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
