//! Cache Statistics Module
//!
//! Tracks where reads were served from and how many writes failed to persist.

use serde::Serialize;

// == Cache Stats ==
/// Per-instance read and write counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CacheStats {
    /// Reads served from the memory overlay
    pub overlay_hits: u64,
    /// Reads served by decoding a persisted record
    pub store_hits: u64,
    /// Reads that reached the store and produced nothing
    pub misses: u64,
    /// Writes that updated the overlay but could not be persisted
    pub persist_failures: u64,
}

impl CacheStats {
    // == Constructor ==
    /// Creates a new CacheStats with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Calculates the cache hit rate.
    ///
    /// Returns (overlay_hits + store_hits) / all lookups, or 0.0 if no
    /// lookups have been made.
    pub fn hit_rate(&self) -> f64 {
        let hits = self.overlay_hits + self.store_hits;
        let total = hits + self.misses;
        if total == 0 {
            0.0
        } else {
            hits as f64 / total as f64
        }
    }

    // == Record Overlay Hit ==
    /// Increments the overlay hit counter.
    pub fn record_overlay_hit(&mut self) {
        self.overlay_hits += 1;
    }

    // == Record Store Hit ==
    /// Increments the store hit counter.
    pub fn record_store_hit(&mut self) {
        self.store_hits += 1;
    }

    // == Record Miss ==
    /// Increments the miss counter.
    pub fn record_miss(&mut self) {
        self.misses += 1;
    }

    // == Record Persist Failure ==
    /// Increments the persist failure counter.
    pub fn record_persist_failure(&mut self) {
        self.persist_failures += 1;
    }
}
