//! Cache Module
//!
//! The per-identity cache manager: a memory overlay in front of an indexed
//! store, with a master collection tracking every collection it creates.

mod manager;
mod master;
mod overlay;
mod stats;

#[cfg(test)]
mod property_tests;

// Re-export public types
pub use manager::{CacheManager, WriteOutcome};
pub use overlay::{MemoryOverlay, OverlaySlot};
pub use stats::CacheStats;

// == Public Constants ==
/// Indexed attribute holding the cache key of a cache record
pub const CACHE_KEY: &str = "cache_key";

/// Attribute holding the raw payload array of a cache record
pub const CACHE_DATA: &str = "cache_data";

/// Reserved collection listing every collection created by the manager
pub const MASTER_COLLECTION: &str = "master_soup";

/// Indexed attribute of master collection rows holding a collection name
pub const COLLECTION_NAME_KEY: &str = "soup_names";
