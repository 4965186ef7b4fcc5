//! Cached payload models
//!
//! The three payload domains the cache manager stores, and the
//! [`CachePayload`] capability that lets one read/write pipeline serve all
//! of them.

pub mod layout;
pub mod object;
pub mod object_type;

use serde_json::Value;

use crate::cache::{MemoryOverlay, OverlaySlot};

// Re-export commonly used types
pub use layout::ObjectLayout;
pub use object::CachedObject;
pub use object_type::ObjectType;

// == Cache Payload ==
/// A value the cache manager can persist as raw JSON and keep decoded in
/// the memory overlay.
pub trait CachePayload: Clone + Send + Sync + 'static {
    /// Short domain name used in log lines
    const DOMAIN: &'static str;

    /// Decodes one raw payload entry. None drops the entry.
    fn decode(raw: &Value) -> Option<Self>;

    /// Encodes the value for persistence. None skips it.
    fn encode(&self) -> Option<Value>;

    /// The overlay mapping holding this domain.
    fn slot(overlay: &MemoryOverlay) -> &OverlaySlot<Self>;
}
