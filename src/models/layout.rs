//! Layout descriptors.
//!
//! Unlike the other domains, a layout is persisted wrapped in an envelope
//! carrying its record type, and an entry missing either half is dropped.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::CachePayload;
use crate::cache::{MemoryOverlay, OverlaySlot};

/// Persisted form of a layout entry.
#[derive(Debug, Serialize, Deserialize)]
struct LayoutEnvelope {
    #[serde(rename = "rawData")]
    raw_data: Map<String, Value>,
    #[serde(rename = "type")]
    object_type: String,
}

/// Page layout of one record type.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectLayout {
    object_type: String,
    raw_data: Map<String, Value>,
}

impl ObjectLayout {
    pub fn new(object_type: impl Into<String>, raw_data: Map<String, Value>) -> Self {
        Self {
            object_type: object_type.into(),
            raw_data,
        }
    }

    pub fn object_type(&self) -> &str {
        &self.object_type
    }

    pub fn raw_data(&self) -> &Map<String, Value> {
        &self.raw_data
    }
}

impl CachePayload for ObjectLayout {
    const DOMAIN: &'static str = "layout";

    fn decode(raw: &Value) -> Option<Self> {
        let envelope = LayoutEnvelope::deserialize(raw).ok()?;
        if envelope.object_type.trim().is_empty() {
            return None;
        }
        Some(Self::new(envelope.object_type, envelope.raw_data))
    }

    fn encode(&self) -> Option<Value> {
        if self.object_type.trim().is_empty() {
            return None;
        }
        let envelope = LayoutEnvelope {
            raw_data: self.raw_data.clone(),
            object_type: self.object_type.clone(),
        };
        serde_json::to_value(envelope).ok()
    }

    fn slot(overlay: &MemoryOverlay) -> &OverlaySlot<Self> {
        &overlay.layouts
    }
}
