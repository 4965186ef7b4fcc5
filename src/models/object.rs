//! Generic cached records.

use serde_json::{Map, Value};

use super::CachePayload;
use crate::cache::{MemoryOverlay, OverlaySlot};

/// A generic record (an account, a contact, ...) kept as its raw JSON.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedObject {
    raw_data: Map<String, Value>,
}

impl CachedObject {
    pub fn new(raw_data: Map<String, Value>) -> Self {
        Self { raw_data }
    }

    pub fn raw_data(&self) -> &Map<String, Value> {
        &self.raw_data
    }

    /// Record type from `attributes.type`.
    pub fn object_type(&self) -> Option<&str> {
        self.raw_data
            .get("attributes")
            .and_then(|attrs| attrs.get("type"))
            .and_then(Value::as_str)
    }

    pub fn object_id(&self) -> Option<&str> {
        self.raw_data.get("Id").and_then(Value::as_str)
    }

    pub fn name(&self) -> Option<&str> {
        self.raw_data.get("Name").and_then(Value::as_str)
    }
}

impl CachePayload for CachedObject {
    const DOMAIN: &'static str = "object";

    fn decode(raw: &Value) -> Option<Self> {
        raw.as_object().cloned().map(Self::new)
    }

    fn encode(&self) -> Option<Value> {
        Some(Value::Object(self.raw_data.clone()))
    }

    fn slot(overlay: &MemoryOverlay) -> &OverlaySlot<Self> {
        &overlay.objects
    }
}
