//! Object-type descriptors.

use serde_json::{Map, Value};

use super::CachePayload;
use crate::cache::{MemoryOverlay, OverlaySlot};

/// Describes one record type (name, label, key prefix, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectType {
    raw_data: Map<String, Value>,
}

impl ObjectType {
    pub fn new(raw_data: Map<String, Value>) -> Self {
        Self { raw_data }
    }

    pub fn raw_data(&self) -> &Map<String, Value> {
        &self.raw_data
    }

    pub fn name(&self) -> Option<&str> {
        self.raw_data.get("name").and_then(Value::as_str)
    }

    pub fn label(&self) -> Option<&str> {
        self.raw_data.get("label").and_then(Value::as_str)
    }

    pub fn key_prefix(&self) -> Option<&str> {
        self.raw_data.get("keyPrefix").and_then(Value::as_str)
    }

    pub fn is_searchable(&self) -> bool {
        self.raw_data
            .get("searchable")
            .and_then(Value::as_bool)
            .unwrap_or(false)
    }
}

impl CachePayload for ObjectType {
    const DOMAIN: &'static str = "object type";

    fn decode(raw: &Value) -> Option<Self> {
        raw.as_object().cloned().map(Self::new)
    }

    fn encode(&self) -> Option<Value> {
        Some(Value::Object(self.raw_data.clone()))
    }

    fn slot(overlay: &MemoryOverlay) -> &OverlaySlot<Self> {
        &overlay.object_types
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_descriptor_fields() {
        let ty = ObjectType::decode(&json!({
            "name": "Account",
            "label": "Account",
            "keyPrefix": "001",
            "searchable": true
        }))
        .unwrap();
        assert_eq!(ty.name(), Some("Account"));
        assert_eq!(ty.key_prefix(), Some("001"));
        assert!(ty.is_searchable());
        assert_eq!(ObjectType::decode(&ty.encode().unwrap()), Some(ty));
    }
}
