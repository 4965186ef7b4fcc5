//! Collection state shared by the store implementations.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{EntryId, IndexSpec, QuerySpec, StoredRecord};
use crate::error::{StoreError, StoreResult};

/// One named collection and its records, kept in entry id order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Collection {
    indexes: Vec<IndexSpec>,
    next_id: i64,
    entries: Vec<StoredRecord>,
}

impl Collection {
    fn is_indexed(&self, attribute: &str) -> bool {
        self.indexes.iter().any(|index| index.path == attribute)
    }
}

/// All collections of one store.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct Collections {
    collections: BTreeMap<String, Collection>,
}

/// Compares a record attribute against a query value.
///
/// Strings compare directly; other scalars compare by their JSON text.
fn attribute_matches(body: &Value, attribute: &str, value: &str) -> bool {
    match body.get(attribute) {
        Some(Value::String(s)) => s == value,
        Some(Value::Null) | None => false,
        Some(other) => other.to_string() == value,
    }
}

impl Collections {
    pub(crate) fn register(&mut self, name: &str, indexes: &[IndexSpec]) -> StoreResult<()> {
        if name.trim().is_empty() {
            return Err(StoreError::InvalidRecord(
                "Collection name cannot be empty".to_string(),
            ));
        }
        self.collections
            .entry(name.to_string())
            .or_insert_with(|| Collection {
                indexes: indexes.to_vec(),
                next_id: 1,
                entries: Vec::new(),
            });
        Ok(())
    }

    pub(crate) fn exists(&self, name: &str) -> bool {
        self.collections.contains_key(name)
    }

    fn get(&self, name: &str) -> StoreResult<&Collection> {
        self.collections
            .get(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    fn get_mut(&mut self, name: &str) -> StoreResult<&mut Collection> {
        self.collections
            .get_mut(name)
            .ok_or_else(|| StoreError::CollectionNotFound(name.to_string()))
    }

    pub(crate) fn upsert(
        &mut self,
        name: &str,
        record: Value,
        key_attribute: Option<&str>,
        now_ms: i64,
    ) -> StoreResult<StoredRecord> {
        if !record.is_object() {
            return Err(StoreError::InvalidRecord(format!(
                "Records in '{}' must be JSON objects",
                name
            )));
        }
        let collection = self.get_mut(name)?;

        if let Some(attribute) = key_attribute {
            if !collection.is_indexed(attribute) {
                return Err(StoreError::NotIndexed {
                    collection: name.to_string(),
                    attribute: attribute.to_string(),
                });
            }
            let key = match record.get(attribute) {
                Some(Value::String(s)) => s.clone(),
                Some(Value::Null) | None => {
                    return Err(StoreError::InvalidRecord(format!(
                        "Record is missing key attribute '{}'",
                        attribute
                    )))
                }
                Some(other) => other.to_string(),
            };

            if let Some(existing) = collection
                .entries
                .iter_mut()
                .find(|entry| attribute_matches(&entry.body, attribute, &key))
            {
                existing.body = record;
                existing.last_modified = now_ms;
                return Ok(existing.clone());
            }
        }

        let stored = StoredRecord {
            id: EntryId(collection.next_id),
            last_modified: now_ms,
            body: record,
        };
        collection.next_id += 1;
        collection.entries.push(stored.clone());
        Ok(stored)
    }

    fn matching<'a>(
        &'a self,
        spec: &'a QuerySpec,
    ) -> StoreResult<impl Iterator<Item = &'a StoredRecord> + 'a> {
        let collection = self.get(&spec.collection)?;
        if let Some(filter) = &spec.filter {
            if !collection.is_indexed(&filter.attribute) {
                return Err(StoreError::NotIndexed {
                    collection: spec.collection.clone(),
                    attribute: filter.attribute.clone(),
                });
            }
        }
        Ok(collection.entries.iter().filter(move |entry| {
            spec.filter
                .as_ref()
                .map_or(true, |f| attribute_matches(&entry.body, &f.attribute, &f.value))
        }))
    }

    pub(crate) fn query(
        &self,
        spec: &QuerySpec,
        page_index: usize,
    ) -> StoreResult<Vec<StoredRecord>> {
        let skip = page_index.saturating_mul(spec.page_size);
        Ok(self
            .matching(spec)?
            .skip(skip)
            .take(spec.page_size)
            .cloned()
            .collect())
    }

    pub(crate) fn count(&self, spec: &QuerySpec) -> StoreResult<i64> {
        Ok(self.matching(spec)?.count() as i64)
    }

    pub(crate) fn lookup_entry_id(
        &self,
        name: &str,
        attribute: &str,
        value: &str,
    ) -> StoreResult<Option<EntryId>> {
        let spec = QuerySpec::exact(name, attribute, value, 1);
        let id = self.matching(&spec)?.next().map(|entry| entry.id);
        Ok(id)
    }

    pub(crate) fn delete(&mut self, name: &str, ids: &[EntryId]) -> StoreResult<()> {
        let collection = self.get_mut(name)?;
        collection.entries.retain(|entry| !ids.contains(&entry.id));
        Ok(())
    }

    pub(crate) fn drop_collection(&mut self, name: &str) {
        self.collections.remove(name);
    }

    pub(crate) fn drop_all(&mut self) {
        self.collections.clear();
    }
}
