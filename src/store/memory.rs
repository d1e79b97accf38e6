//! In-memory [`DocumentStore`] backend used by tests and local runs.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;
use dashmap::DashMap;
use serde_json::{Map, Value};

use super::{field_at, Document, DocumentStore, Filter, StoreError};

struct Versioned {
    data: Value,
    version: u64,
}

/// DashMap-backed store. Each document carries a monotonically increasing
/// version; all mutation happens under the per-document shard lock, which
/// is what makes `increment` and `compare_and_swap` atomic here.
#[derive(Default)]
pub struct MemoryStore {
    collections: DashMap<String, DashMap<String, Versioned>>,
    // Documents whose writes are forced to fail, keyed "collection/id".
    // Test hook for exercising partial-failure paths.
    poisoned: Mutex<HashSet<String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes every subsequent write to `collection/id` fail. Reads are
    /// unaffected.
    pub fn poison_writes(&self, collection: &str, id: &str) {
        self.poisoned
            .lock()
            .expect("poison set lock")
            .insert(format!("{collection}/{id}"));
    }

    fn check_poisoned(&self, collection: &str, id: &str) -> Result<(), StoreError> {
        let poisoned = self.poisoned.lock().expect("poison set lock");
        if poisoned.contains(&format!("{collection}/{id}")) {
            return Err(StoreError::Backend(format!(
                "simulated write failure for {collection}/{id}"
            )));
        }
        Ok(())
    }

    fn collection(&self, name: &str) -> dashmap::mapref::one::RefMut<'_, String, DashMap<String, Versioned>> {
        self.collections.entry(name.to_string()).or_default()
    }
}

fn deep_merge(target: &mut Value, patch: Value) {
    match (target, patch) {
        (Value::Object(target_map), Value::Object(patch_map)) => {
            for (key, value) in patch_map {
                if value.is_null() {
                    target_map.remove(&key);
                } else {
                    match target_map.get_mut(&key) {
                        Some(existing) if existing.is_object() && value.is_object() => {
                            deep_merge(existing, value);
                        }
                        _ => {
                            target_map.insert(key, value);
                        }
                    }
                }
            }
        }
        (target, patch) => *target = patch,
    }
}

fn add_at_path(data: &mut Value, path: &str, delta: f64) {
    let mut current = data;
    let segments: Vec<&str> = path.split('.').collect();
    for segment in &segments[..segments.len() - 1] {
        if !current.get(*segment).map(Value::is_object).unwrap_or(false) {
            current[*segment] = Value::Object(Map::new());
        }
        current = &mut current[*segment];
    }
    let leaf = segments[segments.len() - 1];
    let base = current.get(leaf).and_then(Value::as_f64).unwrap_or(0.0);
    current[leaf] = serde_json::json!(base + delta);
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, StoreError> {
        Ok(self.get_versioned(collection, id).await?.map(|(doc, _)| doc))
    }

    async fn get_versioned(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<(Document, u64)>, StoreError> {
        let Some(col) = self.collections.get(collection) else {
            return Ok(None);
        };
        Ok(col.get(id).map(|entry| {
            (
                Document {
                    id: id.to_string(),
                    data: entry.data.clone(),
                },
                entry.version,
            )
        }))
    }

    async fn query(
        &self,
        collection: &str,
        filters: &[Filter],
    ) -> Result<Vec<Document>, StoreError> {
        let Some(col) = self.collections.get(collection) else {
            return Ok(Vec::new());
        };
        let mut results: Vec<Document> = col
            .iter()
            .filter(|entry| {
                filters.iter().all(|filter| {
                    field_at(&entry.data, &filter.field) == Some(&filter.value)
                })
            })
            .map(|entry| Document {
                id: entry.key().clone(),
                data: entry.data.clone(),
            })
            .collect();
        // Stable output for callers and tests.
        results.sort_by(|a, b| a.id.cmp(&b.id));
        Ok(results)
    }

    async fn insert(&self, collection: &str, id: &str, data: Value) -> Result<(), StoreError> {
        self.check_poisoned(collection, id)?;
        self.collection(collection)
            .insert(id.to_string(), Versioned { data, version: 1 });
        Ok(())
    }

    async fn merge(&self, collection: &str, id: &str, patch: Value) -> Result<(), StoreError> {
        self.check_poisoned(collection, id)?;
        let col = self.collection(collection);
        let mut entry = col
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        deep_merge(&mut entry.data, patch);
        entry.version += 1;
        Ok(())
    }

    async fn increment(
        &self,
        collection: &str,
        id: &str,
        deltas: &[(String, f64)],
    ) -> Result<(), StoreError> {
        self.check_poisoned(collection, id)?;
        let col = self.collection(collection);
        let mut entry = col
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        for (path, delta) in deltas {
            add_at_path(&mut entry.data, path, *delta);
        }
        entry.version += 1;
        Ok(())
    }

    async fn compare_and_swap(
        &self,
        collection: &str,
        id: &str,
        expected_version: u64,
        data: Value,
    ) -> Result<bool, StoreError> {
        self.check_poisoned(collection, id)?;
        let col = self.collection(collection);
        let mut entry = col
            .get_mut(id)
            .ok_or_else(|| StoreError::Missing {
                collection: collection.to_string(),
                id: id.to_string(),
            })?;
        if entry.version != expected_version {
            return Ok(false);
        }
        entry.data = data;
        entry.version += 1;
        Ok(true)
    }
}
