//! In-process document store.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use serde_json::{Map, Value};
use tracing::debug;

use super::{split_path, KeyPathStore};
use crate::error::StoreError;

/// A JSON document tree kept in memory.
///
/// Handy for tests and for running the ledger without a database. Counts
/// every read so callers can check whether a code path touched the store.
#[derive(Debug, Default)]
pub struct MemoryStore {
    root: RwLock<Value>,
    reads: AtomicU64,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            root: RwLock::new(Value::Object(Map::new())),
            reads: AtomicU64::new(0),
        }
    }

    /// Create a store seeded with an existing document tree.
    pub fn with_data(data: Value) -> Self {
        Self {
            root: RwLock::new(data),
            reads: AtomicU64::new(0),
        }
    }

    /// Number of reads served so far (`get` and `keys_list`).
    pub fn reads(&self) -> u64 {
        self.reads.load(Ordering::Relaxed)
    }

    /// Snapshot of the whole tree.
    pub fn snapshot(&self) -> Value {
        self.root.read().clone()
    }
}

fn lookup<'a>(mut node: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    for segment in segments {
        node = match node {
            Value::Object(map) => map.get(*segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(node)
}

/// Walk to `segments`, replacing anything that is not an object on the way.
fn lookup_or_create<'a>(mut node: &'a mut Value, segments: &[&str]) -> &'a mut Value {
    for segment in segments {
        if !node.is_object() {
            *node = Value::Object(Map::new());
        }
        node = match node {
            Value::Object(map) => map.entry(segment.to_string()).or_insert(Value::Null),
            _ => unreachable!("node was just made an object"),
        };
    }
    node
}

#[async_trait]
impl KeyPathStore for MemoryStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        let segments = split_path(path)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let root = self.root.read();
        Ok(lookup(&root, &segments)
            .filter(|value| !value.is_null())
            .cloned())
    }

    async fn set(&self, path: &str, value: Value) -> Result<bool, StoreError> {
        let segments = split_path(path)?;
        if segments.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        let mut root = self.root.write();
        *lookup_or_create(&mut root, &segments) = value;
        debug!("memory store: set {}", path);
        Ok(true)
    }

    async fn push(&self, path: &str, value: Value) -> Result<bool, StoreError> {
        let segments = split_path(path)?;
        if segments.is_empty() {
            return Err(StoreError::InvalidPath(path.to_string()));
        }

        let mut root = self.root.write();
        let node = lookup_or_create(&mut root, &segments);
        match node {
            Value::Array(items) => items.push(value),
            Value::Null => *node = Value::Array(vec![value]),
            _ => {
                return Err(StoreError::Write {
                    path: path.to_string(),
                    message: "target is not an array".to_string(),
                });
            }
        }
        debug!("memory store: push {}", path);
        Ok(true)
    }

    async fn pull(&self, path: &str, index: usize, value: Value) -> Result<bool, StoreError> {
        let segments = split_path(path)?;

        let mut root = self.root.write();
        let mut node: &mut Value = &mut root;
        for segment in &segments {
            node = match node {
                Value::Object(map) => match map.get_mut(*segment) {
                    Some(next) => next,
                    None => return Ok(false),
                },
                _ => return Ok(false),
            };
        }

        match node {
            Value::Array(items) if index < items.len() => {
                items[index] = value;
                debug!("memory store: pull {}[{}]", path, index);
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove(&self, path: &str) -> Result<bool, StoreError> {
        let segments = split_path(path)?;
        let Some((last, parents)) = segments.split_last() else {
            return Err(StoreError::InvalidPath(path.to_string()));
        };

        let mut root = self.root.write();
        let mut node: &mut Value = &mut root;
        for segment in parents {
            node = match node {
                Value::Object(map) => match map.get_mut(*segment) {
                    Some(next) => next,
                    None => return Ok(false),
                },
                _ => return Ok(false),
            };
        }

        let removed = match node {
            Value::Object(map) => map.remove(*last).is_some(),
            _ => false,
        };
        debug!("memory store: remove {} ({})", path, removed);
        Ok(removed)
    }

    async fn keys_list(&self, path: &str) -> Result<Vec<String>, StoreError> {
        let segments = split_path(path)?;
        self.reads.fetch_add(1, Ordering::Relaxed);

        let root = self.root.read();
        Ok(match lookup(&root, &segments) {
            Some(Value::Object(map)) => map.keys().cloned().collect(),
            _ => Vec::new(),
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[tokio::test]
    async fn test_set_creates_intermediate_objects() {
        let store = MemoryStore::new();
        store.set("g1.u1.money", json!(50)).await.unwrap();

        assert_eq!(store.get("g1.u1.money").await.unwrap(), Some(json!(50)));
        assert_eq!(
            store.get("g1.u1").await.unwrap(),
            Some(json!({ "money": 50 }))
        );
        assert_eq!(store.get("g1.u2").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_push_and_pull() {
        let store = MemoryStore::new();
        store.push("g1.shop", json!({ "id": 1 })).await.unwrap();
        store.push("g1.shop", json!({ "id": 2 })).await.unwrap();

        assert!(store.pull("g1.shop", 1, json!({ "id": 3 })).await.unwrap());
        assert!(!store.pull("g1.shop", 5, json!({ "id": 4 })).await.unwrap());
        assert_eq!(
            store.get("g1.shop").await.unwrap(),
            Some(json!([{ "id": 1 }, { "id": 3 }]))
        );
        assert_eq!(store.get("g1.shop.0.id").await.unwrap(), Some(json!(1)));
    }

    #[tokio::test]
    async fn test_push_onto_scalar_fails() {
        let store = MemoryStore::new();
        store.set("g1.u1.money", json!(5)).await.unwrap();
        assert!(store.push("g1.u1.money", json!(1)).await.is_err());
    }

    #[tokio::test]
    async fn test_remove_and_keys_list() {
        let store = MemoryStore::with_data(json!({
            "g1": { "u1": { "money": 1 }, "u2": { "money": 2 } }
        }));

        let mut keys = store.keys_list("g1").await.unwrap();
        keys.sort();
        assert_eq!(keys, vec!["u1", "u2"]);
        assert_eq!(store.keys_list("").await.unwrap(), vec!["g1"]);

        assert!(store.remove("g1.u1").await.unwrap());
        assert!(!store.delete("g1.u1").await.unwrap());
        assert_eq!(store.keys_list("g1").await.unwrap(), vec!["u2"]);
    }

    #[tokio::test]
    async fn test_reads_are_counted() {
        let store = MemoryStore::new();
        assert_eq!(store.reads(), 0);
        store.fetch("g1").await.unwrap();
        store.keys_list("g1").await.unwrap();
        store.set("g1.x", json!(1)).await.unwrap();
        assert_eq!(store.reads(), 2);
    }
}
