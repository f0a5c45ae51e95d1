//! Key-path document store.
//!
//! Everything the ledger persists lives in one document tree addressed by
//! dot-separated paths such as `"{guild}.{member}.money"`. The cache layer
//! and the managers only ever talk to the store through [`KeyPathStore`].

mod memory;
mod mongo;
pub mod typed;

#[cfg(test)]
pub(crate) mod testing;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;

pub use memory::MemoryStore;
pub use mongo::MongoStore;

/// Separator between path segments.
pub const PATH_SEPARATOR: char = '.';

/// Asynchronous document store addressed by dot-paths.
#[async_trait]
pub trait KeyPathStore: Send + Sync {
    /// Read the value at `path`, `None` if nothing is stored there.
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError>;

    /// Overwrite the value at `path`, creating intermediate objects.
    async fn set(&self, path: &str, value: Value) -> Result<bool, StoreError>;

    /// Append `value` to the array at `path`, creating the array if missing.
    async fn push(&self, path: &str, value: Value) -> Result<bool, StoreError>;

    /// Replace the array element at `index` under `path`.
    async fn pull(&self, path: &str, index: usize, value: Value) -> Result<bool, StoreError>;

    /// Delete the value at `path`. Returns whether anything was removed.
    async fn remove(&self, path: &str) -> Result<bool, StoreError>;

    /// Keys of the object at `path` (the root when `path` is empty).
    async fn keys_list(&self, path: &str) -> Result<Vec<String>, StoreError>;

    async fn fetch(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.get(path).await
    }

    async fn delete(&self, path: &str) -> Result<bool, StoreError> {
        self.remove(path).await
    }
}

/// Join segments into a store path.
pub fn key_path(segments: &[&str]) -> String {
    segments.join(".")
}

/// Split a path into segments, rejecting empty segments.
pub(crate) fn split_path(path: &str) -> Result<Vec<&str>, StoreError> {
    if path.is_empty() {
        return Ok(Vec::new());
    }

    let segments: Vec<&str> = path.split(PATH_SEPARATOR).collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::InvalidPath(path.to_string()));
    }
    Ok(segments)
}
