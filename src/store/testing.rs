//! Store wrappers for tests.

use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value;

use super::{KeyPathStore, MemoryStore};
use crate::error::StoreError;

/// A [`MemoryStore`] whose reads, or writes under one path, can be
/// switched to fail.
#[derive(Debug, Default)]
pub struct FlakyStore {
    pub inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes_under: Mutex<Option<String>>,
}

impl FlakyStore {
    pub fn new(inner: MemoryStore) -> Self {
        Self {
            inner,
            fail_reads: AtomicBool::new(false),
            fail_writes_under: Mutex::new(None),
        }
    }

    /// Fail every write to `path` or below it; `None` lets writes through.
    pub fn fail_writes_under(&self, path: Option<&str>) {
        *self.fail_writes_under.lock() = path.map(str::to_string);
    }

    fn check_write(&self, path: &str) -> Result<(), StoreError> {
        if let Some(prefix) = self.fail_writes_under.lock().as_deref() {
            if path == prefix || path.starts_with(&format!("{prefix}.")) {
                return Err(StoreError::Write {
                    path: path.to_string(),
                    message: "connection reset".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    fn check(&self, path: &str) -> Result<(), StoreError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(StoreError::Read {
                path: path.to_string(),
                message: "connection reset".to_string(),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl KeyPathStore for FlakyStore {
    async fn get(&self, path: &str) -> Result<Option<Value>, StoreError> {
        self.check(path)?;
        self.inner.get(path).await
    }

    async fn set(&self, path: &str, value: Value) -> Result<bool, StoreError> {
        self.check_write(path)?;
        self.inner.set(path, value).await
    }

    async fn push(&self, path: &str, value: Value) -> Result<bool, StoreError> {
        self.check_write(path)?;
        self.inner.push(path, value).await
    }

    async fn pull(&self, path: &str, index: usize, value: Value) -> Result<bool, StoreError> {
        self.check_write(path)?;
        self.inner.pull(path, index, value).await
    }

    async fn remove(&self, path: &str) -> Result<bool, StoreError> {
        self.check_write(path)?;
        self.inner.remove(path).await
    }

    async fn keys_list(&self, path: &str) -> Result<Vec<String>, StoreError> {
        self.check(path)?;
        self.inner.keys_list(path).await
    }
}
