//! Typed reads and writes over a [`KeyPathStore`].

use serde::de::DeserializeOwned;
use serde::Serialize;

use super::KeyPathStore;
use crate::error::StoreError;

fn encoding(path: &str, e: serde_json::Error) -> StoreError {
    StoreError::Encoding(format!("'{path}': {e}"))
}

/// Read and decode the value at `path`.
pub async fn get_as<T: DeserializeOwned>(
    store: &dyn KeyPathStore,
    path: &str,
) -> Result<Option<T>, StoreError> {
    match store.get(path).await? {
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| encoding(path, e)),
        None => Ok(None),
    }
}

/// Read a list, empty when nothing is stored.
pub async fn get_list<T: DeserializeOwned>(
    store: &dyn KeyPathStore,
    path: &str,
) -> Result<Vec<T>, StoreError> {
    Ok(get_as(store, path).await?.unwrap_or_default())
}

/// Read an amount, 0 when nothing is stored.
pub async fn get_amount(store: &dyn KeyPathStore, path: &str) -> Result<i64, StoreError> {
    Ok(get_as(store, path).await?.unwrap_or(0))
}

/// Encode and write `value` at `path`.
pub async fn set_as<T: Serialize + ?Sized>(
    store: &dyn KeyPathStore,
    path: &str,
    value: &T,
) -> Result<bool, StoreError> {
    let value = serde_json::to_value(value).map_err(|e| encoding(path, e))?;
    store.set(path, value).await
}

/// Encode and append `value` to the list at `path`.
pub async fn push_as<T: Serialize + ?Sized>(
    store: &dyn KeyPathStore,
    path: &str,
    value: &T,
) -> Result<bool, StoreError> {
    let value = serde_json::to_value(value).map_err(|e| encoding(path, e))?;
    store.push(path, value).await
}

/// Encode and replace element `index` of the list at `path`.
pub async fn pull_as<T: Serialize + ?Sized>(
    store: &dyn KeyPathStore,
    path: &str,
    index: usize,
    value: &T,
) -> Result<bool, StoreError> {
    let value = serde_json::to_value(value).map_err(|e| encoding(path, e))?;
    store.pull(path, index, value).await
}
