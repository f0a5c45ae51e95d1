//! Error types for the ledger and its store.

use crate::cache::{FieldSet, SlotName};

/// Errors raised by a [`KeyPathStore`](crate::store::KeyPathStore) backend.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("failed to read '{path}': {message}")]
    Read { path: String, message: String },

    #[error("failed to write '{path}': {message}")]
    Write { path: String, message: String },

    #[error("invalid key path '{0}'")]
    InvalidPath(String),

    #[error("MongoDB error: {0}")]
    Backend(#[from] mongodb::error::Error),

    #[error("encoding error: {0}")]
    Encoding(String),
}

/// Errors raised by the cache layer and the managers on top of it.
#[derive(Debug, thiserror::Error)]
pub enum EconomyError {
    /// The identifier lacks a field the slot needs.
    #[error("identifier mismatch for '{slot}': required {required}, received {received}")]
    InvalidIdentifier {
        slot: SlotName,
        required: FieldSet,
        received: FieldSet,
    },

    /// An identifier field was empty or contained a path separator.
    #[error("invalid {field}: '{value}'")]
    MalformedIdentifier { field: &'static str, value: String },

    #[error("unknown cache slot '{0}'")]
    InvalidSlotName(String),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("cannot hydrate '{slot}' record: {source}")]
    Hydration {
        slot: SlotName,
        #[source]
        source: serde_json::Error,
    },

    /// The store write went through but the cache could not be refreshed.
    #[error("cache out of sync with store for slots [{slots}]: {}", failures.join("; "))]
    CacheDesync { slots: String, failures: Vec<String> },

    #[error("item {0} not found")]
    ItemNotFound(u64),

    #[error("currency '{0}' not found")]
    CurrencyNotFound(String),

    #[error("insufficient funds: need {needed}, have {available}")]
    InsufficientFunds { needed: i64, available: i64 },

    #[error("invalid amount: {0}")]
    InvalidAmount(i64),

    #[error("item {id} limit reached ({max})")]
    ItemLimitReached { id: u64, max: u64 },
}

pub type Result<T, E = EconomyError> = std::result::Result<T, E>;
