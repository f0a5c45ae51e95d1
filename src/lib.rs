//! Coffer - per-guild economy ledger.
//!
//! Balances, bank accounts, rewards, shops, inventories, purchase history
//! and custom currencies for many guilds, persisted in a key-path document
//! store and served through a typed, identity-keyed cache.
//!
//! ## Architecture
//!
//! - `store` - the `KeyPathStore` trait with memory and MongoDB backends
//! - `cache` - one cache slot per entity kind plus the registry over them
//! - `models` - raw stored records
//! - `entities` - typed views hydrated from cached records
//! - `managers` - write paths that keep store and cache in step
//! - `events` - per-instance event bus
//! - `config` - environment configuration for the binary

mod checked;
pub mod cache;
pub mod config;
pub mod economy;
pub mod entities;
pub mod error;
pub mod events;
pub mod managers;
pub mod models;
pub mod options;
pub mod store;

pub use cache::{CacheRegistry, Identifier, SlotName};
pub use economy::Economy;
pub use error::{EconomyError, Result, StoreError};
pub use events::{EconomyEvent, EventBus};
pub use options::EconomyOptions;
pub use store::{KeyPathStore, MemoryStore, MongoStore};
