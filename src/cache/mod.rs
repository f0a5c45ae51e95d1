//! Cache module - typed, identity-keyed cache over the key-path store.
//!
//! ## Architecture
//!
//! - `CacheSlot` - one bucket per entity kind, holding raw records keyed by
//!   guild (and member) and hydrating them into entities on read
//! - `CacheRegistry` - the fixed set of slots plus invalidation by name
//! - `SlotSpec` - table row describing a slot's scope, shape and store path
//! - `Written` - a store write that must be handed to `CacheRegistry::sync`
//!
//! Slots never read through to the store and never expire. They stay
//! coherent only because every write path refreshes the slots it dirtied.
//!
//! ## Usage
//!
//! ```rust,ignore
//! let id = Identifier::member("g1", "u1")?;
//! registry.users.update(&id).await?;
//! let user = registry.users.get(&id).and_then(Hydrated::one);
//!
//! // After a write that changed money
//! registry.update_specified(&["users", "balance"], &id).await?;
//! ```

mod hydrate;
mod identifier;
mod kind;
mod registry;
mod slot;
mod written;

pub use hydrate::{hydrate, Entity, Hydrated};
pub use identifier::{Field, FieldSet, Identifier};
pub use kind::{EntityArgs, HydrationContext, Scope, Shape, SlotName, SlotSet, SlotSpec};
pub use registry::{AnySlot, CacheRegistry};
pub use slot::CacheSlot;
pub use written::Written;
