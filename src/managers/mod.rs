//! Managers - the write paths of the ledger.
//!
//! Every manager writes to the store first and then hands the resulting
//! [`Written`](crate::cache::Written) to `CacheRegistry::sync`, which
//! refreshes exactly the slots the write dirtied. A failed store write
//! returns before any cache work; a failed refresh surfaces as
//! `EconomyError::CacheDesync`.
//!
//! Reads go through the cache: a miss refreshes the slot once and reads
//! it again.

mod account;
mod balance;
mod bank;
mod cooldowns;
mod currencies;
mod history;
mod inventory;
mod rewards;
mod shop;

use std::sync::Arc;

use crate::cache::{CacheRegistry, CacheSlot, Entity, Hydrated, HydrationContext, Identifier};
use crate::error::Result;
use crate::events::EventBus;
use crate::options::EconomyOptions;
use crate::store::KeyPathStore;

pub use balance::{BalanceManager, Transfer};
pub use bank::BankManager;
pub use cooldowns::CooldownManager;
pub use currencies::CurrencyManager;
pub use history::HistoryManager;
pub use inventory::InventoryManager;
pub use rewards::{RewardManager, RewardOutcome};
pub use shop::{Purchase, ShopManager};

/// Shared state every manager works against.
///
/// Cloning is cheap and shares the same store, cache and event bus.
#[derive(Clone)]
pub struct EconomyContext {
    hydration: HydrationContext,
    pub cache: CacheRegistry,
    pub events: EventBus,
}

impl EconomyContext {
    pub fn new(store: Arc<dyn KeyPathStore>, options: EconomyOptions) -> Self {
        let hydration = HydrationContext::new(store, options);
        Self {
            cache: CacheRegistry::new(hydration.clone()),
            events: EventBus::new(),
            hydration,
        }
    }

    pub fn store(&self) -> &dyn KeyPathStore {
        self.hydration.store.as_ref()
    }

    /// Current options snapshot.
    pub fn options(&self) -> Arc<EconomyOptions> {
        self.hydration.options()
    }

    /// Replace the options for every entity hydrated from now on.
    pub fn set_options(&self, options: EconomyOptions) {
        self.hydration.set_options(options);
    }

    /// Cached entry for `id`, refreshing the slot once on a miss.
    pub(crate) async fn read_through<E: Entity>(
        &self,
        slot: &CacheSlot<E>,
        id: &Identifier,
    ) -> Result<Option<Hydrated<E>>> {
        if let Some(hit) = slot.try_get(id)? {
            return Ok(Some(hit));
        }
        slot.update(id).await?;
        slot.try_get(id)
    }

    /// Single entity of a scalar slot.
    pub(crate) async fn read_one<E: Entity>(
        &self,
        slot: &CacheSlot<E>,
        id: &Identifier,
    ) -> Result<Option<E>> {
        Ok(self.read_through(slot, id).await?.and_then(Hydrated::one))
    }

    /// All entities of a list slot, empty when nothing is stored.
    pub(crate) async fn read_list<E: Entity>(
        &self,
        slot: &CacheSlot<E>,
        id: &Identifier,
    ) -> Result<Vec<E>> {
        Ok(self
            .read_through(slot, id)
            .await?
            .map(Hydrated::into_vec)
            .unwrap_or_default())
    }
}

impl std::fmt::Debug for EconomyContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EconomyContext")
            .field("cache", &self.cache)
            .field("subscribers", &self.events.subscriber_count())
            .finish_non_exhaustive()
    }
}

/// Reject zero and negative amounts.
pub(crate) fn positive(amount: i64) -> Result<i64> {
    if amount <= 0 {
        return Err(crate::error::EconomyError::InvalidAmount(amount));
    }
    Ok(amount)
}

#[cfg(test)]
pub(crate) mod test_support {
    use std::sync::Arc;

    use serde_json::Value;

    use super::EconomyContext;
    use crate::options::EconomyOptions;
    use crate::store::testing::FlakyStore;
    use crate::store::MemoryStore;

    /// Context over a seeded memory store, plus the store for direct checks.
    pub fn context(data: Value) -> (EconomyContext, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_data(data));
        let ctx = EconomyContext::new(store.clone(), EconomyOptions::default());
        (ctx, store)
    }

    /// Like [`context`], over a store that can be made to fail.
    pub fn flaky_context(data: Value) -> (EconomyContext, Arc<FlakyStore>) {
        let store = Arc::new(FlakyStore::new(MemoryStore::with_data(data)));
        let ctx = EconomyContext::new(store.clone(), EconomyOptions::default());
        (ctx, store)
    }
}
