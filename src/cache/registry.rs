//! Cache registry - one slot per entity kind plus cross-slot invalidation.

use async_trait::async_trait;
use futures::future::join_all;
use tracing::{debug, info, warn};

use super::hydrate::Entity;
use super::identifier::Identifier;
use super::kind::{HydrationContext, SlotName, SlotSet, SlotSpec};
use super::slot::CacheSlot;
use super::written::Written;
use crate::entities::{
    BalanceItem, CooldownItem, Currency, EconomyGuild, EconomyUser, HistoryItem, InventoryItem,
    ShopItem,
};
use crate::error::{EconomyError, Result};

/// Type-erased view of a slot, for operations that go by [`SlotName`].
#[async_trait]
pub trait AnySlot: Send + Sync {
    fn spec(&self) -> &'static SlotSpec;
    async fn update(&self, id: &Identifier) -> Result<()>;
    fn remove(&self, guild_id: &str);
    fn clear(&self);
    fn has(&self, guild_id: &str) -> bool;
    fn len(&self) -> usize;
}

#[async_trait]
impl<E: Entity> AnySlot for CacheSlot<E> {
    fn spec(&self) -> &'static SlotSpec {
        CacheSlot::spec(self)
    }

    async fn update(&self, id: &Identifier) -> Result<()> {
        CacheSlot::update(self, id).await
    }

    fn remove(&self, guild_id: &str) {
        CacheSlot::remove(self, guild_id);
    }

    fn clear(&self) {
        CacheSlot::clear(self);
    }

    fn has(&self, guild_id: &str) -> bool {
        CacheSlot::has(self, guild_id)
    }

    fn len(&self) -> usize {
        CacheSlot::len(self)
    }
}

/// Every cache slot of the ledger.
///
/// Managers name the slots a write touched instead of refreshing
/// everything, e.g. a reward claim dirties `users`, `cooldowns` and
/// `balance` but never `shop`.
///
/// Cloning is cheap and shares the same slots.
#[derive(Clone, Debug)]
pub struct CacheRegistry {
    pub guilds: CacheSlot<EconomyGuild>,
    pub users: CacheSlot<EconomyUser>,
    pub cooldowns: CacheSlot<CooldownItem>,
    pub balance: CacheSlot<BalanceItem>,
    pub bank: CacheSlot<BalanceItem>,
    pub currencies: CacheSlot<Currency>,
    pub shop: CacheSlot<ShopItem>,
    pub inventory: CacheSlot<InventoryItem>,
    pub history: CacheSlot<HistoryItem>,
}

impl CacheRegistry {
    /// Create a registry with every slot empty.
    pub fn new(ctx: HydrationContext) -> Self {
        let registry = Self {
            guilds: CacheSlot::new(SlotName::Guilds, ctx.clone()),
            users: CacheSlot::new(SlotName::Users, ctx.clone()),
            cooldowns: CacheSlot::new(SlotName::Cooldowns, ctx.clone()),
            balance: CacheSlot::new(SlotName::Balance, ctx.clone()),
            bank: CacheSlot::new(SlotName::Bank, ctx.clone()),
            currencies: CacheSlot::new(SlotName::Currencies, ctx.clone()),
            shop: CacheSlot::new(SlotName::Shop, ctx.clone()),
            inventory: CacheSlot::new(SlotName::Inventory, ctx.clone()),
            history: CacheSlot::new(SlotName::History, ctx),
        };
        info!("Cache registry initialized");
        registry
    }

    /// The slot registered under `name`.
    pub fn slot(&self, name: SlotName) -> &dyn AnySlot {
        match name {
            SlotName::Guilds => &self.guilds,
            SlotName::Users => &self.users,
            SlotName::Cooldowns => &self.cooldowns,
            SlotName::Balance => &self.balance,
            SlotName::Bank => &self.bank,
            SlotName::Currencies => &self.currencies,
            SlotName::Shop => &self.shop,
            SlotName::Inventory => &self.inventory,
            SlotName::History => &self.history,
        }
    }

    /// Refresh `slots` for `id` concurrently, waiting for all of them.
    pub async fn update_slots(&self, slots: SlotSet, id: &Identifier) -> Vec<(SlotName, Result<()>)> {
        let refreshes = slots.iter().map(|name| async move {
            let result = self.slot(name).update(id).await;
            (name, result)
        });
        join_all(refreshes).await
    }

    /// Refresh every slot `id` has enough fields for.
    ///
    /// Guild-scoped slots ignore an extra member id; member-scoped slots are
    /// skipped for a guild-only identifier. All refreshes run to completion
    /// and the first failure, if any, is returned.
    pub async fn update_all(&self, id: &Identifier) -> Result<()> {
        let slots: SlotSet = SlotName::ALL
            .into_iter()
            .filter(|name| name.spec().accepts(id))
            .collect();

        let mut first_error = None;
        for (name, result) in self.update_slots(slots, id).await {
            if let Err(e) = result {
                warn!("Failed to refresh {} for {}: {}", name, id, e);
                first_error.get_or_insert(e);
            }
        }

        debug!("Refreshed [{}] for {}", slots, id);
        first_error.map_or(Ok(()), Err)
    }

    /// Refresh only the named slots.
    ///
    /// # Errors
    /// [`EconomyError::InvalidSlotName`] before any refresh if a name is not
    /// one of the registry's slots. Per-slot failures are returned in the
    /// inner results, in the order the names were given.
    pub async fn update_specified<S: AsRef<str>>(
        &self,
        names: &[S],
        id: &Identifier,
    ) -> Result<Vec<Result<()>>> {
        let names = parse_names(names)?;
        let refreshes = names.iter().map(|name| self.slot(*name).update(id));
        Ok(join_all(refreshes).await)
    }

    /// Alias of [`update_specified`](Self::update_specified).
    pub async fn update_many<S: AsRef<str>>(
        &self,
        names: &[S],
        id: &Identifier,
    ) -> Result<Vec<Result<()>>> {
        self.update_specified(names, id).await
    }

    /// Empty only the named slots. Nothing is cleared if a name is invalid.
    pub fn clear_specified<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        for name in parse_names(names)? {
            self.slot(name).clear();
        }
        Ok(())
    }

    /// Alias of [`clear_specified`](Self::clear_specified).
    pub fn clear_many<S: AsRef<str>>(&self, names: &[S]) -> Result<()> {
        self.clear_specified(names)
    }

    /// Empty every slot.
    pub fn clear_all(&self) {
        for name in SlotName::ALL {
            self.slot(name).clear();
        }
        debug!("Cleared all cache slots");
    }

    /// Drop everything cached for one guild, in every slot.
    pub fn remove_guild(&self, guild_id: &str) {
        for name in SlotName::ALL {
            self.slot(name).remove(guild_id);
        }
    }

    /// Refresh every slot a write dirtied and hand back its value.
    ///
    /// # Errors
    /// [`EconomyError::CacheDesync`] when any refresh fails: the store already
    /// holds the new state but the cache may not.
    pub async fn sync<T>(&self, written: Written<T>) -> Result<T> {
        let Written { value, touched } = written;

        let refreshes = touched
            .iter()
            .map(|(id, slots)| async move { (id, self.update_slots(*slots, id).await) });

        let mut stale = SlotSet::EMPTY;
        let mut failures = Vec::new();
        for (id, results) in join_all(refreshes).await {
            for (name, result) in results {
                if let Err(e) = result {
                    stale = stale.with(name);
                    failures.push(format!("{name} for {id}: {e}"));
                }
            }
        }

        if !failures.is_empty() {
            warn!(
                "Store write succeeded but cache refresh failed for [{}]: {}",
                stale,
                failures.join("; ")
            );
            return Err(EconomyError::CacheDesync {
                slots: stale.to_string(),
                failures,
            });
        }

        Ok(value)
    }

    /// Refresh what a stepwise write dirtied, whether or not every step
    /// landed, then hand back the operation's own outcome.
    ///
    /// A failed step leaves the earlier steps stored, so their slots are
    /// refreshed before the step's error is returned.
    ///
    /// # Errors
    /// The operation's error, or [`EconomyError::CacheDesync`] when the
    /// refresh itself fails.
    pub async fn settle<T>(&self, written: Written<Result<T>>) -> Result<T> {
        let partial = written.value.is_err() && !written.dirty().is_empty();
        if partial {
            warn!("Write failed part-way, refreshing [{}]", written.dirty());
        }
        self.sync(written).await?
    }

    /// Total number of raw records cached across all slots.
    pub fn entry_count(&self) -> usize {
        SlotName::ALL.into_iter().map(|name| self.slot(name).len()).sum()
    }
}

fn parse_names<S: AsRef<str>>(names: &[S]) -> Result<Vec<SlotName>> {
    names.iter().map(|name| name.as_ref().parse()).collect()
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::cache::Hydrated;
    use crate::options::EconomyOptions;
    use crate::store::testing::FlakyStore;
    use crate::store::{KeyPathStore, MemoryStore};

    fn seeded() -> serde_json::Value {
        json!({
            "g1": {
                "u1": { "money": 50, "bank": 5 },
                "shop": [{ "id": 1, "name": "Apple", "price": 5, "date": "2024-01-01T00:00:00Z" }]
            }
        })
    }

    fn registry(data: serde_json::Value) -> (CacheRegistry, Arc<FlakyStore>) {
        let store = Arc::new(FlakyStore::new(MemoryStore::with_data(data)));
        let ctx = HydrationContext::new(store.clone(), EconomyOptions::default());
        (CacheRegistry::new(ctx), store)
    }

    fn member() -> Identifier {
        Identifier::member("g1", "u1").unwrap()
    }

    fn guild() -> Identifier {
        Identifier::guild("g1").unwrap()
    }

    #[tokio::test]
    async fn test_update_all_fills_accepted_slots() {
        let (registry, _) = registry(seeded());

        registry.update_all(&member()).await.unwrap();
        for name in SlotName::ALL {
            assert!(registry.slot(name).has("g1"), "{name} was not filled");
        }

        registry.clear_all();
        registry.update_all(&guild()).await.unwrap();
        assert!(registry.guilds.has("g1"));
        assert!(registry.shop.has("g1"));
        assert!(!registry.users.has("g1"));
        assert!(!registry.balance.has("g1"));
    }

    #[tokio::test]
    async fn test_update_specified_leaves_other_slots_alone() {
        let (registry, _) = registry(seeded());

        let results = registry.update_specified(&["balance"], &member()).await.unwrap();
        assert!(results.iter().all(Result::is_ok));

        let balance = registry.balance.get(&member()).and_then(Hydrated::one).unwrap();
        assert_eq!(balance.amount(), 50);
        assert!(registry.shop.get(&guild()).is_none());
    }

    #[tokio::test]
    async fn test_invalid_slot_name_refreshes_nothing() {
        let (registry, _) = registry(seeded());

        let result = registry.update_many(&["users", "wallet"], &member()).await;
        assert!(matches!(result, Err(EconomyError::InvalidSlotName(name)) if name == "wallet"));
        assert!(!registry.users.has("g1"));
    }

    #[tokio::test]
    async fn test_clear_specified() {
        let (registry, _) = registry(seeded());
        registry.update_all(&member()).await.unwrap();

        assert!(registry.clear_many(&["shop", "nope"]).is_err());
        assert!(registry.shop.has("g1"));

        registry.clear_specified(&["shop", "users"]).unwrap();
        assert!(!registry.shop.has("g1"));
        assert!(!registry.users.has("g1"));
        assert!(registry.bank.has("g1"));
    }

    #[tokio::test]
    async fn test_clear_all_ignores_store() {
        let (registry, store) = registry(seeded());
        registry.guilds.update(&guild()).await.unwrap();
        assert!(registry.guilds.get(&guild()).is_some());

        registry.clear_all();
        assert!(registry.guilds.get(&guild()).is_none());
        assert_eq!(registry.entry_count(), 0);
        assert!(store.inner.get("g1").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_sync_refreshes_dirty_slots() {
        let (registry, store) = registry(seeded());
        registry.update_all(&member()).await.unwrap();

        store.set("g1.u1.money", json!(80)).await.unwrap();
        let value = registry
            .sync(Written::new("ok", &member(), &[SlotName::Balance]))
            .await
            .unwrap();

        assert_eq!(value, "ok");
        let balance = registry.balance.get(&member()).and_then(Hydrated::one).unwrap();
        assert_eq!(balance.amount(), 80);
        // Not dirtied, so still stale.
        let user = registry.users.get(&member()).and_then(Hydrated::one).unwrap();
        assert_eq!(user.money(), 50);
    }

    #[tokio::test]
    async fn test_sync_reports_desync() {
        let (registry, store) = registry(seeded());

        store.set("g1.u1.money", json!(80)).await.unwrap();
        store.fail_reads(true);
        let result = registry
            .sync(Written::new((), &member(), &[SlotName::Users, SlotName::Balance]))
            .await;

        match result {
            Err(EconomyError::CacheDesync { slots, failures }) => {
                assert_eq!(slots, "users, balance");
                assert_eq!(failures.len(), 2);
            }
            other => panic!("expected desync, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_settle_refreshes_landed_steps_on_failure() {
        let (registry, store) = registry(seeded());
        registry.update_all(&member()).await.unwrap();

        let mut pending = Written::pending();
        store.set("g1.u1.money", json!(30)).await.unwrap();
        pending.mark(&member(), &[SlotName::Users, SlotName::Balance]);
        let failed: Result<()> = Err(EconomyError::ItemNotFound(4));

        let result = registry.settle(pending.finish(failed)).await;
        assert!(matches!(result, Err(EconomyError::ItemNotFound(4))));

        let balance = registry.balance.get(&member()).and_then(Hydrated::one).unwrap();
        assert_eq!(balance.amount(), 30);
    }

    #[tokio::test]
    async fn test_settle_reports_desync_over_step_error() {
        let (registry, store) = registry(seeded());

        let mut pending = Written::pending();
        pending.mark(&member(), &[SlotName::Balance]);
        store.fail_reads(true);
        let failed: Result<()> = Err(EconomyError::ItemNotFound(4));

        let result = registry.settle(pending.finish(failed)).await;
        assert!(matches!(result, Err(EconomyError::CacheDesync { .. })));
    }

    #[tokio::test]
    async fn test_remove_guild() {
        let (registry, _) = registry(seeded());
        registry.update_all(&member()).await.unwrap();
        assert!(registry.entry_count() > 0);

        registry.remove_guild("g1");
        assert_eq!(registry.entry_count(), 0);
    }
}
