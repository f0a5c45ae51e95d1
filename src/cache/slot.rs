//! A single named cache bucket.

use std::collections::HashMap;
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::{debug, warn};

use super::hydrate::{hydrate, Entity, Hydrated};
use super::identifier::Identifier;
use super::kind::{HydrationContext, Shape, SlotName, SlotSpec};
use crate::error::Result;

/// Raw records cached under one guild.
#[derive(Debug, Clone)]
enum GuildEntry {
    /// Guild-scoped slots: the guild's record.
    Record(Value),
    /// Member-scoped slots: one record per member.
    Members(HashMap<String, Value>),
}

/// Cache bucket for one entity kind.
///
/// Holds raw records keyed by guild (and member, for member-scoped slots)
/// and hydrates them into `E` on every [`get`](Self::get). Reads never fall
/// back to the store: entries appear only through [`set`](Self::set) or
/// [`update`](Self::update) and stay until removed or cleared.
///
/// Cloning is cheap and shares the same entries.
pub struct CacheSlot<E: Entity> {
    spec: &'static SlotSpec,
    ctx: HydrationContext,
    entries: Arc<RwLock<HashMap<String, GuildEntry>>>,
    _entity: PhantomData<fn() -> E>,
}

// Manual Clone implementation that doesn't require E: Clone
impl<E: Entity> Clone for CacheSlot<E> {
    fn clone(&self) -> Self {
        Self {
            spec: self.spec,
            ctx: self.ctx.clone(),
            entries: Arc::clone(&self.entries),
            _entity: PhantomData,
        }
    }
}

impl<E: Entity> CacheSlot<E> {
    /// Create an empty slot for the given table row.
    pub fn new(name: SlotName, ctx: HydrationContext) -> Self {
        debug!("Creating cache slot: {}", name);
        Self {
            spec: name.spec(),
            ctx,
            entries: Arc::new(RwLock::new(HashMap::new())),
            _entity: PhantomData,
        }
    }

    pub fn name(&self) -> SlotName {
        self.spec.name
    }

    pub fn spec(&self) -> &'static SlotSpec {
        self.spec
    }

    /// Raw record cached for `id`, if any.
    pub fn raw(&self, id: &Identifier) -> Option<Value> {
        let member = self.spec.check(id).ok()?;
        let entries = self.entries.read();

        match (entries.get(id.guild_id())?, member) {
            (GuildEntry::Record(raw), None) => Some(raw.clone()),
            (GuildEntry::Members(members), Some(member)) => members.get(member).cloned(),
            _ => None,
        }
    }

    /// Hydrate the cached record for `id`.
    ///
    /// Returns `None` when nothing is cached, when `id` lacks a field this
    /// slot needs, or when the cached record cannot be hydrated.
    pub fn get(&self, id: &Identifier) -> Option<Hydrated<E>> {
        match self.try_get(id) {
            Ok(entity) => entity,
            Err(e) => {
                warn!("Cache slot {} could not serve {}: {}", self.spec.name, id, e);
                None
            }
        }
    }

    /// Like [`get`](Self::get), but surfaces identifier and hydration errors.
    pub fn try_get(&self, id: &Identifier) -> Result<Option<Hydrated<E>>> {
        let args = self.spec.build_args(id, &self.ctx)?;
        let Some(raw) = self.raw(id) else {
            return Ok(None);
        };
        hydrate(self.spec, &raw, &args).map(Some)
    }

    /// Overwrite the entry for `id` and echo the value back.
    pub fn set(&self, id: &Identifier, raw: Value) -> Result<Value> {
        let member = self.spec.check(id)?;
        let mut entries = self.entries.write();

        match member {
            None => {
                entries.insert(id.guild_id().to_string(), GuildEntry::Record(raw.clone()));
            }
            Some(member) => {
                let entry = entries
                    .entry(id.guild_id().to_string())
                    .or_insert_with(|| GuildEntry::Members(HashMap::new()));
                if let GuildEntry::Members(members) = entry {
                    members.insert(member.to_string(), raw.clone());
                }
            }
        }

        Ok(raw)
    }

    /// Re-read the record `id` addresses from the store and cache it.
    ///
    /// A missing record drops the entry for scalar slots and caches an
    /// empty list for list slots.
    ///
    /// # Errors
    /// [`InvalidIdentifier`](crate::EconomyError::InvalidIdentifier) before any
    /// store access if `id` lacks a required field; store errors unchanged.
    pub async fn update(&self, id: &Identifier) -> Result<()> {
        let path = self.spec.path(id)?;
        let raw = self.ctx.store.get(&path).await?;

        match (raw, self.spec.shape) {
            (Some(raw), _) => {
                self.set(id, raw)?;
            }
            (None, Shape::List) => {
                self.set(id, Value::Array(Vec::new()))?;
            }
            (None, Shape::Scalar) => self.evict(id),
        }

        debug!("Refreshed {} for {} from '{}'", self.spec.name, id, path);
        Ok(())
    }

    /// Refresh several identifiers concurrently.
    ///
    /// Every refresh runs to completion; the result for each identifier is
    /// returned in input order.
    pub async fn update_many(&self, ids: &[Identifier]) -> Vec<Result<()>> {
        let results = join_all(ids.iter().map(|id| self.update(id))).await;

        let failed = results.iter().filter(|r| r.is_err()).count();
        if failed > 0 {
            warn!(
                "Cache slot {}: {} of {} refreshes failed",
                self.spec.name,
                failed,
                ids.len()
            );
        }
        results
    }

    /// Drop the entry addressed by `id` (one member for member-scoped slots).
    pub fn evict(&self, id: &Identifier) {
        let Ok(member) = self.spec.check(id) else {
            return;
        };
        let mut entries = self.entries.write();

        match member {
            None => {
                entries.remove(id.guild_id());
            }
            Some(member) => {
                if let Some(GuildEntry::Members(members)) = entries.get_mut(id.guild_id()) {
                    members.remove(member);
                }
            }
        }
    }

    /// Drop everything cached under `guild_id`.
    pub fn remove(&self, guild_id: &str) {
        if self.entries.write().remove(guild_id).is_some() {
            debug!("Removed {} entry for guild {}", self.spec.name, guild_id);
        }
    }

    /// Empty the whole slot.
    pub fn clear(&self) {
        self.entries.write().clear();
    }

    /// Whether anything is cached under `guild_id`.
    pub fn has(&self, guild_id: &str) -> bool {
        self.entries.read().contains_key(guild_id)
    }

    /// Number of cached records.
    pub fn len(&self) -> usize {
        self.entries
            .read()
            .values()
            .map(|entry| match entry {
                GuildEntry::Record(_) => 1,
                GuildEntry::Members(members) => members.len(),
            })
            .sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<E: Entity> fmt::Debug for CacheSlot<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheSlot")
            .field("name", &self.spec.name)
            .field("scope", &self.spec.scope)
            .field("entries", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::entities::{EconomyUser, ShopItem};
    use crate::error::EconomyError;
    use crate::options::EconomyOptions;
    use crate::store::{KeyPathStore, MemoryStore};

    fn slot<E: Entity>(name: SlotName, data: Value) -> (CacheSlot<E>, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_data(data));
        let ctx = HydrationContext::new(store.clone(), EconomyOptions::default());
        (CacheSlot::new(name, ctx), store)
    }

    fn member() -> Identifier {
        Identifier::member("g1", "u1").unwrap()
    }

    fn guild() -> Identifier {
        Identifier::guild("g1").unwrap()
    }

    fn shop_data() -> Value {
        json!({
            "g1": {
                "shop": [
                    { "id": 1, "name": "Apple", "price": 5, "date": "2024-01-01T00:00:00Z" },
                    { "id": 2, "name": "Sword", "price": 40, "date": "2024-01-01T00:00:00Z" },
                    { "id": 3, "name": "Crown", "price": 500, "date": "2024-01-01T00:00:00Z" }
                ]
            }
        })
    }

    #[tokio::test]
    async fn test_miss_never_reads_store() {
        let (users, store) = slot::<EconomyUser>(SlotName::Users, json!({ "g1": { "u1": { "money": 50 } } }));

        assert!(users.get(&member()).is_none());
        assert_eq!(store.reads(), 0);
    }

    #[tokio::test]
    async fn test_update_reflects_store() {
        let (users, _) = slot::<EconomyUser>(SlotName::Users, json!({ "g1": { "u1": { "money": 50 } } }));

        users.update(&member()).await.unwrap();
        let user = users.get(&member()).and_then(Hydrated::one).unwrap();
        assert_eq!(user.money(), 50);
        assert_eq!(user.bank(), 0);
    }

    #[tokio::test]
    async fn test_repeated_update_is_stable() {
        let (users, _) = slot::<EconomyUser>(SlotName::Users, json!({ "g1": { "u1": { "money": 7 } } }));

        users.update(&member()).await.unwrap();
        let first = users.get(&member()).and_then(Hydrated::one);
        users.update(&member()).await.unwrap();
        let second = users.get(&member()).and_then(Hydrated::one);

        assert!(first.is_some());
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_list_order_is_kept() {
        let (shop, _) = slot::<ShopItem>(SlotName::Shop, shop_data());

        shop.update(&guild()).await.unwrap();
        let ids: Vec<u64> = shop
            .get(&guild())
            .map(Hydrated::into_vec)
            .unwrap()
            .iter()
            .map(ShopItem::id)
            .collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }

    #[tokio::test]
    async fn test_stale_until_updated() {
        let (shop, store) = slot::<ShopItem>(SlotName::Shop, shop_data());
        shop.update(&guild()).await.unwrap();

        store
            .push("g1.shop", json!({ "id": 4, "name": "Bow", "price": 60, "date": "2024-01-02T00:00:00Z" }))
            .await
            .unwrap();
        assert_eq!(shop.get(&guild()).map(Hydrated::into_vec).unwrap().len(), 3);

        shop.update(&guild()).await.unwrap();
        let items = shop.get(&guild()).map(Hydrated::into_vec).unwrap();
        assert_eq!(items.len(), 4);
        assert_eq!(items[3].name(), "Bow");
    }

    #[tokio::test]
    async fn test_missing_record() {
        let (users, _) = slot::<EconomyUser>(SlotName::Users, json!({}));
        let (shop, _) = slot::<ShopItem>(SlotName::Shop, json!({}));

        users.update(&member()).await.unwrap();
        shop.update(&guild()).await.unwrap();

        assert!(users.get(&member()).is_none());
        assert!(!users.has("g1"));
        assert_eq!(shop.get(&guild()).map(Hydrated::into_vec), Some(Vec::new()));
    }

    #[tokio::test]
    async fn test_update_many_settles_every_identifier() {
        let (users, _) = slot::<EconomyUser>(SlotName::Users, json!({ "g1": { "u1": { "money": 1 } } }));

        let results = users.update_many(&[member(), guild()]).await;
        assert!(results[0].is_ok());
        assert!(matches!(
            results[1],
            Err(EconomyError::InvalidIdentifier { slot: SlotName::Users, .. })
        ));
        assert!(users.get(&member()).is_some());
    }

    #[tokio::test]
    async fn test_guild_slot_ignores_member_id() {
        let (shop, _) = slot::<ShopItem>(SlotName::Shop, shop_data());

        shop.update(&member()).await.unwrap();
        assert_eq!(shop.get(&guild()).map(Hydrated::into_vec).unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_malformed_record() {
        let (users, _) = slot::<EconomyUser>(SlotName::Users, json!({ "g1": { "u1": { "money": "lots" } } }));
        users.update(&member()).await.unwrap();

        assert!(users.get(&member()).is_none());
        assert!(matches!(
            users.try_get(&member()),
            Err(EconomyError::Hydration { slot: SlotName::Users, .. })
        ));
    }

    #[test]
    fn test_set_evict_remove_clear() {
        let (users, _) = slot::<EconomyUser>(SlotName::Users, json!({}));
        let other = Identifier::member("g1", "u2").unwrap();

        assert_eq!(users.set(&member(), json!({ "money": 3 })).unwrap(), json!({ "money": 3 }));
        users.set(&other, json!({ "money": 4 })).unwrap();
        assert_eq!(users.len(), 2);

        users.evict(&member());
        assert!(users.get(&member()).is_none());
        assert!(users.get(&other).is_some());

        users.remove("g1");
        assert!(users.is_empty());

        users.set(&other, json!({})).unwrap();
        users.clear();
        assert!(!users.has("g1"));
        assert!(users.set(&guild(), json!({})).is_err());
    }
}
