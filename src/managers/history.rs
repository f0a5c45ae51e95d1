//! Purchase history manager.

use tracing::debug;

use super::EconomyContext;
use crate::cache::{Identifier, SlotName, Written};
use crate::checked;
use crate::entities::HistoryItem;
use crate::error::{EconomyError, Result};
use crate::events::EconomyEvent;
use crate::models::{next_id, now_date, HistoryRecord, ShopRecord};
use crate::store::typed::{get_list, push_as, set_as};
use crate::store::KeyPathStore;

const HISTORY_SLOTS: [SlotName; 2] = [SlotName::Users, SlotName::History];

/// Append a purchase of `quantity` units of `item` to `owner`'s history.
pub(super) async fn append(
    store: &dyn KeyPathStore,
    owner: &Identifier,
    item: &ShopRecord,
    quantity: u64,
) -> Result<HistoryRecord> {
    let total_price = checked::total(item.price, quantity)?;
    let path = SlotName::History.spec().path(owner)?;
    let entries: Vec<HistoryRecord> = get_list(store, &path).await?;

    let record = HistoryRecord {
        id: next_id(entries.iter().map(|entry| entry.id)),
        item_id: item.id,
        guild_id: owner.guild_id().to_string(),
        member_id: owner.member_id().unwrap_or_default().to_string(),
        name: item.name.clone(),
        price: item.price,
        quantity,
        total_price,
        role: item.role.clone(),
        date: now_date(),
    };
    push_as(store, &path, &record).await?;
    debug!("Recorded purchase #{} of item {} for {}", record.id, item.id, owner);

    Ok(record)
}

#[derive(Debug, Clone)]
pub struct HistoryManager {
    ctx: EconomyContext,
}

impl HistoryManager {
    pub fn new(ctx: EconomyContext) -> Self {
        Self { ctx }
    }

    pub async fn fetch(&self, id: &Identifier) -> Result<Vec<HistoryItem>> {
        self.ctx.read_list(&self.ctx.cache.history, id).await
    }

    pub async fn find(&self, id: &Identifier, entry_id: u64) -> Result<Option<HistoryItem>> {
        Ok(self.fetch(id).await?.into_iter().find(|entry| entry.id() == entry_id))
    }

    /// Record a purchase of shop item `item_id` without charging for it.
    pub async fn add(&self, id: &Identifier, item_id: u64, quantity: u64) -> Result<HistoryRecord> {
        if quantity == 0 {
            return Err(EconomyError::InvalidAmount(0));
        }

        let store = self.ctx.store();
        let shop: Vec<ShopRecord> = get_list(store, &SlotName::Shop.spec().path(id)?).await?;
        let item = shop
            .iter()
            .find(|item| item.id == item_id)
            .ok_or(EconomyError::ItemNotFound(item_id))?;

        let record = append(store, id, item, quantity).await?;
        self.ctx.cache.sync(Written::new(record, id, &HISTORY_SLOTS)).await
    }

    /// Delete one entry. Returns whether it existed.
    pub async fn remove(&self, id: &Identifier, entry_id: u64) -> Result<bool> {
        match self.find(id, entry_id).await? {
            Some(entry) => self.ctx.cache.sync(entry.remove().await?).await,
            None => Ok(false),
        }
    }

    /// Delete every entry. Returns whether there was anything to delete.
    pub async fn clear(&self, id: &Identifier) -> Result<bool> {
        let ctx = &self.ctx;
        let path = SlotName::History.spec().path(id)?;
        let entries: Vec<HistoryRecord> = get_list(ctx.store(), &path).await?;
        if entries.is_empty() {
            return Ok(false);
        }

        set_as(ctx.store(), &path, &Vec::<HistoryRecord>::new()).await?;
        ctx.cache.sync(Written::new((), id, &HISTORY_SLOTS)).await?;

        ctx.events.emit(EconomyEvent::HistoryCleared {
            guild_id: id.guild_id().to_string(),
            member_id: id.member_id().unwrap_or_default().to_string(),
        });
        Ok(true)
    }
}
