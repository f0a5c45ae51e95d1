//! Inventory manager.

use tracing::debug;

use super::EconomyContext;
use crate::cache::{Identifier, SlotName, Written};
use crate::checked;
use crate::entities::InventoryItem;
use crate::error::{EconomyError, Result};
use crate::events::EconomyEvent;
use crate::models::{InventoryRecord, ShopRecord};
use crate::store::typed::{get_list, pull_as, push_as, set_as};
use crate::store::KeyPathStore;

const INVENTORY_SLOTS: [SlotName; 2] = [SlotName::Users, SlotName::Inventory];

/// Add `record` to `owner`'s inventory, merging with an existing stack of
/// the same item. Returns the stack size afterwards.
///
/// # Errors
/// [`EconomyError::ItemLimitReached`] when the stack would exceed the
/// item's max amount; nothing is written in that case.
pub(super) async fn stack_into(
    store: &dyn KeyPathStore,
    owner: &Identifier,
    record: InventoryRecord,
) -> Result<u64> {
    let path = SlotName::Inventory.spec().path(owner)?;
    let items: Vec<InventoryRecord> = get_list(store, &path).await?;
    let index = items.iter().position(|item| item.id == record.id);

    let held = index.map_or(0, |index| items[index].quantity);
    let total = checked::stack(held, record.quantity)?;
    if let Some(max) = record.max_amount {
        if total > max {
            return Err(EconomyError::ItemLimitReached { id: record.id, max });
        }
    }

    match index {
        Some(index) => {
            let mut stack = items[index].clone();
            stack.quantity = total;
            pull_as(store, &path, index, &stack).await?;
        }
        None => {
            push_as(store, &path, &record).await?;
        }
    }
    debug!("Stacked item {} x{} for {}", record.id, total, owner);

    Ok(total)
}

#[derive(Debug, Clone)]
pub struct InventoryManager {
    ctx: EconomyContext,
}

impl InventoryManager {
    pub fn new(ctx: EconomyContext) -> Self {
        Self { ctx }
    }

    pub async fn fetch(&self, id: &Identifier) -> Result<Vec<InventoryItem>> {
        self.ctx.read_list(&self.ctx.cache.inventory, id).await
    }

    pub async fn find(&self, id: &Identifier, item_id: u64) -> Result<Option<InventoryItem>> {
        Ok(self.fetch(id).await?.into_iter().find(|item| item.id() == item_id))
    }

    async fn held(&self, id: &Identifier, item_id: u64) -> Result<InventoryItem> {
        self.find(id, item_id)
            .await?
            .ok_or(EconomyError::ItemNotFound(item_id))
    }

    /// Give the member `quantity` units of shop item `item_id` for free.
    /// Returns the stack size afterwards.
    pub async fn add_item(&self, id: &Identifier, item_id: u64, quantity: u64) -> Result<u64> {
        if quantity == 0 {
            return Err(EconomyError::InvalidAmount(0));
        }
        let ctx = &self.ctx;

        let shop: Vec<ShopRecord> = get_list(ctx.store(), &SlotName::Shop.spec().path(id)?).await?;
        let item = shop
            .iter()
            .find(|item| item.id == item_id)
            .ok_or(EconomyError::ItemNotFound(item_id))?;

        let total = stack_into(ctx.store(), id, item.to_inventory(quantity)).await?;
        let total = ctx.cache.sync(Written::new(total, id, &INVENTORY_SLOTS)).await?;

        ctx.events.emit(EconomyEvent::InventoryItemAdded {
            guild_id: id.guild_id().to_string(),
            member_id: id.member_id().unwrap_or_default().to_string(),
            item_id,
            quantity,
        });
        Ok(total)
    }

    /// Take `quantity` units away. Returns the units left.
    pub async fn remove_item(&self, id: &Identifier, item_id: u64, quantity: u64) -> Result<u64> {
        let item = self.held(id, item_id).await?;
        let left = self.ctx.cache.sync(item.remove(quantity).await?).await?;

        self.ctx.events.emit(EconomyEvent::InventoryItemRemoved {
            guild_id: id.guild_id().to_string(),
            member_id: id.member_id().unwrap_or_default().to_string(),
            item_id,
            quantity,
        });
        Ok(left)
    }

    /// Empty the inventory. Returns whether there was anything in it.
    pub async fn clear(&self, id: &Identifier) -> Result<bool> {
        let ctx = &self.ctx;
        let path = SlotName::Inventory.spec().path(id)?;
        let items: Vec<InventoryRecord> = get_list(ctx.store(), &path).await?;
        if items.is_empty() {
            return Ok(false);
        }

        set_as(ctx.store(), &path, &Vec::<InventoryRecord>::new()).await?;
        ctx.cache.sync(Written::new((), id, &INVENTORY_SLOTS)).await?;

        ctx.events.emit(EconomyEvent::InventoryCleared {
            guild_id: id.guild_id().to_string(),
            member_id: id.member_id().unwrap_or_default().to_string(),
        });
        Ok(true)
    }

    /// Consume one unit. Returns the item's use message.
    pub async fn use_item(&self, id: &Identifier, item_id: u64) -> Result<String> {
        let item = self.held(id, item_id).await?;
        let message = self.ctx.cache.sync(item.use_item().await?).await?;

        self.ctx.events.emit(EconomyEvent::InventoryItemUsed {
            guild_id: id.guild_id().to_string(),
            member_id: id.member_id().unwrap_or_default().to_string(),
            item_id,
        });
        Ok(message)
    }

    /// Sell `quantity` units back. Returns the money credited.
    pub async fn sell(&self, id: &Identifier, item_id: u64, quantity: u64) -> Result<i64> {
        let item = self.held(id, item_id).await?;
        let income = self.ctx.cache.settle(item.sell(quantity).await).await?;

        self.ctx.events.emit(EconomyEvent::InventoryItemSold {
            guild_id: id.guild_id().to_string(),
            member_id: id.member_id().unwrap_or_default().to_string(),
            item_id,
            quantity,
            income,
        });
        Ok(income)
    }

    /// Total units of `item_id` the member holds, 0 if none.
    pub async fn stacked(&self, id: &Identifier, item_id: u64) -> Result<u64> {
        Ok(self
            .fetch(id)
            .await?
            .iter()
            .filter(|item| item.id() == item_id)
            .map(InventoryItem::quantity)
            .sum())
    }
}
