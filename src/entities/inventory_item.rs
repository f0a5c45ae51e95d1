//! Inventory items.

use serde_json::Value;

use super::{decode, member_identifier};
use crate::cache::{Entity, EntityArgs, Identifier, SlotName, Written};
use crate::checked;
use crate::error::{EconomyError, Result};
use crate::models::InventoryRecord;
use crate::store::typed::{get_amount, get_list, pull_as, set_as};
use crate::store::{key_path, KeyPathStore};

/// A stack of one item held by a member.
#[derive(Debug, Clone, PartialEq)]
pub struct InventoryItem {
    owner: Identifier,
    record: InventoryRecord,
    args: EntityArgs,
}

/// Remove `quantity` units of item `item_id` from the owner's inventory.
///
/// Drops the stack when it runs out. Returns the units left.
async fn take_from_inventory(
    store: &dyn KeyPathStore,
    owner: &Identifier,
    item_id: u64,
    quantity: u64,
) -> Result<u64> {
    if quantity == 0 {
        return Err(EconomyError::InvalidAmount(0));
    }

    let path = inventory_path(owner);
    let mut items: Vec<InventoryRecord> = get_list(store, &path).await?;
    let index = items
        .iter()
        .position(|item| item.id == item_id)
        .ok_or(EconomyError::ItemNotFound(item_id))?;

    let held = items[index].quantity;
    if quantity > held {
        return Err(EconomyError::InvalidAmount(checked::reported(quantity)));
    }

    let left = held - quantity;
    if left == 0 {
        items.remove(index);
        set_as(store, &path, &items).await?;
    } else {
        items[index].quantity = left;
        pull_as(store, &path, index, &items[index]).await?;
    }
    Ok(left)
}

fn inventory_path(owner: &Identifier) -> String {
    key_path(&[owner.guild_id(), owner.member_id().unwrap_or_default(), "inventory"])
}

impl InventoryItem {
    pub fn owner(&self) -> &Identifier {
        &self.owner
    }

    pub fn id(&self) -> u64 {
        self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn price(&self) -> i64 {
        self.record.price
    }

    pub fn quantity(&self) -> u64 {
        self.record.quantity
    }

    pub fn record(&self) -> &InventoryRecord {
        &self.record
    }

    /// Price paid back for selling `quantity` units at the current sell rate.
    pub fn sell_price(&self, quantity: u64) -> Result<i64> {
        self.args.options.sell_price(self.record.price, quantity)
    }

    /// Remove `quantity` units. Returns the units left.
    pub async fn remove(&self, quantity: u64) -> Result<Written<u64>> {
        let left = take_from_inventory(self.args.store.as_ref(), &self.owner, self.record.id, quantity).await?;
        Ok(Written::new(left, &self.owner, &[SlotName::Inventory, SlotName::Users]))
    }

    /// Sell `quantity` units back. Returns the money credited.
    ///
    /// Takes the units and then credits the wallet. The returned dirty set
    /// covers whichever of the two landed, even when the sale failed, so it
    /// goes to [`CacheRegistry::settle`](crate::cache::CacheRegistry::settle).
    pub async fn sell(&self, quantity: u64) -> Written<Result<i64>> {
        let mut pending = Written::pending();
        let outcome = self.sell_steps(quantity, &mut pending).await;
        pending.finish(outcome)
    }

    async fn sell_steps(&self, quantity: u64, pending: &mut Written<()>) -> Result<i64> {
        let store = self.args.store.as_ref();
        let income = self.sell_price(quantity)?;
        let money_path = key_path(&[self.owner.guild_id(), self.owner.member_id().unwrap_or_default(), "money"]);
        let money = checked::credit(get_amount(store, &money_path).await?, income)?;

        take_from_inventory(store, &self.owner, self.record.id, quantity).await?;
        pending.mark(&self.owner, &[SlotName::Inventory, SlotName::Users]);

        set_as(store, &money_path, &money).await?;
        pending.mark(&self.owner, &[SlotName::Balance, SlotName::Users]);
        Ok(income)
    }

    /// Consume one unit. Returns the item's use message.
    pub async fn use_item(&self) -> Result<Written<String>> {
        take_from_inventory(self.args.store.as_ref(), &self.owner, self.record.id, 1).await?;
        Ok(Written::new(
            self.record.message.clone(),
            &self.owner,
            &[SlotName::Inventory, SlotName::Users],
        ))
    }

    /// Total units of this item the owner holds right now, read from the store.
    pub async fn stack(&self) -> Result<u64> {
        let items: Vec<InventoryRecord> =
            get_list(self.args.store.as_ref(), &inventory_path(&self.owner)).await?;
        Ok(items
            .iter()
            .filter(|item| item.id == self.record.id)
            .map(|item| item.quantity)
            .sum())
    }
}

impl Entity for InventoryItem {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error> {
        Ok(Self {
            owner: member_identifier(args)?,
            record: decode(raw)?,
            args: args.clone(),
        })
    }
}
