//! Shop items.

use serde_json::Value;

use super::{decode, guild_identifier};
use crate::cache::{Entity, EntityArgs, Identifier, SlotName, Written};
use crate::error::{EconomyError, Result};
use crate::models::{ShopItemEdit, ShopRecord};
use crate::store::key_path;
use crate::store::typed::{get_list, pull_as, set_as};

const SHOP_SLOTS: [SlotName; 2] = [SlotName::Shop, SlotName::Guilds];

/// An item in a guild's shop.
#[derive(Debug, Clone, PartialEq)]
pub struct ShopItem {
    guild: Identifier,
    record: ShopRecord,
    args: EntityArgs,
}

impl ShopItem {
    pub fn guild(&self) -> &Identifier {
        &self.guild
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

    pub fn max_amount(&self) -> Option<u64> {
        self.record.max_amount
    }

    pub fn record(&self) -> &ShopRecord {
        &self.record
    }

    fn path(&self) -> String {
        key_path(&[self.guild.guild_id(), "shop"])
    }

    /// Change one field of this item in the store.
    pub async fn edit(&self, edit: ShopItemEdit) -> Result<Written<ShopRecord>> {
        if let ShopItemEdit::Price(price) = edit {
            if price < 0 {
                return Err(EconomyError::InvalidAmount(price));
            }
        }
        let store = self.args.store.as_ref();
        let path = self.path();

        let items: Vec<ShopRecord> = get_list(store, &path).await?;
        let index = items
            .iter()
            .position(|item| item.id == self.record.id)
            .ok_or(EconomyError::ItemNotFound(self.record.id))?;

        let mut item = items[index].clone();
        edit.apply(&mut item);
        pull_as(store, &path, index, &item).await?;

        Ok(Written::new(item, &self.guild, &SHOP_SLOTS))
    }

    /// Take this item off the shop. Returns whether it was still listed.
    pub async fn remove(&self) -> Result<Written<bool>> {
        let store = self.args.store.as_ref();
        let path = self.path();

        let mut items: Vec<ShopRecord> = get_list(store, &path).await?;
        let before = items.len();
        items.retain(|item| item.id != self.record.id);

        let removed = items.len() != before;
        if removed {
            set_as(store, &path, &items).await?;
        }
        Ok(Written::new(removed, &self.guild, &SHOP_SLOTS))
    }
}

impl Entity for ShopItem {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error> {
        Ok(Self {
            guild: guild_identifier(args)?,
            record: decode(raw)?,
            args: args.clone(),
        })
    }
}
