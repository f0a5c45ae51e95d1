//! Entities hydrated from cache slots.
//!
//! An entity is a typed view over one raw record plus the identifiers and
//! options needed to act on it. Methods that change data write straight to
//! the store and return a [`Written`](crate::cache::Written), so the caller
//! has to pass it through `CacheRegistry::sync` to get the result.

mod balance;
mod cooldown;
mod currency;
mod guild;
mod history_item;
mod inventory_item;
mod shop_item;
mod user;

use serde::de::{DeserializeOwned, Error as _};
use serde_json::Value;

use crate::cache::{EntityArgs, Identifier, SlotName};

pub use balance::BalanceItem;
pub use cooldown::{CooldownItem, RewardKind};
pub use currency::Currency;
pub use guild::EconomyGuild;
pub use history_item::HistoryItem;
pub use inventory_item::InventoryItem;
pub use shop_item::ShopItem;
pub use user::EconomyUser;

/// Every member-scoped slot.
pub const MEMBER_SLOTS: [SlotName; 6] = [
    SlotName::Users,
    SlotName::Cooldowns,
    SlotName::Balance,
    SlotName::Bank,
    SlotName::Inventory,
    SlotName::History,
];

fn decode<T: DeserializeOwned>(raw: &Value) -> Result<T, serde_json::Error> {
    T::deserialize(raw)
}

fn guild_identifier(args: &EntityArgs) -> Result<Identifier, serde_json::Error> {
    Identifier::guild(args.guild_id.as_str()).map_err(serde_json::Error::custom)
}

fn member_identifier(args: &EntityArgs) -> Result<Identifier, serde_json::Error> {
    let member = args
        .member_id
        .as_deref()
        .ok_or_else(|| serde_json::Error::custom("member id missing for member-scoped entity"))?;
    Identifier::member(args.guild_id.as_str(), member).map_err(serde_json::Error::custom)
}
