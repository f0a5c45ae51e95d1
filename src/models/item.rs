//! Shop, inventory and history item records.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::now_date;

/// An item on sale in a guild's shop.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShopRecord {
    pub id: u64,
    pub name: String,
    pub price: i64,

    /// Text shown when the item is used.
    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub description: String,

    /// Most units one member may hold (None = unlimited).
    #[serde(default)]
    pub max_amount: Option<u64>,

    /// Role granted on use, if any.
    #[serde(default)]
    pub role: Option<String>,

    /// RFC 3339 creation date.
    pub date: String,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
}

/// A stack of items held by a member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryRecord {
    pub id: u64,
    pub name: String,
    pub price: i64,

    #[serde(default)]
    pub message: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub max_amount: Option<u64>,

    #[serde(default)]
    pub role: Option<String>,

    pub date: String,

    #[serde(default = "default_quantity")]
    pub quantity: u64,

    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub custom: Map<String, Value>,
}

fn default_quantity() -> u64 {
    1
}

/// One purchase in a member's history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryRecord {
    pub id: u64,

    /// Shop id of the purchased item.
    pub item_id: u64,

    #[serde(rename = "guildID")]
    pub guild_id: String,

    #[serde(rename = "memberID")]
    pub member_id: String,

    pub name: String,
    pub price: i64,

    #[serde(default = "default_quantity")]
    pub quantity: u64,

    pub total_price: i64,

    #[serde(default)]
    pub role: Option<String>,

    pub date: String,
}

/// Fields of a new shop or inventory item.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemData {
    pub name: String,
    pub price: i64,
    pub message: String,
    pub description: String,
    pub max_amount: Option<u64>,
    pub role: Option<String>,
    pub custom: Map<String, Value>,
}

impl ItemData {
    pub fn new(name: impl Into<String>, price: i64) -> Self {
        Self {
            name: name.into(),
            price,
            ..Default::default()
        }
    }

    #[must_use]
    pub fn message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn max_amount(mut self, max_amount: u64) -> Self {
        self.max_amount = Some(max_amount);
        self
    }

    #[must_use]
    pub fn role(mut self, role: impl Into<String>) -> Self {
        self.role = Some(role.into());
        self
    }

    pub(crate) fn into_shop_record(self, id: u64) -> ShopRecord {
        ShopRecord {
            id,
            name: self.name,
            price: self.price,
            message: self.message,
            description: self.description,
            max_amount: self.max_amount,
            role: self.role,
            date: now_date(),
            custom: self.custom,
        }
    }
}

/// A single-field change to a shop item.
#[derive(Debug, Clone, PartialEq)]
pub enum ShopItemEdit {
    Name(String),
    Price(i64),
    Message(String),
    Description(String),
    MaxAmount(Option<u64>),
    Role(Option<String>),
    Custom(Map<String, Value>),
}

impl ShopItemEdit {
    pub(crate) fn apply(self, item: &mut ShopRecord) {
        match self {
            Self::Name(name) => item.name = name,
            Self::Price(price) => item.price = price,
            Self::Message(message) => item.message = message,
            Self::Description(description) => item.description = description,
            Self::MaxAmount(max_amount) => item.max_amount = max_amount,
            Self::Role(role) => item.role = role,
            Self::Custom(custom) => item.custom = custom,
        }
    }
}

impl ShopRecord {
    /// Inventory stack of `quantity` units of this item.
    pub fn to_inventory(&self, quantity: u64) -> InventoryRecord {
        InventoryRecord {
            id: self.id,
            name: self.name.clone(),
            price: self.price,
            message: self.message.clone(),
            description: self.description.clone(),
            max_amount: self.max_amount,
            role: self.role.clone(),
            date: now_date(),
            quantity,
            custom: self.custom.clone(),
        }
    }
}

impl InventoryRecord {
    /// Standalone inventory item not bought from the shop.
    pub fn from_data(id: u64, data: ItemData, quantity: u64) -> Self {
        data.into_shop_record(id).to_inventory(quantity)
    }
}
