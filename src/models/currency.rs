//! Guild currency record.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A custom currency defined by a guild, with per-member balances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRecord {
    pub id: u64,
    pub name: String,
    pub symbol: String,

    #[serde(default)]
    pub balances: BTreeMap<String, i64>,

    #[serde(default, skip_serializing_if = "serde_json::Map::is_empty")]
    pub custom: serde_json::Map<String, serde_json::Value>,
}

impl CurrencyRecord {
    pub fn new(id: u64, name: impl Into<String>, symbol: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            symbol: symbol.into(),
            balances: BTreeMap::new(),
            custom: serde_json::Map::new(),
        }
    }

    /// Balance of `member_id`, 0 if they never held any.
    pub fn balance_of(&self, member_id: &str) -> i64 {
        self.balances.get(member_id).copied().unwrap_or(0)
    }
}
