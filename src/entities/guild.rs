//! Whole-guild view.

use serde::de::Error as _;
use serde_json::Value;

use super::{decode, guild_identifier};
use crate::cache::{Entity, EntityArgs, Identifier};
use crate::models::{CurrencyRecord, ShopRecord, UserRecord, GUILD_KEYS};

/// Everything stored under one guild.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomyGuild {
    id: Identifier,
    /// Member records sorted by member id.
    members: Vec<(String, UserRecord)>,
    shop: Vec<ShopRecord>,
    currencies: Vec<CurrencyRecord>,
}

impl EconomyGuild {
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn member_ids(&self) -> impl Iterator<Item = &str> {
        self.members.iter().map(|(id, _)| id.as_str())
    }

    pub fn member(&self, member_id: &str) -> Option<&UserRecord> {
        self.members
            .iter()
            .find(|(id, _)| id == member_id)
            .map(|(_, record)| record)
    }

    pub fn members(&self) -> &[(String, UserRecord)] {
        &self.members
    }

    pub fn shop(&self) -> &[ShopRecord] {
        &self.shop
    }

    pub fn currencies(&self) -> &[CurrencyRecord] {
        &self.currencies
    }

    /// Members ranked by `amount`, highest first; ties keep member id order.
    pub fn leaderboard(&self, amount: impl Fn(&UserRecord) -> i64) -> Vec<(String, i64)> {
        let mut ranked: Vec<(String, i64)> = self
            .members
            .iter()
            .map(|(id, record)| (id.clone(), amount(record)))
            .collect();
        ranked.sort_by(|a, b| b.1.cmp(&a.1));
        ranked
    }
}

impl Entity for EconomyGuild {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error> {
        let record = raw
            .as_object()
            .ok_or_else(|| serde_json::Error::custom("guild record must be an object"))?;

        let mut members = Vec::new();
        for (key, value) in record {
            if GUILD_KEYS.contains(&key.as_str()) || !value.is_object() {
                continue;
            }
            members.push((key.clone(), decode::<UserRecord>(value)?));
        }
        members.sort_by(|a, b| a.0.cmp(&b.0));

        let list = |key: &str| record.get(key).cloned().unwrap_or(Value::Array(Vec::new()));

        Ok(Self {
            id: guild_identifier(args)?,
            members,
            shop: decode(&list("shop"))?,
            currencies: decode(&list("currencies"))?,
        })
    }
}
