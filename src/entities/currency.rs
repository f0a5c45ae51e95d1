//! Guild currencies.

use serde_json::Value;

use super::{decode, guild_identifier};
use crate::cache::{Entity, EntityArgs, Identifier};
use crate::models::CurrencyRecord;

/// A custom currency of one guild.
#[derive(Debug, Clone, PartialEq)]
pub struct Currency {
    guild: Identifier,
    record: CurrencyRecord,
}

impl Currency {
    pub fn guild(&self) -> &Identifier {
        &self.guild
    }

    pub fn id(&self) -> u64 {
        self.record.id
    }

    pub fn name(&self) -> &str {
        &self.record.name
    }

    pub fn symbol(&self) -> &str {
        &self.record.symbol
    }

    pub fn balance_of(&self, member_id: &str) -> i64 {
        self.record.balance_of(member_id)
    }

    pub fn record(&self) -> &CurrencyRecord {
        &self.record
    }
}

impl Entity for Currency {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error> {
        Ok(Self {
            guild: guild_identifier(args)?,
            record: decode(raw)?,
        })
    }
}
