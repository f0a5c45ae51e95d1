//! Member view.

use serde_json::Value;

use super::{decode, member_identifier, MEMBER_SLOTS};
use crate::cache::{Entity, EntityArgs, Identifier, SlotName, Written};
use crate::error::Result;
use crate::models::{HistoryRecord, InventoryRecord, UserRecord};
use crate::store::key_path;
use crate::store::typed::set_as;

/// Everything stored for one member.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomyUser {
    id: Identifier,
    record: UserRecord,
    args: EntityArgs,
}

impl EconomyUser {
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn guild_id(&self) -> &str {
        self.id.guild_id()
    }

    pub fn member_id(&self) -> &str {
        self.id.member_id().unwrap_or_default()
    }

    pub fn money(&self) -> i64 {
        self.record.money
    }

    pub fn bank(&self) -> i64 {
        self.record.bank
    }

    pub fn inventory(&self) -> &[InventoryRecord] {
        &self.record.inventory
    }

    pub fn history(&self) -> &[HistoryRecord] {
        &self.record.history
    }

    pub fn record(&self) -> &UserRecord {
        &self.record
    }

    fn path(&self) -> String {
        key_path(&[self.guild_id(), self.member_id()])
    }

    /// Wipe the member back to an empty record.
    pub async fn reset(&self) -> Result<Written<()>> {
        set_as(self.args.store.as_ref(), &self.path(), &UserRecord::default()).await?;
        Ok(Written::new((), &self.id, &MEMBER_SLOTS))
    }

    /// Delete the member's record. Returns whether anything was stored.
    pub async fn delete(&self) -> Result<Written<bool>> {
        let removed = self.args.store.remove(&self.path()).await?;
        Ok(Written::new(removed, &self.id, &MEMBER_SLOTS).and(&self.id.to_guild(), &[SlotName::Guilds]))
    }
}

impl Entity for EconomyUser {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: member_identifier(args)?,
            record: decode(raw)?,
            args: args.clone(),
        })
    }
}
