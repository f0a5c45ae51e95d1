//! Purchase history entries.

use serde_json::Value;

use super::{decode, member_identifier};
use crate::cache::{Entity, EntityArgs, Identifier, SlotName, Written};
use crate::error::Result;
use crate::models::HistoryRecord;
use crate::store::key_path;
use crate::store::typed::{get_list, set_as};

/// One purchase made by a member.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryItem {
    owner: Identifier,
    record: HistoryRecord,
    args: EntityArgs,
}

impl HistoryItem {
    pub fn owner(&self) -> &Identifier {
        &self.owner
    }

    pub fn id(&self) -> u64 {
        self.record.id
    }

    pub fn item_id(&self) -> u64 {
        self.record.item_id
    }

    pub fn total_price(&self) -> i64 {
        self.record.total_price
    }

    pub fn record(&self) -> &HistoryRecord {
        &self.record
    }

    /// Delete this entry. Returns whether it was still stored.
    pub async fn remove(&self) -> Result<Written<bool>> {
        let store = self.args.store.as_ref();
        let path = key_path(&[self.owner.guild_id(), self.owner.member_id().unwrap_or_default(), "history"]);

        let mut entries: Vec<HistoryRecord> = get_list(store, &path).await?;
        let before = entries.len();
        entries.retain(|entry| entry.id != self.record.id);

        let removed = entries.len() != before;
        if removed {
            set_as(store, &path, &entries).await?;
        }
        Ok(Written::new(removed, &self.owner, &[SlotName::History, SlotName::Users]))
    }
}

impl Entity for HistoryItem {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error> {
        Ok(Self {
            owner: member_identifier(args)?,
            record: decode(raw)?,
            args: args.clone(),
        })
    }
}
