//! Member record.

use serde::{Deserialize, Serialize};

use super::item::{HistoryRecord, InventoryRecord};

/// Everything stored for one member of a guild.
///
/// Every field defaults, so a record created by a single `money` write
/// still parses.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UserRecord {
    pub money: i64,
    pub bank: i64,

    /// Unix timestamps (ms) of the last claims; 0 when never claimed.
    pub daily_cooldown: i64,
    pub work_cooldown: i64,
    pub weekly_cooldown: i64,

    pub inventory: Vec<InventoryRecord>,
    pub history: Vec<HistoryRecord>,
}
