//! Reward cooldowns.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;

use super::{decode, member_identifier};
use crate::cache::{Entity, EntityArgs, Identifier};
use crate::models::UserRecord;
use crate::options::EconomyOptions;

/// Periodic rewards a member can claim.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RewardKind {
    Daily,
    Work,
    Weekly,
}

impl RewardKind {
    pub const ALL: [RewardKind; 3] = [Self::Daily, Self::Work, Self::Weekly];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Work => "work",
            Self::Weekly => "weekly",
        }
    }

    /// Stored field holding the last claim timestamp.
    pub fn field(self) -> &'static str {
        match self {
            Self::Daily => "dailyCooldown",
            Self::Work => "workCooldown",
            Self::Weekly => "weeklyCooldown",
        }
    }

    pub fn cooldown(self, options: &EconomyOptions) -> Duration {
        match self {
            Self::Daily => options.daily_cooldown,
            Self::Work => options.work_cooldown,
            Self::Weekly => options.weekly_cooldown,
        }
    }

    pub fn amount(self, options: &EconomyOptions) -> i64 {
        match self {
            Self::Daily => options.daily_amount,
            Self::Work => options.work_amount,
            Self::Weekly => options.weekly_amount,
        }
    }
}

/// A member's last claim times, read against the current options.
#[derive(Debug, Clone, PartialEq)]
pub struct CooldownItem {
    id: Identifier,
    daily: i64,
    work: i64,
    weekly: i64,
    options: Arc<EconomyOptions>,
}

impl CooldownItem {
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    /// Unix timestamp (ms) of the last claim, 0 if never claimed.
    pub fn last_claim(&self, kind: RewardKind) -> i64 {
        match kind {
            RewardKind::Daily => self.daily,
            RewardKind::Work => self.work,
            RewardKind::Weekly => self.weekly,
        }
    }

    /// Time left before `kind` can be claimed again, `None` when it is ready.
    pub fn remaining(&self, kind: RewardKind, now_ms: i64) -> Option<Duration> {
        let last = self.last_claim(kind);
        if last <= 0 {
            return None;
        }

        let cooldown = i64::try_from(kind.cooldown(&self.options).as_millis()).unwrap_or(i64::MAX);
        let left = last.saturating_add(cooldown) - now_ms;
        (left > 0).then(|| Duration::from_millis(left as u64))
    }

    pub fn is_ready(&self, kind: RewardKind, now_ms: i64) -> bool {
        self.remaining(kind, now_ms).is_none()
    }
}

impl Entity for CooldownItem {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error> {
        let record: UserRecord = decode(raw)?;
        Ok(Self {
            id: member_identifier(args)?,
            daily: record.daily_cooldown,
            work: record.work_cooldown,
            weekly: record.weekly_cooldown,
            options: Arc::clone(&args.options),
        })
    }
}
