//! Daily, work and weekly rewards.

use std::time::Duration;

use chrono::Utc;
use tracing::debug;

use super::EconomyContext;
use crate::cache::{Identifier, SlotName, Written};
use crate::checked;
use crate::entities::RewardKind;
use crate::error::{EconomyError, Result};
use crate::events::EconomyEvent;
use crate::store::key_path;
use crate::store::typed::{get_amount, set_as};

const REWARD_SLOTS: [SlotName; 3] = [SlotName::Users, SlotName::Cooldowns, SlotName::Balance];

/// What happened when a member tried to claim a reward.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RewardOutcome {
    /// The reward was paid out.
    Claimed { reward: i64, balance: i64 },
    /// Still cooling down.
    Cooldown { remaining: Duration },
}

impl RewardOutcome {
    pub fn is_claimed(&self) -> bool {
        matches!(self, Self::Claimed { .. })
    }
}

#[derive(Debug, Clone)]
pub struct RewardManager {
    ctx: EconomyContext,
}

impl RewardManager {
    pub fn new(ctx: EconomyContext) -> Self {
        Self { ctx }
    }

    pub async fn daily(&self, id: &Identifier) -> Result<RewardOutcome> {
        self.claim(id, RewardKind::Daily).await
    }

    pub async fn work(&self, id: &Identifier) -> Result<RewardOutcome> {
        self.claim(id, RewardKind::Work).await
    }

    pub async fn weekly(&self, id: &Identifier) -> Result<RewardOutcome> {
        self.claim(id, RewardKind::Weekly).await
    }

    /// Pay out `kind` if its cooldown has passed and restart the cooldown.
    pub async fn claim(&self, id: &Identifier, kind: RewardKind) -> Result<RewardOutcome> {
        let ctx = &self.ctx;
        let member = SlotName::Cooldowns.spec().check(id)?.unwrap_or_default();
        let now_ms = Utc::now().timestamp_millis();

        if let Some(cooldowns) = ctx.read_one(&ctx.cache.cooldowns, id).await? {
            if let Some(remaining) = cooldowns.remaining(kind, now_ms) {
                debug!("{} reward for {} on cooldown for {:?}", kind.as_str(), id, remaining);
                return Ok(RewardOutcome::Cooldown { remaining });
            }
        }

        let store = ctx.store();
        let reward = kind.amount(&ctx.options());
        let money_path = key_path(&[id.guild_id(), member, "money"]);
        let balance = checked::credit(get_amount(store, &money_path).await?, reward)?;

        let mut pending = Written::pending();
        let outcome = async {
            set_as(store, &money_path, &balance).await?;
            pending.mark(id, &[SlotName::Users, SlotName::Balance]);
            set_as(store, &key_path(&[id.guild_id(), member, kind.field()]), &now_ms).await?;
            pending.mark(id, &REWARD_SLOTS);
            Ok::<_, EconomyError>(balance)
        }
        .await;
        let balance = ctx.cache.settle(pending.finish(outcome)).await?;
        ctx.events.emit(EconomyEvent::RewardClaimed {
            guild_id: id.guild_id().to_string(),
            member_id: member.to_string(),
            kind,
            reward,
            balance,
        });

        Ok(RewardOutcome::Claimed { reward, balance })
    }
}
