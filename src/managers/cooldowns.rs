//! Reward cooldown manager.

use tracing::debug;

use super::EconomyContext;
use crate::cache::{Identifier, SlotName, Written};
use crate::entities::{CooldownItem, RewardKind};
use crate::error::Result;
use crate::events::EconomyEvent;
use crate::store::key_path;
use crate::store::typed::set_as;

#[derive(Debug, Clone)]
pub struct CooldownManager {
    ctx: EconomyContext,
}

impl CooldownManager {
    pub fn new(ctx: EconomyContext) -> Self {
        Self { ctx }
    }

    /// The member's cooldowns, `None` when nothing is stored for them.
    pub async fn fetch(&self, id: &Identifier) -> Result<Option<CooldownItem>> {
        self.ctx.read_one(&self.ctx.cache.cooldowns, id).await
    }

    pub async fn clear_daily(&self, id: &Identifier) -> Result<()> {
        self.clear(id, &[RewardKind::Daily]).await
    }

    pub async fn clear_work(&self, id: &Identifier) -> Result<()> {
        self.clear(id, &[RewardKind::Work]).await
    }

    pub async fn clear_weekly(&self, id: &Identifier) -> Result<()> {
        self.clear(id, &[RewardKind::Weekly]).await
    }

    pub async fn clear_all(&self, id: &Identifier) -> Result<()> {
        self.clear(id, &RewardKind::ALL).await
    }

    async fn clear(&self, id: &Identifier, kinds: &[RewardKind]) -> Result<()> {
        let ctx = &self.ctx;
        let member = SlotName::Cooldowns.spec().check(id)?.unwrap_or_default();

        let mut pending = Written::pending();
        let mut outcome: Result<()> = Ok(());
        for kind in kinds {
            let path = key_path(&[id.guild_id(), member, kind.field()]);
            if let Err(e) = set_as(ctx.store(), &path, &0).await {
                outcome = Err(e.into());
                break;
            }
            pending.mark(id, &[SlotName::Users, SlotName::Cooldowns]);
        }
        ctx.cache.settle(pending.finish(outcome)).await?;
        debug!("Cleared {} cooldown(s) for {}", kinds.len(), id);

        ctx.events.emit(EconomyEvent::CooldownsCleared {
            guild_id: id.guild_id().to_string(),
            member_id: member.to_string(),
        });
        Ok(())
    }
}
