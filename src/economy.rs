//! The ledger facade.

use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::cache::{CacheRegistry, Identifier};
use crate::entities::{EconomyGuild, EconomyUser};
use crate::error::Result;
use crate::events::{EconomyEvent, EventBus};
use crate::managers::{
    BalanceManager, BankManager, CooldownManager, CurrencyManager, EconomyContext, HistoryManager,
    InventoryManager, RewardManager, ShopManager,
};
use crate::models::GUILD_KEYS;
use crate::options::EconomyOptions;
use crate::store::KeyPathStore;

/// Everything needed to run a guild economy over one store.
///
/// Each instance owns its cache and event bus; two instances over the same
/// store do not see each other's cache.
#[derive(Debug, Clone)]
pub struct Economy {
    ctx: EconomyContext,
    pub balance: BalanceManager,
    pub bank: BankManager,
    pub rewards: RewardManager,
    pub cooldowns: CooldownManager,
    pub shop: ShopManager,
    pub inventory: InventoryManager,
    pub history: HistoryManager,
    pub currencies: CurrencyManager,
}

impl Economy {
    pub fn new(store: Arc<dyn KeyPathStore>, options: EconomyOptions) -> Self {
        let ctx = EconomyContext::new(store, options);
        info!("Economy initialized");

        Self {
            balance: BalanceManager::new(ctx.clone()),
            bank: BankManager::new(ctx.clone()),
            rewards: RewardManager::new(ctx.clone()),
            cooldowns: CooldownManager::new(ctx.clone()),
            shop: ShopManager::new(ctx.clone()),
            inventory: InventoryManager::new(ctx.clone()),
            history: HistoryManager::new(ctx.clone()),
            currencies: CurrencyManager::new(ctx.clone()),
            ctx,
        }
    }

    pub fn context(&self) -> &EconomyContext {
        &self.ctx
    }

    pub fn cache(&self) -> &CacheRegistry {
        &self.ctx.cache
    }

    pub fn events(&self) -> &EventBus {
        &self.ctx.events
    }

    pub fn subscribe(&self) -> broadcast::Receiver<EconomyEvent> {
        self.ctx.events.subscribe()
    }

    pub fn options(&self) -> Arc<EconomyOptions> {
        self.ctx.options()
    }

    pub fn set_options(&self, options: EconomyOptions) {
        self.ctx.set_options(options);
    }

    /// The member's whole record.
    pub async fn user(&self, id: &Identifier) -> Result<Option<EconomyUser>> {
        self.ctx.read_one(&self.ctx.cache.users, id).await
    }

    /// The guild's whole record.
    pub async fn guild(&self, guild: &Identifier) -> Result<Option<EconomyGuild>> {
        self.ctx.read_one(&self.ctx.cache.guilds, &guild.to_guild()).await
    }

    /// Fill every slot for a guild and all of its stored members.
    ///
    /// Returns the number of members loaded. Member keys that are not valid
    /// identifiers are skipped.
    pub async fn warm(&self, guild_id: &str) -> Result<usize> {
        let guild = Identifier::guild(guild_id)?;
        let cache = &self.ctx.cache;

        let members: Vec<Identifier> = self
            .ctx
            .store()
            .keys_list(guild_id)
            .await?
            .into_iter()
            .filter(|key| !GUILD_KEYS.contains(&key.as_str()))
            .filter_map(|key| match guild.with_member(key.as_str()) {
                Ok(id) => Some(id),
                Err(e) => {
                    warn!("Skipping member key in guild {}: {}", guild_id, e);
                    None
                }
            })
            .collect();

        cache.update_all(&guild).await?;
        for result in join_all(members.iter().map(|id| cache.update_all(id))).await {
            result?;
        }

        info!("Warmed cache for guild {} ({} members)", guild_id, members.len());
        Ok(members.len())
    }

    /// Wipe a member back to an empty record. Returns whether they existed.
    pub async fn reset_user(&self, id: &Identifier) -> Result<bool> {
        let Some(user) = self.user(id).await? else {
            return Ok(false);
        };
        self.ctx.cache.sync(user.reset().await?).await?;
        Ok(true)
    }

    /// Delete a member's record. Returns whether it existed.
    pub async fn delete_user(&self, id: &Identifier) -> Result<bool> {
        let Some(user) = self.user(id).await? else {
            return Ok(false);
        };
        self.ctx.cache.sync(user.delete().await?).await
    }

    /// Delete everything stored for a guild. Returns whether it existed.
    pub async fn delete_guild(&self, guild: &Identifier) -> Result<bool> {
        let removed = self.ctx.store().remove(guild.guild_id()).await?;
        self.ctx.cache.remove_guild(guild.guild_id());
        if removed {
            info!("Deleted guild {}", guild.guild_id());
        }
        Ok(removed)
    }
}
