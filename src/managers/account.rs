//! Wallet and bank amounts.
//!
//! Both are a single integer under the member record, so the balance and
//! bank managers share these helpers and differ only in the [`Account`].

use tracing::debug;

use super::{positive, EconomyContext};
use crate::checked;
use crate::cache::{CacheSlot, Identifier, SlotName, Written};
use crate::entities::BalanceItem;
use crate::error::{EconomyError, Result};
use crate::events::EconomyEvent;
use crate::models::UserRecord;
use crate::store::typed::{get_amount, set_as};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum Account {
    Wallet,
    Bank,
}

impl Account {
    pub(super) fn slot_name(self) -> SlotName {
        match self {
            Self::Wallet => SlotName::Balance,
            Self::Bank => SlotName::Bank,
        }
    }

    fn slot(self, ctx: &EconomyContext) -> &CacheSlot<BalanceItem> {
        match self {
            Self::Wallet => &ctx.cache.balance,
            Self::Bank => &ctx.cache.bank,
        }
    }

    fn amount_of(self, record: &UserRecord) -> i64 {
        match self {
            Self::Wallet => record.money,
            Self::Bank => record.bank,
        }
    }

    pub(super) fn changed(self, id: &Identifier, change: i64, amount: i64, reason: &str) -> EconomyEvent {
        let guild_id = id.guild_id().to_string();
        let member_id = id.member_id().unwrap_or_default().to_string();
        let reason = reason.to_string();
        match self {
            Self::Wallet => EconomyEvent::BalanceChanged {
                guild_id,
                member_id,
                change,
                balance: amount,
                reason,
            },
            Self::Bank => EconomyEvent::BankChanged {
                guild_id,
                member_id,
                change,
                bank: amount,
                reason,
            },
        }
    }
}

/// Cached amount, 0 when the member has none stored.
pub(super) async fn fetch(ctx: &EconomyContext, account: Account, id: &Identifier) -> Result<i64> {
    Ok(ctx
        .read_one(account.slot(ctx), id)
        .await?
        .map_or(0, |item| item.amount()))
}

/// Amount as currently stored, bypassing the cache.
pub(super) async fn stored(ctx: &EconomyContext, account: Account, id: &Identifier) -> Result<i64> {
    let path = account.slot_name().spec().path(id)?;
    Ok(get_amount(ctx.store(), &path).await?)
}

/// Write `amount` without refreshing anything yet.
pub(super) async fn write(
    ctx: &EconomyContext,
    account: Account,
    id: &Identifier,
    amount: i64,
) -> Result<Written<i64>> {
    let path = account.slot_name().spec().path(id)?;
    set_as(ctx.store(), &path, &amount).await?;
    debug!("Stored {} = {} for {}", account.slot_name(), amount, id);
    Ok(Written::new(amount, id, &[SlotName::Users, account.slot_name()]))
}

pub(super) async fn add(
    ctx: &EconomyContext,
    account: Account,
    id: &Identifier,
    amount: i64,
    reason: &str,
) -> Result<i64> {
    let amount = positive(amount)?;
    let current = stored(ctx, account, id).await?;
    let updated = checked::credit(current, amount)?;
    let updated = ctx.cache.sync(write(ctx, account, id, updated).await?).await?;

    ctx.events.emit(account.changed(id, amount, updated, reason));
    Ok(updated)
}

/// Take `amount` away. The result may go negative.
pub(super) async fn subtract(
    ctx: &EconomyContext,
    account: Account,
    id: &Identifier,
    amount: i64,
    reason: &str,
) -> Result<i64> {
    let amount = positive(amount)?;
    let current = stored(ctx, account, id).await?;
    let updated = checked::debit(current, amount)?;
    let updated = ctx.cache.sync(write(ctx, account, id, updated).await?).await?;

    ctx.events.emit(account.changed(id, -amount, updated, reason));
    Ok(updated)
}

pub(super) async fn set(
    ctx: &EconomyContext,
    account: Account,
    id: &Identifier,
    amount: i64,
    reason: &str,
) -> Result<i64> {
    if amount < 0 {
        return Err(EconomyError::InvalidAmount(amount));
    }

    let current = stored(ctx, account, id).await?;
    let updated = ctx.cache.sync(write(ctx, account, id, amount).await?).await?;

    ctx.events.emit(account.changed(id, updated.saturating_sub(current), updated, reason));
    Ok(updated)
}

/// Members of `guild` ranked by amount, highest first.
///
/// Member writes don't dirty the `guilds` slot, so it is refreshed first.
pub(super) async fn leaderboard(
    ctx: &EconomyContext,
    account: Account,
    guild: &Identifier,
) -> Result<Vec<(String, i64)>> {
    let guild = guild.to_guild();
    ctx.cache.guilds.update(&guild).await?;

    Ok(ctx
        .cache
        .guilds
        .try_get(&guild)?
        .and_then(|hydrated| hydrated.one())
        .map(|entity| entity.leaderboard(|record| account.amount_of(record)))
        .unwrap_or_default())
}
