//! Bank manager.

use super::account::{self, Account};
use super::{positive, EconomyContext};
use crate::cache::{Identifier, Written};
use crate::checked;
use crate::error::{EconomyError, Result};

/// Money members keep in the bank.
#[derive(Debug, Clone)]
pub struct BankManager {
    ctx: EconomyContext,
}

impl BankManager {
    pub fn new(ctx: EconomyContext) -> Self {
        Self { ctx }
    }

    pub async fn fetch(&self, id: &Identifier) -> Result<i64> {
        account::fetch(&self.ctx, Account::Bank, id).await
    }

    pub async fn add(&self, id: &Identifier, amount: i64, reason: &str) -> Result<i64> {
        account::add(&self.ctx, Account::Bank, id, amount, reason).await
    }

    pub async fn subtract(&self, id: &Identifier, amount: i64, reason: &str) -> Result<i64> {
        account::subtract(&self.ctx, Account::Bank, id, amount, reason).await
    }

    pub async fn set(&self, id: &Identifier, amount: i64, reason: &str) -> Result<i64> {
        account::set(&self.ctx, Account::Bank, id, amount, reason).await
    }

    /// Move `amount` from the wallet into the bank. Returns the new bank amount.
    pub async fn deposit(&self, id: &Identifier, amount: i64) -> Result<i64> {
        self.shift(id, Account::Wallet, Account::Bank, amount, "deposit").await
    }

    /// Move `amount` from the bank into the wallet. Returns the new bank amount.
    pub async fn withdraw(&self, id: &Identifier, amount: i64) -> Result<i64> {
        self.shift(id, Account::Bank, Account::Wallet, amount, "withdraw").await
    }

    async fn shift(
        &self,
        id: &Identifier,
        from: Account,
        to: Account,
        amount: i64,
        reason: &str,
    ) -> Result<i64> {
        let amount = positive(amount)?;
        let ctx = &self.ctx;

        let available = account::stored(ctx, from, id).await?;
        if available < amount {
            return Err(EconomyError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        let to_amount = checked::credit(account::stored(ctx, to, id).await?, amount)?;

        let mut pending = Written::pending();
        let outcome = async {
            let from_amount = pending.record(account::write(ctx, from, id, available - amount).await?);
            pending.record(account::write(ctx, to, id, to_amount).await?);
            Ok::<_, EconomyError>(from_amount)
        }
        .await;
        let from_amount = ctx.cache.settle(pending.finish(outcome)).await?;

        ctx.events.emit(from.changed(id, -amount, from_amount, reason));
        ctx.events.emit(to.changed(id, amount, to_amount, reason));

        Ok(match to {
            Account::Bank => to_amount,
            Account::Wallet => from_amount,
        })
    }

    /// Members of `guild` ranked by bank amount.
    pub async fn leaderboard(&self, guild: &Identifier) -> Result<Vec<(String, i64)>> {
        account::leaderboard(&self.ctx, Account::Bank, guild).await
    }
}
