//! Wallet balance manager.

use super::account::{self, Account};
use super::{positive, EconomyContext};
use crate::cache::{Identifier, SlotName, Written};
use crate::checked;
use crate::error::{EconomyError, Result};

/// Balances of both sides after a transfer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transfer {
    pub amount: i64,
    pub sender_balance: i64,
    pub receiver_balance: i64,
}

/// Money members carry around.
#[derive(Debug, Clone)]
pub struct BalanceManager {
    ctx: EconomyContext,
}

impl BalanceManager {
    pub fn new(ctx: EconomyContext) -> Self {
        Self { ctx }
    }

    pub async fn fetch(&self, id: &Identifier) -> Result<i64> {
        account::fetch(&self.ctx, Account::Wallet, id).await
    }

    pub async fn add(&self, id: &Identifier, amount: i64, reason: &str) -> Result<i64> {
        account::add(&self.ctx, Account::Wallet, id, amount, reason).await
    }

    pub async fn subtract(&self, id: &Identifier, amount: i64, reason: &str) -> Result<i64> {
        account::subtract(&self.ctx, Account::Wallet, id, amount, reason).await
    }

    pub async fn set(&self, id: &Identifier, amount: i64, reason: &str) -> Result<i64> {
        account::set(&self.ctx, Account::Wallet, id, amount, reason).await
    }

    /// Move `amount` from `sender` to `receiver`.
    ///
    /// # Errors
    /// [`EconomyError::InsufficientFunds`] if the sender holds less than
    /// `amount`; nothing is written in that case.
    pub async fn transfer(
        &self,
        sender: &Identifier,
        receiver: &Identifier,
        amount: i64,
        reason: &str,
    ) -> Result<Transfer> {
        let amount = positive(amount)?;
        let ctx = &self.ctx;

        let available = account::stored(ctx, Account::Wallet, sender).await?;
        if available < amount {
            return Err(EconomyError::InsufficientFunds {
                needed: amount,
                available,
            });
        }
        // Validate the receiver before the first write.
        SlotName::Balance.spec().check(receiver)?;
        let held = account::stored(ctx, Account::Wallet, receiver).await?;
        let received = checked::credit(held, amount)?;

        let mut pending = Written::pending();
        let outcome = self
            .move_funds(sender, receiver, available - amount, received, &mut pending)
            .await;
        let (sender_balance, receiver_balance) =
            ctx.cache.settle(pending.finish(outcome)).await?;

        ctx.events.emit(Account::Wallet.changed(sender, -amount, sender_balance, reason));
        ctx.events.emit(Account::Wallet.changed(receiver, amount, receiver_balance, reason));

        Ok(Transfer {
            amount,
            sender_balance,
            receiver_balance,
        })
    }

    async fn move_funds(
        &self,
        sender: &Identifier,
        receiver: &Identifier,
        sent: i64,
        received: i64,
        pending: &mut Written<()>,
    ) -> Result<(i64, i64)> {
        let sent = pending.record(account::write(&self.ctx, Account::Wallet, sender, sent).await?);
        let received =
            pending.record(account::write(&self.ctx, Account::Wallet, receiver, received).await?);
        Ok((sent, received))
    }

    /// Members of `guild` ranked by wallet balance.
    pub async fn leaderboard(&self, guild: &Identifier) -> Result<Vec<(String, i64)>> {
        account::leaderboard(&self.ctx, Account::Wallet, guild).await
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::events::EconomyEvent;
    use crate::managers::test_support::{context, flaky_context};

    fn member(id: &str) -> Identifier {
        Identifier::member("g1", id).unwrap()
    }

    #[tokio::test]
    async fn test_add_writes_store_and_refreshes_cache() {
        let (ctx, store) = context(json!({ "g1": { "u1": { "money": 50 } } }));
        let balance = BalanceManager::new(ctx.clone());
        let mut events = ctx.events.subscribe();

        assert_eq!(balance.add(&member("u1"), 25, "gift").await.unwrap(), 75);
        assert_eq!(store.snapshot()["g1"]["u1"]["money"], 75);

        let cached = ctx.cache.balance.get(&member("u1")).and_then(|h| h.one()).unwrap();
        assert_eq!(cached.amount(), 75);

        match events.recv().await.unwrap() {
            EconomyEvent::BalanceChanged { change, balance, reason, .. } => {
                assert_eq!((change, balance, reason.as_str()), (25, 75, "gift"));
            }
            other => panic!("unexpected event {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_defaults_to_zero() {
        let (ctx, _) = context(json!({}));
        let balance = BalanceManager::new(ctx);
        assert_eq!(balance.fetch(&member("u1")).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_rejects_guild_only_identifier() {
        let (ctx, _) = context(json!({}));
        let balance = BalanceManager::new(ctx);
        let result = balance.add(&Identifier::guild("g1").unwrap(), 5, "").await;
        assert!(matches!(result, Err(EconomyError::InvalidIdentifier { .. })));
    }

    #[tokio::test]
    async fn test_rejects_non_positive_amounts() {
        let (ctx, _) = context(json!({}));
        let balance = BalanceManager::new(ctx);
        assert!(matches!(
            balance.subtract(&member("u1"), 0, "").await,
            Err(EconomyError::InvalidAmount(0))
        ));
        assert!(matches!(
            balance.set(&member("u1"), -3, "").await,
            Err(EconomyError::InvalidAmount(-3))
        ));
    }

    #[tokio::test]
    async fn test_transfer_moves_money_and_syncs_both() {
        let (ctx, store) = context(json!({ "g1": { "u1": { "money": 100 }, "u2": { "money": 5 } } }));
        let balance = BalanceManager::new(ctx.clone());

        let transfer = balance.transfer(&member("u1"), &member("u2"), 40, "pay").await.unwrap();
        assert_eq!(transfer.sender_balance, 60);
        assert_eq!(transfer.receiver_balance, 45);
        assert_eq!(store.snapshot()["g1"]["u2"]["money"], 45);

        let receiver = ctx.cache.users.get(&member("u2")).and_then(|h| h.one()).unwrap();
        assert_eq!(receiver.money(), 45);
    }

    #[tokio::test]
    async fn test_transfer_without_funds_writes_nothing() {
        let (ctx, store) = context(json!({ "g1": { "u1": { "money": 10 } } }));
        let balance = BalanceManager::new(ctx);

        let result = balance.transfer(&member("u1"), &member("u2"), 40, "pay").await;
        assert!(matches!(
            result,
            Err(EconomyError::InsufficientFunds { needed: 40, available: 10 })
        ));
        assert_eq!(store.snapshot()["g1"]["u1"]["money"], 10);
        assert!(store.snapshot()["g1"].get("u2").is_none());
    }

    #[tokio::test]
    async fn test_add_rejects_overflow() {
        let (ctx, store) = context(json!({ "g1": { "u1": { "money": 5 } } }));
        let balance = BalanceManager::new(ctx);

        assert!(matches!(
            balance.add(&member("u1"), i64::MAX, "").await,
            Err(EconomyError::InvalidAmount(i64::MAX))
        ));
        assert_eq!(store.snapshot()["g1"]["u1"]["money"], 5);
    }

    #[tokio::test]
    async fn test_transfer_refreshes_sender_when_receiver_write_fails() {
        let (ctx, store) = flaky_context(json!({ "g1": { "u1": { "money": 100 }, "u2": { "money": 5 } } }));
        let balance = BalanceManager::new(ctx.clone());
        assert_eq!(balance.fetch(&member("u1")).await.unwrap(), 100);

        store.fail_writes_under(Some("g1.u2"));
        let result = balance.transfer(&member("u1"), &member("u2"), 40, "pay").await;
        assert!(matches!(result, Err(EconomyError::Store(_))));

        assert_eq!(store.inner.snapshot()["g1"]["u1"]["money"], 60);
        assert_eq!(balance.fetch(&member("u1")).await.unwrap(), 60);
    }

    #[tokio::test]
    async fn test_leaderboard_sees_fresh_writes() {
        let (ctx, _) = context(json!({
            "g1": { "u1": { "money": 10 }, "u2": { "money": 30 }, "shop": [] }
        }));
        let balance = BalanceManager::new(ctx);

        balance.leaderboard(&member("u1")).await.unwrap();
        balance.add(&member("u1"), 50, "").await.unwrap();

        let board = balance.leaderboard(&Identifier::guild("g1").unwrap()).await.unwrap();
        assert_eq!(board, vec![("u1".to_string(), 60), ("u2".to_string(), 30)]);
    }
}
