//! Guild currency manager.

use tracing::debug;

use super::{positive, EconomyContext};
use crate::cache::{Identifier, SlotName, Written};
use crate::checked;
use crate::entities::Currency;
use crate::error::{EconomyError, Result};
use crate::events::EconomyEvent;
use crate::models::{next_id, CurrencyRecord};
use crate::store::typed::{get_list, pull_as, push_as, set_as};

const CURRENCY_SLOTS: [SlotName; 2] = [SlotName::Currencies, SlotName::Guilds];

/// Custom currencies a guild defines on top of the wallet.
#[derive(Debug, Clone)]
pub struct CurrencyManager {
    ctx: EconomyContext,
}

impl CurrencyManager {
    pub fn new(ctx: EconomyContext) -> Self {
        Self { ctx }
    }

    pub async fn fetch(&self, guild: &Identifier) -> Result<Vec<Currency>> {
        self.ctx.read_list(&self.ctx.cache.currencies, guild).await
    }

    pub async fn find(&self, guild: &Identifier, currency_id: u64) -> Result<Option<Currency>> {
        Ok(self
            .fetch(guild)
            .await?
            .into_iter()
            .find(|currency| currency.id() == currency_id))
    }

    /// Case-insensitive lookup by name.
    pub async fn find_by_name(&self, guild: &Identifier, name: &str) -> Result<Option<Currency>> {
        Ok(self
            .fetch(guild)
            .await?
            .into_iter()
            .find(|currency| currency.name().eq_ignore_ascii_case(name)))
    }

    pub async fn create(&self, guild: &Identifier, name: &str, symbol: &str) -> Result<CurrencyRecord> {
        let ctx = &self.ctx;
        let guild = guild.to_guild();
        let path = SlotName::Currencies.spec().path(&guild)?;

        let currencies: Vec<CurrencyRecord> = get_list(ctx.store(), &path).await?;
        let record = CurrencyRecord::new(
            next_id(currencies.iter().map(|currency| currency.id)),
            name,
            symbol,
        );
        push_as(ctx.store(), &path, &record).await?;
        debug!("Created currency {} '{}' in {}", record.id, record.name, guild);

        let record = ctx.cache.sync(Written::new(record, &guild, &CURRENCY_SLOTS)).await?;
        ctx.events.emit(EconomyEvent::CurrencyCreated {
            guild_id: guild.guild_id().to_string(),
            currency: record.clone(),
        });
        Ok(record)
    }

    /// Delete a currency with every balance in it. Returns whether it existed.
    pub async fn delete(&self, guild: &Identifier, currency_id: u64) -> Result<bool> {
        let ctx = &self.ctx;
        let guild = guild.to_guild();
        let path = SlotName::Currencies.spec().path(&guild)?;

        let mut currencies: Vec<CurrencyRecord> = get_list(ctx.store(), &path).await?;
        let before = currencies.len();
        currencies.retain(|currency| currency.id != currency_id);
        if currencies.len() == before {
            return Ok(false);
        }

        set_as(ctx.store(), &path, &currencies).await?;
        ctx.cache.sync(Written::new((), &guild, &CURRENCY_SLOTS)).await?;

        ctx.events.emit(EconomyEvent::CurrencyDeleted {
            guild_id: guild.guild_id().to_string(),
            currency_id,
        });
        Ok(true)
    }

    /// The member's balance in a currency.
    pub async fn balance_of(&self, id: &Identifier, currency_id: u64) -> Result<i64> {
        let member = member_of(id)?;
        let currency = self
            .find(id, currency_id)
            .await?
            .ok_or_else(|| EconomyError::CurrencyNotFound(currency_id.to_string()))?;
        Ok(currency.balance_of(member))
    }

    pub async fn add(&self, id: &Identifier, currency_id: u64, amount: i64) -> Result<i64> {
        let amount = positive(amount)?;
        self.update_balance(id, currency_id, |balance| checked::credit(balance, amount))
            .await
    }

    /// Take `amount` away. The result may go negative.
    pub async fn subtract(&self, id: &Identifier, currency_id: u64, amount: i64) -> Result<i64> {
        let amount = positive(amount)?;
        self.update_balance(id, currency_id, |balance| checked::debit(balance, amount))
            .await
    }

    pub async fn set(&self, id: &Identifier, currency_id: u64, amount: i64) -> Result<i64> {
        if amount < 0 {
            return Err(EconomyError::InvalidAmount(amount));
        }
        self.update_balance(id, currency_id, |_| Ok(amount)).await
    }

    async fn update_balance(
        &self,
        id: &Identifier,
        currency_id: u64,
        change: impl FnOnce(i64) -> Result<i64>,
    ) -> Result<i64> {
        let ctx = &self.ctx;
        let member = member_of(id)?;
        let guild = id.to_guild();
        let path = SlotName::Currencies.spec().path(&guild)?;

        let currencies: Vec<CurrencyRecord> = get_list(ctx.store(), &path).await?;
        let index = currencies
            .iter()
            .position(|currency| currency.id == currency_id)
            .ok_or_else(|| EconomyError::CurrencyNotFound(currency_id.to_string()))?;

        let mut currency = currencies[index].clone();
        let previous = currency.balance_of(member);
        let balance = change(previous)?;
        currency.balances.insert(member.to_string(), balance);
        pull_as(ctx.store(), &path, index, &currency).await?;

        let balance = ctx.cache.sync(Written::new(balance, &guild, &CURRENCY_SLOTS)).await?;
        ctx.events.emit(EconomyEvent::CurrencyBalanceChanged {
            guild_id: guild.guild_id().to_string(),
            member_id: member.to_string(),
            currency_id,
            change: balance.saturating_sub(previous),
            balance,
        });
        Ok(balance)
    }
}

/// Currency balances are keyed by member even though the slot is guild-scoped.
fn member_of(id: &Identifier) -> Result<&str> {
    id.member_id().ok_or(EconomyError::InvalidIdentifier {
        slot: SlotName::Currencies,
        required: crate::cache::FieldSet::GUILD_MEMBER,
        received: id.fields(),
    })
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::managers::test_support::context;

    fn guild() -> Identifier {
        Identifier::guild("g1").unwrap()
    }

    fn member() -> Identifier {
        Identifier::member("g1", "u1").unwrap()
    }

    #[tokio::test]
    async fn test_create_find_delete() {
        let (ctx, _) = context(json!({}));
        let currencies = CurrencyManager::new(ctx);

        let gems = currencies.create(&guild(), "Gems", "💎").await.unwrap();
        let coins = currencies.create(&guild(), "Coins", "c").await.unwrap();
        assert_eq!((gems.id, coins.id), (1, 2));

        let found = currencies.find_by_name(&guild(), "gems").await.unwrap().unwrap();
        assert_eq!(found.symbol(), "💎");

        assert!(currencies.delete(&guild(), 1).await.unwrap());
        assert!(!currencies.delete(&guild(), 1).await.unwrap());
        assert!(currencies.find(&guild(), 1).await.unwrap().is_none());
        assert_eq!(currencies.fetch(&guild()).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_member_balances() {
        let (ctx, store) = context(json!({}));
        let currencies = CurrencyManager::new(ctx.clone());
        currencies.create(&guild(), "Gems", "g").await.unwrap();

        assert_eq!(currencies.balance_of(&member(), 1).await.unwrap(), 0);
        assert_eq!(currencies.add(&member(), 1, 12).await.unwrap(), 12);
        assert_eq!(currencies.subtract(&member(), 1, 2).await.unwrap(), 10);
        assert_eq!(currencies.balance_of(&member(), 1).await.unwrap(), 10);
        assert_eq!(store.snapshot()["g1"]["currencies"][0]["balances"]["u1"], 10);

        let guild_view = ctx.cache.guilds.get(&guild()).and_then(|h| h.one()).unwrap();
        assert_eq!(guild_view.currencies()[0].balance_of("u1"), 10);

        assert_eq!(currencies.set(&member(), 1, 3).await.unwrap(), 3);
        assert!(matches!(
            currencies.add(&member(), 1, i64::MAX).await,
            Err(EconomyError::InvalidAmount(i64::MAX))
        ));
        assert_eq!(currencies.balance_of(&member(), 1).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_unknown_currency_and_missing_member() {
        let (ctx, _) = context(json!({}));
        let currencies = CurrencyManager::new(ctx);

        assert!(matches!(
            currencies.add(&member(), 4, 1).await,
            Err(EconomyError::CurrencyNotFound(id)) if id == "4"
        ));
        assert!(matches!(
            currencies.balance_of(&guild(), 1).await,
            Err(EconomyError::InvalidIdentifier { .. })
        ));
    }
}
