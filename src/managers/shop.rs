//! Shop manager.

use tracing::{debug, info};

use super::{history, inventory, EconomyContext};
use crate::cache::{Identifier, SlotName, Written};
use crate::checked;
use crate::entities::ShopItem;
use crate::error::{EconomyError, Result};
use crate::events::EconomyEvent;
use crate::models::{next_id, ItemData, ShopItemEdit, ShopRecord};
use crate::store::key_path;
use crate::store::typed::{get_amount, get_list, push_as, set_as};

const SHOP_SLOTS: [SlotName; 2] = [SlotName::Shop, SlotName::Guilds];

const PURCHASE_SLOTS: [SlotName; 4] = [
    SlotName::Users,
    SlotName::Balance,
    SlotName::Inventory,
    SlotName::History,
];

/// A completed purchase.
#[derive(Debug, Clone, PartialEq)]
pub struct Purchase {
    pub item: ShopRecord,
    pub quantity: u64,
    pub total_price: i64,
    /// Buyer's wallet after paying.
    pub balance: i64,
    /// Buyer's stack of the item after the purchase.
    pub stack: u64,
}

#[derive(Debug, Clone)]
pub struct ShopManager {
    ctx: EconomyContext,
}

impl ShopManager {
    pub fn new(ctx: EconomyContext) -> Self {
        Self { ctx }
    }

    /// Items on sale in the guild, in listing order.
    pub async fn fetch(&self, guild: &Identifier) -> Result<Vec<ShopItem>> {
        self.ctx.read_list(&self.ctx.cache.shop, guild).await
    }

    pub async fn find(&self, guild: &Identifier, item_id: u64) -> Result<Option<ShopItem>> {
        Ok(self.fetch(guild).await?.into_iter().find(|item| item.id() == item_id))
    }

    /// List a new item. Ids are one past the highest id in the shop.
    pub async fn add_item(&self, guild: &Identifier, data: ItemData) -> Result<ShopRecord> {
        if data.price < 0 {
            return Err(EconomyError::InvalidAmount(data.price));
        }
        let ctx = &self.ctx;
        let guild = guild.to_guild();
        let path = SlotName::Shop.spec().path(&guild)?;

        let items: Vec<ShopRecord> = get_list(ctx.store(), &path).await?;
        let record = data.into_shop_record(next_id(items.iter().map(|item| item.id)));
        push_as(ctx.store(), &path, &record).await?;
        debug!("Listed item {} '{}' in {}", record.id, record.name, guild);

        let record = ctx.cache.sync(Written::new(record, &guild, &SHOP_SLOTS)).await?;
        ctx.events.emit(EconomyEvent::ShopItemAdded {
            guild_id: guild.guild_id().to_string(),
            item: record.clone(),
        });
        Ok(record)
    }

    pub async fn edit_item(&self, guild: &Identifier, item_id: u64, edit: ShopItemEdit) -> Result<ShopRecord> {
        let item = self
            .find(guild, item_id)
            .await?
            .ok_or(EconomyError::ItemNotFound(item_id))?;
        let record = self.ctx.cache.sync(item.edit(edit).await?).await?;

        self.ctx.events.emit(EconomyEvent::ShopItemEdited {
            guild_id: guild.guild_id().to_string(),
            item: record.clone(),
        });
        Ok(record)
    }

    /// Take an item off sale. Returns whether it was listed.
    pub async fn remove_item(&self, guild: &Identifier, item_id: u64) -> Result<bool> {
        let Some(item) = self.find(guild, item_id).await? else {
            return Ok(false);
        };

        let removed = self.ctx.cache.sync(item.remove().await?).await?;
        if removed {
            self.ctx.events.emit(EconomyEvent::ShopItemRemoved {
                guild_id: guild.guild_id().to_string(),
                item_id,
            });
        }
        Ok(removed)
    }

    /// Remove every item. Returns whether the shop had any.
    pub async fn clear(&self, guild: &Identifier) -> Result<bool> {
        let ctx = &self.ctx;
        let guild = guild.to_guild();
        let path = SlotName::Shop.spec().path(&guild)?;

        let items: Vec<ShopRecord> = get_list(ctx.store(), &path).await?;
        if items.is_empty() {
            return Ok(false);
        }

        set_as(ctx.store(), &path, &Vec::<ShopRecord>::new()).await?;
        ctx.cache.sync(Written::new((), &guild, &SHOP_SLOTS)).await?;

        ctx.events.emit(EconomyEvent::ShopCleared {
            guild_id: guild.guild_id().to_string(),
        });
        Ok(true)
    }

    /// Buy `quantity` units of item `item_id` for the member.
    ///
    /// Charges the buyer when `subtract_on_buy` is set and records the
    /// purchase when `save_purchases_history` is set.
    ///
    /// # Errors
    /// - [`EconomyError::ItemNotFound`] if the item is not on sale.
    /// - [`EconomyError::InsufficientFunds`] if the buyer can't pay.
    /// - [`EconomyError::ItemLimitReached`] if the buyer would hold more
    ///   than the item's max amount.
    pub async fn buy(&self, buyer: &Identifier, item_id: u64, quantity: u64) -> Result<Purchase> {
        if quantity == 0 {
            return Err(EconomyError::InvalidAmount(0));
        }
        let ctx = &self.ctx;
        let store = ctx.store();
        let options = ctx.options();
        let member = SlotName::Inventory.spec().check(buyer)?.unwrap_or_default();

        let shop: Vec<ShopRecord> = get_list(store, &SlotName::Shop.spec().path(buyer)?).await?;
        let item = shop
            .into_iter()
            .find(|item| item.id == item_id)
            .ok_or(EconomyError::ItemNotFound(item_id))?;
        let total_price = checked::total(item.price, quantity)?;

        let money_path = key_path(&[buyer.guild_id(), member, "money"]);
        let available = get_amount(store, &money_path).await?;
        let balance = if options.subtract_on_buy {
            if available < total_price {
                return Err(EconomyError::InsufficientFunds {
                    needed: total_price,
                    available,
                });
            }
            checked::debit(available, total_price)?
        } else {
            available
        };

        let mut pending = Written::pending();
        let outcome = async {
            let stack = inventory::stack_into(store, buyer, item.to_inventory(quantity)).await?;
            pending.mark(buyer, &[SlotName::Users, SlotName::Inventory]);

            if options.subtract_on_buy {
                set_as(store, &money_path, &balance).await?;
                pending.mark(buyer, &[SlotName::Users, SlotName::Balance]);
            }
            if options.save_purchases_history {
                history::append(store, buyer, &item, quantity).await?;
                pending.mark(buyer, &PURCHASE_SLOTS);
            }
            Ok::<_, EconomyError>(stack)
        }
        .await;
        let stack = ctx.cache.settle(pending.finish(outcome)).await?;

        let purchase = Purchase {
            item,
            quantity,
            total_price,
            balance,
            stack,
        };
        info!(
            "{} bought {} x{} for {}",
            buyer, purchase.item.name, quantity, total_price
        );

        ctx.events.emit(EconomyEvent::ShopItemBought {
            guild_id: buyer.guild_id().to_string(),
            member_id: member.to_string(),
            item_id,
            quantity,
            total_price,
        });
        if options.subtract_on_buy {
            ctx.events.emit(EconomyEvent::BalanceChanged {
                guild_id: buyer.guild_id().to_string(),
                member_id: member.to_string(),
                change: -total_price,
                balance,
                reason: format!("bought {}", purchase.item.name),
            });
        }

        Ok(purchase)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::managers::test_support::{context, flaky_context};
    use crate::options::EconomyOptions;

    fn guild() -> Identifier {
        Identifier::guild("g1").unwrap()
    }

    fn member() -> Identifier {
        Identifier::member("g1", "u1").unwrap()
    }

    #[tokio::test]
    async fn test_add_item_assigns_sequential_ids() {
        let (ctx, store) = context(json!({}));
        let shop = ShopManager::new(ctx.clone());

        let apple = shop.add_item(&guild(), ItemData::new("Apple", 5)).await.unwrap();
        let sword = shop
            .add_item(&guild(), ItemData::new("Sword", 40).description("Sharp"))
            .await
            .unwrap();

        assert_eq!((apple.id, sword.id), (1, 2));
        assert_eq!(store.snapshot()["g1"]["shop"][1]["description"], "Sharp");

        let names: Vec<String> = shop
            .fetch(&guild())
            .await
            .unwrap()
            .iter()
            .map(|item| item.name().to_string())
            .collect();
        assert_eq!(names, vec!["Apple", "Sword"]);

        // Shop writes dirty the whole-guild view too.
        let cached = ctx.cache.guilds.get(&guild()).and_then(|h| h.one()).unwrap();
        assert_eq!(cached.shop().len(), 2);
    }

    #[tokio::test]
    async fn test_edit_and_remove_item() {
        let (ctx, _) = context(json!({}));
        let shop = ShopManager::new(ctx);
        shop.add_item(&guild(), ItemData::new("Apple", 5)).await.unwrap();

        let edited = shop.edit_item(&guild(), 1, ShopItemEdit::Price(9)).await.unwrap();
        assert_eq!(edited.price, 9);
        assert_eq!(shop.find(&guild(), 1).await.unwrap().unwrap().price(), 9);

        assert!(matches!(
            shop.edit_item(&guild(), 7, ShopItemEdit::Price(1)).await,
            Err(EconomyError::ItemNotFound(7))
        ));

        assert!(shop.remove_item(&guild(), 1).await.unwrap());
        assert!(!shop.remove_item(&guild(), 1).await.unwrap());
        assert!(shop.fetch(&guild()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_clear() {
        let (ctx, _) = context(json!({}));
        let shop = ShopManager::new(ctx);
        assert!(!shop.clear(&guild()).await.unwrap());

        shop.add_item(&guild(), ItemData::new("Apple", 5)).await.unwrap();
        assert!(shop.clear(&guild()).await.unwrap());
        assert!(shop.fetch(&guild()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_buy_charges_stacks_and_records() {
        let (ctx, store) = context(json!({ "g1": { "u1": { "money": 100 } } }));
        let shop = ShopManager::new(ctx.clone());
        shop.add_item(&guild(), ItemData::new("Apple", 15)).await.unwrap();

        let purchase = shop.buy(&member(), 1, 2).await.unwrap();
        assert_eq!(purchase.total_price, 30);
        assert_eq!(purchase.balance, 70);
        assert_eq!(purchase.stack, 2);

        let snapshot = store.snapshot();
        assert_eq!(snapshot["g1"]["u1"]["money"], 70);
        assert_eq!(snapshot["g1"]["u1"]["inventory"][0]["quantity"], 2);
        assert_eq!(snapshot["g1"]["u1"]["history"][0]["totalPrice"], 30);

        let user = ctx.cache.users.get(&member()).and_then(|h| h.one()).unwrap();
        assert_eq!(user.money(), 70);
        assert_eq!(user.inventory().len(), 1);
        let history = ctx.cache.history.get(&member()).map(|h| h.into_vec()).unwrap();
        assert_eq!(history.len(), 1);
    }

    #[tokio::test]
    async fn test_buy_without_funds() {
        let (ctx, store) = context(json!({ "g1": { "u1": { "money": 10 } } }));
        let shop = ShopManager::new(ctx);
        shop.add_item(&guild(), ItemData::new("Sword", 40)).await.unwrap();

        assert!(matches!(
            shop.buy(&member(), 1, 1).await,
            Err(EconomyError::InsufficientFunds { needed: 40, available: 10 })
        ));
        assert!(store.snapshot()["g1"]["u1"].get("inventory").is_none());
    }

    #[tokio::test]
    async fn test_buy_honours_options() {
        let (ctx, store) = context(json!({ "g1": { "u1": { "money": 0 } } }));
        ctx.set_options(
            EconomyOptions::default()
                .subtract_on_buy(false)
                .save_purchases_history(false),
        );
        let shop = ShopManager::new(ctx);
        shop.add_item(&guild(), ItemData::new("Crown", 500).max_amount(1))
            .await
            .unwrap();

        let purchase = shop.buy(&member(), 1, 1).await.unwrap();
        assert_eq!(purchase.balance, 0);
        assert!(store.snapshot()["g1"]["u1"].get("history").is_none());

        assert!(matches!(
            shop.buy(&member(), 1, 1).await,
            Err(EconomyError::ItemLimitReached { id: 1, max: 1 })
        ));
    }

    #[tokio::test]
    async fn test_buy_rejects_overflowing_quantity() {
        let (ctx, store) = context(json!({ "g1": { "u1": { "money": 10 } } }));
        let shop = ShopManager::new(ctx);
        shop.add_item(&guild(), ItemData::new("Apple", 5)).await.unwrap();

        for quantity in [u64::MAX, 1 << 62] {
            assert!(matches!(
                shop.buy(&member(), 1, quantity).await,
                Err(EconomyError::InvalidAmount(_))
            ));
        }
        let snapshot = store.snapshot();
        assert_eq!(snapshot["g1"]["u1"]["money"], 10);
        assert!(snapshot["g1"]["u1"].get("inventory").is_none());
    }

    #[tokio::test]
    async fn test_buy_refreshes_cache_when_history_write_fails() {
        let (ctx, store) = flaky_context(json!({ "g1": { "u1": { "money": 100 } } }));
        let shop = ShopManager::new(ctx.clone());
        shop.add_item(&guild(), ItemData::new("Apple", 30)).await.unwrap();
        ctx.cache.update_all(&member()).await.unwrap();

        store.fail_writes_under(Some("g1.u1.history"));
        assert!(matches!(shop.buy(&member(), 1, 1).await, Err(EconomyError::Store(_))));

        let snapshot = store.inner.snapshot();
        assert_eq!(snapshot["g1"]["u1"]["money"], 70);
        let wallet = ctx.cache.balance.get(&member()).and_then(|h| h.one()).unwrap();
        assert_eq!(wallet.amount(), 70);
        let inventory = ctx.cache.inventory.get(&member()).map(|h| h.into_vec()).unwrap();
        assert_eq!(inventory.len(), 1);
    }

    #[tokio::test]
    async fn test_edit_rejects_negative_price() {
        let (ctx, _) = context(json!({}));
        let shop = ShopManager::new(ctx);
        shop.add_item(&guild(), ItemData::new("Apple", 5)).await.unwrap();

        assert!(matches!(
            shop.edit_item(&guild(), 1, ShopItemEdit::Price(-1)).await,
            Err(EconomyError::InvalidAmount(-1))
        ));
        assert_eq!(shop.find(&guild(), 1).await.unwrap().unwrap().price(), 5);
    }

    #[tokio::test]
    async fn test_buy_unknown_item() {
        let (ctx, _) = context(json!({}));
        let shop = ShopManager::new(ctx);
        assert!(matches!(
            shop.buy(&member(), 3, 1).await,
            Err(EconomyError::ItemNotFound(3))
        ));
    }
}
