//! Ledger events.
//!
//! Each `Economy` owns its own [`EventBus`]; collaborators that want to
//! observe ledger changes get a receiver from [`EventBus::subscribe`].

use tokio::sync::broadcast;
use tracing::trace;

use crate::entities::RewardKind;
use crate::models::{CurrencyRecord, ShopRecord};

/// Events buffered per subscriber before the slowest one starts lagging.
const EVENT_CAPACITY: usize = 256;

/// Something that changed in the ledger.
#[derive(Debug, Clone, PartialEq)]
pub enum EconomyEvent {
    BalanceChanged {
        guild_id: String,
        member_id: String,
        change: i64,
        balance: i64,
        reason: String,
    },
    BankChanged {
        guild_id: String,
        member_id: String,
        change: i64,
        bank: i64,
        reason: String,
    },
    RewardClaimed {
        guild_id: String,
        member_id: String,
        kind: RewardKind,
        reward: i64,
        balance: i64,
    },
    CooldownsCleared {
        guild_id: String,
        member_id: String,
    },
    ShopItemAdded {
        guild_id: String,
        item: ShopRecord,
    },
    ShopItemEdited {
        guild_id: String,
        item: ShopRecord,
    },
    ShopItemRemoved {
        guild_id: String,
        item_id: u64,
    },
    ShopCleared {
        guild_id: String,
    },
    ShopItemBought {
        guild_id: String,
        member_id: String,
        item_id: u64,
        quantity: u64,
        total_price: i64,
    },
    InventoryItemAdded {
        guild_id: String,
        member_id: String,
        item_id: u64,
        quantity: u64,
    },
    InventoryItemRemoved {
        guild_id: String,
        member_id: String,
        item_id: u64,
        quantity: u64,
    },
    InventoryItemSold {
        guild_id: String,
        member_id: String,
        item_id: u64,
        quantity: u64,
        income: i64,
    },
    InventoryItemUsed {
        guild_id: String,
        member_id: String,
        item_id: u64,
    },
    InventoryCleared {
        guild_id: String,
        member_id: String,
    },
    HistoryCleared {
        guild_id: String,
        member_id: String,
    },
    CurrencyCreated {
        guild_id: String,
        currency: CurrencyRecord,
    },
    CurrencyDeleted {
        guild_id: String,
        currency_id: u64,
    },
    CurrencyBalanceChanged {
        guild_id: String,
        member_id: String,
        currency_id: u64,
        change: i64,
        balance: i64,
    },
}

/// Broadcast channel for [`EconomyEvent`]s.
///
/// Cloning is cheap and publishes to the same subscribers.
#[derive(Debug, Clone)]
pub struct EventBus {
    sender: broadcast::Sender<EconomyEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(EVENT_CAPACITY);
        Self { sender }
    }

    /// Receive every event published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<EconomyEvent> {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is fine.
    pub fn emit(&self, event: EconomyEvent) {
        trace!("Emitting {:?}", event);
        let _ = self.sender.send(event);
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
