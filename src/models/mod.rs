//! Raw records as stored in the key-path store.
//!
//! Field names follow the stored camelCase layout:
//!
//! ```text
//! {guild}: {
//!     {member}: { money, bank, dailyCooldown, workCooldown, weeklyCooldown,
//!                 inventory: [..], history: [..] },
//!     shop: [..],
//!     currencies: [..]
//! }
//! ```

pub mod currency;
pub mod item;
pub mod user;

pub use currency::CurrencyRecord;
pub use item::{HistoryRecord, InventoryRecord, ItemData, ShopItemEdit, ShopRecord};
pub use user::UserRecord;

/// Guild-level keys that are not members.
pub const GUILD_KEYS: [&str; 2] = ["shop", "currencies"];

/// Current time as an RFC 3339 string, the format item dates are stored in.
pub fn now_date() -> String {
    chrono::Utc::now().to_rfc3339()
}

/// Next id for a list of records: one past the highest id in use.
pub fn next_id(ids: impl Iterator<Item = u64>) -> u64 {
    ids.max().map_or(1, |max| max + 1)
}
