//! Economy options.

use std::time::Duration;

use crate::checked;
use crate::error::{EconomyError, Result};

/// Tunables for rewards, selling and purchases.
#[derive(Debug, Clone, PartialEq)]
pub struct EconomyOptions {
    /// Money granted by the daily reward.
    pub daily_amount: i64,

    /// Money granted by the work reward.
    pub work_amount: i64,

    /// Money granted by the weekly reward.
    pub weekly_amount: i64,

    pub daily_cooldown: Duration,
    pub work_cooldown: Duration,
    pub weekly_cooldown: Duration,

    /// Share of an item's price paid back when it is sold (0-100).
    pub sell_percent: u8,

    /// Take the price out of the buyer's balance on purchase.
    pub subtract_on_buy: bool,

    /// Record every purchase in the buyer's history.
    pub save_purchases_history: bool,
}

impl Default for EconomyOptions {
    fn default() -> Self {
        Self {
            daily_amount: 100,
            work_amount: 10,
            weekly_amount: 1000,
            daily_cooldown: Duration::from_secs(86_400), // 1 day
            work_cooldown: Duration::from_secs(3_600),   // 1 hour
            weekly_cooldown: Duration::from_secs(604_800), // 1 week
            sell_percent: 75,
            subtract_on_buy: true,
            save_purchases_history: true,
        }
    }
}

impl EconomyOptions {
    #[must_use]
    pub fn daily_amount(mut self, amount: i64) -> Self {
        self.daily_amount = amount;
        self
    }

    #[must_use]
    pub fn work_amount(mut self, amount: i64) -> Self {
        self.work_amount = amount;
        self
    }

    #[must_use]
    pub fn weekly_amount(mut self, amount: i64) -> Self {
        self.weekly_amount = amount;
        self
    }

    #[must_use]
    pub fn daily_cooldown(mut self, cooldown: Duration) -> Self {
        self.daily_cooldown = cooldown;
        self
    }

    #[must_use]
    pub fn work_cooldown(mut self, cooldown: Duration) -> Self {
        self.work_cooldown = cooldown;
        self
    }

    #[must_use]
    pub fn weekly_cooldown(mut self, cooldown: Duration) -> Self {
        self.weekly_cooldown = cooldown;
        self
    }

    /// Set the sell-back percentage, capped at 100.
    #[must_use]
    pub fn sell_percent(mut self, percent: u8) -> Self {
        self.sell_percent = percent.min(100);
        self
    }

    #[must_use]
    pub fn subtract_on_buy(mut self, enabled: bool) -> Self {
        self.subtract_on_buy = enabled;
        self
    }

    #[must_use]
    pub fn save_purchases_history(mut self, enabled: bool) -> Self {
        self.save_purchases_history = enabled;
        self
    }

    /// Money paid back for `quantity` units of an item priced `price`.
    ///
    /// # Errors
    /// [`EconomyError::InvalidAmount`] if the total does not fit in an `i64`.
    pub fn sell_price(&self, price: i64, quantity: u64) -> Result<i64> {
        let unit = price
            .checked_mul(i64::from(self.sell_percent))
            .ok_or(EconomyError::InvalidAmount(price))?
            / 100;
        checked::total(unit, quantity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_overrides_defaults() {
        let options = EconomyOptions::default()
            .daily_amount(250)
            .sell_percent(150)
            .subtract_on_buy(false);

        assert_eq!(options.daily_amount, 250);
        assert_eq!(options.sell_percent, 100);
        assert!(!options.subtract_on_buy);
        assert_eq!(options.weekly_amount, 1000);
    }

    #[test]
    fn test_sell_price() {
        let options = EconomyOptions::default();
        assert_eq!(options.sell_price(100, 1).unwrap(), 75);
        assert_eq!(options.sell_price(100, 3).unwrap(), 225);
        assert_eq!(options.clone().sell_percent(50).sell_price(9, 2).unwrap(), 8);

        assert!(matches!(
            options.sell_price(100, u64::MAX),
            Err(EconomyError::InvalidAmount(_))
        ));
        assert!(options.sell_price(i64::MAX, 1).is_err());
    }
}
