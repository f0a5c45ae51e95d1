//! Checked money and quantity arithmetic.
//!
//! Every helper fails with [`EconomyError::InvalidAmount`] instead of
//! wrapping, and runs before the store is touched.

use crate::error::{EconomyError, Result};

/// `quantity` as reported in an error, clamped to `i64::MAX`.
pub(crate) fn reported(quantity: u64) -> i64 {
    i64::try_from(quantity).unwrap_or(i64::MAX)
}

/// `quantity` as a signed amount.
pub(crate) fn signed(quantity: u64) -> Result<i64> {
    i64::try_from(quantity).map_err(|_| EconomyError::InvalidAmount(i64::MAX))
}

/// Price of `quantity` units at `price` each.
pub(crate) fn total(price: i64, quantity: u64) -> Result<i64> {
    signed(quantity)?
        .checked_mul(price)
        .ok_or(EconomyError::InvalidAmount(reported(quantity)))
}

pub(crate) fn credit(balance: i64, amount: i64) -> Result<i64> {
    balance
        .checked_add(amount)
        .ok_or(EconomyError::InvalidAmount(amount))
}

pub(crate) fn debit(balance: i64, amount: i64) -> Result<i64> {
    balance
        .checked_sub(amount)
        .ok_or(EconomyError::InvalidAmount(amount))
}

/// Units held after adding `quantity` to a stack of `held`.
pub(crate) fn stack(held: u64, quantity: u64) -> Result<u64> {
    held.checked_add(quantity)
        .ok_or(EconomyError::InvalidAmount(reported(quantity)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_total_rejects_overflow() {
        assert_eq!(total(5, 3).unwrap(), 15);
        assert!(matches!(total(5, u64::MAX), Err(EconomyError::InvalidAmount(i64::MAX))));
        assert!(matches!(total(5, 1 << 62), Err(EconomyError::InvalidAmount(_))));
    }

    #[test]
    fn test_credit_and_debit_reject_overflow() {
        assert_eq!(credit(10, 5).unwrap(), 15);
        assert!(matches!(credit(1, i64::MAX), Err(EconomyError::InvalidAmount(i64::MAX))));
        assert_eq!(debit(0, 5).unwrap(), -5);
        assert!(debit(i64::MIN, 1).is_err());
    }

    #[test]
    fn test_stack_and_reported() {
        assert_eq!(stack(2, 3).unwrap(), 5);
        assert!(stack(u64::MAX, 1).is_err());
        assert_eq!(reported(u64::MAX), i64::MAX);
        assert_eq!(reported(7), 7);
    }
}
