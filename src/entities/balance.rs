//! Wallet and bank balances.

use serde_json::Value;

use super::{decode, member_identifier};
use crate::cache::{Entity, EntityArgs, Identifier};

/// One member's amount in the `balance` or `bank` slot.
#[derive(Debug, Clone, PartialEq)]
pub struct BalanceItem {
    id: Identifier,
    amount: i64,
}

impl BalanceItem {
    pub fn id(&self) -> &Identifier {
        &self.id
    }

    pub fn amount(&self) -> i64 {
        self.amount
    }
}

impl Entity for BalanceItem {
    fn from_raw(raw: &Value, args: &EntityArgs) -> Result<Self, serde_json::Error> {
        Ok(Self {
            id: member_identifier(args)?,
            amount: decode(raw)?,
        })
    }
}
