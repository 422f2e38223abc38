//! A non-negative amount tagged with its currency.

use compact_str::CompactString;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

pub const USD: &str = "USD";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    #[error("amount must not be negative: {0}")]
    Negative(Decimal),
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Money {
    amount: Decimal,
    currency: CompactString,
}

impl Money {
    pub fn new(amount: Decimal, currency: impl Into<CompactString>) -> Result<Self, MoneyError> {
        if amount.is_sign_negative() && !amount.is_zero() {
            return Err(MoneyError::Negative(amount));
        }
        Ok(Self {
            amount,
            currency: currency.into(),
        })
    }

    /// USD amount, rounded to cents.
    pub fn usd(amount: Decimal) -> Result<Self, MoneyError> {
        Self::new(
            amount.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero),
            USD,
        )
    }

    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn currency(&self) -> &str {
        &self.currency
    }

    pub fn is_usd(&self) -> bool {
        self.currency.eq_ignore_ascii_case(USD)
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.amount, self.currency)
    }
}
