//! Monetary amounts with two-decimal precision.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! This type wraps `rust_decimal::Decimal` and is always stored with scale 2.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Largest amount representable by a `NUMERIC(14, 2)` column.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(276_447_231, 23_283, 0, false, 2);

/// Reasons a decimal cannot be used as an `Amount`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmountError {
    /// Amounts are never negative.
    #[error("amount cannot be negative")]
    Negative,

    /// More than two fractional digits were supplied.
    #[error("amount must have at most two decimal places")]
    TooPrecise,

    /// Does not fit the storage column.
    #[error("amount exceeds the maximum of {MAX_AMOUNT}")]
    TooLarge,
}

/// A non-negative monetary amount with exactly two decimal places.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "Decimal", into = "Decimal")]
pub struct Amount(Decimal);

impl Amount {
    /// Zero.
    pub const ZERO: Self = Self(Decimal::from_parts(0, 0, 0, false, 2));

    /// Validates a decimal and rescales it to two places.
    ///
    /// # Errors
    ///
    /// Returns an `AmountError` when the value is negative, carries more than
    /// two significant fractional digits, or exceeds `MAX_AMOUNT`.
    pub fn new(value: Decimal) -> Result<Self, AmountError> {
        if value.is_sign_negative() && !value.is_zero() {
            return Err(AmountError::Negative);
        }
        let normalized = value.normalize();
        if normalized.scale() > 2 {
            return Err(AmountError::TooPrecise);
        }
        if normalized > MAX_AMOUNT {
            return Err(AmountError::TooLarge);
        }
        let mut scaled = normalized;
        scaled.rescale(2);
        // -0.00 and 0.00 compare equal but print differently.
        scaled.set_sign_positive(true);
        Ok(Self(scaled))
    }

    /// Creates an amount from a whole number of cents.
    ///
    /// # Errors
    ///
    /// Same as [`Amount::new`].
    pub fn from_cents(cents: i64) -> Result<Self, AmountError> {
        Self::new(Decimal::new(cents, 2))
    }

    /// Returns the inner decimal (scale 2).
    #[must_use]
    pub const fn value(self) -> Decimal {
        self.0
    }
}

impl TryFrom<Decimal> for Amount {
    type Error = AmountError;

    fn try_from(value: Decimal) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<Amount> for Decimal {
    fn from(amount: Amount) -> Self {
        amount.0
    }
}

impl std::fmt::Display for Amount {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
#[path = "amount_tests.rs"]
mod tests;
