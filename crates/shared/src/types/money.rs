//! Money type stored as integer minor units.
//!
//! CRITICAL: Never use floating-point for money calculations.
//! Balances and amounts are counted in cents; `rust_decimal::Decimal` is only
//! used at the boundary to read and render major units ("10.50").

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Number of fractional digits in a major unit.
pub const MINOR_UNIT_SCALE: u32 = 2;

/// Errors converting a major-unit decimal into [`Money`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MoneyError {
    /// More fractional digits than the currency has minor units.
    #[error("amount {0} has more than two decimal places")]
    TooPrecise(Decimal),

    /// Value does not fit in the minor-unit representation.
    #[error("amount {0} is out of range")]
    OutOfRange(Decimal),
}

/// A monetary amount in minor units (e.g., cents) of the ledger currency.
///
/// Serialized as a bare integer so persisted and wire representations stay lossless.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Zero minor units.
    pub const ZERO: Self = Self(0);

    /// Creates an amount from a count of minor units.
    #[must_use]
    pub const fn from_minor(minor: i64) -> Self {
        Self(minor)
    }

    /// Returns the amount in minor units.
    #[must_use]
    pub const fn minor(self) -> i64 {
        self.0
    }

    /// Converts a major-unit decimal (e.g., `10.50`) into minor units.
    ///
    /// # Errors
    ///
    /// Returns an error if the value has sub-cent precision or overflows.
    pub fn from_major(value: Decimal) -> Result<Self, MoneyError> {
        let scaled = value
            .checked_mul(Decimal::ONE_HUNDRED)
            .ok_or(MoneyError::OutOfRange(value))?;

        if !scaled.fract().is_zero() {
            return Err(MoneyError::TooPrecise(value));
        }

        scaled
            .to_i64()
            .map(Self)
            .ok_or(MoneyError::OutOfRange(value))
    }

    /// Returns the amount as a major-unit decimal with two fractional digits.
    #[must_use]
    pub fn to_major(self) -> Decimal {
        Decimal::new(self.0, MINOR_UNIT_SCALE)
    }

    /// Returns true if the amount is zero.
    #[must_use]
    pub const fn is_zero(self) -> bool {
        self.0 == 0
    }

    /// Returns true if the amount is strictly greater than zero.
    #[must_use]
    pub const fn is_positive(self) -> bool {
        self.0 > 0
    }

    /// Returns true if the amount is negative.
    #[must_use]
    pub const fn is_negative(self) -> bool {
        self.0 < 0
    }

    /// Adds two amounts, returning `None` on overflow.
    #[must_use]
    pub const fn checked_add(self, other: Self) -> Option<Self> {
        match self.0.checked_add(other.0) {
            Some(sum) => Some(Self(sum)),
            None => None,
        }
    }

    /// Subtracts `other`, returning `None` on overflow.
    #[must_use]
    pub const fn checked_sub(self, other: Self) -> Option<Self> {
        match self.0.checked_sub(other.0) {
            Some(diff) => Some(Self(diff)),
            None => None,
        }
    }
}

impl std::fmt::Display for Money {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_major())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal_macros::dec;

    #[test]
    fn test_money_zero() {
        assert!(Money::ZERO.is_zero());
        assert!(!Money::ZERO.is_positive());
        assert!(!Money::ZERO.is_negative());
        assert_eq!(Money::default(), Money::ZERO);
    }

    #[test]
    fn test_money_sign() {
        assert!(Money::from_minor(1).is_positive());
        assert!(Money::from_minor(-1).is_negative());
    }

    #[rstest]
    #[case(dec!(10.50), 1050)]
    #[case(dec!(10.5), 1050)]
    #[case(dec!(0.01), 1)]
    #[case(dec!(1000), 100_000)]
    #[case(dec!(-3.00), -300)]
    fn test_from_major(#[case] major: Decimal, #[case] minor: i64) {
        assert_eq!(Money::from_major(major).unwrap(), Money::from_minor(minor));
    }

    #[test]
    fn test_from_major_rejects_sub_cent_precision() {
        assert_eq!(
            Money::from_major(dec!(0.001)),
            Err(MoneyError::TooPrecise(dec!(0.001)))
        );
    }

    #[test]
    fn test_from_major_rejects_out_of_range() {
        let huge = Decimal::from(i64::MAX);
        assert_eq!(Money::from_major(huge), Err(MoneyError::OutOfRange(huge)));
    }

    #[test]
    fn test_to_major_and_display() {
        let money = Money::from_minor(1050);
        assert_eq!(money.to_major(), dec!(10.50));
        assert_eq!(money.to_string(), "10.50");
        assert_eq!(Money::from_minor(7).to_string(), "0.07");
    }

    #[test]
    fn test_checked_arithmetic() {
        let a = Money::from_minor(1000);
        let b = Money::from_minor(300);
        assert_eq!(a.checked_sub(b), Some(Money::from_minor(700)));
        assert_eq!(a.checked_add(b), Some(Money::from_minor(1300)));
        assert_eq!(Money::from_minor(i64::MAX).checked_add(b), None);
        assert_eq!(Money::from_minor(i64::MIN).checked_sub(b), None);
    }

    #[test]
    fn test_repeated_cents_do_not_drift() {
        let mut total = Money::ZERO;
        for _ in 0..1000 {
            total = total.checked_add(Money::from_minor(10)).unwrap();
        }
        assert_eq!(total.to_major(), dec!(100.00));
    }

    #[test]
    fn test_serializes_as_integer_minor_units() {
        let json = serde_json::to_string(&Money::from_minor(1050)).unwrap();
        assert_eq!(json, "1050");
        let back: Money = serde_json::from_str("1050").unwrap();
        assert_eq!(back, Money::from_minor(1050));
    }
}
