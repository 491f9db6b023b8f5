//! Precision-safe decimal types for auction arithmetic.
//!
//! Uses `rust_decimal` for exact decimal arithmetic. Clearing prices are
//! computed by division, which carries 28 significant digits and rounds
//! half-even; this is the documented rounding behavior for every ratio
//! produced by the matcher.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, Sub};
use std::str::FromStr;

/// Price (exchange rate or USD quote) with exact decimal precision.
///
/// Wraps `Decimal` so prices cannot be mixed up with order volumes in
/// calculations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Price(pub Decimal);

impl Price {
    pub const ZERO: Self = Self(Decimal::ZERO);
    pub const ONE: Self = Self(Decimal::ONE);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Absolute percentage change relative to `other`.
    ///
    /// Returns `None` when `other` is zero (no baseline to compare to).
    #[inline]
    pub fn pct_change_from(&self, other: Price) -> Option<Decimal> {
        if other.is_zero() {
            return None;
        }
        Some((self.0 - other.0).abs() / other.0 * Decimal::ONE_HUNDRED)
    }
}

impl fmt::Display for Price {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Price {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Price {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Price {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Price {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

/// Order volume with exact decimal precision.
///
/// Values are in human units of the sold asset (the chain-side 18-decimal
/// fixed point representation is converted at the ledger boundary).
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Amount(pub Decimal);

impl Amount {
    pub const ZERO: Self = Self(Decimal::ZERO);

    #[inline]
    pub fn new(value: Decimal) -> Self {
        Self(value)
    }

    #[inline]
    pub fn inner(&self) -> Decimal {
        self.0
    }

    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0.is_sign_positive() && !self.0.is_zero()
    }

    /// Ratio of this volume to another, as a price.
    ///
    /// This is the uniform-clearing-price operation: aggregate buy volume
    /// divided by aggregate sell volume. Returns `None` when the divisor
    /// is zero.
    #[inline]
    pub fn ratio(&self, divisor: Amount) -> Option<Price> {
        if divisor.is_zero() {
            return None;
        }
        Some(Price(self.0 / divisor.0))
    }
}

impl fmt::Display for Amount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for Amount {
    type Err = rust_decimal::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.parse()?))
    }
}

impl From<Decimal> for Amount {
    fn from(d: Decimal) -> Self {
        Self(d)
    }
}

impl Add for Amount {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self(self.0 + rhs.0)
    }
}

impl Sub for Amount {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self(self.0 - rhs.0)
    }
}

impl Sum for Amount {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::ZERO, Add::add)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    #[test]
    fn test_price_pct_change() {
        let last = Price::new(dec!(2000));
        let observed = Price::new(dec!(2010));

        let change = observed.pct_change_from(last).unwrap();
        assert_eq!(change, dec!(0.5));

        // Symmetric for a drop of the same size
        let dropped = Price::new(dec!(1990));
        assert_eq!(dropped.pct_change_from(last).unwrap(), dec!(0.5));
    }

    #[test]
    fn test_price_pct_change_zero_baseline() {
        assert!(Price::new(dec!(1)).pct_change_from(Price::ZERO).is_none());
    }

    #[test]
    fn test_amount_ratio() {
        let buys = Amount::new(dec!(50));
        let sells = Amount::new(dec!(100));

        assert_eq!(buys.ratio(sells).unwrap(), Price::new(dec!(0.5)));
        assert!(buys.ratio(Amount::ZERO).is_none());
    }

    #[test]
    fn test_amount_sum() {
        let total: Amount = [dec!(1.5), dec!(2.5), dec!(96)]
            .into_iter()
            .map(Amount::new)
            .sum();
        assert_eq!(total, Amount::new(dec!(100)));
    }

    #[test]
    fn test_is_positive_rejects_zero_and_negative() {
        assert!(Amount::new(dec!(0.001)).is_positive());
        assert!(!Amount::ZERO.is_positive());
        assert!(!Amount::new(dec!(-1)).is_positive());
    }
}
