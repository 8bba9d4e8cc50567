//! Money type for recorded prices
//!
//! Prices are stored as whole cents (i64) so that totals are exact: the sum
//! of line-item prices never drifts from the recorded appointment total.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, AddAssign, Sub};

/// A monetary amount stored as cents (hundredths of the currency unit)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Money(i64);

impl Money {
    /// Create a Money amount from cents
    ///
    /// # Examples
    /// ```
    /// use agenda_pricing::models::Money;
    /// let price = Money::from_cents(4000); // 40.00
    /// assert_eq!(price.units(), 40);
    /// ```
    pub const fn from_cents(cents: i64) -> Self {
        Self(cents)
    }

    /// Create a Money amount from whole units and cents
    pub const fn from_units_cents(units: i64, cents: i64) -> Self {
        Self(units * 100 + cents)
    }

    /// Create a zero Money amount
    pub const fn zero() -> Self {
        Self(0)
    }

    /// Get the amount in cents
    pub const fn cents(&self) -> i64 {
        self.0
    }

    /// Whole units (truncated toward zero)
    pub const fn units(&self) -> i64 {
        self.0 / 100
    }

    /// Cents portion (0-99)
    pub const fn cents_part(&self) -> i64 {
        (self.0 % 100).abs()
    }

    /// `None` on overflow
    pub fn checked_add(self, other: Self) -> Option<Self> {
        self.0.checked_add(other.0).map(Self)
    }

    pub fn saturating_add(self, other: Self) -> Self {
        Self(self.0.saturating_add(other.0))
    }

    /// Exact sum, or `None` if it does not fit
    pub fn checked_sum<I: IntoIterator<Item = Self>>(iter: I) -> Option<Self> {
        iter.into_iter()
            .try_fold(Money::zero(), |acc, m| acc.checked_add(m))
    }

    pub const fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub const fn is_positive(&self) -> bool {
        self.0 > 0
    }

    pub const fn is_negative(&self) -> bool {
        self.0 < 0
    }

    /// True when a nullable recorded price is missing or zero
    ///
    /// This is the per-field half of the anomaly predicate: both the
    /// appointment total and each line item are checked with it.
    pub fn is_missing(price: Option<Money>) -> bool {
        price.map_or(true, |p| p.is_zero())
    }

    /// Plain decimal rendering without a currency symbol ("40.00")
    pub fn to_decimal_string(&self) -> String {
        if self.is_negative() {
            format!("-{}.{:02}", self.units().abs(), self.cents_part())
        } else {
            format!("{}.{:02}", self.units(), self.cents_part())
        }
    }

    /// Format with a currency symbol
    pub fn format_with_symbol(&self, symbol: &str) -> String {
        if self.is_negative() {
            format!("-{}{}.{:02}", symbol, self.units().abs(), self.cents_part())
        } else {
            format!("{}{}.{:02}", symbol, self.units(), self.cents_part())
        }
    }
}

impl Default for Money {
    fn default() -> Self {
        Self::zero()
    }
}

impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.format_with_symbol("$"))
    }
}

impl Add for Money {
    type Output = Self;

    fn add(self, other: Self) -> Self {
        Self(self.0 + other.0)
    }
}

impl AddAssign for Money {
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    fn sub(self, other: Self) -> Self {
        Self(self.0 - other.0)
    }
}

/// Saturates at the `i64` bounds; use `Money::checked_sum` before persisting
impl std::iter::Sum for Money {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc.saturating_add(m))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let m = Money::from_cents(1050);
        assert_eq!(m.cents(), 1050);
        assert_eq!(m.units(), 10);
        assert_eq!(m.cents_part(), 50);
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", Money::from_cents(4000)), "$40.00");
        assert_eq!(format!("{}", Money::from_cents(0)), "$0.00");
        assert_eq!(format!("{}", Money::from_cents(5)), "$0.05");
        assert_eq!(format!("{:>8}", Money::from_cents(5)), "   $0.05");
    }

    #[test]
    fn test_symbol_and_decimal_formats() {
        let m = Money::from_units_cents(55, 0);
        assert_eq!(m.format_with_symbol("R$ "), "R$ 55.00");
        assert_eq!(m.to_decimal_string(), "55.00");
    }

    #[test]
    fn test_is_missing() {
        assert!(Money::is_missing(None));
        assert!(Money::is_missing(Some(Money::zero())));
        assert!(!Money::is_missing(Some(Money::from_cents(1))));
    }

    #[test]
    fn test_sum_is_exact() {
        // 0.10 added ten times must be exactly 1.00
        let total: Money = std::iter::repeat(Money::from_cents(10)).take(10).sum();
        assert_eq!(total, Money::from_units_cents(1, 0));
    }

    #[test]
    fn test_checked_sum_detects_overflow() {
        let near_max = Money::from_cents(i64::MAX - 100);
        assert_eq!(Money::checked_sum([near_max, Money::from_cents(101)]), None);
        assert_eq!(
            Money::checked_sum([Money::from_cents(4000), Money::from_cents(1500)]),
            Some(Money::from_cents(5500))
        );

        let total: Money = [near_max, Money::from_cents(101)].into_iter().sum();
        assert_eq!(total, Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_serialization() {
        let m = Money::from_cents(1050);
        let json = serde_json::to_string(&m).unwrap();
        assert_eq!(json, "1050");

        let deserialized: Money = serde_json::from_str(&json).unwrap();
        assert_eq!(m, deserialized);
    }
}
