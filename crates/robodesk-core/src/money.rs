//! # Money Module
//!
//! Provides the `Money` type for handling monetary values safely.
//!
//! ## Precision Model
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  WHERE ROUNDING HAPPENS                                                 │
//! │                                                                         │
//! │  Lease fallback:  10 000.00 / 12  = 833.3333…  (kept exact)            │
//! │  Quantity × 3:                    = 2 499.9999…  (kept exact)          │
//! │  Persist / display:               → 2 500.00     (rounded ONCE)        │
//! │                                                                         │
//! │  Rounding each step instead would give 833.33 × 3 = 2 499.99,          │
//! │  and the error compounds with every extra offer line.                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `Money` wraps a [`Decimal`]. Arithmetic never rounds; [`Money::round_cents`]
//! and [`Money::to_cents`] are the only rounding points and are called at the
//! persistence and presentation boundaries.
//!
//! ## Usage
//! ```rust
//! use robodesk_core::money::Money;
//!
//! let purchase = Money::from_cents(10_000_00);
//! let monthly = purchase.split_months(12).unwrap();
//! let three_units = monthly * 3;
//!
//! assert_eq!(three_units.to_cents(), 2_500_00);
//! ```

use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::iter::Sum;
use std::ops::{Add, AddAssign, Mul, Neg, Sub, SubAssign};
use ts_rs::TS;

use crate::types::VatRate;

// =============================================================================
// Money Type
// =============================================================================

/// A net monetary amount in a currency's major unit (e.g. złoty, dollar).
///
/// The currency itself is carried by the owning offer or contract, not by
/// the amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Money(#[ts(type = "string")] Decimal);

impl Money {
    /// Creates a Money value from minor units (grosz, cents).
    ///
    /// ## Example
    /// ```rust
    /// use robodesk_core::money::Money;
    ///
    /// let price = Money::from_cents(1099);
    /// assert_eq!(price.to_string(), "10.99");
    /// ```
    #[inline]
    pub fn from_cents(cents: i64) -> Self {
        Money(Decimal::new(cents, 2))
    }

    /// Creates a Money value from whole major units.
    #[inline]
    pub fn from_major(units: i64) -> Self {
        Money(Decimal::from(units))
    }

    /// Wraps an arbitrary decimal amount.
    #[inline]
    pub const fn from_decimal(amount: Decimal) -> Self {
        Money(amount)
    }

    /// Returns the exact, unrounded amount.
    #[inline]
    pub const fn amount(&self) -> Decimal {
        self.0
    }

    /// Returns zero money value.
    #[inline]
    pub const fn zero() -> Self {
        Money(Decimal::ZERO)
    }

    /// Checks if the value is zero.
    #[inline]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }

    /// Checks if the value is strictly negative.
    #[inline]
    pub fn is_negative(&self) -> bool {
        self.0 < Decimal::ZERO
    }

    /// Checks if the value is strictly positive.
    #[inline]
    pub fn is_positive(&self) -> bool {
        self.0 > Decimal::ZERO
    }

    /// Rounds to two decimal places, midpoint away from zero.
    ///
    /// ## Example
    /// ```rust
    /// use robodesk_core::money::Money;
    /// use rust_decimal::Decimal;
    ///
    /// let third = Money::from_decimal(Decimal::from(100) / Decimal::from(3));
    /// assert_eq!(third.round_cents(), Money::from_cents(3333));
    /// ```
    pub fn round_cents(&self) -> Money {
        let mut rounded = self
            .0
            .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
        if rounded.is_zero() {
            rounded = Decimal::ZERO;
        }
        Money(rounded)
    }

    /// Rounds to two decimal places and returns the amount in minor units.
    ///
    /// Saturates at the `i64` bounds.
    pub fn to_cents(&self) -> i64 {
        let mut rounded = self.round_cents().0;
        rounded.rescale(2);
        let mantissa = rounded.mantissa();
        i64::try_from(mantissa).unwrap_or(if mantissa < 0 { i64::MIN } else { i64::MAX })
    }

    /// Multiplies money by a line quantity.
    #[inline]
    pub fn multiply_quantity(&self, qty: i64) -> Money {
        Money(self.0 * Decimal::from(qty))
    }

    /// Splits an amount evenly over `months`, without rounding.
    ///
    /// Returns `None` for a zero-month term.
    ///
    /// ## Example
    /// ```rust
    /// use robodesk_core::money::Money;
    ///
    /// let monthly = Money::from_major(1200).split_months(12).unwrap();
    /// assert_eq!(monthly, Money::from_major(100));
    /// assert!(Money::from_major(1200).split_months(0).is_none());
    /// ```
    pub fn split_months(&self, months: u32) -> Option<Money> {
        if months == 0 {
            return None;
        }
        self.0.checked_div(Decimal::from(months)).map(Money)
    }

    /// Returns `pct` percent of this amount (`pct = 30` → 30%).
    pub fn percent(&self, pct: Decimal) -> Money {
        Money(self.0 * pct / Decimal::ONE_HUNDRED)
    }

    /// VAT due on this net amount, unrounded.
    pub fn vat(&self, rate: VatRate) -> Money {
        Money(self.0 * Decimal::from(rate.bps()) / Decimal::from(10_000))
    }

    /// Gross amount (net + VAT), unrounded.
    pub fn with_vat(&self, rate: VatRate) -> Money {
        *self + self.vat(rate)
    }
}

// =============================================================================
// Trait Implementations
// =============================================================================

/// Shows the amount rounded to cents, without a currency code.
impl fmt::Display for Money {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rounded = self.round_cents().0;
        rounded.rescale(2);
        write!(f, "{}", rounded)
    }
}

impl Default for Money {
    fn default() -> Self {
        Money::zero()
    }
}

impl Add for Money {
    type Output = Self;

    #[inline]
    fn add(self, other: Self) -> Self {
        Money(self.0 + other.0)
    }
}

impl AddAssign for Money {
    #[inline]
    fn add_assign(&mut self, other: Self) {
        self.0 += other.0;
    }
}

impl Sub for Money {
    type Output = Self;

    #[inline]
    fn sub(self, other: Self) -> Self {
        Money(self.0 - other.0)
    }
}

impl SubAssign for Money {
    #[inline]
    fn sub_assign(&mut self, other: Self) {
        self.0 -= other.0;
    }
}

impl Neg for Money {
    type Output = Self;

    #[inline]
    fn neg(self) -> Self {
        Money(-self.0)
    }
}

/// Multiplication by a quantity.
impl Mul<i64> for Money {
    type Output = Self;

    #[inline]
    fn mul(self, qty: i64) -> Self {
        self.multiply_quantity(qty)
    }
}

impl Sum for Money {
    fn sum<I: Iterator<Item = Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), Add::add)
    }
}

impl<'a> Sum<&'a Money> for Money {
    fn sum<I: Iterator<Item = &'a Money>>(iter: I) -> Self {
        iter.fold(Money::zero(), |acc, m| acc + *m)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_cents() {
        let money = Money::from_cents(1099);
        assert_eq!(money.to_cents(), 1099);
        assert_eq!(money.amount(), Decimal::new(1099, 2));
    }

    #[test]
    fn test_display() {
        assert_eq!(Money::from_cents(1099).to_string(), "10.99");
        assert_eq!(Money::from_major(5).to_string(), "5.00");
        assert_eq!(Money::from_cents(-550).to_string(), "-5.50");
        assert_eq!(Money::zero().to_string(), "0.00");
    }

    #[test]
    fn test_arithmetic() {
        let a = Money::from_cents(1000);
        let b = Money::from_cents(500);

        assert_eq!((a + b).to_cents(), 1500);
        assert_eq!((a - b).to_cents(), 500);
        assert_eq!((a * 3).to_cents(), 3000);
        assert_eq!((-a).to_cents(), -1000);
    }

    #[test]
    fn test_full_precision_until_rounded() {
        let monthly = Money::from_major(10_000).split_months(12).unwrap();
        // 833.333… is not rounded on its own
        assert_ne!(monthly, Money::from_cents(83_333));

        let total: Money = std::iter::repeat(monthly).take(12).sum();
        assert_eq!(total.to_cents(), 1_000_000);
    }

    #[test]
    fn test_round_midpoint_away_from_zero() {
        assert_eq!(Money::from_decimal(Decimal::new(1005, 3)).to_cents(), 101);
        assert_eq!(Money::from_decimal(Decimal::new(-1005, 3)).to_cents(), -101);
    }

    #[test]
    fn test_percent() {
        let base = Money::from_major(2000);
        assert_eq!(base.percent(Decimal::from(25)), Money::from_major(500));
        assert_eq!(base.percent(Decimal::ZERO), Money::zero());
    }

    #[test]
    fn test_vat() {
        let net = Money::from_major(1000);
        let rate = VatRate::from_bps(2300);
        assert_eq!(net.vat(rate), Money::from_major(230));
        assert_eq!(net.with_vat(rate), Money::from_major(1230));
    }

    #[test]
    fn test_zero_and_checks() {
        assert!(Money::zero().is_zero());
        assert!(Money::from_cents(100).is_positive());
        assert!(Money::from_cents(-100).is_negative());
    }
}
