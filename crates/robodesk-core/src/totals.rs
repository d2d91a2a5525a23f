//! # Offer Totals
//!
//! Computes the summary shown under the offer and contract dialogs.
//!
//! ```text
//! robots_purchase_total      = Σ purchase robot lines  qty × unit_price
//! robots_lease_monthly_total = Σ lease robot lines     qty × monthly_price
//! items_total                = Σ ancillary items       qty × unit_price
//!
//! total_purchase_value = robots_purchase_total + items_total
//! total_monthly        = robots_lease_monthly_total
//!
//! prepayment_amount = percent → (total_purchase_value + total_monthly) × p / 100
//!                     amount  → value
//!                     none    → 0
//!
//! net_payable = total_purchase_value + total_monthly
//!             − prepayment_amount − initial_payment
//! ```
//!
//! `net_payable` is informational. The stored totals never include the
//! prepayment.

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::money::Money;
use crate::types::{OfferLines, Prepayment};

/// Totals of one offer at full precision; see [`OfferTotals::rounded`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OfferTotals {
    pub robots_purchase_total: Money,
    pub robots_lease_monthly_total: Money,
    pub items_total: Money,
    pub total_purchase_value: Money,
    pub total_monthly: Money,
    pub prepayment_amount: Money,
    pub initial_payment: Money,
    pub net_payable: Money,
    /// Any purchase robot line or any ancillary item.
    pub has_purchase: bool,
    /// Any lease robot line.
    pub has_lease: bool,
}

impl OfferTotals {
    /// Computes offer totals.
    ///
    /// ## Example
    /// ```rust
    /// use robodesk_core::money::Money;
    /// use robodesk_core::totals::OfferTotals;
    /// use robodesk_core::types::{ItemLine, OfferLines, Prepayment};
    ///
    /// let lines = OfferLines {
    ///     robots: vec![],
    ///     items: vec![ItemLine::new("Installation", 1, Money::from_major(800))],
    /// };
    /// let totals = OfferTotals::compute(&lines, &Prepayment::none(), Money::zero());
    /// assert_eq!(totals.total_purchase_value, Money::from_major(800));
    /// assert!(totals.has_purchase && !totals.has_lease);
    /// ```
    pub fn compute(lines: &OfferLines, prepayment: &Prepayment, initial_payment: Money) -> Self {
        let robots_purchase_total: Money = lines.purchase_lines().map(|l| l.line_total()).sum();
        let robots_lease_monthly_total: Money =
            lines.lease_lines().map(|l| l.monthly_total()).sum();
        let items_total: Money = lines.items.iter().map(|i| i.line_total()).sum();

        let total_purchase_value = robots_purchase_total + items_total;
        let total_monthly = robots_lease_monthly_total;
        let prepayment_amount = prepayment.amount_on(total_purchase_value + total_monthly);
        let net_payable =
            total_purchase_value + total_monthly - prepayment_amount - initial_payment;

        OfferTotals {
            robots_purchase_total,
            robots_lease_monthly_total,
            items_total,
            total_purchase_value,
            total_monthly,
            prepayment_amount,
            initial_payment,
            net_payable,
            has_purchase: lines.purchase_lines().next().is_some() || !lines.items.is_empty(),
            has_lease: lines.lease_lines().next().is_some(),
        }
    }

    /// Offer value the prepayment percentage applies to.
    pub fn gross_offer_value(&self) -> Money {
        self.total_purchase_value + self.total_monthly
    }

    /// Copy with every amount rounded to cents, for persistence and display.
    pub fn rounded(&self) -> Self {
        OfferTotals {
            robots_purchase_total: self.robots_purchase_total.round_cents(),
            robots_lease_monthly_total: self.robots_lease_monthly_total.round_cents(),
            items_total: self.items_total.round_cents(),
            total_purchase_value: self.total_purchase_value.round_cents(),
            total_monthly: self.total_monthly.round_cents(),
            prepayment_amount: self.prepayment_amount.round_cents(),
            initial_payment: self.initial_payment.round_cents(),
            net_payable: self.net_payable.round_cents(),
            ..*self
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
