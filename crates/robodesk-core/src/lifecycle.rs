//! # Offer Lifecycle
//!
//! Funnel stages and the contract derived when an offer is won.
//!
//! ## Stage Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  leads → qualified → proposal_sent → negotiation ─┬─► closed_won  ★   │
//! │                                                    └─► closed_lost     │
//! │                                                                         │
//! │  Any jump is allowed. Only entering closed_won from another stage      │
//! │  (★) derives a draft contract; re-saving a won offer does not.         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Derived Contract
//! - any lease line → `lease`, monthly payment = Σ lease line price divided
//!   by the FIRST lease line's term, end date = start + that term
//! - otherwise → `purchase`, monthly payment 0, no end date
//!
//! The first-line divisor assumes every lease line shares one term. Mixed
//! terms are not generalised here; see DESIGN.md. The sum takes each line's
//! unit price once, whatever its quantity, while `total_monthly_contracted`
//! multiplies by quantity; the two differ for a line with quantity above 1.

use chrono::{Months, NaiveDate};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::totals::OfferTotals;
use crate::types::{
    BillingSchedule, ContractStatus, Currency, EntryMode, OfferLines, OfferStage, PaymentModel,
};

impl OfferStage {
    /// Initial stage for a new offer.
    pub const fn initial(mode: EntryMode) -> Self {
        match mode {
            EntryMode::Lead => OfferStage::Leads,
            EntryMode::Qualified => OfferStage::Qualified,
        }
    }

    /// Won or lost.
    pub const fn is_closed(&self) -> bool {
        matches!(self, OfferStage::ClosedWon | OfferStage::ClosedLost)
    }
}

/// True only for a transition into `ClosedWon` from any other stage.
pub fn triggers_contract(from: OfferStage, to: OfferStage) -> bool {
    to == OfferStage::ClosedWon && from != OfferStage::ClosedWon
}

/// Everything needed to derive a contract from a won offer.
#[derive(Debug, Clone)]
pub struct DerivationInput<'a> {
    pub offer_id: &'a str,
    pub client_id: &'a str,
    pub currency: Currency,
    pub lines: &'a OfferLines,
    pub totals: &'a OfferTotals,
    pub contract_number: String,
    pub billing_schedule: BillingSchedule,
    pub start_date: NaiveDate,
    pub created_by: &'a str,
}

/// A contract ready to insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContractDraft {
    pub client_id: String,
    pub offer_id: Option<String>,
    pub contract_number: String,
    pub status: ContractStatus,
    pub payment_model: PaymentModel,
    pub currency: Currency,
    pub monthly_payment: Money,
    #[ts(as = "String")]
    pub start_date: NaiveDate,
    #[ts(as = "Option<String>")]
    pub end_date: Option<NaiveDate>,
    pub billing_schedule: BillingSchedule,
    pub total_purchase_value: Money,
    pub total_monthly_contracted: Money,
    pub created_by: String,
}

/// Payment terms of a derived contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PaymentTerms {
    pub payment_model: PaymentModel,
    pub monthly_payment: Money,
    pub end_date: Option<NaiveDate>,
}

/// Computes payment model, monthly payment and end date from offer lines.
///
/// ## Errors
/// A first lease line with no term, or a zero term, is a validation error.
/// An end date beyond chrono's range is [`CoreError::DateOutOfRange`].
pub fn payment_terms(lines: &OfferLines, start_date: NaiveDate) -> CoreResult<PaymentTerms> {
    let mut lease_lines = lines.lease_lines().peekable();

    let Some(first) = lease_lines.peek() else {
        return Ok(PaymentTerms {
            payment_model: PaymentModel::Purchase,
            monthly_payment: Money::zero(),
            end_date: None,
        });
    };

    let months = first
        .lease_months
        .filter(|m| *m > 0)
        .ok_or_else(|| ValidationError::MustBePositive {
            field: "lease_months".to_string(),
        })?;

    let lease_sum: Money = lease_lines.map(|l| l.unit_price).sum();
    let monthly_payment = lease_sum.split_months(months).unwrap_or_default();

    let end_date = start_date
        .checked_add_months(Months::new(months))
        .ok_or_else(|| CoreError::DateOutOfRange(format!("{} + {} months", start_date, months)))?;

    Ok(PaymentTerms {
        payment_model: PaymentModel::Lease,
        monthly_payment,
        end_date: Some(end_date),
    })
}

/// Derives the draft contract for a won offer.
///
/// Amounts are rounded to cents; the draft goes straight to persistence.
pub fn derive_contract(input: DerivationInput<'_>) -> CoreResult<ContractDraft> {
    let terms = payment_terms(input.lines, input.start_date)?;

    Ok(ContractDraft {
        client_id: input.client_id.to_string(),
        offer_id: Some(input.offer_id.to_string()),
        contract_number: input.contract_number,
        status: ContractStatus::Draft,
        payment_model: terms.payment_model,
        currency: input.currency,
        monthly_payment: terms.monthly_payment.round_cents(),
        start_date: input.start_date,
        end_date: terms.end_date,
        billing_schedule: input.billing_schedule,
        total_purchase_value: input.totals.total_purchase_value.round_cents(),
        total_monthly_contracted: input.totals.total_monthly.round_cents(),
        created_by: input.created_by.to_string(),
    })
}

// =============================================================================
// Unit Tests
// =============================================================================
