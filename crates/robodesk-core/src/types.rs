//! # Domain Types
//!
//! Core domain types used throughout Robodesk.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐        ┌─────────────────┐                        │
//! │  │  RobotPricing   │ 1    * │  LeasePricing   │                        │
//! │  │  robot_model    │───────►│  months         │                        │
//! │  │  sale (PLN/USD/ │        │  monthly (PLN/  │                        │
//! │  │   EUR)          │        │   USD/EUR)      │                        │
//! │  └─────────────────┘        └─────────────────┘                        │
//! │                                                                         │
//! │  ┌─────────────────┐  won   ┌─────────────────┐ 1   * ┌──────────────┐ │
//! │  │     Offer       │───────►│    Contract     │──────►│ContractVersion│ │
//! │  │  stage          │        │  contract_number│       │  version     │ │
//! │  │  OfferLines     │        │  payment_model  │       └──────────────┘ │
//! │  └────────┬────────┘        └────────┬────────┘                        │
//! │           │ client_id                │ client_id                       │
//! │           └──────────► Client ◄──────┘                                 │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Ownership is by foreign key, never by pointer: offers and contracts name
//! their client by id, lines and versions name their parent by id.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// VAT Rate
// =============================================================================

/// VAT rate represented in basis points (2300 = 23%).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct VatRate(u32);

impl VatRate {
    /// Creates a VAT rate from basis points.
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        VatRate(bps)
    }

    /// Returns the rate in basis points.
    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }

    /// Returns the rate as a percentage (for display only).
    #[inline]
    pub fn percentage(&self) -> f64 {
        self.0 as f64 / 100.0
    }
}

impl Default for VatRate {
    fn default() -> Self {
        VatRate(2300)
    }
}

// =============================================================================
// Currency
// =============================================================================

/// Currencies the price list is maintained in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "UPPERCASE"))]
#[ts(export)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    #[default]
    Pln,
    Usd,
    Eur,
}

impl Currency {
    pub const ALL: [Currency; 3] = [Currency::Pln, Currency::Usd, Currency::Eur];

    /// ISO 4217 code.
    pub const fn code(&self) -> &'static str {
        match self {
            Currency::Pln => "PLN",
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
        }
    }

    /// Formats an amount with this currency's code, e.g. `1200.00 PLN`.
    pub fn format(&self, amount: Money) -> String {
        format!("{} {}", amount, self.code())
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "PLN" => Ok(Currency::Pln),
            "USD" => Ok(Currency::Usd),
            "EUR" => Ok(Currency::Eur),
            _ => Err(ValidationError::NotAllowed {
                field: "currency".to_string(),
                allowed: Currency::ALL.iter().map(|c| c.code().to_string()).collect(),
            }),
        }
    }
}

/// One amount per supported currency; all three are mandatory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct CurrencyPrices {
    pub pln: Money,
    pub usd: Money,
    pub eur: Money,
}

impl CurrencyPrices {
    pub fn new(pln: Money, usd: Money, eur: Money) -> Self {
        CurrencyPrices { pln, usd, eur }
    }

    /// Selects the amount for `currency`.
    #[inline]
    pub fn get(&self, currency: Currency) -> Money {
        match currency {
            Currency::Pln => self.pln,
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
        }
    }
}

/// Optional per-currency overrides (promo, lowest, evidence prices).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceOverrides {
    pub pln: Option<Money>,
    pub usd: Option<Money>,
    pub eur: Option<Money>,
}

impl PriceOverrides {
    #[inline]
    pub fn get(&self, currency: Currency) -> Option<Money> {
        match currency {
            Currency::Pln => self.pln,
            Currency::Usd => self.usd,
            Currency::Eur => self.eur,
        }
    }

    /// Iterates over the overrides that are set.
    pub fn present(&self) -> impl Iterator<Item = (Currency, Money)> + '_ {
        Currency::ALL
            .into_iter()
            .filter_map(move |c| self.get(c).map(|m| (c, m)))
    }
}

// =============================================================================
// Robot Pricing
// =============================================================================

/// Price-list entry for one robot model. All prices are net.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RobotPricing {
    pub id: String,
    /// Model name, unique across the price list.
    pub robot_model: String,
    /// Regular sale price.
    pub sale: CurrencyPrices,
    /// Promotional price.
    pub promo: PriceOverrides,
    /// Lowest price a salesperson may go to (admin-only).
    pub lowest: PriceOverrides,
    /// Evidence (cost) price used for margin reporting.
    pub evidence: PriceOverrides,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl RobotPricing {
    /// Sale price in `currency`.
    #[inline]
    pub fn sale_price(&self, currency: Currency) -> Money {
        self.sale.get(currency)
    }
}

/// Monthly lease price of a robot for one lease term.
///
/// At most one row exists per `(robot_pricing_id, months)`.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct LeasePricing {
    pub id: String,
    pub robot_pricing_id: String,
    pub months: u32,
    pub monthly: CurrencyPrices,
}

// =============================================================================
// Offer Lines
// =============================================================================

/// Whether a robot is sold outright or leased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ContractType {
    #[default]
    Purchase,
    Lease,
}

/// A robot on an offer.
///
/// For purchase lines `unit_price` is the net sale price. For lease lines
/// `monthly_price` is the resolved monthly rate and `unit_price` is the value
/// of one unit over the whole term (`monthly_price × lease_months`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct RobotLine {
    pub robot_model: String,
    pub quantity: i64,
    pub contract_type: ContractType,
    pub lease_months: Option<u32>,
    pub unit_price: Money,
    pub monthly_price: Option<Money>,
}

impl RobotLine {
    /// A purchase line with no price yet; run it through
    /// [`PriceBook::reprice`](crate::pricing::PriceBook::reprice).
    pub fn purchase(robot_model: impl Into<String>, quantity: i64) -> Self {
        RobotLine {
            robot_model: robot_model.into(),
            quantity,
            contract_type: ContractType::Purchase,
            lease_months: None,
            unit_price: Money::zero(),
            monthly_price: None,
        }
    }

    /// A lease line with no price yet.
    pub fn lease(robot_model: impl Into<String>, quantity: i64, months: u32) -> Self {
        RobotLine {
            robot_model: robot_model.into(),
            quantity,
            contract_type: ContractType::Lease,
            lease_months: Some(months),
            unit_price: Money::zero(),
            monthly_price: None,
        }
    }

    #[inline]
    pub fn is_lease(&self) -> bool {
        self.contract_type == ContractType::Lease
    }

    /// `quantity × unit_price`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }

    /// `quantity × monthly_price`; zero for purchase lines.
    pub fn monthly_total(&self) -> Money {
        self.monthly_price
            .unwrap_or_default()
            .multiply_quantity(self.quantity)
    }
}

/// An ancillary item (installation, training, accessories). Always purchase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ItemLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price: Money,
}

impl ItemLine {
    pub fn new(name: impl Into<String>, quantity: i64, unit_price: Money) -> Self {
        ItemLine {
            name: name.into(),
            quantity,
            unit_price,
        }
    }

    /// `quantity × unit_price`.
    pub fn line_total(&self) -> Money {
        self.unit_price.multiply_quantity(self.quantity)
    }
}

/// All lines of one offer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct OfferLines {
    pub robots: Vec<RobotLine>,
    pub items: Vec<ItemLine>,
}

impl OfferLines {
    pub fn lease_lines(&self) -> impl Iterator<Item = &RobotLine> {
        self.robots.iter().filter(|l| l.is_lease())
    }

    pub fn purchase_lines(&self) -> impl Iterator<Item = &RobotLine> {
        self.robots.iter().filter(|l| !l.is_lease())
    }

    pub fn is_empty(&self) -> bool {
        self.robots.is_empty() && self.items.is_empty()
    }
}

// =============================================================================
// Offer
// =============================================================================

/// Sales funnel stage of an offer.
///
/// Transitions are free-form; only entering `ClosedWon` has a side effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OfferStage {
    #[default]
    Leads,
    Qualified,
    ProposalSent,
    Negotiation,
    ClosedWon,
    ClosedLost,
}

impl OfferStage {
    pub const ALL: [OfferStage; 6] = [
        OfferStage::Leads,
        OfferStage::Qualified,
        OfferStage::ProposalSent,
        OfferStage::Negotiation,
        OfferStage::ClosedWon,
        OfferStage::ClosedLost,
    ];

    pub const fn as_str(&self) -> &'static str {
        match self {
            OfferStage::Leads => "leads",
            OfferStage::Qualified => "qualified",
            OfferStage::ProposalSent => "proposal_sent",
            OfferStage::Negotiation => "negotiation",
            OfferStage::ClosedWon => "closed_won",
            OfferStage::ClosedLost => "closed_lost",
        }
    }
}

impl fmt::Display for OfferStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OfferStage {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        OfferStage::ALL
            .into_iter()
            .find(|stage| stage.as_str() == s.trim())
            .ok_or_else(|| ValidationError::NotAllowed {
                field: "stage".to_string(),
                allowed: OfferStage::ALL.iter().map(|s| s.as_str().to_string()).collect(),
            })
    }
}

/// How an offer entered the funnel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum EntryMode {
    /// Raw lead, not yet contacted.
    Lead,
    /// Offer prepared for a known, qualified client.
    Qualified,
}

/// Kind of prepayment requested on an offer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PrepaymentKind {
    #[default]
    None,
    Percent,
    Amount,
}

/// Prepayment specification: a percentage of the offer value or a fixed amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Prepayment {
    pub kind: PrepaymentKind,
    /// Percent (0–100) for `Percent`, amount for `Amount`, ignored for `None`.
    #[ts(type = "string")]
    pub value: Decimal,
}

impl Prepayment {
    pub fn none() -> Self {
        Prepayment::default()
    }

    pub fn percent(pct: Decimal) -> Self {
        Prepayment {
            kind: PrepaymentKind::Percent,
            value: pct,
        }
    }

    pub fn amount(amount: Money) -> Self {
        Prepayment {
            kind: PrepaymentKind::Amount,
            value: amount.amount(),
        }
    }

    /// Prepayment due when the offer is worth `base`.
    pub fn amount_on(&self, base: Money) -> Money {
        match self.kind {
            PrepaymentKind::None => Money::zero(),
            PrepaymentKind::Percent => base.percent(self.value),
            PrepaymentKind::Amount => Money::from_decimal(self.value),
        }
    }
}

/// A sales offer for one client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Offer {
    pub id: String,
    pub client_id: String,
    pub currency: Currency,
    pub stage: OfferStage,
    pub prepayment: Prepayment,
    pub initial_payment: Money,
    /// Purchase value plus first-month lease value, rounded to cents.
    pub total_price: Money,
    pub notes: Option<String>,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

// =============================================================================
// Contract
// =============================================================================

/// Contract status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "snake_case"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ContractStatus {
    #[default]
    Draft,
    PendingSignature,
    Active,
    Expired,
    Cancelled,
}

/// How a contract is paid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentModel {
    #[default]
    Purchase,
    Lease,
    Mixed,
}

/// Invoicing cadence for a contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum BillingSchedule {
    #[default]
    Monthly,
    Quarterly,
    Yearly,
}

impl BillingSchedule {
    pub const fn as_str(&self) -> &'static str {
        match self {
            BillingSchedule::Monthly => "monthly",
            BillingSchedule::Quarterly => "quarterly",
            BillingSchedule::Yearly => "yearly",
        }
    }
}

impl FromStr for BillingSchedule {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "monthly" => Ok(BillingSchedule::Monthly),
            "quarterly" => Ok(BillingSchedule::Quarterly),
            "yearly" => Ok(BillingSchedule::Yearly),
            _ => Err(ValidationError::NotAllowed {
                field: "billing_schedule".to_string(),
                allowed: vec![
                    "monthly".to_string(),
                    "quarterly".to_string(),
                    "yearly".to_string(),
                ],
            }),
        }
    }
}

/// A signed (or to-be-signed) contract with a client.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Contract {
    pub id: String,
    pub client_id: String,
    /// Offer this contract was derived from, if any.
    pub offer_id: Option<String>,
    /// Unique, generated.
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
    pub warranty_cost: Money,
    pub implementation_cost: Money,
    pub other_services_cost: Money,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

/// Immutable PDF snapshot of a contract.
///
/// `version` strictly increases per contract and is never reused.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct ContractVersion {
    pub id: String,
    pub contract_id: String,
    pub version: i64,
    /// Path of the PDF in the document store.
    pub file_path: String,
    pub created_by: String,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Client
// =============================================================================

/// A customer company.
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Client {
    pub id: String,
    pub company_name: String,
    pub email: Option<String>,
    /// Polish tax identification number.
    pub nip: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_currency_parse_and_select() {
        assert_eq!("eur".parse::<Currency>().unwrap(), Currency::Eur);
        assert!("GBP".parse::<Currency>().is_err());

        let prices = CurrencyPrices::new(
            Money::from_major(400),
            Money::from_major(100),
            Money::from_major(90),
        );
        assert_eq!(prices.get(Currency::Usd), Money::from_major(100));
        assert_eq!(Currency::Pln.format(prices.pln), "400.00 PLN");
    }

    #[test]
    fn test_offer_stage_round_trip_names() {
        for stage in OfferStage::ALL {
            assert_eq!(stage.as_str().parse::<OfferStage>().unwrap(), stage);
        }
        assert!("won".parse::<OfferStage>().is_err());
    }

    #[test]
    fn test_line_totals() {
        let mut line = RobotLine::lease("KettyBot", 2, 24);
        line.monthly_price = Some(Money::from_major(500));
        line.unit_price = Money::from_major(12_000);

        assert_eq!(line.line_total(), Money::from_major(24_000));
        assert_eq!(line.monthly_total(), Money::from_major(1_000));
        assert_eq!(RobotLine::purchase("KettyBot", 1).monthly_total(), Money::zero());
    }

    #[test]
    fn test_prepayment_amount_on() {
        let base = Money::from_major(1000);
        assert_eq!(Prepayment::none().amount_on(base), Money::zero());
        assert_eq!(
            Prepayment::percent(Decimal::from(10)).amount_on(base),
            Money::from_major(100)
        );
        assert_eq!(
            Prepayment::amount(Money::from_major(250)).amount_on(base),
            Money::from_major(250)
        );
    }

    #[test]
    fn test_defaults() {
        assert_eq!(ContractStatus::default(), ContractStatus::Draft);
        assert_eq!(BillingSchedule::default(), BillingSchedule::Monthly);
        assert_eq!(VatRate::default().bps(), 2300);
    }
}
