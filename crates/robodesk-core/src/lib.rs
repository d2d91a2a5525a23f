//! # robodesk-core: Pure Business Logic for Robodesk
//!
//! This crate holds the pricing and lifecycle rules of the robot sales and
//! leasing back-office as pure functions with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Robodesk Architecture                            │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                  Back-office UI (forms, dialogs)                │   │
//! │  │    Offer dialog ──► Contract dialog ──► Forecast tables        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 apps/backoffice (commands)                      │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ robodesk-core (THIS CRATE) ★                    │   │
//! │  │                                                                 │   │
//! │  │   pricing ── totals ── numbering ── lifecycle ── forecast      │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 robodesk-db (Database Layer)                    │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Domain types (RobotPricing, Offer, Contract, ...)
//! - [`money`] - Decimal money with cent rounding at the boundaries
//! - [`pricing`] - Purchase/lease unit price resolution
//! - [`totals`] - Offer totals, prepayment and net payable
//! - [`numbering`] - Contract number generation
//! - [`lifecycle`] - Offer stages and contract derivation on deal-won
//! - [`forecast`] - Monthly forecast/actual tracking
//! - [`classification`] - Client classification set diffs
//! - [`settings`] - Typed company settings
//! - [`validation`] - Business rule validation
//! - [`error`] - Domain error types
//!
//! ## Example Usage
//!
//! ```rust
//! use robodesk_core::money::Money;
//! use robodesk_core::types::{Prepayment, PrepaymentKind};
//!
//! let purchase = Money::from_cents(10_000_00);
//! let prepayment = Prepayment::percent(rust_decimal::Decimal::from(30));
//! assert_eq!(prepayment.amount_on(purchase).to_cents(), 3_000_00);
//! assert_eq!(prepayment.kind, PrepaymentKind::Percent);
//! ```

pub mod classification;
pub mod error;
pub mod forecast;
pub mod lifecycle;
pub mod money;
pub mod numbering;
pub mod pricing;
pub mod settings;
pub mod totals;
pub mod types;
pub mod validation;

// These allow users to do `use robodesk_core::Money` instead of
// `use robodesk_core::money::Money`
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use pricing::{PriceBook, PriceResolution, PriceSource};
pub use settings::CompanySettings;
pub use totals::OfferTotals;
pub use types::*;

// =============================================================================
// Crate-Level Constants
// =============================================================================

/// Maximum quantity on a single offer line.
///
/// Guards against typing 1000 instead of 10 in the offer dialog.
pub const MAX_LINE_QUANTITY: i64 = 999;

/// Longest lease term offered, in months.
pub const MAX_LEASE_MONTHS: u32 = 120;

/// Mask used when the settings table has no contract number mask.
pub const DEFAULT_CONTRACT_MASK: &str = "CNT-{YYYY}-{NNN}";

/// Literal prefix of sequential-suffix contract numbers.
pub const SEQUENTIAL_CONTRACT_PREFIX: &str = "CON-";
