//! # Repository Module
//!
//! Database repository implementations for Robodesk.
//!
//! ## Repository Pattern
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Backoffice command                                                     │
//! │       │                                                                 │
//! │       │  db.contracts().numbers_with_prefix("CNT-2024-")               │
//! │       ▼                                                                 │
//! │  ContractRepository                                                    │
//! │  ├── insert_draft(&self, draft)                                        │
//! │  ├── get_by_id(&self, id)                                              │
//! │  └── next_version(&self, contract_id)                                  │
//! │       │                                                                 │
//! │       │  SQL Query (row struct → domain type)                          │
//! │       ▼                                                                 │
//! │  SQLite Database                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rounded amounts (totals, price list, contract values) are stored as
//! integer cents. Amounts that still feed a sum are stored as decimal text:
//! offer line prices, the prepayment value and forecast figures. Text is
//! parsed on read; a value that does not parse is a [`DbError::Decode`].
//!
//! ## Available Repositories
//!
//! - [`ClientRepository`] - Client rows
//! - [`PricingRepository`] - Robot and lease price list, [`PriceBook`](robodesk_core::PriceBook) loading
//! - [`OfferRepository`] - Offers and their lines
//! - [`ContractRepository`] - Contracts, numbering lookups, versions
//! - [`SettingsRepository`] - Company settings
//! - [`ClassificationRepository`] - Client type / market / tag sets
//! - [`ForecastRepository`] - Revenue and delivery tracking

pub mod classification;
pub mod client;
pub mod contract;
pub mod forecast;
pub mod offer;
pub mod pricing;
pub mod settings;

pub use classification::ClassificationRepository;
pub use client::ClientRepository;
pub use contract::ContractRepository;
pub use forecast::ForecastRepository;
pub use offer::OfferRepository;
pub use pricing::PricingRepository;
pub use settings::SettingsRepository;

use std::str::FromStr;

use robodesk_core::Money;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::{DbError, DbResult};

/// Generates a new primary key.
pub fn new_id() -> String {
    Uuid::new_v4().to_string()
}

#[inline]
pub(crate) fn money(cents: i64) -> Money {
    Money::from_cents(cents)
}

#[inline]
pub(crate) fn opt_money(cents: Option<i64>) -> Option<Money> {
    cents.map(Money::from_cents)
}

/// Money → cents at the persistence boundary.
#[inline]
pub(crate) fn cents(amount: Money) -> i64 {
    amount.to_cents()
}

pub(crate) fn parse_decimal(field: &str, raw: &str) -> DbResult<Decimal> {
    Decimal::from_str(raw.trim()).map_err(|e| DbError::decode(field, e.to_string()))
}

/// Unrounded amount from a decimal text column.
pub(crate) fn parse_money(field: &str, raw: &str) -> DbResult<Money> {
    parse_decimal(field, raw).map(Money::from_decimal)
}

/// Money → decimal text, keeping every digit.
#[inline]
pub(crate) fn decimal_text(amount: Money) -> String {
    amount.amount().to_string()
}

// =============================================================================
// Test Support
// =============================================================================

#[cfg(test)]
pub(crate) mod test_support {
    use chrono::Utc;
    use robodesk_core::Client;

    use crate::{Database, DbConfig};

    pub async fn test_db() -> Database {
        Database::new(DbConfig::in_memory())
            .await
            .expect("in-memory database")
    }

    pub async fn seed_client(db: &Database) -> Client {
        let client = Client {
            id: super::new_id(),
            company_name: "Hotel Wawel".to_string(),
            email: Some("biuro@hotelwawel.pl".to_string()),
            nip: None,
            created_at: Utc::now(),
        };
        db.clients().insert(&client).await.expect("insert client");
        client
    }
}
