//! # robodesk-db
//!
//! SQLite persistence for the Robodesk back-office, via sqlx.
//!
//! ```text
//!   backoffice command
//!          │
//!          ▼
//!   Database ──► one repository per aggregate ──► SQLite (WAL)
//!      │           clients · pricing · offers · contracts
//!      │           settings · classifications · forecasts
//!      └── migrations/sqlite (embedded, applied on open)
//! ```
//!
//! Money columns hold integer cents; decimal inputs that must keep their
//! scale (prepayment value, tracking figures) are stored as text.
//!
//! ```rust,ignore
//! use robodesk_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("robodesk.db")).await?;
//! let book = db.pricing().load_price_book().await?;
//! let settings = db.settings().load().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use pool::{Database, DbConfig};

pub use repository::classification::ClassificationRepository;
pub use repository::client::ClientRepository;
pub use repository::contract::ContractRepository;
pub use repository::forecast::ForecastRepository;
pub use repository::offer::OfferRepository;
pub use repository::pricing::PricingRepository;
pub use repository::settings::SettingsRepository;
