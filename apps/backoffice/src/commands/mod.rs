//! # Commands Module
//!
//! Everything the back-office dialogs call.
//!
//! ## Command Organization
//! ```text
//! commands/
//! ├── mod.rs            ◄─── You are here (exports)
//! ├── client.rs         ◄─── Client create/lookup
//! ├── pricing.rs        ◄─── Price list, price quotes, line repricing
//! ├── offer.rs          ◄─── Offer create, line save, stage change
//! ├── contract.rs       ◄─── Numbering, create, versions, e-mail
//! ├── forecast.rs       ◄─── Revenue / delivery tracking
//! ├── classification.rs ◄─── Client type / market / tag sets
//! └── settings.rs       ◄─── Company settings
//! ```
//!
//! ## How Commands Work
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Dialog submit                                                          │
//! │         │                                                               │
//! │         ▼                                                               │
//! │  pub async fn save_offer_lines(                                         │
//! │      db: &DbState,              ◄── only the state it needs             │
//! │      request: SaveOfferLinesRequest,                                    │
//! │  ) -> Result<OfferSummary, ApiError>                                    │
//! │         │                                                               │
//! │         │ (serde, camelCase)                                            │
//! │         ▼                                                               │
//! │  Dialog receives OfferSummary or { code, message }                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod classification;
pub mod client;
pub mod contract;
pub mod forecast;
pub mod offer;
pub mod pricing;
pub mod settings;
