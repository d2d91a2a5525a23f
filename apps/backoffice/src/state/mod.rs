//! # State Module
//!
//! Separate state types; each command declares only the ones it needs.
//!
//! ```text
//! ┌──────────────┐  ┌──────────────┐  ┌────────────────┐  ┌──────────────┐
//! │   DbState    │  │  AppConfig   │  │ DocumentStore  │  │    Mailer    │
//! │  (SQLite     │  │  (env, read  │  │ (trait object) │  │   (trait     │
//! │   pool)      │  │   only)      │  │                │  │    object)   │
//! └──────────────┘  └──────────────┘  └────────────────┘  └──────────────┘
//! ```
//!
//! `DbState` is cheap to clone: the pool is reference counted.

mod config;
mod db;

pub use config::{AppConfig, ENV_DB_PATH, ENV_LOG, ENV_STORAGE_DIR};
pub use db::DbState;
