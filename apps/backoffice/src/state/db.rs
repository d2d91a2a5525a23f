//! # Database State
//!
//! Wraps the `Database` connection for use in commands.
//!
//! ## Usage in Commands
//! ```rust,ignore
//! pub async fn list_offers(db: &DbState) -> Result<Vec<Offer>, ApiError> {
//!     Ok(db.inner().offers().list(None).await?)
//! }
//! ```

use robodesk_core::CompanySettings;
use robodesk_db::Database;

use crate::error::ApiError;

/// Wrapper around `Database` shared by all commands.
#[derive(Debug, Clone)]
pub struct DbState {
    db: Database,
}

impl DbState {
    pub fn new(db: Database) -> Self {
        DbState { db }
    }

    /// Returns a reference to the inner Database.
    pub fn inner(&self) -> &Database {
        &self.db
    }

    /// Company settings, read once for the current request.
    pub async fn settings(&self) -> Result<CompanySettings, ApiError> {
        Ok(self.db.settings().load().await?)
    }
}
