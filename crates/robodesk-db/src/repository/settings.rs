//! # Settings Repository
//!
//! Key/value company settings, read as one typed [`CompanySettings`].
//!
//! ```text
//! settings table                         CompanySettings
//! ┌──────────────────────┬──────────┐    ┌───────────────────────────┐
//! │ contract_number_mask │ CNT-...  │───►│ contract_number_mask      │
//! │ billing_schedule     │ monthly  │    │ billing_schedule          │
//! │ km_rate              │ 1.15     │    │ km_rate, default_currency │
//! └──────────────────────┴──────────┘    └───────────────────────────┘
//! ```

use chrono::Utc;
use robodesk_core::CompanySettings;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

/// Repository for company settings.
#[derive(Debug, Clone)]
pub struct SettingsRepository {
    pool: SqlitePool,
}

impl SettingsRepository {
    /// Creates a new SettingsRepository.
    pub fn new(pool: SqlitePool) -> Self {
        SettingsRepository { pool }
    }

    /// Loads all settings, with defaults for missing keys.
    ///
    /// ## Errors
    /// A stored value that fails validation is a `Decode` error.
    pub async fn load(&self) -> DbResult<CompanySettings> {
        let pairs: Vec<(String, String)> = sqlx::query_as("SELECT key, value FROM settings")
            .fetch_all(&self.pool)
            .await?;

        debug!(keys = pairs.len(), "Settings loaded");

        CompanySettings::from_pairs(pairs).map_err(|e| DbError::decode("settings", e.to_string()))
    }

    /// Reads one raw value.
    pub async fn get(&self, key: &str) -> DbResult<Option<String>> {
        let value: Option<String> = sqlx::query_scalar("SELECT value FROM settings WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await?;

        Ok(value)
    }

    /// Writes one raw value.
    pub async fn set(&self, key: &str, value: &str) -> DbResult<()> {
        debug!(key = %key, "Writing setting");

        sqlx::query(
            r#"
            INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
            ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Writes every setting in one transaction.
    pub async fn save(&self, settings: &CompanySettings) -> DbResult<()> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        for (key, value) in settings.to_pairs() {
            sqlx::query(
                r#"
                INSERT INTO settings (key, value, updated_at) VALUES (?1, ?2, ?3)
                ON CONFLICT (key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at
                "#,
            )
            .bind(key)
            .bind(value)
            .bind(now)
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        debug!("Settings saved");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;
    use robodesk_core::types::{BillingSchedule, Currency};

    #[tokio::test]
    async fn test_defaults_on_empty_table() {
        let db = test_db().await;
        let settings = db.settings().load().await.unwrap();
        assert_eq!(settings, CompanySettings::default());
    }

    #[tokio::test]
    async fn test_save_and_load() {
        let db = test_db().await;
        let mut settings = CompanySettings::default();
        settings.billing_schedule = BillingSchedule::Yearly;
        settings.default_currency = Currency::Usd;
        settings.contract_number_mask = "RB-{YYYY}/{NNN}".to_string();

        db.settings().save(&settings).await.unwrap();
        assert_eq!(db.settings().load().await.unwrap(), settings);
        assert_eq!(
            db.settings().get("billing_schedule").await.unwrap().as_deref(),
            Some("yearly")
        );
    }

    #[tokio::test]
    async fn test_invalid_stored_value() {
        let db = test_db().await;
        db.settings().set("billing_schedule", "fortnightly").await.unwrap();
        assert!(matches!(
            db.settings().load().await,
            Err(DbError::Decode { .. })
        ));
    }
}
