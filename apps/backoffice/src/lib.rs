//! # Robodesk Back-Office Library
//!
//! Command layer behind the sales back-office: offers, price list,
//! contracts, forecast tracking and company settings.
//!
//! ## Module Organization
//! ```text
//! robodesk_backoffice/
//! ├── lib.rs          ◄─── You are here (startup)
//! ├── state/
//! │   ├── mod.rs      ◄─── State type exports
//! │   ├── db.rs       ◄─── Database state wrapper
//! │   └── config.rs   ◄─── Environment configuration
//! ├── commands/       ◄─── One module per dialog family
//! ├── storage.rs      ◄─── Contract document store
//! ├── mail.rs         ◄─── Outgoing e-mail
//! └── error.rs        ◄─── API error type for commands
//! ```
//!
//! ## Startup Sequence
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  1. AppConfig::from_env()    ROBODESK_DB_PATH / _STORAGE_DIR / _LOG    │
//! │  2. init_tracing(filter)     RUST_LOG wins over ROBODESK_LOG           │
//! │  3. Database::new            SQLite, WAL, pending migrations           │
//! │  4. LocalDirStore            document root                             │
//! │  5. Backoffice { db, documents, config }                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod commands;
pub mod error;
pub mod mail;
pub mod state;
pub mod storage;

use std::sync::Arc;

use robodesk_db::{Database, DbConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

use crate::error::ApiError;
use crate::state::{AppConfig, DbState};
use crate::storage::{DocumentStore, LocalDirStore};

/// Everything a running back-office holds on to.
#[derive(Clone)]
pub struct Backoffice {
    pub db: DbState,
    pub documents: Arc<dyn DocumentStore>,
    pub config: AppConfig,
}

impl Backoffice {
    /// Opens the database and the document store described by `config`.
    pub async fn start(config: AppConfig) -> Result<Self, ApiError> {
        info!(db_path = ?config.db_path, "Opening database");
        let db = Database::new(DbConfig::new(&config.db_path)).await?;
        info!("Database connected and migrations applied");

        tokio::fs::create_dir_all(&config.storage_dir)
            .await
            .map_err(|source| storage::StorageError::Io {
                path: config.storage_dir.display().to_string(),
                source,
            })?;
        let documents: Arc<dyn DocumentStore> = Arc::new(LocalDirStore::new(&config.storage_dir));
        info!(storage_dir = ?config.storage_dir, "Document store ready");

        Ok(Backoffice {
            db: DbState::new(db),
            documents,
            config,
        })
    }

    /// True when the database answers.
    pub async fn health_check(&self) -> bool {
        self.db.inner().health_check().await
    }

    pub async fn shutdown(&self) {
        self.db.inner().close().await;
        info!("Back-office stopped");
    }
}

/// Installs the global tracing subscriber.
///
/// `RUST_LOG` overrides `default_filter`. Calling it twice is harmless.
pub fn init_tracing(default_filter: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("{},sqlx=warn", default_filter)));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_start_creates_database_and_store() {
        let dir = tempfile::tempdir().unwrap();
        let config = AppConfig {
            db_path: dir.path().join("robodesk.db"),
            storage_dir: dir.path().join("documents"),
            log_filter: "debug".to_string(),
        };

        let app = Backoffice::start(config).await.unwrap();
        assert!(app.health_check().await);
        assert!(dir.path().join("documents").is_dir());

        app.documents
            .upload("contracts/c1/v1.pdf", b"%PDF".to_vec())
            .await
            .unwrap();
        assert_eq!(
            app.documents.download("contracts/c1/v1.pdf").await.unwrap(),
            b"%PDF".to_vec()
        );
        app.shutdown().await;
    }
}
