//! # Database Errors
//!
//! ```text
//! sqlx::Error ──► DbError ──► ApiError (backoffice)
//!
//!   UNIQUE constraint failed: contracts.contract_number
//!       └─► UniqueViolation { field: "contracts.contract_number", .. }
//!             └─► DUPLICATE_CONTRACT_NUMBER
//! ```
//!
//! Constraint failures are classified through sqlx's `ErrorKind`; the
//! failing column is taken from SQLite's message so the command layer can
//! tell a duplicate contract number from a duplicate robot model.

use sqlx::error::ErrorKind;
use thiserror::Error;

const UNIQUE_PREFIX: &str = "UNIQUE constraint failed: ";

#[derive(Debug, Error)]
pub enum DbError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// `field` is `table.column`, e.g. `contracts.contract_number`.
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Offer for an unknown client, lease row for an unknown robot, ...
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// NOT NULL or CHECK constraint rejected a row.
    #[error("Constraint violation: {0}")]
    ConstraintViolation(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    /// A stored value that does not map back to a domain value: a decimal
    /// text column that does not parse, a setting rejected by validation.
    #[error("Invalid stored value for {field}: {reason}")]
    Decode { field: String, reason: String },

    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    pub fn duplicate(field: impl Into<String>, value: impl Into<String>) -> Self {
        DbError::UniqueViolation {
            field: field.into(),
            value: value.into(),
        }
    }

    pub fn decode(field: impl Into<String>, reason: impl Into<String>) -> Self {
        DbError::Decode {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// True for a unique violation on `column` (e.g. `contract_number`).
    pub fn is_unique_violation_on(&self, column: &str) -> bool {
        matches!(self, DbError::UniqueViolation { field, .. } if field.contains(column))
    }

    /// Fills in the offending value of a unique violation.
    ///
    /// SQLite reports only the column; the repository knows the value.
    pub fn with_value(self, value: impl Into<String>) -> Self {
        match self {
            DbError::UniqueViolation { field, .. } => DbError::UniqueViolation {
                field,
                value: value.into(),
            },
            other => other,
        }
    }
}

/// Column list of a SQLite unique-constraint message.
fn unique_field(message: &str) -> String {
    message
        .split_once(UNIQUE_PREFIX)
        .map(|(_, field)| field.trim().to_string())
        .unwrap_or_else(|| "unknown".to_string())
}

impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::not_found("Record", "unknown"),

            sqlx::Error::Database(db_err) => {
                let message = db_err.message().to_string();
                match db_err.kind() {
                    ErrorKind::UniqueViolation => {
                        DbError::duplicate(unique_field(&message), "unknown")
                    }
                    ErrorKind::ForeignKeyViolation => DbError::ForeignKeyViolation { message },
                    ErrorKind::NotNullViolation | ErrorKind::CheckViolation => {
                        DbError::ConstraintViolation(message)
                    }
                    _ => DbError::QueryFailed(message),
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,
            sqlx::Error::PoolClosed => DbError::ConnectionFailed("pool is closed".to_string()),
            other => DbError::Internal(other.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

pub type DbResult<T> = Result<T, DbError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unique_field_from_sqlite_message() {
        assert_eq!(
            unique_field("UNIQUE constraint failed: contracts.contract_number"),
            "contracts.contract_number"
        );
        assert_eq!(unique_field("something else"), "unknown");
    }

    #[test]
    fn test_unique_violation_helpers() {
        let err = DbError::duplicate("contracts.contract_number", "unknown")
            .with_value("CNT-2024-001");

        assert!(err.is_unique_violation_on("contract_number"));
        assert!(!err.is_unique_violation_on("robot_model"));
        assert_eq!(
            err.to_string(),
            "Duplicate contracts.contract_number: 'CNT-2024-001' already exists"
        );
    }

    #[test]
    fn test_with_value_keeps_other_errors() {
        let err = DbError::not_found("Offer", "o-1").with_value("x");
        assert!(matches!(err, DbError::NotFound { .. }));
    }

    #[tokio::test]
    async fn test_sqlite_constraints_are_classified() {
        let db = crate::Database::new(crate::DbConfig::in_memory()).await.unwrap();
        sqlx::query("INSERT INTO settings (key, value) VALUES ('km_rate', '1')")
            .execute(db.pool())
            .await
            .unwrap();

        let err: DbError = sqlx::query("INSERT INTO settings (key, value) VALUES ('km_rate', '2')")
            .execute(db.pool())
            .await
            .unwrap_err()
            .into();
        assert!(err.is_unique_violation_on("settings.key"));
    }
}
