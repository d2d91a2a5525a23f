//! # API Error Type
//!
//! Unified error type for back-office commands.
//!
//! ## Error Handling Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Flow in Robodesk                               │
//! │                                                                         │
//! │  Command Function  Result<T, ApiError>                                  │
//! │         │                                                               │
//! │         ├── ValidationError ───────────────► VALIDATION_ERROR           │
//! │         ├── DbError::UniqueViolation                                    │
//! │         │     contracts.contract_number ───► DUPLICATE_CONTRACT_NUMBER  │
//! │         │     robot_pricing.robot_model ───► DUPLICATE_ROBOT_MODEL      │
//! │         ├── DbError::NotFound ─────────────► NOT_FOUND                  │
//! │         ├── StorageError ──────────────────► STORAGE_ERROR              │
//! │         ├── MailError ─────────────────────► NOTIFICATION_ERROR         │
//! │         └── anything else ─────────────────► DATABASE_ERROR / INTERNAL  │
//! │                                                                         │
//! │  Generic failures keep the backend's message text.                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! No error is retried; every failure ends the user action.

use robodesk_core::{CoreError, ValidationError};
use robodesk_db::DbError;
use serde::{Deserialize, Serialize};

use crate::mail::MailError;
use crate::storage::StorageError;

/// API error returned from commands.
///
/// ## Serialization
/// ```json
/// {
///   "code": "DUPLICATE_CONTRACT_NUMBER",
///   "message": "Contract number 'CNT-2024-013' already exists"
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    pub code: ErrorCode,
    /// Shown to the user as is.
    pub message: String,
}

/// What the dialog switches on: inline field error, specific toast or generic toast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Resource not found
    NotFound,

    /// Input validation failed; shown inline per field
    ValidationError,

    /// Generated contract number collided with an existing one
    DuplicateContractNumber,

    /// Robot model already on the price list
    DuplicateRobotModel,

    /// First step committed, a later step failed
    PartialFailure,

    /// Database operation failed
    DatabaseError,

    /// Document store failed
    StorageError,

    /// E-mail could not be sent
    NotificationError,

    /// Failure outside any known category
    Internal,
}

impl ApiError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        ApiError {
            code,
            message: message.into(),
        }
    }

    pub fn not_found(resource: &str, id: &str) -> Self {
        ApiError::new(ErrorCode::NotFound, format!("{} not found: {}", resource, id))
    }

    pub fn validation(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::ValidationError, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        ApiError::new(ErrorCode::Internal, message)
    }
}

impl From<DbError> for ApiError {
    fn from(err: DbError) -> Self {
        match err {
            DbError::NotFound { entity, id } => ApiError::not_found(&entity, &id),
            DbError::UniqueViolation { field, value } if field.contains("contract_number") => {
                ApiError::new(
                    ErrorCode::DuplicateContractNumber,
                    format!("Contract number '{}' already exists", value),
                )
            }
            DbError::UniqueViolation { field, value } if field.contains("robot_model") => {
                ApiError::new(
                    ErrorCode::DuplicateRobotModel,
                    format!("Robot model '{}' is already on the price list", value),
                )
            }
            err @ DbError::UniqueViolation { .. } => ApiError::validation(err.to_string()),
            DbError::ForeignKeyViolation { message } => {
                tracing::warn!(%message, "Rejected reference to a missing row");
                ApiError::validation("Referenced client, offer or robot does not exist")
            }
            DbError::ConstraintViolation(message) => ApiError::validation(message),
            DbError::Internal(message) => {
                tracing::error!(%message, "Unexpected database failure");
                ApiError::internal(message)
            }
            other => {
                tracing::error!("Database operation failed: {}", other);
                ApiError::new(ErrorCode::DatabaseError, other.to_string())
            }
        }
    }
}

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        match err {
            CoreError::Validation(e) => e.into(),
            other => ApiError::validation(other.to_string()),
        }
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        ApiError::validation(err.to_string())
    }
}

impl From<StorageError> for ApiError {
    fn from(err: StorageError) -> Self {
        tracing::error!("Document store failed: {}", err);
        ApiError::new(ErrorCode::StorageError, err.to_string())
    }
}

impl From<MailError> for ApiError {
    fn from(err: MailError) -> Self {
        tracing::error!("Mail delivery failed: {}", err);
        ApiError::new(ErrorCode::NotificationError, err.to_string())
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{:?}] {}", self.code, self.message)
    }
}

impl std::error::Error for ApiError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_numbers_get_distinct_codes() {
        let err: ApiError = DbError::duplicate("contracts.contract_number", "CNT-2024-001").into();
        assert_eq!(err.code, ErrorCode::DuplicateContractNumber);
        assert!(err.message.contains("CNT-2024-001"));

        let err: ApiError = DbError::duplicate("robot_pricing.robot_model", "BellaBot").into();
        assert_eq!(err.code, ErrorCode::DuplicateRobotModel);
    }

    #[test]
    fn test_generic_failure_keeps_backend_message() {
        let err: ApiError = DbError::QueryFailed("disk I/O error".to_string()).into();
        assert_eq!(err.code, ErrorCode::DatabaseError);
        assert!(err.message.contains("disk I/O error"));
    }

    #[test]
    fn test_serialized_shape() {
        let err = ApiError::validation("company_name is required");
        let json = serde_json::to_value(&err).unwrap();
        assert_eq!(json["code"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "company_name is required");
    }
}
