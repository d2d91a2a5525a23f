//! # Core Errors
//!
//! ```text
//! ValidationError ──► CoreError ──► ApiError (backoffice)
//!   bad input           rule failure     code + message for the UI
//! ```
//!
//! Validation errors always name the offending field so the dialog can show
//! them next to it.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CoreError {
    /// A lease line or lease price request carried no term.
    #[error("Lease term is required for {robot_model}")]
    LeaseTermRequired { robot_model: String },

    /// Mask without exactly one `{NNN}`.
    #[error("Invalid contract number mask '{mask}': {reason}")]
    InvalidMask { mask: String, reason: String },

    /// A date computation left the supported calendar range.
    #[error("Date out of range: {0}")]
    DateOutOfRange(String),

    /// A month outside 1..=12 was addressed in a tracking table.
    #[error("Month {0} is out of range")]
    MonthOutOfRange(u32),

    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

/// Rejected input. Blocks the operation; nothing is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    #[error("{field} is required")]
    Required { field: String },

    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    #[error("{field} must be positive")]
    MustBePositive { field: String },

    #[error("{field} must not be negative")]
    Negative { field: String },

    /// Malformed e-mail, NIP, UUID, mask, ...
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    #[error("{field} must be one of: {allowed:?}")]
    NotAllowed { field: String, allowed: Vec<String> },
}

impl ValidationError {
    pub fn required(field: impl Into<String>) -> Self {
        ValidationError::Required {
            field: field.into(),
        }
    }

    pub fn invalid_format(field: impl Into<String>, reason: impl Into<String>) -> Self {
        ValidationError::InvalidFormat {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// The field the error belongs to.
    pub fn field(&self) -> &str {
        match self {
            ValidationError::Required { field }
            | ValidationError::TooLong { field, .. }
            | ValidationError::OutOfRange { field, .. }
            | ValidationError::MustBePositive { field }
            | ValidationError::Negative { field }
            | ValidationError::InvalidFormat { field, .. }
            | ValidationError::NotAllowed { field, .. } => field,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_messages() {
        let err = CoreError::LeaseTermRequired {
            robot_model: "BellaBot".to_string(),
        };
        assert_eq!(err.to_string(), "Lease term is required for BellaBot");

        let err = CoreError::InvalidMask {
            mask: "CNT-{YYYY}".to_string(),
            reason: "missing {NNN}".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Invalid contract number mask 'CNT-{YYYY}': missing {NNN}"
        );
    }

    #[test]
    fn test_validation_error_messages() {
        assert_eq!(
            ValidationError::required("company_name").to_string(),
            "company_name is required"
        );

        let err = ValidationError::OutOfRange {
            field: "lease_months".to_string(),
            min: 1,
            max: 120,
        };
        assert_eq!(err.to_string(), "lease_months must be between 1 and 120");
    }

    #[test]
    fn test_field_is_exposed() {
        let err = ValidationError::invalid_format("nip", "checksum mismatch");
        assert_eq!(err.field(), "nip");
        assert_eq!(ValidationError::required("email").field(), "email");
    }

    #[test]
    fn test_validation_converts_to_core_error() {
        let core_err: CoreError = ValidationError::required("email").into();
        assert!(matches!(core_err, CoreError::Validation(_)));
    }
}
