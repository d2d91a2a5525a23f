//! # Mailer
//!
//! Outgoing e-mail as a single request/response call. Delivery itself lives
//! behind the [`Mailer`] trait; nothing here retries.

use async_trait::async_trait;
use robodesk_core::validation::validate_email;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::error::ApiError;

/// Mail delivery failures.
#[derive(Debug, Error)]
pub enum MailError {
    #[error("Mail rejected: {0}")]
    Rejected(String),

    #[error("Mail transport failed: {0}")]
    Transport(String),
}

/// One outgoing message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailRequest {
    pub recipient: String,
    pub subject: String,
    pub body: String,
    /// Document store path of an attachment.
    pub attachment_path: Option<String>,
}

impl EmailRequest {
    /// Checks the recipient address and the subject.
    pub fn validate(&self) -> Result<(), ApiError> {
        validate_email(&self.recipient)?;
        if self.subject.trim().is_empty() {
            return Err(ApiError::validation("subject is required"));
        }
        Ok(())
    }
}

#[async_trait]
pub trait Mailer: Send + Sync {
    async fn send(&self, request: EmailRequest) -> Result<(), MailError>;
}

/// Records messages instead of sending them.
#[cfg(test)]
#[derive(Debug, Default)]
pub struct RecordingMailer {
    pub sent: std::sync::Mutex<Vec<EmailRequest>>,
    pub fail: bool,
}

#[cfg(test)]
#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, request: EmailRequest) -> Result<(), MailError> {
        if self.fail {
            return Err(MailError::Transport("connection refused".to_string()));
        }
        self.sent.lock().unwrap().push(request);
        Ok(())
    }
}
