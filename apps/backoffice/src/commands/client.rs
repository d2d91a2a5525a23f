//! # Client Commands

use chrono::Utc;
use robodesk_core::validation::{validate_company_name, validate_email, validate_nip};
use robodesk_core::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewClientRequest {
    pub company_name: String,
    pub email: Option<String>,
    pub nip: Option<String>,
}

/// Blank optional fields are stored as absent.
fn optional(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

pub async fn create_client(db: &DbState, request: NewClientRequest) -> Result<Client, ApiError> {
    debug!(company = %request.company_name, "create_client command");

    validate_company_name(&request.company_name)?;
    let email = optional(request.email);
    if let Some(email) = &email {
        validate_email(email)?;
    }
    let nip = optional(request.nip);
    if let Some(nip) = &nip {
        validate_nip(nip)?;
    }

    let client = Client {
        id: Uuid::new_v4().to_string(),
        company_name: request.company_name.trim().to_string(),
        email,
        nip,
        created_at: Utc::now(),
    };
    db.inner().clients().insert(&client).await?;

    info!(client_id = %client.id, "Client created");
    Ok(client)
}

pub async fn get_client(db: &DbState, client_id: &str) -> Result<Client, ApiError> {
    Ok(db.inner().clients().require(client_id).await?)
}

pub async fn list_clients(db: &DbState) -> Result<Vec<Client>, ApiError> {
    Ok(db.inner().clients().list().await?)
}
