//! # Client Classification Commands

use robodesk_core::classification::{ClassificationKind, SetDiff};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;

/// All three sets of one client, as the client form loads them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientClassifications {
    pub client_types: Vec<String>,
    pub markets: Vec<String>,
    pub tags: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateClassificationRequest {
    pub client_id: String,
    pub kind: ClassificationKind,
    /// The complete desired set.
    pub codes: Vec<String>,
}

pub async fn get_client_classifications(
    db: &DbState,
    client_id: &str,
) -> Result<ClientClassifications, ApiError> {
    db.inner().clients().require(client_id).await?;

    let repo = db.inner().classifications();
    let mut result = ClientClassifications::default();
    for kind in ClassificationKind::ALL {
        let codes = repo.get(client_id, kind).await?;
        match kind {
            ClassificationKind::ClientType => result.client_types = codes,
            ClassificationKind::Market => result.markets = codes,
            ClassificationKind::Tag => result.tags = codes,
        }
    }

    Ok(result)
}

/// Replaces one set; returns what was actually added and removed.
pub async fn update_client_classification(
    db: &DbState,
    request: UpdateClassificationRequest,
) -> Result<SetDiff, ApiError> {
    debug!(
        client_id = %request.client_id,
        kind = ?request.kind,
        codes = request.codes.len(),
        "update_client_classification command"
    );

    db.inner().clients().require(&request.client_id).await?;
    let diff = db
        .inner()
        .classifications()
        .apply(&request.client_id, request.kind, &request.codes)
        .await?;

    if !diff.is_empty() {
        info!(
            client_id = %request.client_id,
            kind = ?request.kind,
            added = diff.to_add.len(),
            removed = diff.to_remove.len(),
            "Client classification changed"
        );
    }
    Ok(diff)
}
