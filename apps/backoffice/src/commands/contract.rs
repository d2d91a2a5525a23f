//! # Contract Commands
//!
//! ## Numbering per call site
//! ```text
//! ┌──────────────────────────────┬──────────────────────────────────────────┐
//! │ Call site                    │ Strategy                                 │
//! ├──────────────────────────────┼──────────────────────────────────────────┤
//! │ offer won (stage change)     │ Mask from settings, CNT-{YYYY}-{NNN}     │
//! │ new-contract dialog          │ Mask from settings                       │
//! │ create-from-offer dialog     │ Sequential, CON-00001                    │
//! └──────────────────────────────┴──────────────────────────────────────────┘
//! ```
//!
//! Generation and insert are separate round trips. A number taken in
//! between is rejected by the unique index and reported as
//! `DUPLICATE_CONTRACT_NUMBER`.
//!
//! ## Versions
//! ```text
//! next_version ──► upload contracts/{id}/v{n}.pdf ──► insert_version
//!                        │ fails: abort                 │ fails: reported,
//!                        ▼                              ▼ file stays
//! ```

use chrono::{Datelike, NaiveDate, Utc};
use robodesk_core::lifecycle::{derive_contract, DerivationInput};
use robodesk_core::numbering::{NumberingStrategy, SequentialSuffix};
use robodesk_core::types::{
    BillingSchedule, Contract, ContractStatus, ContractVersion, Currency, Offer, PaymentModel,
};
use robodesk_core::validation::validate_price_non_negative;
use robodesk_core::{CompanySettings, Money, OfferTotals};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::ApiError;
use crate::mail::{EmailRequest, Mailer};
use crate::state::DbState;
use crate::storage::{contract_version_path, DocumentStore};

// =============================================================================
// Numbering
// =============================================================================

/// Generates the next contract number for `strategy`.
pub async fn next_contract_number(
    db: &DbState,
    strategy: &NumberingStrategy,
    year: i32,
) -> Result<String, ApiError> {
    let repo = db.inner().contracts();
    let number = match strategy {
        NumberingStrategy::Mask(mask) => {
            let existing = repo.numbers_with_prefix(&mask.prefix(year)).await?;
            mask.next(year, &existing)
        }
        NumberingStrategy::Sequential(sequence) => {
            let latest = repo.latest_number().await?;
            sequence.next(latest.as_deref())
        }
    };

    debug!(number = %number, "Contract number generated");
    Ok(number)
}

// =============================================================================
// Derivation from an offer
// =============================================================================

/// Derives a draft contract from `offer` and inserts it.
///
/// Start date is today; billing schedule comes from `settings`.
pub(crate) async fn derive_and_insert(
    db: &DbState,
    offer: &Offer,
    settings: &CompanySettings,
    strategy: &NumberingStrategy,
    acting_user: &str,
) -> Result<Contract, ApiError> {
    let lines = db.inner().offers().get_lines(&offer.id).await?;
    let totals = OfferTotals::compute(&lines, &offer.prepayment, offer.initial_payment);

    let today = Utc::now().date_naive();
    let contract_number = next_contract_number(db, strategy, today.year()).await?;

    let draft = derive_contract(DerivationInput {
        offer_id: &offer.id,
        client_id: &offer.client_id,
        currency: offer.currency,
        lines: &lines,
        totals: &totals,
        contract_number,
        billing_schedule: settings.billing_schedule,
        start_date: today,
        created_by: acting_user,
    })?;

    let contract = db.inner().contracts().insert_draft(draft).await?;
    info!(
        contract_id = %contract.id,
        contract_number = %contract.contract_number,
        offer_id = %offer.id,
        payment_model = ?contract.payment_model,
        "Contract derived from offer"
    );
    Ok(contract)
}

/// Create-from-offer dialog: derives a contract with sequential numbering.
pub async fn create_contract_from_offer(
    db: &DbState,
    offer_id: &str,
    acting_user: &str,
) -> Result<Contract, ApiError> {
    debug!(offer_id = %offer_id, "create_contract_from_offer command");

    let offer = db.inner().offers().require(offer_id).await?;
    let settings = db.settings().await?;
    let strategy = NumberingStrategy::Sequential(SequentialSuffix::default());

    derive_and_insert(db, &offer, &settings, &strategy, acting_user).await
}

// =============================================================================
// New-contract dialog
// =============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCosts {
    pub warranty: Money,
    pub implementation: Money,
    pub other: Money,
}

impl ServiceCosts {
    fn validate(&self) -> Result<(), ApiError> {
        validate_price_non_negative("warranty_cost", self.warranty)?;
        validate_price_non_negative("implementation_cost", self.implementation)?;
        validate_price_non_negative("other_services_cost", self.other)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewContractRequest {
    pub client_id: String,
    pub payment_model: PaymentModel,
    /// Defaults to the company currency.
    pub currency: Option<Currency>,
    pub monthly_payment: Money,
    /// Defaults to today.
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    /// Defaults to the company billing schedule.
    pub billing_schedule: Option<BillingSchedule>,
    pub total_purchase_value: Money,
    pub total_monthly_contracted: Money,
    #[serde(default)]
    pub services: ServiceCosts,
}

/// New-contract dialog: a contract not tied to an offer, mask numbering.
pub async fn create_contract(
    db: &DbState,
    request: NewContractRequest,
    acting_user: &str,
) -> Result<Contract, ApiError> {
    debug!(client_id = %request.client_id, "create_contract command");

    validate_price_non_negative("monthly_payment", request.monthly_payment)?;
    validate_price_non_negative("total_purchase_value", request.total_purchase_value)?;
    validate_price_non_negative("total_monthly_contracted", request.total_monthly_contracted)?;
    request.services.validate()?;

    let start_date = request.start_date.unwrap_or_else(|| Utc::now().date_naive());
    if matches!(request.end_date, Some(end) if end < start_date) {
        return Err(ApiError::validation("end_date must not be before start_date"));
    }

    db.inner().clients().require(&request.client_id).await?;
    let settings = db.settings().await?;
    let strategy = NumberingStrategy::Mask(settings.number_mask()?);
    let contract_number = next_contract_number(db, &strategy, start_date.year()).await?;

    let contract = Contract {
        id: Uuid::new_v4().to_string(),
        client_id: request.client_id,
        offer_id: None,
        contract_number,
        status: ContractStatus::Draft,
        payment_model: request.payment_model,
        currency: request.currency.unwrap_or(settings.default_currency),
        monthly_payment: request.monthly_payment.round_cents(),
        start_date,
        end_date: request.end_date,
        billing_schedule: request.billing_schedule.unwrap_or(settings.billing_schedule),
        total_purchase_value: request.total_purchase_value.round_cents(),
        total_monthly_contracted: request.total_monthly_contracted.round_cents(),
        warranty_cost: request.services.warranty.round_cents(),
        implementation_cost: request.services.implementation.round_cents(),
        other_services_cost: request.services.other.round_cents(),
        created_by: acting_user.to_string(),
        created_at: Utc::now(),
    };
    db.inner().contracts().insert(&contract).await?;

    info!(contract_id = %contract.id, contract_number = %contract.contract_number, "Contract created");
    Ok(contract)
}

pub async fn get_contract(db: &DbState, contract_id: &str) -> Result<Contract, ApiError> {
    Ok(db.inner().contracts().require(contract_id).await?)
}

pub async fn list_contracts(db: &DbState) -> Result<Vec<Contract>, ApiError> {
    Ok(db.inner().contracts().list().await?)
}

pub async fn update_contract_status(
    db: &DbState,
    contract_id: &str,
    status: ContractStatus,
) -> Result<(), ApiError> {
    db.inner().contracts().update_status(contract_id, status).await?;
    info!(contract_id = %contract_id, status = ?status, "Contract status updated");
    Ok(())
}

pub async fn update_service_costs(
    db: &DbState,
    contract_id: &str,
    costs: ServiceCosts,
) -> Result<(), ApiError> {
    costs.validate()?;
    db.inner()
        .contracts()
        .update_service_costs(
            contract_id,
            costs.warranty.round_cents(),
            costs.implementation.round_cents(),
            costs.other.round_cents(),
        )
        .await?;
    Ok(())
}

// =============================================================================
// Versions & e-mail
// =============================================================================

/// Stores a new PDF snapshot of a contract.
///
/// ## Errors
/// An upload failure aborts before anything is recorded. If recording the
/// version fails after the upload, the error is returned and the uploaded
/// file is left in place.
pub async fn upload_contract_version(
    db: &DbState,
    store: &dyn DocumentStore,
    contract_id: &str,
    pdf: Vec<u8>,
    acting_user: &str,
) -> Result<ContractVersion, ApiError> {
    if pdf.is_empty() {
        return Err(ApiError::validation("document is empty"));
    }

    let repo = db.inner().contracts();
    repo.require(contract_id).await?;

    let version = repo.next_version(contract_id).await?;
    let file_path = contract_version_path(contract_id, version);
    store.upload(&file_path, pdf).await?;

    let record = ContractVersion {
        id: Uuid::new_v4().to_string(),
        contract_id: contract_id.to_string(),
        version,
        file_path,
        created_by: acting_user.to_string(),
        created_at: Utc::now(),
    };
    repo.insert_version(&record).await?;

    info!(contract_id = %contract_id, version = version, "Contract version stored");
    Ok(record)
}

pub async fn list_contract_versions(
    db: &DbState,
    contract_id: &str,
) -> Result<Vec<ContractVersion>, ApiError> {
    Ok(db.inner().contracts().list_versions(contract_id).await?)
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EmailContractRequest {
    pub contract_id: String,
    /// Defaults to the client's e-mail.
    pub recipient: Option<String>,
    pub subject: String,
    pub body: String,
}

/// Sends the newest PDF version of a contract. One attempt, no retry.
pub async fn email_contract(
    db: &DbState,
    mailer: &dyn Mailer,
    request: EmailContractRequest,
) -> Result<EmailRequest, ApiError> {
    let contract = db.inner().contracts().require(&request.contract_id).await?;

    let recipient = match request.recipient.filter(|r| !r.trim().is_empty()) {
        Some(recipient) => recipient,
        None => db
            .inner()
            .clients()
            .require(&contract.client_id)
            .await?
            .email
            .ok_or_else(|| ApiError::validation("recipient is required"))?,
    };

    let latest = db
        .inner()
        .contracts()
        .list_versions(&contract.id)
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| ApiError::validation("contract has no document version to send"))?;

    let email = EmailRequest {
        recipient,
        subject: request.subject,
        body: request.body,
        attachment_path: Some(latest.file_path),
    };
    email.validate()?;

    mailer.send(email.clone()).await?;
    info!(contract_id = %contract.id, version = latest.version, "Contract e-mailed");
    Ok(email)
}

// =============================================================================
// Unit Tests
// =============================================================================
