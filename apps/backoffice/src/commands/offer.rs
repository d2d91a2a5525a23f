//! # Offer Commands
//!
//! ## Stage Change
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  change_offer_stage(offer, to)                                          │
//! │                                                                         │
//! │  1. UPDATE offers.stage            ── committed on its own              │
//! │  2. entering closed_won?  no ──────────────────────────► Updated        │
//! │                           yes                                           │
//! │  3. number from mask, derive, INSERT contract                           │
//! │        ok ─────────────────────────────────────────────► ContractCreated│
//! │        err ── stage stays changed, error logged ───────► ContractFailed │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! `ContractFailed` is a partial failure, not a rollback: the caller shows
//! "offer updated but contract creation failed" together with the code of
//! the underlying error (a duplicate number keeps its own code).

use chrono::Utc;
use robodesk_core::lifecycle::triggers_contract;
use robodesk_core::numbering::NumberingStrategy;
use robodesk_core::types::{Currency, EntryMode, Offer, OfferLines, OfferStage, Prepayment};
use robodesk_core::validation::{
    validate_offer_lines, validate_prepayment, validate_price_non_negative,
};
use robodesk_core::{Money, OfferTotals};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use super::contract::derive_and_insert;
use super::pricing::reprice_lines;
use crate::error::{ApiError, ErrorCode};
use crate::state::DbState;

/// Message shown when the stage change committed but the contract did not.
pub const CONTRACT_FAILED_MESSAGE: &str = "offer updated but contract creation failed";

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOfferRequest {
    pub client_id: String,
    pub entry_mode: EntryMode,
    /// Defaults to the company currency.
    pub currency: Option<Currency>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SaveOfferLinesRequest {
    pub offer_id: String,
    pub currency: Currency,
    pub prepayment: Prepayment,
    pub initial_payment: Money,
    pub lines: OfferLines,
}

/// Offer with its lines and totals, as the offer dialog shows it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OfferSummary {
    pub offer: Offer,
    pub lines: OfferLines,
    /// Rounded to cents.
    pub totals: OfferTotals,
}

/// Result of a stage change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StageChangeOutcome {
    /// Stage changed, no side effect.
    Updated,
    /// Offer won and its contract created.
    ContractCreated {
        contract_id: String,
        contract_number: String,
    },
    /// Offer won, stage committed, contract creation failed.
    ContractFailed { message: String, reason: ApiError },
}

impl StageChangeOutcome {
    fn contract_failed(reason: ApiError) -> Self {
        StageChangeOutcome::ContractFailed {
            message: CONTRACT_FAILED_MESSAGE.to_string(),
            reason,
        }
    }

    /// The partial failure as a single error, for callers that only toast.
    pub fn into_error(self) -> Option<ApiError> {
        match self {
            StageChangeOutcome::ContractFailed { message, reason } => Some(ApiError::new(
                ErrorCode::PartialFailure,
                format!("{}: {}", message, reason.message),
            )),
            _ => None,
        }
    }
}

pub async fn create_offer(
    db: &DbState,
    request: CreateOfferRequest,
    acting_user: &str,
) -> Result<Offer, ApiError> {
    debug!(client_id = %request.client_id, mode = ?request.entry_mode, "create_offer command");

    db.inner().clients().require(&request.client_id).await?;
    let currency = match request.currency {
        Some(currency) => currency,
        None => db.settings().await?.default_currency,
    };

    let now = Utc::now();
    let offer = Offer {
        id: Uuid::new_v4().to_string(),
        client_id: request.client_id,
        currency,
        stage: OfferStage::initial(request.entry_mode),
        prepayment: Prepayment::none(),
        initial_payment: Money::zero(),
        total_price: Money::zero(),
        notes: request.notes.filter(|n| !n.trim().is_empty()),
        created_by: acting_user.to_string(),
        created_at: now,
        updated_at: now,
    };
    db.inner().offers().insert(&offer).await?;

    info!(offer_id = %offer.id, stage = %offer.stage, "Offer created");
    Ok(offer)
}

/// Validates, reprices and stores all lines of an offer.
///
/// Robot prices are always re-resolved against the current price list in
/// the requested currency; prices sent by the dialog are ignored. Header
/// and lines are written in one transaction.
pub async fn save_offer_lines(
    db: &DbState,
    request: SaveOfferLinesRequest,
) -> Result<OfferSummary, ApiError> {
    debug!(
        offer_id = %request.offer_id,
        robots = request.lines.robots.len(),
        items = request.lines.items.len(),
        "save_offer_lines command"
    );

    let mut lines = request.lines;
    validate_offer_lines(&lines)?;
    validate_prepayment(&request.prepayment)?;
    validate_price_non_negative("initial_payment", request.initial_payment)?;

    let repo = db.inner().offers();
    let mut offer = repo.require(&request.offer_id).await?;

    let book = db.inner().pricing().load_price_book().await?;
    reprice_lines(&book, &mut lines, request.currency)?;

    let totals = OfferTotals::compute(&lines, &request.prepayment, request.initial_payment);
    let total_price = totals.gross_offer_value().round_cents();

    offer.currency = request.currency;
    offer.prepayment = request.prepayment;
    offer.initial_payment = request.initial_payment.round_cents();
    offer.total_price = total_price;

    repo.save_lines(&offer, &lines).await?;

    info!(offer_id = %offer.id, total_price = %total_price, "Offer lines saved");
    Ok(OfferSummary {
        offer,
        lines,
        totals: totals.rounded(),
    })
}

pub async fn get_offer_summary(db: &DbState, offer_id: &str) -> Result<OfferSummary, ApiError> {
    let offer = db.inner().offers().require(offer_id).await?;
    let lines = db.inner().offers().get_lines(offer_id).await?;
    let totals = OfferTotals::compute(&lines, &offer.prepayment, offer.initial_payment).rounded();
    Ok(OfferSummary {
        offer,
        lines,
        totals,
    })
}

pub async fn list_offers(
    db: &DbState,
    stage: Option<OfferStage>,
) -> Result<Vec<Offer>, ApiError> {
    Ok(db.inner().offers().list(stage).await?)
}

/// Moves an offer to `to`; entering `closed_won` derives a contract.
///
/// ## Errors
/// Only a failure of the stage update itself is an `Err`. A failed contract
/// derivation after a committed stage change is
/// [`StageChangeOutcome::ContractFailed`].
pub async fn change_offer_stage(
    db: &DbState,
    offer_id: &str,
    to: OfferStage,
    acting_user: &str,
) -> Result<StageChangeOutcome, ApiError> {
    debug!(offer_id = %offer_id, to = %to, "change_offer_stage command");

    let repo = db.inner().offers();
    let mut offer = repo.require(offer_id).await?;
    let from = offer.stage;

    repo.update_stage(offer_id, to).await?;
    offer.stage = to;
    info!(offer_id = %offer_id, from = %from, to = %to, "Offer stage changed");

    if !triggers_contract(from, to) {
        return Ok(StageChangeOutcome::Updated);
    }

    match derive_for_won_offer(db, &offer, acting_user).await {
        Ok((contract_id, contract_number)) => Ok(StageChangeOutcome::ContractCreated {
            contract_id,
            contract_number,
        }),
        Err(reason) => {
            error!(
                offer_id = %offer_id,
                code = ?reason.code,
                error = %reason.message,
                "Offer won but contract creation failed"
            );
            warn!(offer_id = %offer_id, "Offer stage left at closed_won");
            Ok(StageChangeOutcome::contract_failed(reason))
        }
    }
}

async fn derive_for_won_offer(
    db: &DbState,
    offer: &Offer,
    acting_user: &str,
) -> Result<(String, String), ApiError> {
    let settings = db.settings().await?;
    let strategy = NumberingStrategy::Mask(settings.number_mask()?);
    let contract = derive_and_insert(db, offer, &settings, &strategy, acting_user).await?;
    Ok((contract.id, contract.contract_number))
}

pub async fn delete_offer(db: &DbState, offer_id: &str) -> Result<(), ApiError> {
    db.inner().offers().delete(offer_id).await?;
    info!(offer_id = %offer_id, "Offer deleted");
    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{seed_client, seed_price_list, test_state};
    use chrono::{Datelike, Months};
    use robodesk_core::types::{ItemLine, PaymentModel, RobotLine};
    use rust_decimal::Decimal;

    async fn new_offer(db: &DbState, mode: EntryMode) -> Offer {
        let client = seed_client(db).await;
        create_offer(
            db,
            CreateOfferRequest {
                client_id: client.id,
                entry_mode: mode,
                currency: None,
                notes: Some("Lobby robots".to_string()),
            },
            "user-1",
        )
        .await
        .unwrap()
    }

    fn lines(robots: Vec<RobotLine>, items: Vec<ItemLine>) -> OfferLines {
        OfferLines { robots, items }
    }

    async fn save(
        db: &DbState,
        offer_id: &str,
        prepayment: Prepayment,
        lines: OfferLines,
    ) -> OfferSummary {
        save_offer_lines(
            db,
            SaveOfferLinesRequest {
                offer_id: offer_id.to_string(),
                currency: Currency::Pln,
                prepayment,
                initial_payment: Money::zero(),
                lines,
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_entry_mode_sets_initial_stage() {
        let db = test_state().await;
        assert_eq!(new_offer(&db, EntryMode::Lead).await.stage, OfferStage::Leads);
        let qualified = new_offer(&db, EntryMode::Qualified).await;
        assert_eq!(qualified.stage, OfferStage::Qualified);
        assert_eq!(qualified.currency, Currency::Pln);
    }

    #[tokio::test]
    async fn test_save_lines_reprices_and_totals() {
        let db = test_state().await;
        seed_price_list(&db).await;
        let offer = new_offer(&db, EntryMode::Qualified).await;

        let mut purchase = RobotLine::purchase("KettyBot", 2);
        purchase.unit_price = Money::from_major(1); // stale price from the dialog
        let summary = save(
            &db,
            &offer.id,
            Prepayment::percent(Decimal::from(10)),
            lines(
                vec![purchase, RobotLine::lease("KettyBot", 1, 12)],
                vec![ItemLine::new("Installation", 1, Money::from_major(300))],
            ),
        )
        .await;

        assert_eq!(summary.lines.robots[0].unit_price, Money::from_major(2400));
        assert_eq!(summary.lines.robots[1].monthly_price, Some(Money::from_major(100)));
        assert_eq!(summary.totals.total_purchase_value, Money::from_major(5100));
        assert_eq!(summary.totals.total_monthly, Money::from_major(100));
        assert_eq!(summary.totals.prepayment_amount, Money::from_major(520));
        assert_eq!(summary.offer.total_price, Money::from_major(5200));

        let reloaded = get_offer_summary(&db, &offer.id).await.unwrap();
        assert_eq!(reloaded.lines, summary.lines);
        assert_eq!(reloaded.totals, summary.totals);
        assert_eq!(reloaded.offer.total_price, Money::from_major(5200));
    }

    #[tokio::test]
    async fn test_uneven_lease_price_totals_survive_reload() {
        let db = test_state().await;
        seed_price_list(&db).await;
        let offer = new_offer(&db, EntryMode::Qualified).await;

        // no 7-month row: 2400 / 7 per robot, never rounded per line
        let saved = save(
            &db,
            &offer.id,
            Prepayment::none(),
            lines(vec![RobotLine::lease("KettyBot", 3, 7)], Vec::new()),
        )
        .await;
        assert_eq!(saved.totals.total_monthly, Money::from_cents(102_857));
        assert_eq!(saved.offer.total_price, Money::from_cents(102_857));

        let reloaded = get_offer_summary(&db, &offer.id).await.unwrap();
        assert_eq!(reloaded.lines, saved.lines);
        assert_eq!(reloaded.totals, saved.totals);
        assert_eq!(reloaded.offer.total_price, saved.offer.total_price);

        let outcome = change_offer_stage(&db, &offer.id, OfferStage::ClosedWon, "user-1")
            .await
            .unwrap();
        let StageChangeOutcome::ContractCreated { contract_id, .. } = outcome else {
            panic!("expected a contract, got {:?}", outcome);
        };
        let contract = db.inner().contracts().require(&contract_id).await.unwrap();
        assert_eq!(contract.total_monthly_contracted, saved.offer.total_price);
    }

    #[tokio::test]
    async fn test_full_prepayment_nets_to_zero() {
        let db = test_state().await;
        seed_price_list(&db).await;
        let offer = new_offer(&db, EntryMode::Qualified).await;

        let summary = save(
            &db,
            &offer.id,
            Prepayment::percent(Decimal::ONE_HUNDRED),
            lines(vec![RobotLine::purchase("KettyBot", 1)], Vec::new()),
        )
        .await;
        assert!(summary.totals.net_payable.is_zero());
        assert_eq!(summary.totals.total_purchase_value, Money::from_major(2400));
    }

    #[tokio::test]
    async fn test_currency_change_reprices() {
        let db = test_state().await;
        seed_price_list(&db).await;
        let offer = new_offer(&db, EntryMode::Qualified).await;
        save(
            &db,
            &offer.id,
            Prepayment::none(),
            lines(vec![RobotLine::purchase("KettyBot", 1)], Vec::new()),
        )
        .await;

        let stored = get_offer_summary(&db, &offer.id).await.unwrap();
        let summary = save_offer_lines(
            &db,
            SaveOfferLinesRequest {
                offer_id: offer.id.clone(),
                currency: Currency::Eur,
                prepayment: Prepayment::none(),
                initial_payment: Money::zero(),
                lines: stored.lines,
            },
        )
        .await
        .unwrap();
        assert_eq!(summary.offer.currency, Currency::Eur);
        assert_eq!(summary.lines.robots[0].unit_price, Money::from_major(560));
    }

    #[tokio::test]
    async fn test_invalid_lines_rejected_before_write() {
        let db = test_state().await;
        let offer = new_offer(&db, EntryMode::Lead).await;

        let err = save_offer_lines(
            &db,
            SaveOfferLinesRequest {
                offer_id: offer.id.clone(),
                currency: Currency::Pln,
                prepayment: Prepayment::none(),
                initial_payment: Money::zero(),
                lines: lines(vec![RobotLine::purchase("KettyBot", 0)], Vec::new()),
            },
        )
        .await
        .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
        assert!(get_offer_summary(&db, &offer.id).await.unwrap().lines.is_empty());
    }

    #[tokio::test]
    async fn test_won_lease_offer_derives_contract() {
        let db = test_state().await;
        seed_price_list(&db).await;
        let offer = new_offer(&db, EntryMode::Qualified).await;
        let summary = save(
            &db,
            &offer.id,
            Prepayment::none(),
            lines(vec![RobotLine::lease("KettyBot", 1, 12)], Vec::new()),
        )
        .await;
        // 12 × 100 over the term
        assert_eq!(summary.lines.robots[0].unit_price, Money::from_major(1200));

        change_offer_stage(&db, &offer.id, OfferStage::Negotiation, "user-1")
            .await
            .unwrap();
        let outcome = change_offer_stage(&db, &offer.id, OfferStage::ClosedWon, "user-1")
            .await
            .unwrap();

        let StageChangeOutcome::ContractCreated { contract_id, contract_number } = outcome else {
            panic!("expected a contract, got {:?}", outcome);
        };
        let today = Utc::now().date_naive();
        assert_eq!(contract_number, format!("CNT-{}-001", today.year()));

        let contract = db.inner().contracts().require(&contract_id).await.unwrap();
        assert_eq!(contract.payment_model, PaymentModel::Lease);
        assert_eq!(contract.monthly_payment, Money::from_major(100));
        assert_eq!(contract.start_date, today);
        assert_eq!(contract.end_date, today.checked_add_months(Months::new(12)));
        assert_eq!(contract.offer_id.as_deref(), Some(offer.id.as_str()));
        assert_eq!(contract.created_by, "user-1");
    }

    #[tokio::test]
    async fn test_other_transitions_create_no_contract() {
        let db = test_state().await;
        let offer = new_offer(&db, EntryMode::Lead).await;

        for stage in [
            OfferStage::Qualified,
            OfferStage::ProposalSent,
            OfferStage::Negotiation,
            OfferStage::ClosedLost,
        ] {
            let outcome = change_offer_stage(&db, &offer.id, stage, "user-1").await.unwrap();
            assert_eq!(outcome, StageChangeOutcome::Updated);
        }

        change_offer_stage(&db, &offer.id, OfferStage::ClosedWon, "user-1")
            .await
            .unwrap();
        // re-saving a won offer is not a transition into closed_won
        let outcome = change_offer_stage(&db, &offer.id, OfferStage::ClosedWon, "user-1")
            .await
            .unwrap();
        assert_eq!(outcome, StageChangeOutcome::Updated);
        assert_eq!(db.inner().contracts().list().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_contract_failure_keeps_stage() {
        let db = test_state().await;
        let offer = new_offer(&db, EntryMode::Qualified).await;
        // bypasses settings validation: a mask with no counter
        db.inner()
            .settings()
            .set("contract_number_mask", "CNT-{YYYY}")
            .await
            .unwrap();

        let outcome = change_offer_stage(&db, &offer.id, OfferStage::ClosedWon, "user-1")
            .await
            .unwrap();

        let StageChangeOutcome::ContractFailed { message, .. } = &outcome else {
            panic!("expected a partial failure, got {:?}", outcome);
        };
        assert_eq!(message, CONTRACT_FAILED_MESSAGE);
        assert_eq!(outcome.clone().into_error().unwrap().code, ErrorCode::PartialFailure);

        let stored = db.inner().offers().require(&offer.id).await.unwrap();
        assert_eq!(stored.stage, OfferStage::ClosedWon);
        assert!(db.inner().contracts().list().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_number_taken_before_insert_is_duplicate() {
        let db = test_state().await;
        let offer = new_offer(&db, EntryMode::Qualified).await;
        // another writer takes the generated number between lookup and insert
        sqlx::query(
            r#"
            CREATE TRIGGER take_number_first BEFORE INSERT ON contracts
            WHEN NEW.offer_id IS NOT NULL
            BEGIN
                INSERT INTO contracts (
                    id, client_id, contract_number, payment_model,
                    start_date, created_by, created_at
                ) VALUES (
                    'other-' || NEW.id, NEW.client_id, NEW.contract_number, 'purchase',
                    NEW.start_date, 'user-2', NEW.created_at
                );
            END
            "#,
        )
        .execute(db.inner().pool())
        .await
        .unwrap();

        let outcome = change_offer_stage(&db, &offer.id, OfferStage::ClosedWon, "user-1")
            .await
            .unwrap();

        let StageChangeOutcome::ContractFailed { message, reason } = &outcome else {
            panic!("expected a partial failure, got {:?}", outcome);
        };
        assert_eq!(message, CONTRACT_FAILED_MESSAGE);
        assert_eq!(reason.code, ErrorCode::DuplicateContractNumber);

        let stored = db.inner().offers().require(&offer.id).await.unwrap();
        assert_eq!(stored.stage, OfferStage::ClosedWon);
        let derived = db.inner().contracts().list().await.unwrap();
        assert!(derived.iter().all(|c| c.offer_id.is_none()));
    }
}
