//! # Pricing Commands
//!
//! Price list maintenance, single price quotes and line repricing.
//!
//! A price that degrades to zero because the model is not on the price list
//! is still returned, but logged at `warn` and flagged in the response.

use chrono::Utc;
use robodesk_core::types::{ContractType, Currency, LeasePricing, OfferLines, RobotPricing};
use robodesk_core::validation::{
    validate_lease_months, validate_price_non_negative, validate_robot_pricing,
};
use robodesk_core::{Money, PriceBook, PriceResolution, PriceSource};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::ApiError;
use crate::state::DbState;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuoteRequest {
    pub robot_model: String,
    pub contract_type: ContractType,
    pub currency: Currency,
    pub lease_months: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceQuote {
    /// Unit price, monthly for leases; rounded to cents.
    pub price: Money,
    pub source: PriceSource,
    /// Promo price for purchases, when one is set.
    pub promo_price: Option<Money>,
    /// True when the model is missing and the price fell back to zero.
    pub degraded: bool,
}

/// One price-list row with its lease terms.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceListEntry {
    pub robot: RobotPricing,
    pub lease: Vec<LeasePricing>,
    /// Sale minus evidence price in PLN, when the cost is known.
    pub margin_pln: Option<Money>,
}

fn log_degraded(robot_model: &str, currency: Currency, resolution: &PriceResolution) {
    if resolution.is_degraded() {
        warn!(
            robot_model = %robot_model,
            currency = %currency.code(),
            "Robot not on the price list, price falls back to zero"
        );
    }
}

/// Re-resolves every robot line of an offer against `book`.
///
/// Item lines keep the price entered by hand.
pub(crate) fn reprice_lines(
    book: &PriceBook,
    lines: &mut OfferLines,
    currency: Currency,
) -> Result<(), ApiError> {
    for line in &mut lines.robots {
        let resolution = book.reprice(line, currency)?;
        log_degraded(&line.robot_model, currency, &resolution);
    }
    Ok(())
}

/// Resolves one unit price; used while a line is being edited.
pub async fn quote_price(db: &DbState, request: QuoteRequest) -> Result<PriceQuote, ApiError> {
    debug!(
        robot_model = %request.robot_model,
        contract_type = ?request.contract_type,
        currency = %request.currency.code(),
        months = ?request.lease_months,
        "quote_price command"
    );

    if let Some(months) = request.lease_months {
        validate_lease_months(months)?;
    }

    let book = db.inner().pricing().load_price_book().await?;
    let resolution = book.resolve(
        &request.robot_model,
        request.contract_type,
        request.currency,
        request.lease_months,
    )?;
    log_degraded(&request.robot_model, request.currency, &resolution);

    let promo_price = match request.contract_type {
        ContractType::Purchase => book.promo_price(&request.robot_model, request.currency),
        ContractType::Lease => None,
    };

    Ok(PriceQuote {
        price: resolution.price.round_cents(),
        source: resolution.source,
        promo_price,
        degraded: resolution.is_degraded(),
    })
}

pub async fn list_price_list(db: &DbState) -> Result<Vec<PriceListEntry>, ApiError> {
    let robots = db.inner().pricing().list_robots().await?;
    let lease = db.inner().pricing().list_lease().await?;
    let book = PriceBook::new(robots.clone(), lease.clone());

    Ok(robots
        .into_iter()
        .map(|robot| {
            let terms = lease
                .iter()
                .filter(|l| l.robot_pricing_id == robot.id)
                .cloned()
                .collect();
            PriceListEntry {
                margin_pln: book.margin(&robot.robot_model, Currency::Pln),
                lease: terms,
                robot,
            }
        })
        .collect())
}

/// Creates a price-list entry, or updates it when `id` is already known.
///
/// ## Errors
/// A model name already on the list is `DUPLICATE_ROBOT_MODEL`.
pub async fn save_robot_pricing(
    db: &DbState,
    mut robot: RobotPricing,
) -> Result<RobotPricing, ApiError> {
    debug!(robot_model = %robot.robot_model, "save_robot_pricing command");

    robot.robot_model = robot.robot_model.trim().to_string();
    validate_robot_pricing(&robot)?;

    let repo = db.inner().pricing();
    let now = Utc::now();
    robot.updated_at = now;

    let existing = if robot.id.is_empty() {
        None
    } else {
        repo.list_robots()
            .await?
            .into_iter()
            .find(|r| r.id == robot.id)
    };

    match existing {
        Some(previous) => {
            robot.created_at = previous.created_at;
            repo.update_robot(&robot).await?;
            info!(id = %robot.id, robot_model = %robot.robot_model, "Robot pricing updated");
        }
        None => {
            if robot.id.is_empty() {
                robot.id = Uuid::new_v4().to_string();
            }
            robot.created_at = now;
            repo.insert_robot(&robot).await?;
            info!(id = %robot.id, robot_model = %robot.robot_model, "Robot pricing created");
        }
    }

    Ok(robot)
}

pub async fn delete_robot_pricing(db: &DbState, robot_pricing_id: &str) -> Result<(), ApiError> {
    db.inner().pricing().delete_robot(robot_pricing_id).await?;
    info!(id = %robot_pricing_id, "Robot pricing deleted");
    Ok(())
}

/// Sets the monthly price of one lease term; replaces an existing row for
/// the same robot and term.
pub async fn save_lease_pricing(
    db: &DbState,
    mut lease: LeasePricing,
) -> Result<LeasePricing, ApiError> {
    validate_lease_months(lease.months)?;
    for currency in Currency::ALL {
        validate_price_non_negative("monthly_price", lease.monthly.get(currency))?;
    }

    if lease.id.is_empty() {
        lease.id = Uuid::new_v4().to_string();
    }
    db.inner().pricing().upsert_lease(&lease).await?;

    debug!(robot_pricing_id = %lease.robot_pricing_id, months = lease.months, "Lease pricing saved");
    Ok(lease)
}

pub async fn delete_lease_pricing(db: &DbState, lease_id: &str) -> Result<(), ApiError> {
    Ok(db.inner().pricing().delete_lease(lease_id).await?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::{seed_price_list, test_state};
    use crate::error::ErrorCode;
    use robodesk_core::types::{CurrencyPrices, PriceOverrides, RobotLine};

    fn quote(model: &str, contract_type: ContractType, months: Option<u32>) -> QuoteRequest {
        QuoteRequest {
            robot_model: model.to_string(),
            contract_type,
            currency: Currency::Pln,
            lease_months: months,
        }
    }

    #[tokio::test]
    async fn test_quote_lease_table_and_fallback() {
        let db = test_state().await;
        seed_price_list(&db).await;

        let table = quote_price(&db, quote("KettyBot", ContractType::Lease, Some(12)))
            .await
            .unwrap();
        assert_eq!(table.price, Money::from_major(100));
        assert_eq!(table.source, PriceSource::LeaseTable);

        // no 24-month row: 2400 / 24
        let fallback = quote_price(&db, quote("KettyBot", ContractType::Lease, Some(24)))
            .await
            .unwrap();
        assert_eq!(fallback.price, Money::from_major(100));
        assert_eq!(fallback.source, PriceSource::LeaseFallback);
    }

    #[tokio::test]
    async fn test_quote_unknown_model_is_flagged() {
        let db = test_state().await;
        let quote = quote_price(&db, quote("Ghost", ContractType::Purchase, None))
            .await
            .unwrap();
        assert!(quote.degraded);
        assert!(quote.price.is_zero());
    }

    #[tokio::test]
    async fn test_quote_is_repeatable() {
        let db = test_state().await;
        seed_price_list(&db).await;

        let first = quote_price(&db, quote("KettyBot", ContractType::Purchase, None))
            .await
            .unwrap();
        let second = quote_price(&db, quote("KettyBot", ContractType::Purchase, None))
            .await
            .unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_duplicate_model_has_own_code() {
        let db = test_state().await;
        let existing = seed_price_list(&db).await;

        let now = Utc::now();
        let duplicate = RobotPricing {
            id: String::new(),
            robot_model: existing.robot_model.clone(),
            sale: CurrencyPrices::new(Money::from_major(1), Money::from_major(1), Money::from_major(1)),
            promo: PriceOverrides::default(),
            lowest: PriceOverrides::default(),
            evidence: PriceOverrides::default(),
            created_at: now,
            updated_at: now,
        };

        let err = save_robot_pricing(&db, duplicate).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::DuplicateRobotModel);
    }

    #[tokio::test]
    async fn test_update_existing_entry_and_margin() {
        let db = test_state().await;
        let mut robot = seed_price_list(&db).await;
        robot.sale.pln = Money::from_major(2600);

        save_robot_pricing(&db, robot.clone()).await.unwrap();

        let list = list_price_list(&db).await.unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].robot.sale.pln, Money::from_major(2600));
        assert_eq!(list[0].lease.len(), 1);
        assert_eq!(list[0].margin_pln, Some(Money::from_major(800)));
    }

    #[tokio::test]
    async fn test_reprice_lines_follows_currency() {
        let db = test_state().await;
        seed_price_list(&db).await;
        let book = db.inner().pricing().load_price_book().await.unwrap();

        let mut lines = OfferLines {
            robots: vec![RobotLine::purchase("KettyBot", 2)],
            items: Vec::new(),
        };
        reprice_lines(&book, &mut lines, Currency::Pln).unwrap();
        assert_eq!(lines.robots[0].unit_price, Money::from_major(2400));

        reprice_lines(&book, &mut lines, Currency::Usd).unwrap();
        assert_eq!(lines.robots[0].unit_price, Money::from_major(600));
    }
}
