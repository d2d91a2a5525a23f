//! # Offer Repository
//!
//! Offers and their robot / item lines.
//!
//! ## Saving Lines
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_lines(offer, lines)                      ONE TRANSACTION          │
//! │                                                                         │
//! │  1. UPDATE offers SET currency, prepayment, initial payment,           │
//! │                       total_price, notes, updated_at                   │
//! │  2. DELETE offer_robot_lines, offer_items WHERE offer_id               │
//! │  3. INSERT every robot line, every item (position = list index)        │
//! │                                                                         │
//! │  A failure at any step leaves the previous header and lines in place.  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Line prices are stored unrounded as decimal text, so totals rebuilt from
//! stored lines equal the totals computed when the lines were saved.

use chrono::{DateTime, Utc};
use robodesk_core::types::{
    ContractType, Currency, ItemLine, Offer, OfferLines, OfferStage, Prepayment, PrepaymentKind,
    RobotLine,
};
use sqlx::SqlitePool;
use tracing::debug;

use super::{cents, decimal_text, money, new_id, parse_decimal, parse_money};
use crate::error::{DbError, DbResult};

const OFFER_COLUMNS: &str = r#"
    id, client_id, currency, stage,
    prepayment_kind, prepayment_value,
    initial_payment_cents, total_price_cents,
    notes, created_by, created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct OfferRow {
    id: String,
    client_id: String,
    currency: Currency,
    stage: OfferStage,
    prepayment_kind: PrepaymentKind,
    prepayment_value: String,
    initial_payment_cents: i64,
    total_price_cents: i64,
    notes: Option<String>,
    created_by: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TryFrom<OfferRow> for Offer {
    type Error = DbError;

    fn try_from(row: OfferRow) -> Result<Self, Self::Error> {
        Ok(Offer {
            prepayment: Prepayment {
                kind: row.prepayment_kind,
                value: parse_decimal("offers.prepayment_value", &row.prepayment_value)?,
            },
            id: row.id,
            client_id: row.client_id,
            currency: row.currency,
            stage: row.stage,
            initial_payment: money(row.initial_payment_cents),
            total_price: money(row.total_price_cents),
            notes: row.notes,
            created_by: row.created_by,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct RobotLineRow {
    robot_model: String,
    quantity: i64,
    contract_type: ContractType,
    lease_months: Option<i64>,
    unit_price: String,
    monthly_price: Option<String>,
}

impl TryFrom<RobotLineRow> for RobotLine {
    type Error = DbError;

    fn try_from(row: RobotLineRow) -> Result<Self, Self::Error> {
        let lease_months = row
            .lease_months
            .map(|m| {
                u32::try_from(m)
                    .map_err(|_| DbError::decode("offer_robot_lines.lease_months", m.to_string()))
            })
            .transpose()?;

        Ok(RobotLine {
            robot_model: row.robot_model,
            quantity: row.quantity,
            contract_type: row.contract_type,
            lease_months,
            unit_price: parse_money("offer_robot_lines.unit_price", &row.unit_price)?,
            monthly_price: row
                .monthly_price
                .as_deref()
                .map(|raw| parse_money("offer_robot_lines.monthly_price", raw))
                .transpose()?,
        })
    }
}

#[derive(sqlx::FromRow)]
struct ItemLineRow {
    name: String,
    quantity: i64,
    unit_price: String,
}

impl TryFrom<ItemLineRow> for ItemLine {
    type Error = DbError;

    fn try_from(row: ItemLineRow) -> Result<Self, Self::Error> {
        let unit_price = parse_money("offer_items.unit_price", &row.unit_price)?;
        Ok(ItemLine::new(row.name, row.quantity, unit_price))
    }
}

/// Repository for offer database operations.
#[derive(Debug, Clone)]
pub struct OfferRepository {
    pool: SqlitePool,
}

impl OfferRepository {
    /// Creates a new OfferRepository.
    pub fn new(pool: SqlitePool) -> Self {
        OfferRepository { pool }
    }

    /// Inserts an offer header.
    pub async fn insert(&self, offer: &Offer) -> DbResult<()> {
        debug!(id = %offer.id, client_id = %offer.client_id, stage = %offer.stage, "Inserting offer");

        sqlx::query(
            r#"
            INSERT INTO offers (
                id, client_id, currency, stage,
                prepayment_kind, prepayment_value,
                initial_payment_cents, total_price_cents,
                notes, created_by, created_at, updated_at
            ) VALUES (
                ?1, ?2, ?3, ?4,
                ?5, ?6,
                ?7, ?8,
                ?9, ?10, ?11, ?12
            )
            "#,
        )
        .bind(&offer.id)
        .bind(&offer.client_id)
        .bind(offer.currency)
        .bind(offer.stage)
        .bind(offer.prepayment.kind)
        .bind(offer.prepayment.value.to_string())
        .bind(cents(offer.initial_payment))
        .bind(cents(offer.total_price))
        .bind(&offer.notes)
        .bind(&offer.created_by)
        .bind(offer.created_at)
        .bind(offer.updated_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets an offer by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Offer>> {
        let sql = format!("SELECT {} FROM offers WHERE id = ?1", OFFER_COLUMNS);
        let row: Option<OfferRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        row.map(Offer::try_from).transpose()
    }

    /// Gets an offer by ID or fails with NotFound.
    pub async fn require(&self, id: &str) -> DbResult<Offer> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Offer", id))
    }

    /// Lists offers, newest first, optionally filtered by stage.
    pub async fn list(&self, stage: Option<OfferStage>) -> DbResult<Vec<Offer>> {
        let sql = format!(
            "SELECT {} FROM offers WHERE (?1 IS NULL OR stage = ?1) ORDER BY created_at DESC",
            OFFER_COLUMNS
        );
        let rows: Vec<OfferRow> = sqlx::query_as(&sql)
            .bind(stage)
            .fetch_all(&self.pool)
            .await?;

        rows.into_iter().map(Offer::try_from).collect()
    }

    /// Sets the funnel stage. Last write wins.
    pub async fn update_stage(&self, id: &str, stage: OfferStage) -> DbResult<()> {
        debug!(id = %id, stage = %stage, "Updating offer stage");

        let result = sqlx::query("UPDATE offers SET stage = ?2, updated_at = ?3 WHERE id = ?1")
            .bind(id)
            .bind(stage)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Offer", id));
        }

        Ok(())
    }

    /// Gets the lines of an offer in their saved order.
    pub async fn get_lines(&self, offer_id: &str) -> DbResult<OfferLines> {
        let robot_rows: Vec<RobotLineRow> = sqlx::query_as(
            r#"
            SELECT robot_model, quantity, contract_type, lease_months,
                   unit_price, monthly_price
            FROM offer_robot_lines
            WHERE offer_id = ?1
            ORDER BY position
            "#,
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await?;

        let item_rows: Vec<ItemLineRow> = sqlx::query_as(
            r#"
            SELECT name, quantity, unit_price
            FROM offer_items
            WHERE offer_id = ?1
            ORDER BY position
            "#,
        )
        .bind(offer_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(OfferLines {
            robots: robot_rows
                .into_iter()
                .map(RobotLine::try_from)
                .collect::<DbResult<_>>()?,
            items: item_rows
                .into_iter()
                .map(ItemLine::try_from)
                .collect::<DbResult<_>>()?,
        })
    }

    /// Stores the offer header (currency, prepayment, initial payment,
    /// total price, notes) and replaces all of its lines in one transaction.
    pub async fn save_lines(&self, offer: &Offer, lines: &OfferLines) -> DbResult<()> {
        let offer_id = offer.id.as_str();
        debug!(
            offer_id = %offer_id,
            robots = lines.robots.len(),
            items = lines.items.len(),
            "Saving offer lines"
        );

        let mut tx = self.pool.begin().await?;

        let result = sqlx::query(
            r#"
            UPDATE offers SET
                currency = ?2,
                prepayment_kind = ?3,
                prepayment_value = ?4,
                initial_payment_cents = ?5,
                total_price_cents = ?6,
                notes = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(offer_id)
        .bind(offer.currency)
        .bind(offer.prepayment.kind)
        .bind(offer.prepayment.value.to_string())
        .bind(cents(offer.initial_payment))
        .bind(cents(offer.total_price))
        .bind(&offer.notes)
        .bind(Utc::now())
        .execute(&mut *tx)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Offer", offer_id));
        }

        sqlx::query("DELETE FROM offer_robot_lines WHERE offer_id = ?1")
            .bind(offer_id)
            .execute(&mut *tx)
            .await?;
        sqlx::query("DELETE FROM offer_items WHERE offer_id = ?1")
            .bind(offer_id)
            .execute(&mut *tx)
            .await?;

        for (position, line) in lines.robots.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO offer_robot_lines (
                    id, offer_id, position, robot_model, quantity,
                    contract_type, lease_months, unit_price, monthly_price
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                "#,
            )
            .bind(new_id())
            .bind(offer_id)
            .bind(position as i64)
            .bind(&line.robot_model)
            .bind(line.quantity)
            .bind(line.contract_type)
            .bind(line.lease_months.map(i64::from))
            .bind(decimal_text(line.unit_price))
            .bind(line.monthly_price.map(decimal_text))
            .execute(&mut *tx)
            .await?;
        }

        for (position, item) in lines.items.iter().enumerate() {
            sqlx::query(
                r#"
                INSERT INTO offer_items (id, offer_id, position, name, quantity, unit_price)
                VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                "#,
            )
            .bind(new_id())
            .bind(offer_id)
            .bind(position as i64)
            .bind(&item.name)
            .bind(item.quantity)
            .bind(decimal_text(item.unit_price))
            .execute(&mut *tx)
            .await?;
        }

        tx.commit().await?;
        Ok(())
    }

    /// Deletes an offer and, by cascade, its lines.
    pub async fn delete(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM offers WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Offer", id));
        }

        Ok(())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::test_support::{seed_client, test_db};
    use crate::Database;
    use robodesk_core::Money;
    use rust_decimal::Decimal;

    pub(crate) async fn seed_offer(db: &Database, client_id: &str) -> Offer {
        let now = Utc::now();
        let offer = Offer {
            id: new_id(),
            client_id: client_id.to_string(),
            currency: Currency::Pln,
            stage: OfferStage::Negotiation,
            prepayment: Prepayment::percent(Decimal::new(125, 1)),
            initial_payment: Money::from_major(1_000),
            total_price: Money::zero(),
            notes: None,
            created_by: "user-1".to_string(),
            created_at: now,
            updated_at: now,
        };
        db.offers().insert(&offer).await.unwrap();
        offer
    }

    fn sample_lines() -> OfferLines {
        let mut lease = RobotLine::lease("KettyBot", 2, 12);
        lease.monthly_price = Some(Money::from_major(100));
        lease.unit_price = Money::from_major(1_200);
        let mut purchase = RobotLine::purchase("BellaBot", 1);
        purchase.unit_price = Money::from_cents(6_000_050);
        OfferLines {
            robots: vec![lease, purchase],
            items: vec![ItemLine::new("Installation", 1, Money::from_major(800))],
        }
    }

    #[tokio::test]
    async fn test_offer_round_trip() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let offer = seed_offer(&db, &client.id).await;

        let loaded = db.offers().require(&offer.id).await.unwrap();
        assert_eq!(loaded.stage, OfferStage::Negotiation);
        assert_eq!(loaded.prepayment.kind, PrepaymentKind::Percent);
        assert_eq!(loaded.prepayment.value, Decimal::new(125, 1));
        assert_eq!(loaded.initial_payment, Money::from_major(1_000));
    }

    #[tokio::test]
    async fn test_save_lines_replaces_in_order() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let offer = seed_offer(&db, &client.id).await;
        let repo = db.offers();

        repo.save_lines(&offer, &sample_lines()).await.unwrap();
        let lines = repo.get_lines(&offer.id).await.unwrap();
        assert_eq!(lines, sample_lines());

        let fewer = OfferLines {
            robots: vec![],
            items: vec![ItemLine::new("Training", 3, Money::from_major(200))],
        };
        let mut updated = offer.clone();
        updated.total_price = Money::from_major(600);
        repo.save_lines(&updated, &fewer).await.unwrap();
        assert_eq!(repo.get_lines(&offer.id).await.unwrap(), fewer);
        assert_eq!(
            repo.require(&offer.id).await.unwrap().total_price,
            Money::from_major(600)
        );
    }

    #[tokio::test]
    async fn test_save_lines_failure_keeps_previous_lines() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let offer = seed_offer(&db, &client.id).await;
        let repo = db.offers();
        repo.save_lines(&offer, &sample_lines()).await.unwrap();

        // quantity 0 violates the CHECK constraint on the second insert
        let bad = OfferLines {
            robots: vec![],
            items: vec![
                ItemLine::new("Installation", 1, Money::from_major(800)),
                ItemLine::new("Broken", 0, Money::zero()),
            ],
        };
        let mut changed = offer.clone();
        changed.currency = Currency::Eur;
        changed.total_price = Money::from_major(999);
        assert!(repo.save_lines(&changed, &bad).await.is_err());
        assert_eq!(repo.get_lines(&offer.id).await.unwrap(), sample_lines());

        let kept = repo.require(&offer.id).await.unwrap();
        assert_eq!(kept.currency, Currency::Pln);
        assert_eq!(kept.total_price, Money::zero());
    }

    #[tokio::test]
    async fn test_line_prices_keep_full_precision() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let offer = seed_offer(&db, &client.id).await;
        let repo = db.offers();

        // 2400 / 7 months, as the fallback lease price produces it
        let monthly = Money::from_major(2_400).split_months(7).unwrap();
        let mut lease = RobotLine::lease("KettyBot", 3, 7);
        lease.monthly_price = Some(monthly);
        lease.unit_price = monthly;
        let lines = OfferLines {
            robots: vec![lease],
            items: vec![ItemLine::new(
                "Service",
                3,
                Money::from_decimal(Decimal::new(1_000_001, 4)),
            )],
        };

        repo.save_lines(&offer, &lines).await.unwrap();
        let loaded = repo.get_lines(&offer.id).await.unwrap();

        assert_eq!(loaded, lines);
        assert_ne!(loaded.robots[0].unit_price, monthly.round_cents());
    }

    #[tokio::test]
    async fn test_corrupt_line_price_is_decode_error() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let offer = seed_offer(&db, &client.id).await;
        sqlx::query(
            "INSERT INTO offer_items (id, offer_id, position, name, quantity, unit_price) VALUES ('i-1', ?1, 0, 'Broken', 1, 'abc')",
        )
        .bind(&offer.id)
        .execute(db.pool())
        .await
        .unwrap();

        assert!(matches!(
            db.offers().get_lines(&offer.id).await,
            Err(DbError::Decode { .. })
        ));
    }

    #[tokio::test]
    async fn test_update_stage_and_filter() {
        let db = test_db().await;
        let client = seed_client(&db).await;
        let offer = seed_offer(&db, &client.id).await;
        let repo = db.offers();

        repo.update_stage(&offer.id, OfferStage::ClosedWon).await.unwrap();
        assert_eq!(repo.list(Some(OfferStage::ClosedWon)).await.unwrap().len(), 1);
        assert!(repo.list(Some(OfferStage::Leads)).await.unwrap().is_empty());
        assert_eq!(repo.list(None).await.unwrap().len(), 1);

        assert!(matches!(
            repo.update_stage("missing", OfferStage::Leads).await,
            Err(DbError::NotFound { .. })
        ));
    }
}
