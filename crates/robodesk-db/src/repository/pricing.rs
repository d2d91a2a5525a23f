//! # Pricing Repository
//!
//! The robot price list and the per-term lease prices.
//!
//! ```text
//! robot_pricing (robot_model UNIQUE)
//!      │ 1
//!      │
//!      │ *
//! lease_pricing (UNIQUE robot_pricing_id, months)
//! ```
//!
//! Offer dialogs load the whole list once as a [`PriceBook`] and resolve
//! every line against that snapshot.

use chrono::{DateTime, Utc};
use robodesk_core::types::{CurrencyPrices, LeasePricing, PriceOverrides, RobotPricing};
use robodesk_core::PriceBook;
use sqlx::SqlitePool;
use tracing::debug;

use super::{cents, money, opt_money};
use crate::error::{DbError, DbResult};

const ROBOT_COLUMNS: &str = r#"
    id, robot_model,
    sale_pln_cents, sale_usd_cents, sale_eur_cents,
    promo_pln_cents, promo_usd_cents, promo_eur_cents,
    lowest_pln_cents, lowest_usd_cents, lowest_eur_cents,
    evidence_pln_cents, evidence_usd_cents, evidence_eur_cents,
    created_at, updated_at
"#;

#[derive(sqlx::FromRow)]
struct RobotPricingRow {
    id: String,
    robot_model: String,
    sale_pln_cents: i64,
    sale_usd_cents: i64,
    sale_eur_cents: i64,
    promo_pln_cents: Option<i64>,
    promo_usd_cents: Option<i64>,
    promo_eur_cents: Option<i64>,
    lowest_pln_cents: Option<i64>,
    lowest_usd_cents: Option<i64>,
    lowest_eur_cents: Option<i64>,
    evidence_pln_cents: Option<i64>,
    evidence_usd_cents: Option<i64>,
    evidence_eur_cents: Option<i64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<RobotPricingRow> for RobotPricing {
    fn from(row: RobotPricingRow) -> Self {
        RobotPricing {
            id: row.id,
            robot_model: row.robot_model,
            sale: CurrencyPrices::new(
                money(row.sale_pln_cents),
                money(row.sale_usd_cents),
                money(row.sale_eur_cents),
            ),
            promo: PriceOverrides {
                pln: opt_money(row.promo_pln_cents),
                usd: opt_money(row.promo_usd_cents),
                eur: opt_money(row.promo_eur_cents),
            },
            lowest: PriceOverrides {
                pln: opt_money(row.lowest_pln_cents),
                usd: opt_money(row.lowest_usd_cents),
                eur: opt_money(row.lowest_eur_cents),
            },
            evidence: PriceOverrides {
                pln: opt_money(row.evidence_pln_cents),
                usd: opt_money(row.evidence_usd_cents),
                eur: opt_money(row.evidence_eur_cents),
            },
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct LeasePricingRow {
    id: String,
    robot_pricing_id: String,
    months: i64,
    monthly_pln_cents: i64,
    monthly_usd_cents: i64,
    monthly_eur_cents: i64,
}

impl TryFrom<LeasePricingRow> for LeasePricing {
    type Error = DbError;

    fn try_from(row: LeasePricingRow) -> Result<Self, Self::Error> {
        let months = u32::try_from(row.months)
            .map_err(|_| DbError::decode("lease_pricing.months", row.months.to_string()))?;
        Ok(LeasePricing {
            id: row.id,
            robot_pricing_id: row.robot_pricing_id,
            months,
            monthly: CurrencyPrices::new(
                money(row.monthly_pln_cents),
                money(row.monthly_usd_cents),
                money(row.monthly_eur_cents),
            ),
        })
    }
}

fn opt_cents(amount: Option<robodesk_core::Money>) -> Option<i64> {
    amount.map(cents)
}

/// Repository for the price list.
#[derive(Debug, Clone)]
pub struct PricingRepository {
    pool: SqlitePool,
}

impl PricingRepository {
    /// Creates a new PricingRepository.
    pub fn new(pool: SqlitePool) -> Self {
        PricingRepository { pool }
    }

    // =========================================================================
    // Robots
    // =========================================================================

    /// Lists every robot on the price list, by model name.
    pub async fn list_robots(&self) -> DbResult<Vec<RobotPricing>> {
        let sql = format!("SELECT {} FROM robot_pricing ORDER BY robot_model", ROBOT_COLUMNS);
        let rows: Vec<RobotPricingRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(RobotPricing::from).collect())
    }

    /// Gets a robot by model name.
    pub async fn get_by_model(&self, robot_model: &str) -> DbResult<Option<RobotPricing>> {
        let sql = format!("SELECT {} FROM robot_pricing WHERE robot_model = ?1", ROBOT_COLUMNS);
        let row: Option<RobotPricingRow> = sqlx::query_as(&sql)
            .bind(robot_model)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(RobotPricing::from))
    }

    /// Inserts a robot.
    ///
    /// ## Errors
    /// A model name already on the list is a `UniqueViolation` on
    /// `robot_pricing.robot_model`.
    pub async fn insert_robot(&self, robot: &RobotPricing) -> DbResult<()> {
        debug!(id = %robot.id, model = %robot.robot_model, "Inserting robot pricing");

        sqlx::query(
            r#"
            INSERT INTO robot_pricing (
                id, robot_model,
                sale_pln_cents, sale_usd_cents, sale_eur_cents,
                promo_pln_cents, promo_usd_cents, promo_eur_cents,
                lowest_pln_cents, lowest_usd_cents, lowest_eur_cents,
                evidence_pln_cents, evidence_usd_cents, evidence_eur_cents,
                created_at, updated_at
            ) VALUES (
                ?1, ?2,
                ?3, ?4, ?5,
                ?6, ?7, ?8,
                ?9, ?10, ?11,
                ?12, ?13, ?14,
                ?15, ?16
            )
            "#,
        )
        .bind(&robot.id)
        .bind(&robot.robot_model)
        .bind(cents(robot.sale.pln))
        .bind(cents(robot.sale.usd))
        .bind(cents(robot.sale.eur))
        .bind(opt_cents(robot.promo.pln))
        .bind(opt_cents(robot.promo.usd))
        .bind(opt_cents(robot.promo.eur))
        .bind(opt_cents(robot.lowest.pln))
        .bind(opt_cents(robot.lowest.usd))
        .bind(opt_cents(robot.lowest.eur))
        .bind(opt_cents(robot.evidence.pln))
        .bind(opt_cents(robot.evidence.usd))
        .bind(opt_cents(robot.evidence.eur))
        .bind(robot.created_at)
        .bind(robot.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&robot.robot_model))?;

        Ok(())
    }

    /// Updates a robot's model name and prices.
    pub async fn update_robot(&self, robot: &RobotPricing) -> DbResult<()> {
        debug!(id = %robot.id, model = %robot.robot_model, "Updating robot pricing");

        let result = sqlx::query(
            r#"
            UPDATE robot_pricing SET
                robot_model = ?2,
                sale_pln_cents = ?3, sale_usd_cents = ?4, sale_eur_cents = ?5,
                promo_pln_cents = ?6, promo_usd_cents = ?7, promo_eur_cents = ?8,
                lowest_pln_cents = ?9, lowest_usd_cents = ?10, lowest_eur_cents = ?11,
                evidence_pln_cents = ?12, evidence_usd_cents = ?13, evidence_eur_cents = ?14,
                updated_at = ?15
            WHERE id = ?1
            "#,
        )
        .bind(&robot.id)
        .bind(&robot.robot_model)
        .bind(cents(robot.sale.pln))
        .bind(cents(robot.sale.usd))
        .bind(cents(robot.sale.eur))
        .bind(opt_cents(robot.promo.pln))
        .bind(opt_cents(robot.promo.usd))
        .bind(opt_cents(robot.promo.eur))
        .bind(opt_cents(robot.lowest.pln))
        .bind(opt_cents(robot.lowest.usd))
        .bind(opt_cents(robot.lowest.eur))
        .bind(opt_cents(robot.evidence.pln))
        .bind(opt_cents(robot.evidence.usd))
        .bind(opt_cents(robot.evidence.eur))
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&robot.robot_model))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RobotPricing", &robot.id));
        }

        Ok(())
    }

    /// Deletes a robot and, by cascade, its lease prices.
    pub async fn delete_robot(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM robot_pricing WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("RobotPricing", id));
        }

        Ok(())
    }

    // =========================================================================
    // Lease prices
    // =========================================================================

    /// Lists all lease prices.
    pub async fn list_lease(&self) -> DbResult<Vec<LeasePricing>> {
        let rows: Vec<LeasePricingRow> = sqlx::query_as(
            r#"
            SELECT id, robot_pricing_id, months,
                   monthly_pln_cents, monthly_usd_cents, monthly_eur_cents
            FROM lease_pricing
            ORDER BY robot_pricing_id, months
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LeasePricing::try_from).collect()
    }

    /// Lists the lease prices of one robot, by term.
    pub async fn list_lease_for(&self, robot_pricing_id: &str) -> DbResult<Vec<LeasePricing>> {
        let rows: Vec<LeasePricingRow> = sqlx::query_as(
            r#"
            SELECT id, robot_pricing_id, months,
                   monthly_pln_cents, monthly_usd_cents, monthly_eur_cents
            FROM lease_pricing
            WHERE robot_pricing_id = ?1
            ORDER BY months
            "#,
        )
        .bind(robot_pricing_id)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(LeasePricing::try_from).collect()
    }

    /// Inserts or replaces the price for `(robot_pricing_id, months)`.
    ///
    /// Keeps the existing row id when the term already has a price.
    pub async fn upsert_lease(&self, lease: &LeasePricing) -> DbResult<()> {
        debug!(
            robot_pricing_id = %lease.robot_pricing_id,
            months = lease.months,
            "Upserting lease pricing"
        );

        sqlx::query(
            r#"
            INSERT INTO lease_pricing (
                id, robot_pricing_id, months,
                monthly_pln_cents, monthly_usd_cents, monthly_eur_cents
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT (robot_pricing_id, months) DO UPDATE SET
                monthly_pln_cents = excluded.monthly_pln_cents,
                monthly_usd_cents = excluded.monthly_usd_cents,
                monthly_eur_cents = excluded.monthly_eur_cents
            "#,
        )
        .bind(&lease.id)
        .bind(&lease.robot_pricing_id)
        .bind(i64::from(lease.months))
        .bind(cents(lease.monthly.pln))
        .bind(cents(lease.monthly.usd))
        .bind(cents(lease.monthly.eur))
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Deletes one lease price.
    pub async fn delete_lease(&self, id: &str) -> DbResult<()> {
        let result = sqlx::query("DELETE FROM lease_pricing WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("LeasePricing", id));
        }

        Ok(())
    }

    /// Loads the whole price list as a resolution snapshot.
    pub async fn load_price_book(&self) -> DbResult<PriceBook> {
        let robots = self.list_robots().await?;
        let lease = self.list_lease().await?;
        debug!(robots = robots.len(), lease_rows = lease.len(), "Price book loaded");
        Ok(PriceBook::new(robots, lease))
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
