//! # Forecast Repository
//!
//! Monthly forecast/actual rows for the revenue and robots-delivered
//! trackers. Both tables share one shape, so one repository serves both and
//! takes the [`Tracker`] per call.
//!
//! ```text
//! year(tracker, 2024)         → stored rows + placeholders = 12 rows
//! set_forecast(.., 2024, 3)   → INSERT … ON CONFLICT (year, month) DO UPDATE forecast
//! set_actual(.., 2024, 3)     → INSERT … ON CONFLICT (year, month) DO UPDATE actual
//! ```

use chrono::Utc;
use robodesk_core::forecast::{ensure_year, MonthlyFigure, Tracker, YearSummary};
use robodesk_core::validation::validate_month;
use rust_decimal::Decimal;
use sqlx::SqlitePool;
use tracing::debug;

use super::{new_id, parse_decimal};
use crate::error::{DbError, DbResult};

#[derive(sqlx::FromRow)]
struct FigureRow {
    id: String,
    year: i64,
    month: i64,
    forecast: String,
    actual: String,
}

impl TryFrom<FigureRow> for MonthlyFigure {
    type Error = DbError;

    fn try_from(row: FigureRow) -> Result<Self, Self::Error> {
        Ok(MonthlyFigure {
            forecast: parse_decimal("forecast", &row.forecast)?,
            actual: parse_decimal("actual", &row.actual)?,
            year: i32::try_from(row.year)
                .map_err(|_| DbError::decode("year", row.year.to_string()))?,
            month: u32::try_from(row.month)
                .map_err(|_| DbError::decode("month", row.month.to_string()))?,
            id: row.id,
        })
    }
}

#[derive(Clone, Copy)]
enum Column {
    Forecast,
    Actual,
}

/// Repository for the monthly tracking tables.
#[derive(Debug, Clone)]
pub struct ForecastRepository {
    pool: SqlitePool,
}

impl ForecastRepository {
    /// Creates a new ForecastRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ForecastRepository { pool }
    }

    /// Exactly twelve rows for `year`; unsaved months are placeholders.
    pub async fn year(&self, tracker: Tracker, year: i32) -> DbResult<Vec<MonthlyFigure>> {
        let sql = format!(
            "SELECT id, year, month, forecast, actual FROM {} WHERE year = ?1 ORDER BY month",
            tracker.table_name()
        );
        let rows: Vec<FigureRow> = sqlx::query_as(&sql)
            .bind(i64::from(year))
            .fetch_all(&self.pool)
            .await?;

        let stored = rows
            .into_iter()
            .map(MonthlyFigure::try_from)
            .collect::<DbResult<Vec<_>>>()?;

        Ok(ensure_year(stored, year))
    }

    /// Year rows plus their total.
    pub async fn year_with_summary(
        &self,
        tracker: Tracker,
        year: i32,
    ) -> DbResult<(Vec<MonthlyFigure>, YearSummary)> {
        let rows = self.year(tracker, year).await?;
        let summary = YearSummary::from_rows(&rows);
        Ok((rows, summary))
    }

    /// Sets the forecast of one month, creating the row if needed.
    pub async fn set_forecast(
        &self,
        tracker: Tracker,
        year: i32,
        month: u32,
        value: Decimal,
    ) -> DbResult<MonthlyFigure> {
        self.upsert(tracker, year, month, Column::Forecast, value).await
    }

    /// Sets the actual of one month, creating the row if needed.
    pub async fn set_actual(
        &self,
        tracker: Tracker,
        year: i32,
        month: u32,
        value: Decimal,
    ) -> DbResult<MonthlyFigure> {
        self.upsert(tracker, year, month, Column::Actual, value).await
    }

    async fn upsert(
        &self,
        tracker: Tracker,
        year: i32,
        month: u32,
        column: Column,
        value: Decimal,
    ) -> DbResult<MonthlyFigure> {
        validate_month(month).map_err(|e| DbError::decode("month", e.to_string()))?;

        let table = tracker.table_name();
        let column = match column {
            Column::Forecast => "forecast",
            Column::Actual => "actual",
        };

        debug!(table = table, year = year, month = month, column = column, "Upserting figure");

        let sql = format!(
            r#"
            INSERT INTO {table} (id, year, month, {column}, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT (year, month) DO UPDATE SET
                {column} = excluded.{column},
                updated_at = excluded.updated_at
            RETURNING id, year, month, forecast, actual
            "#
        );

        let row: FigureRow = sqlx::query_as(&sql)
            .bind(new_id())
            .bind(i64::from(year))
            .bind(i64::from(month))
            .bind(value.to_string())
            .bind(Utc::now())
            .fetch_one(&self.pool)
            .await?;

        MonthlyFigure::try_from(row)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::test_support::test_db;

    #[tokio::test]
    async fn test_empty_year_is_twelve_placeholders() {
        let db = test_db().await;
        let rows = db.forecasts().year(Tracker::Revenue, 2024).await.unwrap();

        assert_eq!(rows.len(), 12);
        assert!(rows.iter().all(|r| r.is_placeholder()));
    }

    #[tokio::test]
    async fn test_forecast_and_actual_edited_independently() {
        let db = test_db().await;
        let repo = db.forecasts();

        let saved = repo
            .set_forecast(Tracker::Revenue, 2024, 3, Decimal::from(100))
            .await
            .unwrap();
        assert!(!saved.is_placeholder());
        assert_eq!(saved.actual, Decimal::ZERO);

        let saved = repo
            .set_actual(Tracker::Revenue, 2024, 3, Decimal::from(120))
            .await
            .unwrap();
        assert_eq!(saved.forecast, Decimal::from(100));
        assert_eq!(saved.variance(), Decimal::from(20));

        let (rows, summary) = repo.year_with_summary(Tracker::Revenue, 2024).await.unwrap();
        assert_eq!(rows[2].id, saved.id);
        assert_eq!(summary.actual_total, Decimal::from(120));
        assert_eq!(summary.variance, Decimal::from(20));
    }

    #[tokio::test]
    async fn test_trackers_are_separate_tables() {
        let db = test_db().await;
        let repo = db.forecasts();
        repo.set_actual(Tracker::RobotsDelivered, 2024, 1, Decimal::from(4))
            .await
            .unwrap();

        let revenue = repo.year(Tracker::Revenue, 2024).await.unwrap();
        assert!(revenue[0].is_placeholder());
        let delivered = repo.year(Tracker::RobotsDelivered, 2024).await.unwrap();
        assert_eq!(delivered[0].actual, Decimal::from(4));
    }

    #[tokio::test]
    async fn test_month_out_of_range() {
        let db = test_db().await;
        let result = db
            .forecasts()
            .set_forecast(Tracker::Revenue, 2024, 13, Decimal::ONE)
            .await;
        assert!(matches!(result, Err(DbError::Decode { .. })));
    }
}
