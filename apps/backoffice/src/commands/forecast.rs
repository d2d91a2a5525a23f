//! # Forecast Tracking Commands
//!
//! Revenue and robots-delivered tables. Each request returns the whole year
//! so the grid can redraw its total row after a single cell edit.

use robodesk_core::forecast::{variance_pct, MonthlyFigure, Tracker, YearSummary};
use robodesk_core::validation::validate_month;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;

/// Which half of a month is being edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackingField {
    Forecast,
    Actual,
}

/// One grid row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingRow {
    #[serde(flatten)]
    pub figure: MonthlyFigure,
    /// Percent, 0 when nothing was forecast.
    pub variance_pct: Decimal,
    /// Not yet stored; the first edit persists it.
    pub placeholder: bool,
}

impl From<MonthlyFigure> for TrackingRow {
    fn from(figure: MonthlyFigure) -> Self {
        TrackingRow {
            variance_pct: variance_pct(figure.forecast, figure.actual),
            placeholder: figure.is_placeholder(),
            figure,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingYear {
    pub tracker: Tracker,
    pub year: i32,
    /// Always twelve rows, January first.
    pub rows: Vec<TrackingRow>,
    pub summary: YearSummary,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SetTrackingValueRequest {
    pub tracker: Tracker,
    pub year: i32,
    pub month: u32,
    pub field: TrackingField,
    pub value: Decimal,
}

pub async fn get_tracking_year(
    db: &DbState,
    tracker: Tracker,
    year: i32,
) -> Result<TrackingYear, ApiError> {
    debug!(?tracker, year, "get_tracking_year command");

    let (rows, summary) = db.inner().forecasts().year_with_summary(tracker, year).await?;
    Ok(TrackingYear {
        tracker,
        year,
        rows: rows.into_iter().map(TrackingRow::from).collect(),
        summary,
    })
}

/// Stores one cell and returns the refreshed year.
pub async fn set_tracking_value(
    db: &DbState,
    request: SetTrackingValueRequest,
) -> Result<TrackingYear, ApiError> {
    validate_month(request.month)?;

    let repo = db.inner().forecasts();
    let figure = match request.field {
        TrackingField::Forecast => {
            repo.set_forecast(request.tracker, request.year, request.month, request.value)
                .await?
        }
        TrackingField::Actual => {
            repo.set_actual(request.tracker, request.year, request.month, request.value)
                .await?
        }
    };

    info!(
        tracker = ?request.tracker,
        year = figure.year,
        month = figure.month,
        field = ?request.field,
        "Tracking value saved"
    );

    get_tracking_year(db, request.tracker, request.year).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::test_support::test_state;
    use crate::error::ErrorCode;

    fn set(tracker: Tracker, month: u32, field: TrackingField, value: i64) -> SetTrackingValueRequest {
        SetTrackingValueRequest {
            tracker,
            year: 2025,
            month,
            field,
            value: Decimal::from(value),
        }
    }

    #[tokio::test]
    async fn test_empty_year_has_twelve_placeholders() {
        let db = test_state().await;
        let year = get_tracking_year(&db, Tracker::Revenue, 2025).await.unwrap();

        assert_eq!(year.rows.len(), 12);
        assert!(year.rows.iter().all(|r| r.placeholder));
        assert_eq!(year.rows[0].figure.month, 1);
        assert_eq!(year.rows[11].figure.month, 12);
        assert_eq!(year.summary.forecast_total, Decimal::ZERO);
    }

    #[tokio::test]
    async fn test_variance_per_row_and_total() {
        let db = test_state().await;

        // March: nothing forecast, 50 delivered
        set_tracking_value(&db, set(Tracker::Revenue, 3, TrackingField::Actual, 50))
            .await
            .unwrap();
        set_tracking_value(&db, set(Tracker::Revenue, 4, TrackingField::Forecast, 100))
            .await
            .unwrap();
        let year = set_tracking_value(&db, set(Tracker::Revenue, 4, TrackingField::Actual, 120))
            .await
            .unwrap();

        let march = &year.rows[2];
        assert_eq!(march.variance_pct, Decimal::ZERO);
        assert!(!march.placeholder);

        let april = &year.rows[3];
        assert_eq!(april.figure.forecast, Decimal::from(100));
        assert_eq!(april.figure.actual, Decimal::from(120));
        assert_eq!(april.variance_pct, Decimal::from(20));

        assert_eq!(year.summary.forecast_total, Decimal::from(100));
        assert_eq!(year.summary.actual_total, Decimal::from(170));
        assert_eq!(year.summary.variance, Decimal::from(70));
        assert!(year.rows[0].placeholder);
    }

    #[tokio::test]
    async fn test_trackers_are_independent() {
        let db = test_state().await;
        set_tracking_value(&db, set(Tracker::RobotsDelivered, 1, TrackingField::Forecast, 4))
            .await
            .unwrap();

        let revenue = get_tracking_year(&db, Tracker::Revenue, 2025).await.unwrap();
        assert!(revenue.rows[0].placeholder);
    }

    #[tokio::test]
    async fn test_month_out_of_range_is_validation_error() {
        let db = test_state().await;
        let err = set_tracking_value(&db, set(Tracker::Revenue, 13, TrackingField::Actual, 1))
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::ValidationError);
    }
}
