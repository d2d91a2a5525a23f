//! # Forecast Tracking
//!
//! Monthly forecast-vs-actual tables for revenue and robots delivered.
//!
//! Both tables follow one pattern: exactly twelve rows per year, the
//! forecast and actual of each month edited independently, and a variance
//! column.
//!
//! ```text
//! variance % = (actual − forecast) / forecast × 100      (0 when forecast = 0)
//! ```
//!
//! Months missing from storage are synthesized as zero rows with a temporary
//! id (`temp-{year}-{month}`) until the first edit persists them.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult};

const TEMP_ID_PREFIX: &str = "temp-";

/// Which monthly table a figure belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Tracker {
    Revenue,
    RobotsDelivered,
}

impl Tracker {
    pub const fn table_name(&self) -> &'static str {
        match self {
            Tracker::Revenue => "revenue_tracking",
            Tracker::RobotsDelivered => "delivery_tracking",
        }
    }
}

/// One month of one tracker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct MonthlyFigure {
    pub id: String,
    pub year: i32,
    /// 1..=12
    pub month: u32,
    #[ts(type = "string")]
    pub forecast: Decimal,
    #[ts(type = "string")]
    pub actual: Decimal,
}

impl MonthlyFigure {
    /// Zero-valued placeholder for a month with no stored row.
    pub fn placeholder(year: i32, month: u32) -> Self {
        MonthlyFigure {
            id: format!("{}{}-{}", TEMP_ID_PREFIX, year, month),
            year,
            month,
            forecast: Decimal::ZERO,
            actual: Decimal::ZERO,
        }
    }

    /// True until the row has been stored.
    pub fn is_placeholder(&self) -> bool {
        self.id.starts_with(TEMP_ID_PREFIX)
    }

    pub fn variance(&self) -> Decimal {
        variance_pct(self.forecast, self.actual)
    }
}

/// `(actual − forecast) / forecast × 100`, or 0 when forecast is 0.
///
/// ## Example
/// ```rust
/// use robodesk_core::forecast::variance_pct;
/// use rust_decimal::Decimal;
///
/// assert_eq!(variance_pct(Decimal::from(100), Decimal::from(120)), Decimal::from(20));
/// assert_eq!(variance_pct(Decimal::ZERO, Decimal::from(50)), Decimal::ZERO);
/// ```
pub fn variance_pct(forecast: Decimal, actual: Decimal) -> Decimal {
    if forecast.is_zero() {
        return Decimal::ZERO;
    }
    (actual - forecast) / forecast * Decimal::ONE_HUNDRED
}

/// Returns exactly twelve rows for `year`, ordered by month.
///
/// Rows of other years and out-of-range months are dropped. If a month
/// appears twice, the first row wins.
pub fn ensure_year(rows: Vec<MonthlyFigure>, year: i32) -> Vec<MonthlyFigure> {
    let mut by_month: [Option<MonthlyFigure>; 12] = Default::default();

    for row in rows {
        if row.year != year || !(1..=12).contains(&row.month) {
            continue;
        }
        let slot = &mut by_month[(row.month - 1) as usize];
        if slot.is_none() {
            *slot = Some(row);
        }
    }

    by_month
        .into_iter()
        .enumerate()
        .map(|(idx, row)| row.unwrap_or_else(|| MonthlyFigure::placeholder(year, idx as u32 + 1)))
        .collect()
}

fn month_mut(rows: &mut [MonthlyFigure], month: u32) -> CoreResult<&mut MonthlyFigure> {
    rows.iter_mut()
        .find(|r| r.month == month)
        .ok_or(CoreError::MonthOutOfRange(month))
}

/// Edits the forecast of one month, leaving the actual untouched.
pub fn set_forecast(rows: &mut [MonthlyFigure], month: u32, value: Decimal) -> CoreResult<()> {
    month_mut(rows, month)?.forecast = value;
    Ok(())
}

/// Edits the actual of one month, leaving the forecast untouched.
pub fn set_actual(rows: &mut [MonthlyFigure], month: u32, value: Decimal) -> CoreResult<()> {
    month_mut(rows, month)?.actual = value;
    Ok(())
}

/// The total row of a year.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct YearSummary {
    #[ts(type = "string")]
    pub forecast_total: Decimal,
    #[ts(type = "string")]
    pub actual_total: Decimal,
    /// Variance of the totals, not an average of monthly variances.
    #[ts(type = "string")]
    pub variance: Decimal,
}

impl YearSummary {
    pub fn from_rows(rows: &[MonthlyFigure]) -> Self {
        let forecast_total: Decimal = rows.iter().map(|r| r.forecast).sum();
        let actual_total: Decimal = rows.iter().map(|r| r.actual).sum();
        YearSummary {
            forecast_total,
            actual_total,
            variance: variance_pct(forecast_total, actual_total),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
