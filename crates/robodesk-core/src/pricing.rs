//! # Pricing Resolution
//!
//! Resolves the net unit price of a robot for an offer line.
//!
//! ## Resolution Rules
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  resolve(model, contract_type, currency, months)                        │
//! │                                                                         │
//! │  Purchase ──► RobotPricing[model].sale[currency]        source: Sale    │
//! │                                                                         │
//! │  Lease ─────► LeasePricing[(robot.id, months)]          source: Lease   │
//! │                     │ no row for that exact term                        │
//! │                     ▼                                                   │
//! │               sale[currency] / months          source: LeaseFallback    │
//! │                                                                         │
//! │  Unknown model (either type) ──► 0               source: Missing        │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The zero price for an unknown model is kept for compatibility with the
//! existing offer forms. It is never silent: the returned [`PriceSource`]
//! says `Missing` and callers log it.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CoreError, CoreResult, ValidationError};
use crate::money::Money;
use crate::types::{ContractType, Currency, LeasePricing, RobotLine, RobotPricing};

/// Where a resolved price came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PriceSource {
    /// Regular sale price of the model.
    Sale,
    /// Dedicated lease price for the exact term.
    LeaseTable,
    /// Sale price divided by the term; no lease row for that term.
    LeaseFallback,
    /// Model not on the price list; price is zero.
    Missing,
}

/// A resolved unit price and its provenance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct PriceResolution {
    pub price: Money,
    pub source: PriceSource,
}

impl PriceResolution {
    fn missing() -> Self {
        PriceResolution {
            price: Money::zero(),
            source: PriceSource::Missing,
        }
    }

    /// True when the price fell back to zero because the model is unknown.
    pub fn is_degraded(&self) -> bool {
        self.source == PriceSource::Missing
    }
}

/// Immutable snapshot of the price list used to price one offer.
#[derive(Debug, Clone, Default)]
pub struct PriceBook {
    robots: HashMap<String, RobotPricing>,
    /// Keyed by `(robot_pricing_id, months)`.
    lease: HashMap<(String, u32), LeasePricing>,
}

impl PriceBook {
    /// Builds a snapshot from price-list rows.
    ///
    /// If two lease rows share a `(robot, months)` key the last one wins;
    /// the database forbids that pair from repeating.
    pub fn new(robots: Vec<RobotPricing>, lease: Vec<LeasePricing>) -> Self {
        let robots = robots
            .into_iter()
            .map(|r| (r.robot_model.clone(), r))
            .collect();
        let lease = lease
            .into_iter()
            .map(|l| ((l.robot_pricing_id.clone(), l.months), l))
            .collect();
        PriceBook { robots, lease }
    }

    /// Looks up a model on the price list.
    pub fn robot(&self, robot_model: &str) -> Option<&RobotPricing> {
        self.robots.get(robot_model)
    }

    /// Model names on the price list, sorted.
    pub fn models(&self) -> Vec<&str> {
        let mut models: Vec<&str> = self.robots.keys().map(String::as_str).collect();
        models.sort_unstable();
        models
    }

    /// Lease terms with a dedicated price for `robot_model`, ascending.
    pub fn lease_terms(&self, robot_model: &str) -> Vec<u32> {
        let Some(robot) = self.robot(robot_model) else {
            return Vec::new();
        };
        let mut terms: Vec<u32> = self
            .lease
            .keys()
            .filter(|(robot_id, _)| *robot_id == robot.id)
            .map(|(_, months)| *months)
            .collect();
        terms.sort_unstable();
        terms
    }

    /// Net purchase price of `robot_model` in `currency`.
    pub fn purchase_price(&self, robot_model: &str, currency: Currency) -> PriceResolution {
        match self.robot(robot_model) {
            Some(robot) => PriceResolution {
                price: robot.sale_price(currency),
                source: PriceSource::Sale,
            },
            None => PriceResolution::missing(),
        }
    }

    /// Net monthly lease price of `robot_model` for a `months`-long term.
    ///
    /// ## Errors
    /// `months == 0` is rejected before any division happens.
    pub fn lease_price(
        &self,
        robot_model: &str,
        currency: Currency,
        months: u32,
    ) -> CoreResult<PriceResolution> {
        if months == 0 {
            return Err(ValidationError::MustBePositive {
                field: "lease_months".to_string(),
            }
            .into());
        }

        let Some(robot) = self.robot(robot_model) else {
            return Ok(PriceResolution::missing());
        };

        if let Some(row) = self.lease.get(&(robot.id.clone(), months)) {
            return Ok(PriceResolution {
                price: row.monthly.get(currency),
                source: PriceSource::LeaseTable,
            });
        }

        let price = robot
            .sale_price(currency)
            .split_months(months)
            .unwrap_or_default();
        Ok(PriceResolution {
            price,
            source: PriceSource::LeaseFallback,
        })
    }

    /// Resolves the unit price for a line configuration.
    ///
    /// For `Lease` the returned price is monthly.
    ///
    /// ## Example
    /// ```rust
    /// use robodesk_core::pricing::{PriceBook, PriceSource};
    /// use robodesk_core::types::{ContractType, Currency};
    ///
    /// let book = PriceBook::default();
    /// let res = book
    ///     .resolve("Unknown", ContractType::Purchase, Currency::Pln, None)
    ///     .unwrap();
    /// assert_eq!(res.source, PriceSource::Missing);
    /// assert!(res.price.is_zero());
    /// ```
    pub fn resolve(
        &self,
        robot_model: &str,
        contract_type: ContractType,
        currency: Currency,
        lease_months: Option<u32>,
    ) -> CoreResult<PriceResolution> {
        match contract_type {
            ContractType::Purchase => Ok(self.purchase_price(robot_model, currency)),
            ContractType::Lease => {
                let months = lease_months.ok_or_else(|| CoreError::LeaseTermRequired {
                    robot_model: robot_model.to_string(),
                })?;
                self.lease_price(robot_model, currency, months)
            }
        }
    }

    /// Re-resolves the price of `line` after any edit to its model, contract
    /// type, lease term or the offer currency.
    ///
    /// Purchase lines drop their lease term. Lease lines get the monthly
    /// price plus the full-term unit value.
    pub fn reprice(&self, line: &mut RobotLine, currency: Currency) -> CoreResult<PriceResolution> {
        let resolution = self.resolve(
            &line.robot_model,
            line.contract_type,
            currency,
            line.lease_months,
        )?;

        match line.contract_type {
            ContractType::Purchase => {
                line.unit_price = resolution.price;
                line.monthly_price = None;
                line.lease_months = None;
            }
            ContractType::Lease => {
                let months = line.lease_months.unwrap_or_default();
                line.monthly_price = Some(resolution.price);
                line.unit_price = resolution.price.multiply_quantity(i64::from(months));
            }
        }

        Ok(resolution)
    }

    /// Sale price minus evidence (cost) price, when the cost is known.
    pub fn margin(&self, robot_model: &str, currency: Currency) -> Option<Money> {
        let robot = self.robot(robot_model)?;
        let cost = robot.evidence.get(currency)?;
        Some(robot.sale_price(currency) - cost)
    }

    /// Promotional price, when one is set.
    pub fn promo_price(&self, robot_model: &str, currency: Currency) -> Option<Money> {
        self.robot(robot_model)?.promo.get(currency)
    }

    /// Lowest allowed price, when one is set.
    pub fn lowest_price(&self, robot_model: &str, currency: Currency) -> Option<Money> {
        self.robot(robot_model)?.lowest.get(currency)
    }

    /// Evidence (cost) price, when one is set.
    pub fn evidence_price(&self, robot_model: &str, currency: Currency) -> Option<Money> {
        self.robot(robot_model)?.evidence.get(currency)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{CurrencyPrices, PriceOverrides};
    use chrono::Utc;

    fn robot(id: &str, model: &str, pln: i64, usd: i64, eur: i64) -> RobotPricing {
        RobotPricing {
            id: id.to_string(),
            robot_model: model.to_string(),
            sale: CurrencyPrices::new(
                Money::from_major(pln),
                Money::from_major(usd),
                Money::from_major(eur),
            ),
            promo: PriceOverrides::default(),
            lowest: PriceOverrides::default(),
            evidence: PriceOverrides {
                pln: Some(Money::from_major(pln / 2)),
                usd: None,
                eur: None,
            },
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn lease(robot_id: &str, months: u32, pln: i64) -> LeasePricing {
        LeasePricing {
            id: format!("{}-{}", robot_id, months),
            robot_pricing_id: robot_id.to_string(),
            months,
            monthly: CurrencyPrices::new(
                Money::from_major(pln),
                Money::from_major(pln / 4),
                Money::from_major(pln / 4),
            ),
        }
    }

    fn book() -> PriceBook {
        PriceBook::new(
            vec![
                robot("r1", "BellaBot", 60_000, 15_000, 14_000),
                robot("r2", "KettyBot", 36_000, 9_000, 8_400),
            ],
            vec![lease("r1", 24, 2_900), lease("r1", 36, 2_100)],
        )
    }

    #[test]
    fn test_purchase_price_per_currency() {
        let book = book();
        let res = book.purchase_price("BellaBot", Currency::Usd);
        assert_eq!(res.price, Money::from_major(15_000));
        assert_eq!(res.source, PriceSource::Sale);
    }

    #[test]
    fn test_missing_model_degrades_to_zero() {
        let book = book();
        let purchase = book.purchase_price("HolaBot", Currency::Pln);
        assert!(purchase.is_degraded());
        assert!(purchase.price.is_zero());

        let lease = book.lease_price("HolaBot", Currency::Pln, 12).unwrap();
        assert_eq!(lease.source, PriceSource::Missing);
    }

    #[test]
    fn test_lease_table_price() {
        let book = book();
        let res = book.lease_price("BellaBot", Currency::Pln, 24).unwrap();
        assert_eq!(res.price, Money::from_major(2_900));
        assert_eq!(res.source, PriceSource::LeaseTable);
    }

    #[test]
    fn test_lease_fallback_divides_purchase_price() {
        let book = book();
        for (model, months) in [("BellaBot", 12), ("KettyBot", 24), ("KettyBot", 7)] {
            for currency in Currency::ALL {
                let res = book.lease_price(model, currency, months).unwrap();
                let purchase = book.purchase_price(model, currency).price;
                assert_eq!(res.source, PriceSource::LeaseFallback);
                assert_eq!(res.price, purchase.split_months(months).unwrap());
            }
        }
    }

    #[test]
    fn test_zero_month_term_rejected() {
        let book = book();
        let err = book.lease_price("BellaBot", Currency::Pln, 0).unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
    }

    #[test]
    fn test_lease_without_term_rejected() {
        let book = book();
        let err = book
            .resolve("BellaBot", ContractType::Lease, Currency::Pln, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::LeaseTermRequired { .. }));
    }

    #[test]
    fn test_resolution_is_repeatable() {
        let book = book();
        let first = book
            .resolve("BellaBot", ContractType::Lease, Currency::Eur, Some(36))
            .unwrap();
        for _ in 0..5 {
            let again = book
                .resolve("BellaBot", ContractType::Lease, Currency::Eur, Some(36))
                .unwrap();
            assert_eq!(first, again);
        }
    }

    #[test]
    fn test_reprice_follows_edits() {
        let book = book();
        let mut line = RobotLine::purchase("BellaBot", 2);

        book.reprice(&mut line, Currency::Pln).unwrap();
        assert_eq!(line.unit_price, Money::from_major(60_000));
        assert_eq!(line.monthly_price, None);

        // currency change
        book.reprice(&mut line, Currency::Eur).unwrap();
        assert_eq!(line.unit_price, Money::from_major(14_000));

        // switch to lease with a tabled term
        line.contract_type = ContractType::Lease;
        line.lease_months = Some(24);
        book.reprice(&mut line, Currency::Pln).unwrap();
        assert_eq!(line.monthly_price, Some(Money::from_major(2_900)));
        assert_eq!(line.unit_price, Money::from_major(69_600));

        // model change to one without lease rows
        line.robot_model = "KettyBot".to_string();
        let res = book.reprice(&mut line, Currency::Pln).unwrap();
        assert_eq!(res.source, PriceSource::LeaseFallback);
        assert_eq!(line.monthly_price, Some(Money::from_major(1_500)));

        // back to purchase drops the term
        line.contract_type = ContractType::Purchase;
        book.reprice(&mut line, Currency::Pln).unwrap();
        assert_eq!(line.lease_months, None);
        assert_eq!(line.unit_price, Money::from_major(36_000));
    }

    #[test]
    fn test_lease_terms_and_margin() {
        let book = book();
        assert_eq!(book.lease_terms("BellaBot"), vec![24, 36]);
        assert!(book.lease_terms("KettyBot").is_empty());
        assert_eq!(book.models(), vec!["BellaBot", "KettyBot"]);

        assert_eq!(
            book.margin("BellaBot", Currency::Pln),
            Some(Money::from_major(30_000))
        );
        assert_eq!(book.margin("BellaBot", Currency::Usd), None);
        assert_eq!(book.promo_price("BellaBot", Currency::Pln), None);
    }
}
