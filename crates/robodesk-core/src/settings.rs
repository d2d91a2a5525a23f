//! # Company Settings
//!
//! Typed view over the key/value `settings` table.
//!
//! Every request that needs a setting loads the whole object once instead of
//! looking keys up one by one. Missing keys fall back to defaults; unknown
//! keys are ignored so older builds tolerate newer rows.
//!
//! | Key                    | Type             | Default            |
//! |------------------------|------------------|--------------------|
//! | `contract_number_mask` | [`NumberMask`]   | `CNT-{YYYY}-{NNN}` |
//! | `billing_schedule`     | [`BillingSchedule`] | `monthly`       |
//! | `km_rate`              | [`Money`]        | `0`                |
//! | `default_currency`     | [`Currency`]     | `PLN`              |
//! | `vat_rate_bps`         | [`VatRate`]      | `2300`             |

use std::str::FromStr;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, ValidationError};
use crate::money::Money;
use crate::numbering::NumberMask;
use crate::types::{BillingSchedule, Currency, VatRate};
use crate::validation::{validate_vat_rate_bps, ValidationResult};

pub const KEY_CONTRACT_NUMBER_MASK: &str = "contract_number_mask";
pub const KEY_BILLING_SCHEDULE: &str = "billing_schedule";
pub const KEY_KM_RATE: &str = "km_rate";
pub const KEY_DEFAULT_CURRENCY: &str = "default_currency";
pub const KEY_VAT_RATE_BPS: &str = "vat_rate_bps";

/// Company-wide settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanySettings {
    pub contract_number_mask: String,
    pub billing_schedule: BillingSchedule,
    /// Travel cost per kilometre, used on service visits.
    pub km_rate: Money,
    pub default_currency: Currency,
    pub vat_rate: VatRate,
}

impl Default for CompanySettings {
    fn default() -> Self {
        CompanySettings {
            contract_number_mask: crate::DEFAULT_CONTRACT_MASK.to_string(),
            billing_schedule: BillingSchedule::default(),
            km_rate: Money::zero(),
            default_currency: Currency::default(),
            vat_rate: VatRate::default(),
        }
    }
}

impl CompanySettings {
    /// Builds settings from stored key/value rows.
    ///
    /// Blank values count as missing.
    ///
    /// ## Example
    /// ```rust
    /// use robodesk_core::settings::CompanySettings;
    /// use robodesk_core::types::BillingSchedule;
    ///
    /// let s = CompanySettings::from_pairs([("billing_schedule", "quarterly")]).unwrap();
    /// assert_eq!(s.billing_schedule, BillingSchedule::Quarterly);
    /// assert_eq!(s.contract_number_mask, "CNT-{YYYY}-{NNN}");
    /// ```
    pub fn from_pairs<I, K, V>(pairs: I) -> ValidationResult<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let mut settings = CompanySettings::default();

        for (key, value) in pairs {
            let value = value.as_ref().trim();
            if value.is_empty() {
                continue;
            }

            match key.as_ref() {
                KEY_CONTRACT_NUMBER_MASK => {
                    NumberMask::parse(value).map_err(|e| {
                        ValidationError::invalid_format(KEY_CONTRACT_NUMBER_MASK, e.to_string())
                    })?;
                    settings.contract_number_mask = value.to_string();
                }
                KEY_BILLING_SCHEDULE => {
                    settings.billing_schedule = BillingSchedule::from_str(value)?;
                }
                KEY_KM_RATE => {
                    let rate = Decimal::from_str(value).map_err(|_| {
                        ValidationError::invalid_format(KEY_KM_RATE, "must be a decimal number")
                    })?;
                    if rate.is_sign_negative() && !rate.is_zero() {
                        return Err(ValidationError::Negative {
                            field: KEY_KM_RATE.to_string(),
                        });
                    }
                    settings.km_rate = Money::from_decimal(rate);
                }
                KEY_DEFAULT_CURRENCY => {
                    settings.default_currency = Currency::from_str(value)?;
                }
                KEY_VAT_RATE_BPS => {
                    let bps: u32 = value.parse().map_err(|_| {
                        ValidationError::invalid_format(KEY_VAT_RATE_BPS, "must be an integer")
                    })?;
                    validate_vat_rate_bps(bps)?;
                    settings.vat_rate = VatRate::from_bps(bps);
                }
                _ => {}
            }
        }

        Ok(settings)
    }

    /// Key/value rows to store.
    pub fn to_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            (KEY_CONTRACT_NUMBER_MASK, self.contract_number_mask.clone()),
            (KEY_BILLING_SCHEDULE, self.billing_schedule.as_str().to_string()),
            (KEY_KM_RATE, self.km_rate.amount().normalize().to_string()),
            (KEY_DEFAULT_CURRENCY, self.default_currency.code().to_string()),
            (KEY_VAT_RATE_BPS, self.vat_rate.bps().to_string()),
        ]
    }

    /// The contract number mask, parsed.
    pub fn number_mask(&self) -> Result<NumberMask, CoreError> {
        NumberMask::parse(&self.contract_number_mask)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
