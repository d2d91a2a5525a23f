//! # Settings Commands
//!
//! The settings page edits the whole [`CompanySettings`] object at once.
//! Values are checked before anything is written, so a bad mask never
//! reaches the contract numbering.

use robodesk_core::validation::{validate_price_non_negative, validate_vat_rate_bps};
use robodesk_core::CompanySettings;
use tracing::{debug, info};

use crate::error::ApiError;
use crate::state::DbState;

pub async fn get_settings(db: &DbState) -> Result<CompanySettings, ApiError> {
    db.settings().await
}

pub async fn update_settings(
    db: &DbState,
    mut settings: CompanySettings,
) -> Result<CompanySettings, ApiError> {
    debug!(mask = %settings.contract_number_mask, "update_settings command");

    settings.contract_number_mask = settings.contract_number_mask.trim().to_string();
    settings.number_mask()?;
    validate_vat_rate_bps(settings.vat_rate.bps())?;
    validate_price_non_negative("km_rate", settings.km_rate)?;

    db.inner().settings().save(&settings).await?;

    info!(
        mask = %settings.contract_number_mask,
        billing = %settings.billing_schedule.as_str(),
        currency = %settings.default_currency.code(),
        "Company settings saved"
    );
    Ok(settings)
}
