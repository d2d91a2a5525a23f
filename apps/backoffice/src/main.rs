//! # Robodesk Back-Office Entry Point
//!
//! Opens the database and document store from the environment, applies
//! pending migrations and reports what the back-office holds.
//!
//! ## Usage
//! ```bash
//! ROBODESK_DB_PATH=./robodesk.db ROBODESK_LOG=debug robodesk-backoffice
//! ```

use robodesk_backoffice::commands::{contract, offer, pricing};
use robodesk_backoffice::state::AppConfig;
use robodesk_backoffice::{init_tracing, Backoffice};
use tracing::{error, info};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::from_env();
    init_tracing(&config.log_filter);

    info!("Starting Robodesk back-office");

    let app = Backoffice::start(config).await?;
    if !app.health_check().await {
        error!("Database health check failed");
        app.shutdown().await;
        return Err("database health check failed".into());
    }

    let price_list = pricing::list_price_list(&app.db).await?;
    let offers = offer::list_offers(&app.db, None).await?;
    let contracts = contract::list_contracts(&app.db).await?;
    info!(
        robots = price_list.len(),
        offers = offers.len(),
        contracts = contracts.len(),
        "Back-office ready"
    );

    app.shutdown().await;
    Ok(())
}
