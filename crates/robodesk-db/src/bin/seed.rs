//! # Seed Data Generator
//!
//! Fills a fresh database with a development price list and default
//! company settings.
//!
//! ## Usage
//! ```bash
//! cargo run -p robodesk-db --bin seed
//!
//! # Specify database path
//! cargo run -p robodesk-db --bin seed -- --db ./data/robodesk.db
//! ```
//!
//! ## Generated Data
//! - One price-list entry per model in [`ROBOTS`], with promo and lowest
//!   prices on some of them
//! - Lease prices for the 12, 24 and 36 month terms
//! - Default [`CompanySettings`]

use chrono::Utc;
use robodesk_core::types::{CurrencyPrices, LeasePricing, PriceOverrides, RobotPricing};
use robodesk_core::{CompanySettings, Money};
use robodesk_db::{Database, DbConfig};
use std::env;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

/// Model name and PLN sale price in whole units.
const ROBOTS: &[(&str, i64)] = &[
    ("BellaBot", 68_000),
    ("KettyBot", 52_000),
    ("PuduBot 2", 45_000),
    ("HolaBot", 61_000),
    ("SwiftBot", 39_000),
    ("CC1 Cleaner", 74_000),
];

/// Lease terms in months and the markup over a straight split, in percent.
const LEASE_TERMS: &[(u32, i64)] = &[(12, 18), (24, 24), (36, 30)];

/// PLN per USD and PLN per EUR, in hundredths.
const USD_RATE: i64 = 400;
const EUR_RATE: i64 = 430;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args: Vec<String> = env::args().collect();
    let mut db_path = String::from("./robodesk_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Robodesk Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./robodesk_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Robodesk Seed Data Generator");
    println!("============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = db.pricing().list_robots().await?;
    if !existing.is_empty() {
        println!("⚠ Price list already has {} robots", existing.len());
        println!("  Skipping seed to avoid duplicates.");
        return Ok(());
    }

    for (idx, (model, pln)) in ROBOTS.iter().enumerate() {
        let robot = robot_pricing(model, *pln, idx);
        db.pricing().insert_robot(&robot).await?;

        for (months, markup) in LEASE_TERMS {
            db.pricing()
                .upsert_lease(&lease_pricing(&robot.id, *pln, *months, *markup))
                .await?;
        }
        println!("  + {} ({} lease terms)", model, LEASE_TERMS.len());
    }

    db.settings().save(&CompanySettings::default()).await?;
    println!("✓ Default settings written");

    println!();
    println!("✓ Seed complete!");
    Ok(())
}

fn converted(pln: i64) -> CurrencyPrices {
    CurrencyPrices::new(
        Money::from_major(pln),
        Money::from_cents(pln * 10_000 / USD_RATE),
        Money::from_cents(pln * 10_000 / EUR_RATE),
    )
}

fn robot_pricing(model: &str, pln: i64, seed: usize) -> RobotPricing {
    let now = Utc::now();

    // every other model runs a 10% promotion
    let promo = if seed % 2 == 0 {
        let discounted = converted(pln * 9 / 10);
        PriceOverrides {
            pln: Some(discounted.pln),
            usd: Some(discounted.usd),
            eur: Some(discounted.eur),
        }
    } else {
        PriceOverrides::default()
    };

    RobotPricing {
        id: Uuid::new_v4().to_string(),
        robot_model: model.to_string(),
        sale: converted(pln),
        promo,
        lowest: PriceOverrides {
            pln: Some(Money::from_major(pln * 85 / 100)),
            ..PriceOverrides::default()
        },
        evidence: PriceOverrides {
            pln: Some(Money::from_major(pln * 70 / 100)),
            ..PriceOverrides::default()
        },
        created_at: now,
        updated_at: now,
    }
}

fn lease_pricing(robot_pricing_id: &str, pln: i64, months: u32, markup: i64) -> LeasePricing {
    let monthly = pln * (100 + markup) / 100 / i64::from(months);
    LeasePricing {
        id: Uuid::new_v4().to_string(),
        robot_pricing_id: robot_pricing_id.to_string(),
        months,
        monthly: converted(monthly),
    }
}
