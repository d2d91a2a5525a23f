//! # Validation Module
//!
//! Business rule validation for Robodesk forms.
//!
//! ## Validation Strategy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                      Validation Layers                                  │
//! │                                                                         │
//! │  Layer 1: Form (browser)                                               │
//! │  └── Required fields, immediate feedback                               │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 2: Backoffice command (Rust)                                    │
//! │  └── THIS MODULE: formats, ranges, price rules                         │
//! │           │                                                             │
//! │           ▼                                                             │
//! │  Layer 3: Database (SQLite)                                            │
//! │  ├── UNIQUE contract_number, robot_model, (robot, months)             │
//! │  └── Foreign key constraints                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//! ```rust
//! use robodesk_core::validation::{validate_company_name, validate_quantity};
//!
//! validate_company_name("Acme Robotics sp. z o.o.").unwrap();
//! validate_quantity(5).unwrap();
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::ValidationError;
use crate::money::Money;
use crate::types::{ContractType, Prepayment, PrepaymentKind, RobotPricing};
use crate::types::{ItemLine, OfferLines, RobotLine};
use crate::{MAX_LEASE_MONTHS, MAX_LINE_QUANTITY};

/// Result type for validation operations.
pub type ValidationResult<T> = Result<T, ValidationError>;

static EMAIL: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("email pattern is valid")
});

// =============================================================================
// String Validators
// =============================================================================

fn required_max(field: &str, value: &str, max: usize) -> ValidationResult<()> {
    let value = value.trim();

    if value.is_empty() {
        return Err(ValidationError::required(field));
    }

    if value.chars().count() > max {
        return Err(ValidationError::TooLong {
            field: field.to_string(),
            max,
        });
    }

    Ok(())
}

/// Validates a client's company name.
///
/// ## Rules
/// - Must not be empty
/// - At most 200 characters
pub fn validate_company_name(name: &str) -> ValidationResult<()> {
    required_max("company_name", name, 200)
}

/// Validates an e-mail address.
///
/// ## Example
/// ```rust
/// use robodesk_core::validation::validate_email;
///
/// assert!(validate_email("sales@robodesk.pl").is_ok());
/// assert!(validate_email("sales@robodesk").is_err());
/// assert!(validate_email("").is_err());
/// ```
pub fn validate_email(email: &str) -> ValidationResult<()> {
    let email = email.trim();

    if email.is_empty() {
        return Err(ValidationError::required("email"));
    }

    if email.len() > 254 {
        return Err(ValidationError::TooLong {
            field: "email".to_string(),
            max: 254,
        });
    }

    if !EMAIL.is_match(email) {
        return Err(ValidationError::invalid_format(
            "email",
            "must look like name@domain.tld",
        ));
    }

    Ok(())
}

/// Validates a Polish NIP (tax id).
///
/// Dashes and spaces are allowed as separators. The check digit is the
/// weighted sum of the first nine digits modulo 11.
///
/// ## Example
/// ```rust
/// use robodesk_core::validation::validate_nip;
///
/// assert!(validate_nip("526-000-12-46").is_ok());
/// assert!(validate_nip("1234567890").is_err());
/// ```
pub fn validate_nip(nip: &str) -> ValidationResult<()> {
    const WEIGHTS: [u32; 9] = [6, 5, 7, 2, 3, 4, 5, 6, 7];

    let digits: Vec<u32> = nip
        .chars()
        .filter(|c| *c != '-' && !c.is_whitespace())
        .map(|c| c.to_digit(10))
        .collect::<Option<_>>()
        .ok_or_else(|| ValidationError::invalid_format("nip", "must contain only digits"))?;

    if digits.len() != 10 {
        return Err(ValidationError::invalid_format("nip", "must have 10 digits"));
    }

    let checksum = digits
        .iter()
        .zip(WEIGHTS)
        .map(|(d, w)| d * w)
        .sum::<u32>()
        % 11;

    if checksum != digits[9] {
        return Err(ValidationError::invalid_format("nip", "check digit mismatch"));
    }

    Ok(())
}

/// Validates a robot model name on the price list.
pub fn validate_robot_model(model: &str) -> ValidationResult<()> {
    required_max("robot_model", model, 100)
}

/// Validates the name of an ancillary item.
pub fn validate_item_name(name: &str) -> ValidationResult<()> {
    required_max("item_name", name, 200)
}

// =============================================================================
// Numeric Validators
// =============================================================================

/// Validates a line quantity.
///
/// ## Rules
/// - Must be positive (> 0)
/// - Must not exceed MAX_LINE_QUANTITY (999)
pub fn validate_quantity(qty: i64) -> ValidationResult<()> {
    if qty <= 0 {
        return Err(ValidationError::MustBePositive {
            field: "quantity".to_string(),
        });
    }

    if qty > MAX_LINE_QUANTITY {
        return Err(ValidationError::OutOfRange {
            field: "quantity".to_string(),
            min: 1,
            max: MAX_LINE_QUANTITY,
        });
    }

    Ok(())
}

/// Validates a lease term in months (1..=120).
pub fn validate_lease_months(months: u32) -> ValidationResult<()> {
    if months == 0 {
        return Err(ValidationError::MustBePositive {
            field: "lease_months".to_string(),
        });
    }

    if months > MAX_LEASE_MONTHS {
        return Err(ValidationError::OutOfRange {
            field: "lease_months".to_string(),
            min: 1,
            max: i64::from(MAX_LEASE_MONTHS),
        });
    }

    Ok(())
}

/// Validates that a price is not negative. Zero is allowed.
pub fn validate_price_non_negative(field: &str, price: Money) -> ValidationResult<()> {
    if price.is_negative() {
        return Err(ValidationError::Negative {
            field: field.to_string(),
        });
    }

    Ok(())
}

/// Validates a VAT rate in basis points (0..=10000).
pub fn validate_vat_rate_bps(bps: u32) -> ValidationResult<()> {
    if bps > 10_000 {
        return Err(ValidationError::OutOfRange {
            field: "vat_rate".to_string(),
            min: 0,
            max: 10_000,
        });
    }

    Ok(())
}

/// Validates a tracking-table month (1..=12).
pub fn validate_month(month: u32) -> ValidationResult<()> {
    if !(1..=12).contains(&month) {
        return Err(ValidationError::OutOfRange {
            field: "month".to_string(),
            min: 1,
            max: 12,
        });
    }

    Ok(())
}

/// Validates a prepayment specification.
///
/// ## Rules
/// - Percent: 0..=100
/// - Amount: not negative
pub fn validate_prepayment(prepayment: &Prepayment) -> ValidationResult<()> {
    match prepayment.kind {
        PrepaymentKind::None => Ok(()),
        PrepaymentKind::Percent => {
            if prepayment.value.is_sign_negative() && !prepayment.value.is_zero()
                || prepayment.value > rust_decimal::Decimal::ONE_HUNDRED
            {
                return Err(ValidationError::OutOfRange {
                    field: "prepayment".to_string(),
                    min: 0,
                    max: 100,
                });
            }
            Ok(())
        }
        PrepaymentKind::Amount => {
            validate_price_non_negative("prepayment", Money::from_decimal(prepayment.value))
        }
    }
}

// =============================================================================
// Composite Validators
// =============================================================================

/// Validates a price-list entry before it is saved.
///
/// ## Rules
/// - Model name required
/// - Sale price present (implicitly, by type) and not negative in every currency
/// - Promo, lowest and evidence prices not negative where set
pub fn validate_robot_pricing(robot: &RobotPricing) -> ValidationResult<()> {
    validate_robot_model(&robot.robot_model)?;

    for currency in crate::types::Currency::ALL {
        validate_price_non_negative("sale_price", robot.sale.get(currency))?;
    }
    for (_, price) in robot.promo.present() {
        validate_price_non_negative("promo_price", price)?;
    }
    for (_, price) in robot.lowest.present() {
        validate_price_non_negative("lowest_price", price)?;
    }
    for (_, price) in robot.evidence.present() {
        validate_price_non_negative("evidence_price", price)?;
    }

    Ok(())
}

/// Validates one robot line.
pub fn validate_robot_line(line: &RobotLine) -> ValidationResult<()> {
    validate_robot_model(&line.robot_model)?;
    validate_quantity(line.quantity)?;
    validate_price_non_negative("unit_price", line.unit_price)?;

    if line.contract_type == ContractType::Lease {
        let months = line
            .lease_months
            .ok_or_else(|| ValidationError::required("lease_months"))?;
        validate_lease_months(months)?;
    }

    Ok(())
}

/// Validates one ancillary item line.
pub fn validate_item_line(item: &ItemLine) -> ValidationResult<()> {
    validate_item_name(&item.name)?;
    validate_quantity(item.quantity)?;
    validate_price_non_negative("unit_price", item.unit_price)
}

/// Validates every line of an offer.
pub fn validate_offer_lines(lines: &OfferLines) -> ValidationResult<()> {
    lines.robots.iter().try_for_each(validate_robot_line)?;
    lines.items.iter().try_for_each(validate_item_line)
}

// =============================================================================
// UUID Validators
// =============================================================================

/// Validates a UUID string.
pub fn validate_uuid(id: &str) -> ValidationResult<()> {
    if id.trim().is_empty() {
        return Err(ValidationError::required("id"));
    }

    uuid::Uuid::parse_str(id)
        .map_err(|_| ValidationError::invalid_format("id", "must be a valid UUID"))?;

    Ok(())
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal::Decimal;

    #[test]
    fn test_validate_company_name() {
        assert!(validate_company_name("Acme").is_ok());
        assert!(validate_company_name("   ").is_err());
        assert!(validate_company_name(&"A".repeat(201)).is_err());
    }

    #[test]
    fn test_validate_email() {
        assert!(validate_email("a.b@example.com").is_ok());
        assert!(validate_email("no-at-sign.com").is_err());
        assert!(validate_email("two words@example.com").is_err());
    }

    #[test]
    fn test_validate_nip() {
        assert!(validate_nip("5260001246").is_ok());
        assert!(validate_nip("526 000 12 46").is_ok());
        assert!(validate_nip("526000124").is_err());
        assert!(validate_nip("52600012X6").is_err());
        assert!(validate_nip("5260001247").is_err());
    }

    #[test]
    fn test_validate_quantity() {
        assert!(validate_quantity(1).is_ok());
        assert!(validate_quantity(999).is_ok());
        assert!(validate_quantity(0).is_err());
        assert!(validate_quantity(1000).is_err());
    }

    #[test]
    fn test_validate_lease_months() {
        assert!(validate_lease_months(12).is_ok());
        assert!(matches!(
            validate_lease_months(0),
            Err(ValidationError::MustBePositive { .. })
        ));
        assert!(validate_lease_months(121).is_err());
    }

    #[test]
    fn test_validate_prepayment() {
        assert!(validate_prepayment(&Prepayment::none()).is_ok());
        assert!(validate_prepayment(&Prepayment::percent(Decimal::from(100))).is_ok());
        assert!(validate_prepayment(&Prepayment::percent(Decimal::from(101))).is_err());
        assert!(validate_prepayment(&Prepayment::percent(Decimal::from(-1))).is_err());
        assert!(validate_prepayment(&Prepayment::amount(Money::from_major(-5))).is_err());
    }

    #[test]
    fn test_validate_offer_lines() {
        let mut lease = RobotLine::lease("KettyBot", 1, 24);
        let lines = OfferLines {
            robots: vec![lease.clone()],
            items: vec![ItemLine::new("Installation", 1, Money::from_major(500))],
        };
        assert!(validate_offer_lines(&lines).is_ok());

        lease.lease_months = None;
        let lines = OfferLines {
            robots: vec![lease],
            items: vec![],
        };
        assert!(matches!(
            validate_offer_lines(&lines),
            Err(ValidationError::Required { .. })
        ));

        let bad_item = OfferLines {
            robots: vec![],
            items: vec![ItemLine::new("", 1, Money::zero())],
        };
        assert!(validate_offer_lines(&bad_item).is_err());
    }

    #[test]
    fn test_validate_month_and_uuid() {
        assert!(validate_month(1).is_ok());
        assert!(validate_month(12).is_ok());
        assert!(validate_month(0).is_err());
        assert!(validate_month(13).is_err());
        assert!(validate_uuid("550e8400-e29b-41d4-a716-446655440000").is_ok());
        assert!(validate_uuid("nope").is_err());
    }
}
