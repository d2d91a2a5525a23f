//! # Contract Repository
//!
//! Contracts, the lookups contract numbering needs, and contract versions.
//!
//! ## Numbering Lookups
//! ```text
//! mask strategy        numbers_with_prefix("CNT-2024-") → every number of that year
//! sequential strategy  latest_number()                  → number of the newest contract
//! ```
//!
//! Neither lookup reserves anything. The UNIQUE index on
//! `contracts.contract_number` is what rejects a number issued twice.
//!
//! ## Versions
//! `version` starts at 1 and grows by one per upload. The UNIQUE index on
//! `(contract_id, version)` rejects a concurrent duplicate, so a number is
//! never reused.

use chrono::{DateTime, NaiveDate, Utc};
use robodesk_core::lifecycle::ContractDraft;
use robodesk_core::types::{
    BillingSchedule, Contract, ContractStatus, ContractVersion, Currency, PaymentModel,
};
use robodesk_core::Money;
use sqlx::SqlitePool;
use tracing::debug;

use super::{cents, money, new_id};
use crate::error::{DbError, DbResult};

const CONTRACT_COLUMNS: &str = r#"
    id, client_id, offer_id, contract_number, status, payment_model, currency,
    monthly_payment_cents, start_date, end_date, billing_schedule,
    total_purchase_value_cents, total_monthly_contracted_cents,
    warranty_cost_cents, implementation_cost_cents, other_services_cost_cents,
    created_by, created_at
"#;

#[derive(sqlx::FromRow)]
struct ContractRow {
    id: String,
    client_id: String,
    offer_id: Option<String>,
    contract_number: String,
    status: ContractStatus,
    payment_model: PaymentModel,
    currency: Currency,
    monthly_payment_cents: i64,
    start_date: NaiveDate,
    end_date: Option<NaiveDate>,
    billing_schedule: BillingSchedule,
    total_purchase_value_cents: i64,
    total_monthly_contracted_cents: i64,
    warranty_cost_cents: i64,
    implementation_cost_cents: i64,
    other_services_cost_cents: i64,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl From<ContractRow> for Contract {
    fn from(row: ContractRow) -> Self {
        Contract {
            id: row.id,
            client_id: row.client_id,
            offer_id: row.offer_id,
            contract_number: row.contract_number,
            status: row.status,
            payment_model: row.payment_model,
            currency: row.currency,
            monthly_payment: money(row.monthly_payment_cents),
            start_date: row.start_date,
            end_date: row.end_date,
            billing_schedule: row.billing_schedule,
            total_purchase_value: money(row.total_purchase_value_cents),
            total_monthly_contracted: money(row.total_monthly_contracted_cents),
            warranty_cost: money(row.warranty_cost_cents),
            implementation_cost: money(row.implementation_cost_cents),
            other_services_cost: money(row.other_services_cost_cents),
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct VersionRow {
    id: String,
    contract_id: String,
    version: i64,
    file_path: String,
    created_by: String,
    created_at: DateTime<Utc>,
}

impl From<VersionRow> for ContractVersion {
    fn from(row: VersionRow) -> Self {
        ContractVersion {
            id: row.id,
            contract_id: row.contract_id,
            version: row.version,
            file_path: row.file_path,
            created_by: row.created_by,
            created_at: row.created_at,
        }
    }
}

/// Repository for contract database operations.
#[derive(Debug, Clone)]
pub struct ContractRepository {
    pool: SqlitePool,
}

impl ContractRepository {
    /// Creates a new ContractRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ContractRepository { pool }
    }

    /// Inserts a contract.
    ///
    /// ## Errors
    /// A number already in use is a `UniqueViolation` on
    /// `contracts.contract_number` carrying the number.
    pub async fn insert(&self, contract: &Contract) -> DbResult<()> {
        debug!(
            id = %contract.id,
            contract_number = %contract.contract_number,
            payment_model = ?contract.payment_model,
            "Inserting contract"
        );

        sqlx::query(
            r#"
            INSERT INTO contracts (
                id, client_id, offer_id, contract_number, status, payment_model, currency,
                monthly_payment_cents, start_date, end_date, billing_schedule,
                total_purchase_value_cents, total_monthly_contracted_cents,
                warranty_cost_cents, implementation_cost_cents, other_services_cost_cents,
                created_by, created_at
            ) VALUES (
                ?1, ?2, ?3, ?4, ?5, ?6, ?7,
                ?8, ?9, ?10, ?11,
                ?12, ?13,
                ?14, ?15, ?16,
                ?17, ?18
            )
            "#,
        )
        .bind(&contract.id)
        .bind(&contract.client_id)
        .bind(&contract.offer_id)
        .bind(&contract.contract_number)
        .bind(contract.status)
        .bind(contract.payment_model)
        .bind(contract.currency)
        .bind(cents(contract.monthly_payment))
        .bind(contract.start_date)
        .bind(contract.end_date)
        .bind(contract.billing_schedule)
        .bind(cents(contract.total_purchase_value))
        .bind(cents(contract.total_monthly_contracted))
        .bind(cents(contract.warranty_cost))
        .bind(cents(contract.implementation_cost))
        .bind(cents(contract.other_services_cost))
        .bind(&contract.created_by)
        .bind(contract.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(&contract.contract_number))?;

        Ok(())
    }

    /// Inserts a contract derived from a won offer and returns it.
    ///
    /// Service costs start at zero.
    pub async fn insert_draft(&self, draft: ContractDraft) -> DbResult<Contract> {
        let contract = Contract {
            id: new_id(),
            client_id: draft.client_id,
            offer_id: draft.offer_id,
            contract_number: draft.contract_number,
            status: draft.status,
            payment_model: draft.payment_model,
            currency: draft.currency,
            monthly_payment: draft.monthly_payment,
            start_date: draft.start_date,
            end_date: draft.end_date,
            billing_schedule: draft.billing_schedule,
            total_purchase_value: draft.total_purchase_value,
            total_monthly_contracted: draft.total_monthly_contracted,
            warranty_cost: Money::zero(),
            implementation_cost: Money::zero(),
            other_services_cost: Money::zero(),
            created_by: draft.created_by,
            created_at: Utc::now(),
        };

        self.insert(&contract).await?;
        Ok(contract)
    }

    /// Gets a contract by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Contract>> {
        let sql = format!("SELECT {} FROM contracts WHERE id = ?1", CONTRACT_COLUMNS);
        let row: Option<ContractRow> = sqlx::query_as(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Contract::from))
    }

    /// Gets a contract by ID or fails with NotFound.
    pub async fn require(&self, id: &str) -> DbResult<Contract> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Contract", id))
    }

    /// Lists contracts, newest first.
    pub async fn list(&self) -> DbResult<Vec<Contract>> {
        let sql = format!(
            "SELECT {} FROM contracts ORDER BY created_at DESC, rowid DESC",
            CONTRACT_COLUMNS
        );
        let rows: Vec<ContractRow> = sqlx::query_as(&sql).fetch_all(&self.pool).await?;
        Ok(rows.into_iter().map(Contract::from).collect())
    }

    /// Every contract number starting with `prefix`.
    ///
    /// `%` and `_` in the prefix are matched literally.
    pub async fn numbers_with_prefix(&self, prefix: &str) -> DbResult<Vec<String>> {
        let pattern = format!(
            "{}%",
            prefix
                .replace('\\', "\\\\")
                .replace('%', "\\%")
                .replace('_', "\\_")
        );

        let numbers: Vec<String> = sqlx::query_scalar(
            r#"
            SELECT contract_number
            FROM contracts
            WHERE contract_number LIKE ?1 ESCAPE '\'
            "#,
        )
        .bind(pattern)
        .fetch_all(&self.pool)
        .await?;

        Ok(numbers)
    }

    /// Number of the most recently created contract.
    pub async fn latest_number(&self) -> DbResult<Option<String>> {
        let number: Option<String> = sqlx::query_scalar(
            r#"
            SELECT contract_number
            FROM contracts
            ORDER BY created_at DESC, rowid DESC
            LIMIT 1
            "#,
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(number)
    }

    /// Sets the status of a contract.
    pub async fn update_status(&self, id: &str, status: ContractStatus) -> DbResult<()> {
        debug!(id = %id, status = ?status, "Updating contract status");

        let result = sqlx::query("UPDATE contracts SET status = ?2 WHERE id = ?1")
            .bind(id)
            .bind(status)
            .execute(&self.pool)
            .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contract", id));
        }

        Ok(())
    }

    /// Sets the warranty, implementation and other-services costs.
    pub async fn update_service_costs(
        &self,
        id: &str,
        warranty: Money,
        implementation: Money,
        other: Money,
    ) -> DbResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE contracts SET
                warranty_cost_cents = ?2,
                implementation_cost_cents = ?3,
                other_services_cost_cents = ?4
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(cents(warranty))
        .bind(cents(implementation))
        .bind(cents(other))
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Contract", id));
        }

        Ok(())
    }

    // =========================================================================
    // Versions
    // =========================================================================

    /// The version number the next upload gets.
    pub async fn next_version(&self, contract_id: &str) -> DbResult<i64> {
        let max: Option<i64> = sqlx::query_scalar(
            "SELECT MAX(version) FROM contract_versions WHERE contract_id = ?1",
        )
        .bind(contract_id)
        .fetch_one(&self.pool)
        .await?;

        Ok(max.unwrap_or(0) + 1)
    }

    /// Records an uploaded version.
    ///
    /// ## Errors
    /// A version number already recorded for the contract is a
    /// `UniqueViolation`.
    pub async fn insert_version(&self, version: &ContractVersion) -> DbResult<()> {
        debug!(
            contract_id = %version.contract_id,
            version = version.version,
            path = %version.file_path,
            "Inserting contract version"
        );

        sqlx::query(
            r#"
            INSERT INTO contract_versions (id, contract_id, version, file_path, created_by, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&version.id)
        .bind(&version.contract_id)
        .bind(version.version)
        .bind(&version.file_path)
        .bind(&version.created_by)
        .bind(version.created_at)
        .execute(&self.pool)
        .await
        .map_err(|e| DbError::from(e).with_value(version.version.to_string()))?;

        Ok(())
    }

    /// Versions of a contract, newest first.
    pub async fn list_versions(&self, contract_id: &str) -> DbResult<Vec<ContractVersion>> {
        let rows: Vec<VersionRow> = sqlx::query_as(
            r#"
            SELECT id, contract_id, version, file_path, created_by, created_at
            FROM contract_versions
            WHERE contract_id = ?1
            ORDER BY version DESC
            "#,
        )
        .bind(contract_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(ContractVersion::from).collect())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::repository::test_support::{seed_client, test_db};
    use crate::Database;

    pub(crate) fn draft(client_id: &str, number: &str) -> ContractDraft {
        ContractDraft {
            client_id: client_id.to_string(),
            offer_id: None,
            contract_number: number.to_string(),
            status: ContractStatus::Draft,
            payment_model: PaymentModel::Lease,
            currency: Currency::Eur,
            monthly_payment: Money::from_major(100),
            start_date: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2025, 3, 15),
            billing_schedule: BillingSchedule::Quarterly,
            total_purchase_value: Money::zero(),
            total_monthly_contracted: Money::from_major(100),
            created_by: "user-1".to_string(),
        }
    }

    async fn seed_contract(db: &Database, number: &str) -> Contract {
        let client = seed_client(db).await;
        db.contracts()
            .insert_draft(draft(&client.id, number))
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_insert_draft_round_trip() {
        let db = test_db().await;
        let contract = seed_contract(&db, "CNT-2024-001").await;

        let loaded = db.contracts().require(&contract.id).await.unwrap();
        assert_eq!(loaded.contract_number, "CNT-2024-001");
        assert_eq!(loaded.payment_model, PaymentModel::Lease);
        assert_eq!(loaded.currency, Currency::Eur);
        assert_eq!(loaded.billing_schedule, BillingSchedule::Quarterly);
        assert_eq!(loaded.end_date, NaiveDate::from_ymd_opt(2025, 3, 15));
        assert_eq!(loaded.monthly_payment, Money::from_major(100));
        assert_eq!(loaded.warranty_cost, Money::zero());
    }

    #[tokio::test]
    async fn test_duplicate_number_rejected() {
        let db = test_db().await;
        let contract = seed_contract(&db, "CNT-2024-001").await;

        let err = db
            .contracts()
            .insert_draft(draft(&contract.client_id, "CNT-2024-001"))
            .await
            .unwrap_err();
        assert!(err.is_unique_violation_on("contracts.contract_number"));
        assert!(err.to_string().contains("CNT-2024-001"));
    }

    #[tokio::test]
    async fn test_numbering_lookups() {
        let db = test_db().await;
        let contract = seed_contract(&db, "CNT-2024-007").await;
        let repo = db.contracts();
        for number in ["CNT-2024-012", "CNT-2023-099", "CNTX2024-500"] {
            repo.insert_draft(draft(&contract.client_id, number))
                .await
                .unwrap();
        }

        let mut numbers = repo.numbers_with_prefix("CNT-2024-").await.unwrap();
        numbers.sort();
        assert_eq!(numbers, vec!["CNT-2024-007", "CNT-2024-012"]);

        // "_" must not act as a wildcard
        assert!(repo.numbers_with_prefix("CNT_2024").await.unwrap().is_empty());

        assert_eq!(
            repo.latest_number().await.unwrap().as_deref(),
            Some("CNTX2024-500")
        );
    }

    #[tokio::test]
    async fn test_versions_increase_and_never_repeat() {
        let db = test_db().await;
        let contract = seed_contract(&db, "CNT-2024-001").await;
        let repo = db.contracts();

        assert_eq!(repo.next_version(&contract.id).await.unwrap(), 1);

        for expected in 1..=2 {
            let n = repo.next_version(&contract.id).await.unwrap();
            assert_eq!(n, expected);
            repo.insert_version(&ContractVersion {
                id: new_id(),
                contract_id: contract.id.clone(),
                version: n,
                file_path: format!("contracts/{}/v{}.pdf", contract.id, n),
                created_by: "user-1".to_string(),
                created_at: Utc::now(),
            })
            .await
            .unwrap();
        }

        let dup = repo
            .insert_version(&ContractVersion {
                id: new_id(),
                contract_id: contract.id.clone(),
                version: 2,
                file_path: "dup.pdf".to_string(),
                created_by: "user-1".to_string(),
                created_at: Utc::now(),
            })
            .await;
        assert!(matches!(dup, Err(DbError::UniqueViolation { .. })));

        let versions = repo.list_versions(&contract.id).await.unwrap();
        assert_eq!(versions.iter().map(|v| v.version).collect::<Vec<_>>(), vec![2, 1]);
    }

    #[tokio::test]
    async fn test_status_update() {
        let db = test_db().await;
        let contract = seed_contract(&db, "CNT-2024-001").await;

        db.contracts()
            .update_status(&contract.id, ContractStatus::Active)
            .await
            .unwrap();
        let loaded = db.contracts().require(&contract.id).await.unwrap();
        assert_eq!(loaded.status, ContractStatus::Active);
    }
}
