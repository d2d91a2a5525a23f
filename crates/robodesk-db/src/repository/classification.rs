//! # Classification Repository
//!
//! Client type, market and tag sets.
//!
//! `apply` reads the current set, diffs it against the desired one and
//! writes only the difference, all in one transaction. A failure leaves the
//! previous set untouched.

use robodesk_core::classification::{diff_sets, ClassificationKind, SetDiff};
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::DbResult;

/// Repository for client classification sets.
#[derive(Debug, Clone)]
pub struct ClassificationRepository {
    pool: SqlitePool,
}

impl ClassificationRepository {
    /// Creates a new ClassificationRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClassificationRepository { pool }
    }

    /// Codes of one set, sorted.
    pub async fn get(&self, client_id: &str, kind: ClassificationKind) -> DbResult<Vec<String>> {
        let sql = format!(
            "SELECT code FROM {} WHERE client_id = ?1 ORDER BY code",
            kind.table_name()
        );
        let codes: Vec<String> = sqlx::query_scalar(&sql)
            .bind(client_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(codes)
    }

    /// Replaces one set with `desired` and returns the applied diff.
    pub async fn apply(
        &self,
        client_id: &str,
        kind: ClassificationKind,
        desired: &[String],
    ) -> DbResult<SetDiff> {
        let table = kind.table_name();
        let mut tx = self.pool.begin().await?;

        let select = format!("SELECT code FROM {} WHERE client_id = ?1", table);
        let current: Vec<String> = sqlx::query_scalar(&select)
            .bind(client_id)
            .fetch_all(&mut *tx)
            .await?;

        let diff = diff_sets(&current, desired);
        if diff.is_empty() {
            return Ok(diff);
        }

        let delete = format!("DELETE FROM {} WHERE client_id = ?1 AND code = ?2", table);
        for code in &diff.to_remove {
            sqlx::query(&delete)
                .bind(client_id)
                .bind(code)
                .execute(&mut *tx)
                .await?;
        }

        let insert = format!("INSERT INTO {} (client_id, code) VALUES (?1, ?2)", table);
        for code in &diff.to_add {
            sqlx::query(&insert)
                .bind(client_id)
                .bind(code)
                .execute(&mut *tx)
                .await?;
        }

        tx.commit().await?;

        debug!(
            client_id = %client_id,
            table = table,
            added = diff.to_add.len(),
            removed = diff.to_remove.len(),
            "Classification applied"
        );
        Ok(diff)
    }
}
