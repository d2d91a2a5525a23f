//! # Client Repository
//!
//! The minimal client row that offers and contracts belong to.

use chrono::{DateTime, Utc};
use robodesk_core::Client;
use sqlx::SqlitePool;
use tracing::debug;

use crate::error::{DbError, DbResult};

#[derive(sqlx::FromRow)]
struct ClientRow {
    id: String,
    company_name: String,
    email: Option<String>,
    nip: Option<String>,
    created_at: DateTime<Utc>,
}

impl From<ClientRow> for Client {
    fn from(row: ClientRow) -> Self {
        Client {
            id: row.id,
            company_name: row.company_name,
            email: row.email,
            nip: row.nip,
            created_at: row.created_at,
        }
    }
}

/// Repository for client database operations.
#[derive(Debug, Clone)]
pub struct ClientRepository {
    pool: SqlitePool,
}

impl ClientRepository {
    /// Creates a new ClientRepository.
    pub fn new(pool: SqlitePool) -> Self {
        ClientRepository { pool }
    }

    /// Inserts a client.
    pub async fn insert(&self, client: &Client) -> DbResult<()> {
        debug!(id = %client.id, company = %client.company_name, "Inserting client");

        sqlx::query(
            r#"
            INSERT INTO clients (id, company_name, email, nip, created_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&client.id)
        .bind(&client.company_name)
        .bind(&client.email)
        .bind(&client.nip)
        .bind(client.created_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Gets a client by ID.
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Client>> {
        let row: Option<ClientRow> = sqlx::query_as(
            r#"
            SELECT id, company_name, email, nip, created_at
            FROM clients
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Client::from))
    }

    /// Gets a client by ID or fails with NotFound.
    pub async fn require(&self, id: &str) -> DbResult<Client> {
        self.get_by_id(id)
            .await?
            .ok_or_else(|| DbError::not_found("Client", id))
    }

    /// Lists clients by company name.
    pub async fn list(&self) -> DbResult<Vec<Client>> {
        let rows: Vec<ClientRow> = sqlx::query_as(
            r#"
            SELECT id, company_name, email, nip, created_at
            FROM clients
            ORDER BY company_name COLLATE NOCASE
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(rows.into_iter().map(Client::from).collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::repository::test_support::{seed_client, test_db};

    #[tokio::test]
    async fn test_insert_and_get() {
        let db = test_db().await;
        let client = seed_client(&db).await;

        let loaded = db.clients().require(&client.id).await.unwrap();
        assert_eq!(loaded.company_name, "Hotel Wawel");
        assert_eq!(loaded.email.as_deref(), Some("biuro@hotelwawel.pl"));

        assert!(db.clients().get_by_id("missing").await.unwrap().is_none());
        assert_eq!(db.clients().list().await.unwrap().len(), 1);
    }
}
