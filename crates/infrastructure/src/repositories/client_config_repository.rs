use super::{parse_group_concat, replace_group_links};
use crate::database::GravityDb;
use std::sync::Arc;
use tracing::{error, instrument};
use umbra_dns_domain::DomainError;

/// A configured client row. The identifier is free-form: an IP, a CIDR
/// subnet, a hardware address, a hostname or an interface marker (":eth0").
#[derive(Debug, Clone)]
pub struct ClientConfigEntry {
    pub id: i64,
    pub identifier: String,
    pub comment: Option<String>,
    pub group_ids: Vec<i64>,
    pub date_added: Option<i64>,
    pub date_modified: Option<i64>,
}

type ClientRow = (i64, String, Option<String>, Option<i64>, Option<i64>, Option<String>);

pub struct SqliteClientConfigRepository {
    db: Arc<GravityDb>,
}

impl SqliteClientConfigRepository {
    pub fn new(db: Arc<GravityDb>) -> Self {
        Self { db }
    }

    fn row_to_entry(row: ClientRow) -> ClientConfigEntry {
        let (id, identifier, comment, date_added, date_modified, groups) = row;
        ClientConfigEntry {
            id,
            identifier,
            comment,
            group_ids: parse_group_concat(groups),
            date_added,
            date_modified,
        }
    }

    #[instrument(skip(self))]
    pub async fn create(
        &self,
        identifier: &str,
        comment: Option<&str>,
    ) -> Result<i64, DomainError> {
        if identifier.trim().is_empty() {
            return Err(DomainError::ClientNotFound(
                "Client identifier cannot be empty".to_string(),
            ));
        }
        let pool = self.db.acquire().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO client (ip, comment) VALUES (?1, ?2) RETURNING id",
        )
        .bind(identifier)
        .bind(comment)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                DomainError::ClientNotFound(format!("Client '{identifier}' already configured"))
            } else {
                error!(error = %e, "Failed to create client entry");
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn get_all(&self) -> Result<Vec<ClientConfigEntry>, DomainError> {
        let pool = self.db.acquire().await?;
        let rows: Vec<ClientRow> = sqlx::query_as(
            "SELECT c.id, c.ip, c.comment, c.date_added, c.date_modified,
                    (SELECT GROUP_CONCAT(group_id) FROM client_by_group g
                      WHERE g.client_id = c.id) AS group_ids
             FROM client c ORDER BY c.id",
        )
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to list client entries");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Self::row_to_entry).collect())
    }

    #[instrument(skip(self))]
    pub async fn delete(&self, identifier: &str) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;
        let result = sqlx::query("DELETE FROM client WHERE ip = ?1")
            .bind(identifier)
            .execute(&pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete client entry");
                DomainError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ClientNotFound(identifier.to_string()));
        }
        Ok(())
    }

    /// Same non-atomic group rewrite contract as the list repositories.
    #[instrument(skip(self, group_ids))]
    pub async fn edit_groups(
        &self,
        identifier: &str,
        group_ids: &[i64],
    ) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;

        let id: Option<i64> = sqlx::query_scalar("SELECT id FROM client WHERE ip = ?1")
            .bind(identifier)
            .fetch_optional(&pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        let id = id.ok_or_else(|| DomainError::ClientNotFound(identifier.to_string()))?;

        replace_group_links(
            &pool,
            "DELETE FROM client_by_group WHERE client_id = ?1",
            "INSERT INTO client_by_group (client_id, group_id) VALUES (?1, ?2)",
            id,
            group_ids,
        )
        .await
    }
}
