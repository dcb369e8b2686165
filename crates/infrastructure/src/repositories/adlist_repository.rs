use super::{parse_group_concat, replace_group_links};
use crate::database::GravityDb;
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, instrument, warn};
use umbra_dns_application::ports::AdlistRepositoryPort;
use umbra_dns_domain::{Adlist, AdlistStatus, DomainError};

type AdlistRow = (
    i64,
    String,
    i64,
    Option<String>,
    Option<i64>,
    Option<i64>,
    Option<i64>,
    i64,
    i64,
    i64,
    Option<String>,
);

const ADLIST_SELECT: &str =
    "SELECT a.id, a.address, a.enabled, a.comment, a.date_added, a.date_modified,
            a.date_updated, a.number, a.invalid_domains, a.status,
            (SELECT GROUP_CONCAT(group_id) FROM adlist_by_group g
              WHERE g.adlist_id = a.id) AS group_ids
     FROM adlist a";

pub struct SqliteAdlistRepository {
    db: Arc<GravityDb>,
}

impl SqliteAdlistRepository {
    pub fn new(db: Arc<GravityDb>) -> Self {
        Self { db }
    }

    fn row_to_adlist(row: AdlistRow) -> Adlist {
        let (
            id,
            address,
            enabled,
            comment,
            date_added,
            date_modified,
            date_updated,
            number,
            invalid_domains,
            status,
            groups,
        ) = row;

        Adlist {
            id: Some(id),
            address: Arc::from(address.as_str()),
            enabled: enabled != 0,
            comment: comment.map(|s| Arc::from(s.as_str())),
            group_ids: parse_group_concat(groups),
            date_added,
            date_modified,
            date_updated,
            number,
            invalid_domains,
            status: AdlistStatus::from_storage(status),
        }
    }

    #[instrument(skip(self))]
    pub async fn create(&self, address: &str, comment: Option<&str>) -> Result<i64, DomainError> {
        Adlist::validate_address(address).map_err(DomainError::InvalidAdlist)?;
        let pool = self.db.acquire().await?;

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO adlist (address, enabled, comment) VALUES (?1, 1, ?2) RETURNING id",
        )
        .bind(address)
        .bind(comment)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                DomainError::InvalidAdlist(format!("Adlist '{address}' already subscribed"))
            } else {
                error!(error = %e, "Failed to create adlist");
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        Ok(id)
    }

    #[instrument(skip(self))]
    pub async fn update(
        &self,
        id: i64,
        enabled: bool,
        comment: Option<&str>,
    ) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;
        let result = sqlx::query(
            "UPDATE adlist SET enabled = ?1, comment = ?2,
                    date_modified = cast(strftime('%s', 'now') as int)
             WHERE id = ?3",
        )
        .bind(enabled)
        .bind(comment)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to update adlist");
            DomainError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AdlistNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Fetch bookkeeping written by the gravity updater after each run.
    #[instrument(skip(self))]
    pub async fn record_fetch_result(
        &self,
        id: i64,
        status: AdlistStatus,
        number: i64,
        invalid_domains: i64,
    ) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;
        let result = sqlx::query(
            "UPDATE adlist SET status = ?1, number = ?2, invalid_domains = ?3,
                    date_updated = cast(strftime('%s', 'now') as int)
             WHERE id = ?4",
        )
        .bind(status.as_storage())
        .bind(number)
        .bind(invalid_domains)
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to record fetch result");
            DomainError::DatabaseError(e.to_string())
        })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::AdlistNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Two-step delete: drop the list's gravity rows first, then the
    /// subscription itself. An interruption in between leaves a list with
    /// no rows, which the next gravity run repairs.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: i64) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;

        sqlx::query("DELETE FROM gravity WHERE adlist_id = ?1")
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete gravity rows for adlist");
                DomainError::DatabaseError(e.to_string())
            })?;

        let result = sqlx::query("DELETE FROM adlist WHERE id = ?1")
            .bind(id)
            .execute(&pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete adlist");
                DomainError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            warn!(id, "Adlist vanished between gravity cleanup and delete");
            return Err(DomainError::AdlistNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Rewrite group assignments; same non-atomic contract as the
    /// domainlist variant.
    #[instrument(skip(self, group_ids))]
    pub async fn edit_groups(&self, id: i64, group_ids: &[i64]) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;

        let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM adlist WHERE id = ?1")
            .bind(id)
            .fetch_optional(&pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        if exists.is_none() {
            return Err(DomainError::AdlistNotFound(id.to_string()));
        }

        replace_group_links(
            &pool,
            "DELETE FROM adlist_by_group WHERE adlist_id = ?1",
            "INSERT INTO adlist_by_group (adlist_id, group_id) VALUES (?1, ?2)",
            id,
            group_ids,
        )
        .await
    }
}

#[async_trait]
impl AdlistRepositoryPort for SqliteAdlistRepository {
    #[instrument(skip(self))]
    async fn get_all(&self) -> Result<Vec<Adlist>, DomainError> {
        let pool = self.db.acquire().await?;
        let sql = format!("{ADLIST_SELECT} ORDER BY a.id");
        let rows: Vec<AdlistRow> = sqlx::query_as(&sql).fetch_all(&pool).await.map_err(|e| {
            error!(error = %e, "Failed to list adlists");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Self::row_to_adlist).collect())
    }

    #[instrument(skip(self))]
    async fn get_unavailable(&self) -> Result<Vec<Adlist>, DomainError> {
        let pool = self.db.acquire().await?;
        let sql = format!("{ADLIST_SELECT} WHERE a.enabled = 1 AND a.status IN (3, 4) ORDER BY a.id");
        let rows: Vec<AdlistRow> = sqlx::query_as(&sql).fetch_all(&pool).await.map_err(|e| {
            error!(error = %e, "Failed to query unavailable adlists");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().map(Self::row_to_adlist).collect())
    }
}
