use super::{parse_group_concat, replace_group_links};
use crate::database::GravityDb;
use std::sync::Arc;
use tracing::{error, instrument};
use umbra_dns_domain::{DomainError, DomainListEntry, ListKind, ListType};

type DomainListRow = (
    i64,
    i64,
    String,
    i64,
    Option<i64>,
    Option<i64>,
    Option<String>,
    Option<String>,
);

/// Administrative access to the domainlist table. List membership during
/// query classification never goes through here; it reads the vw_* views.
pub struct SqliteDomainListRepository {
    db: Arc<GravityDb>,
}

impl SqliteDomainListRepository {
    pub fn new(db: Arc<GravityDb>) -> Self {
        Self { db }
    }

    fn row_to_entry(row: DomainListRow) -> Option<DomainListEntry> {
        let (id, stored_type, domain, enabled, date_added, date_modified, comment, groups) = row;
        let (list_type, kind) = DomainListEntry::from_storage_type(stored_type)?;

        Some(DomainListEntry {
            id: Some(id),
            domain: Arc::from(domain.as_str()),
            list_type,
            kind,
            enabled: enabled != 0,
            comment: comment.map(|s| Arc::from(s.as_str())),
            group_ids: parse_group_concat(groups),
            date_added,
            date_modified,
        })
    }

    #[instrument(skip(self))]
    pub async fn add(
        &self,
        domain: &str,
        list_type: ListType,
        kind: ListKind,
        enabled: bool,
        comment: Option<&str>,
    ) -> Result<i64, DomainError> {
        let pool = self.db.acquire().await?;
        let stored_type = DomainListEntry::storage_type(list_type, kind);

        let id: i64 = sqlx::query_scalar(
            "INSERT INTO domainlist (type, domain, enabled, comment)
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(stored_type)
        .bind(domain)
        .bind(enabled)
        .bind(comment)
        .fetch_one(&pool)
        .await
        .map_err(|e| {
            if e.to_string().contains("UNIQUE constraint failed") {
                DomainError::InvalidListEntry(format!(
                    "Domain '{domain}' already on the {} {} list",
                    list_type.as_str(),
                    kind.as_str()
                ))
            } else {
                error!(error = %e, "Failed to add list entry");
                DomainError::DatabaseError(e.to_string())
            }
        })?;

        Ok(id)
    }

    /// Add or move an entry, preserving its original add date. `previous`
    /// names the classification the entry is moved away from; the default
    /// is an in-place replace.
    #[instrument(skip(self))]
    pub async fn replace(
        &self,
        domain: &str,
        list_type: ListType,
        kind: ListKind,
        previous: Option<(ListType, ListKind)>,
        enabled: bool,
        comment: Option<&str>,
    ) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;
        let new_type = DomainListEntry::storage_type(list_type, kind);
        let (old_type_t, old_kind) = previous.unwrap_or((list_type, kind));
        let old_type = DomainListEntry::storage_type(old_type_t, old_kind);

        sqlx::query(
            "REPLACE INTO domainlist (domain, type, enabled, comment, date_added)
             VALUES (?1, ?2, ?3, ?4,
                     COALESCE((SELECT date_added FROM domainlist WHERE domain = ?1 AND type = ?5),
                              cast(strftime('%s', 'now') as int)))",
        )
        .bind(domain)
        .bind(new_type)
        .bind(enabled)
        .bind(comment)
        .bind(old_type)
        .execute(&pool)
        .await
        .map_err(|e| {
            error!(error = %e, "Failed to replace list entry");
            DomainError::DatabaseError(e.to_string())
        })?;

        // The entry left its previous classification behind
        if old_type != new_type {
            sqlx::query("DELETE FROM domainlist WHERE domain = ?1 AND type = ?2")
                .bind(domain)
                .bind(old_type)
                .execute(&pool)
                .await
                .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    pub async fn delete(
        &self,
        domain: &str,
        list_type: ListType,
        kind: ListKind,
    ) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;
        let stored_type = DomainListEntry::storage_type(list_type, kind);

        let result = sqlx::query("DELETE FROM domainlist WHERE domain = ?1 AND type = ?2")
            .bind(domain)
            .bind(stored_type)
            .execute(&pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to delete list entry");
                DomainError::DatabaseError(e.to_string())
            })?;

        if result.rows_affected() == 0 {
            return Err(DomainError::ListEntryNotFound(domain.to_string()));
        }
        Ok(())
    }

    /// All entries, optionally restricted to one classification. Rows with
    /// an unknown stored type are skipped rather than failing the listing.
    #[instrument(skip(self))]
    pub async fn get_all(
        &self,
        filter: Option<(ListType, ListKind)>,
    ) -> Result<Vec<DomainListEntry>, DomainError> {
        let pool = self.db.acquire().await?;

        let base = "SELECT d.id, d.type, d.domain, d.enabled, d.date_added, d.date_modified,
                           d.comment,
                           (SELECT GROUP_CONCAT(group_id) FROM domainlist_by_group g
                             WHERE g.domainlist_id = d.id) AS group_ids
                    FROM domainlist d";

        let rows: Vec<DomainListRow> = match filter {
            Some((list_type, kind)) => {
                let sql = format!("{base} WHERE d.type = ?1 ORDER BY d.id");
                sqlx::query_as(&sql)
                    .bind(DomainListEntry::storage_type(list_type, kind))
                    .fetch_all(&pool)
                    .await
            }
            None => {
                let sql = format!("{base} ORDER BY d.id");
                sqlx::query_as(&sql).fetch_all(&pool).await
            }
        }
        .map_err(|e| {
            error!(error = %e, "Failed to list entries");
            DomainError::DatabaseError(e.to_string())
        })?;

        Ok(rows.into_iter().filter_map(Self::row_to_entry).collect())
    }

    /// Rewrite the group assignments of one entry. Not atomic: a failing
    /// insert aborts and leaves the assignments partially applied.
    #[instrument(skip(self, group_ids))]
    pub async fn edit_groups(
        &self,
        domain: &str,
        list_type: ListType,
        kind: ListKind,
        group_ids: &[i64],
    ) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;
        let stored_type = DomainListEntry::storage_type(list_type, kind);

        let id: Option<i64> =
            sqlx::query_scalar("SELECT id FROM domainlist WHERE domain = ?1 AND type = ?2")
                .bind(domain)
                .bind(stored_type)
                .fetch_optional(&pool)
                .await
                .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        let id = id.ok_or_else(|| DomainError::ListEntryNotFound(domain.to_string()))?;

        replace_group_links(
            &pool,
            "DELETE FROM domainlist_by_group WHERE domainlist_id = ?1",
            "INSERT INTO domainlist_by_group (domainlist_id, group_id) VALUES (?1, ?2)",
            id,
            group_ids,
        )
        .await
    }

    /// Add a domain to the audit list. Patterns starting with `*` audit a
    /// whole suffix.
    #[instrument(skip(self))]
    pub async fn add_to_audit(&self, domain: &str) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;
        sqlx::query("INSERT OR IGNORE INTO domain_audit (domain) VALUES (?1)")
            .bind(domain)
            .execute(&pool)
            .await
            .map_err(|e| {
                error!(error = %e, "Failed to add audit entry");
                DomainError::DatabaseError(e.to_string())
            })?;
        Ok(())
    }
}
