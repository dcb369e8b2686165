use sqlx::SqlitePool;
use tracing::{error, warn};
use umbra_dns_domain::DomainError;

/// Outcome of one list-membership probe.
///
/// `Unavailable` is deliberately distinct from `NotFound`: a store that
/// cannot be read must degrade to not-blocked without poisoning the verdict
/// cache, never silently turn into a miss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListLookup {
    /// Matched; carries the matched row id where the view exposes one.
    Found(Option<i64>),
    NotFound,
    Unavailable,
}

/// A concurrent writer holding the store (the gravity updater rewrites it
/// wholesale) surfaces as SQLITE_BUSY.
fn is_busy(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            matches!(db.code().as_deref(), Some("5") | Some("517"))
                || db.message().contains("database is locked")
        }
        _ => false,
    }
}

/// Run one per-client membership statement. `sql` binds the domain at `?1`
/// and the group ids afterwards, see [`crate::gravity::ClientStatements`].
pub async fn domain_in_view(
    pool: &SqlitePool,
    sql: &str,
    domain: &str,
    group_ids: &[i64],
    list: &str,
) -> ListLookup {
    let mut query = sqlx::query_scalar::<_, Option<i64>>(sql).bind(domain);
    for id in group_ids {
        query = query.bind(id);
    }

    match query.fetch_optional(pool).await {
        Ok(Some(id)) => ListLookup::Found(id),
        Ok(None) => ListLookup::NotFound,
        Err(e) if is_busy(&e) => {
            warn!(list, domain, "Policy store is busy, treating list as unavailable");
            ListLookup::Unavailable
        }
        Err(e) => {
            error!(list, domain, error = %e, "List lookup failed");
            ListLookup::Unavailable
        }
    }
}

/// Audit-list membership. Entries starting with `*` are suffix patterns:
/// `*.example.com` matches subdomains only, `*example.com` also matches
/// the bare domain (and any name merely ending in "example.com").
pub async fn domain_in_audit(pool: &SqlitePool, domain: &str) -> ListLookup {
    let sql = "SELECT id FROM domain_audit WHERE domain = \
               CASE WHEN substr(domain, 1, 1) = '*' \
                    THEN '*' || substr(?1, -length(domain) + 1) \
                    ELSE ?1 END \
               LIMIT 1";

    match sqlx::query_scalar::<_, i64>(sql)
        .bind(domain)
        .fetch_optional(pool)
        .await
    {
        Ok(Some(id)) => ListLookup::Found(Some(id)),
        Ok(None) => ListLookup::NotFound,
        Err(e) if is_busy(&e) => {
            warn!(domain, "Policy store is busy, treating audit list as unavailable");
            ListLookup::Unavailable
        }
        Err(e) => {
            error!(domain, error = %e, "Audit lookup failed");
            ListLookup::Unavailable
        }
    }
}

/// Row counts exposed for diagnostics and the administrative surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountedTable {
    /// Gravity rows as recorded by the last updater run.
    Gravity,
    AllowedDomains,
    DeniedDomains,
    Clients,
    Groups,
    Adlists,
}

pub async fn table_count(pool: &SqlitePool, table: CountedTable) -> Result<i64, DomainError> {
    // The gravity row count is bookkept by the updater; counting the table
    // itself is only a fallback for stores predating the info property.
    if table == CountedTable::Gravity {
        let recorded: Option<String> =
            sqlx::query_scalar("SELECT value FROM info WHERE property = 'gravity_count'")
                .fetch_optional(pool)
                .await
                .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        if let Some(count) = recorded.and_then(|v| v.parse::<i64>().ok()) {
            return Ok(count);
        }
    }

    let sql = match table {
        CountedTable::Gravity => "SELECT COUNT(*) FROM gravity",
        CountedTable::AllowedDomains => {
            "SELECT COUNT(*) FROM domainlist WHERE type IN (0, 2) AND enabled = 1"
        }
        CountedTable::DeniedDomains => {
            "SELECT COUNT(*) FROM domainlist WHERE type IN (1, 3) AND enabled = 1"
        }
        CountedTable::Clients => "SELECT COUNT(*) FROM client",
        CountedTable::Groups => "SELECT COUNT(*) FROM \"group\"",
        CountedTable::Adlists => "SELECT COUNT(*) FROM adlist",
    };

    sqlx::query_scalar(sql)
        .fetch_one(pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))
}
