pub mod adlist_repository;
pub mod client_config_repository;
pub mod domain_list_repository;
pub mod group_repository;

pub use adlist_repository::SqliteAdlistRepository;
pub use client_config_repository::SqliteClientConfigRepository;
pub use domain_list_repository::SqliteDomainListRepository;
pub use group_repository::SqliteGroupRepository;

use sqlx::SqlitePool;
use umbra_dns_domain::DomainError;

pub(crate) fn parse_group_concat(raw: Option<String>) -> Vec<i64> {
    match raw {
        Some(ids) => ids
            .split(',')
            .filter_map(|s| s.trim().parse::<i64>().ok())
            .collect(),
        None => Vec::new(),
    }
}

/// Replace the group assignments of one row: delete all, then insert the
/// new set one by one. Deliberately not a transaction; on failure the row
/// keeps whatever assignments were inserted so far and the caller reports
/// the error. Mirrors how the store's other writers behave.
pub(crate) async fn replace_group_links(
    pool: &SqlitePool,
    delete_sql: &str,
    insert_sql: &str,
    row_id: i64,
    group_ids: &[i64],
) -> Result<(), DomainError> {
    sqlx::query(delete_sql)
        .bind(row_id)
        .execute(pool)
        .await
        .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

    for group_id in group_ids {
        sqlx::query(insert_sql)
            .bind(row_id)
            .bind(group_id)
            .execute(pool)
            .await
            .map_err(|e| {
                DomainError::DatabaseError(format!(
                    "Failed to assign group {group_id}: {e}"
                ))
            })?;
    }
    Ok(())
}
