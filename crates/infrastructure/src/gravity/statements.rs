use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::sync::Arc;

/// Prepared lookup SQL for one client.
///
/// The group id list is baked in as a placeholder list of the right arity;
/// sqlx keeps the compiled statement in its per-connection cache, so after
/// the first use each lookup is a bind-and-step. The bundle is rebuilt
/// whenever the client's group membership changes.
#[derive(Debug)]
pub struct ClientStatements {
    pub client_id: i64,
    pub group_ids: Vec<i64>,
    pub allow_sql: String,
    pub deny_sql: String,
    pub gravity_sql: String,
}

/// `?1` is the domain; groups bind from `?2` on. A client with no groups
/// gets a statement that can never match.
fn membership_sql(select: &str, view: &str, group_count: usize) -> String {
    if group_count == 0 {
        return format!("SELECT {select} FROM {view} WHERE domain = ?1 AND 0 LIMIT 1");
    }
    let placeholders = (0..group_count)
        .map(|i| format!("?{}", i + 2))
        .collect::<Vec<_>>()
        .join(",");
    format!("SELECT {select} FROM {view} WHERE domain = ?1 AND group_id IN ({placeholders}) LIMIT 1")
}

impl ClientStatements {
    pub fn build(client_id: i64, group_ids: Vec<i64>) -> Self {
        let n = group_ids.len();
        Self {
            client_id,
            allow_sql: membership_sql("id", "vw_whitelist", n),
            deny_sql: membership_sql("id", "vw_blacklist", n),
            // The gravity view carries no row id; NULL keeps the result
            // shape uniform across the three lookups.
            gravity_sql: membership_sql("NULL", "vw_gravity", n),
            group_ids,
        }
    }
}

/// Per-client statement bundles, keyed by runtime client id.
pub struct StatementCache {
    inner: DashMap<i64, Arc<ClientStatements>, FxBuildHasher>,
}

impl StatementCache {
    pub fn new() -> Self {
        Self {
            inner: DashMap::with_hasher(FxBuildHasher),
        }
    }

    pub fn get(&self, client_id: i64) -> Option<Arc<ClientStatements>> {
        self.inner.get(&client_id).map(|s| Arc::clone(&s))
    }

    pub fn build_and_insert(&self, client_id: i64, group_ids: Vec<i64>) -> Arc<ClientStatements> {
        let stmts = Arc::new(ClientStatements::build(client_id, group_ids));
        self.inner.insert(client_id, Arc::clone(&stmts));
        stmts
    }

    pub fn remove(&self, client_id: i64) {
        self.inner.remove(&client_id);
    }

    pub fn clear(&self) {
        self.inner.clear();
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for StatementCache {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_membership_sql_arity() {
        let stmts = ClientStatements::build(1, vec![0, 4, 7]);
        assert_eq!(
            stmts.allow_sql,
            "SELECT id FROM vw_whitelist WHERE domain = ?1 AND group_id IN (?2,?3,?4) LIMIT 1"
        );
        assert_eq!(
            stmts.gravity_sql,
            "SELECT NULL FROM vw_gravity WHERE domain = ?1 AND group_id IN (?2,?3,?4) LIMIT 1"
        );
    }

    #[test]
    fn test_no_groups_never_matches() {
        let stmts = ClientStatements::build(1, vec![]);
        assert!(stmts.deny_sql.contains("AND 0"));
    }

    #[test]
    fn test_cache_replaces_on_rebuild() {
        let cache = StatementCache::new();
        cache.build_and_insert(3, vec![0]);
        cache.build_and_insert(3, vec![0, 5]);
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get(3).unwrap().group_ids, vec![0, 5]);

        cache.remove(3);
        assert!(cache.get(3).is_none());
    }
}
