use crate::database::GravityDb;
use arc_swap::ArcSwap;
use async_trait::async_trait;
use dashmap::DashMap;
use fancy_regex::Regex;
use rustc_hash::{FxBuildHasher, FxHashSet};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use umbra_dns_application::ports::RegexEnginePort;
use umbra_dns_domain::DomainError;

struct CompiledFilter {
    db_id: i64,
    pattern: Arc<str>,
    regex: Regex,
}

#[derive(Default)]
struct ClientFilterSet {
    deny: FxHashSet<i64>,
    allow: FxHashSet<i64>,
}

/// Compiled regex filters plus the per-client view over them.
///
/// All enabled filters are compiled once on (re)load; binding a client only
/// records which filter ids its groups enable. Matching walks the compiled
/// set and consults the binding, so a reload never blocks match calls.
pub struct RegexBinder {
    db: Arc<GravityDb>,
    deny: ArcSwap<Vec<Arc<CompiledFilter>>>,
    allow: ArcSwap<Vec<Arc<CompiledFilter>>>,
    bindings: DashMap<i64, ClientFilterSet, FxBuildHasher>,
}

impl RegexBinder {
    pub fn new(db: Arc<GravityDb>) -> Self {
        Self {
            db,
            deny: ArcSwap::from_pointee(Vec::new()),
            allow: ArcSwap::from_pointee(Vec::new()),
            bindings: DashMap::with_hasher(FxBuildHasher),
        }
    }

    async fn load_filters(
        &self,
        pool: &sqlx::SqlitePool,
        view: &str,
    ) -> Result<Vec<Arc<CompiledFilter>>, DomainError> {
        let sql = format!("SELECT DISTINCT id, domain FROM {view}");
        let rows: Vec<(i64, String)> = sqlx::query_as(&sql)
            .fetch_all(pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        let mut filters = Vec::with_capacity(rows.len());
        for (id, pattern) in rows {
            match Regex::new(&pattern) {
                Ok(regex) => filters.push(Arc::new(CompiledFilter {
                    db_id: id,
                    pattern: Arc::from(pattern.as_str()),
                    regex,
                })),
                Err(e) => {
                    warn!(filter_id = id, pattern = %pattern, error = %e,
                          "Skipping regex filter that does not compile");
                }
            }
        }
        Ok(filters)
    }

    async fn enabled_ids(
        &self,
        pool: &sqlx::SqlitePool,
        view: &str,
        group_ids: &[i64],
    ) -> Result<FxHashSet<i64>, DomainError> {
        if group_ids.is_empty() {
            return Ok(FxHashSet::default());
        }
        let placeholders = (1..=group_ids.len())
            .map(|i| format!("?{i}"))
            .collect::<Vec<_>>()
            .join(",");
        let sql = format!("SELECT DISTINCT id FROM {view} WHERE group_id IN ({placeholders})");

        let mut query = sqlx::query_scalar::<_, i64>(&sql);
        for id in group_ids {
            query = query.bind(id);
        }
        let ids = query
            .fetch_all(pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;
        Ok(ids.into_iter().collect())
    }

    fn match_in(
        &self,
        filters: &[Arc<CompiledFilter>],
        enabled: &FxHashSet<i64>,
        domain: &str,
    ) -> Option<i64> {
        for filter in filters {
            if !enabled.contains(&filter.db_id) {
                continue;
            }
            match filter.regex.is_match(domain) {
                Ok(true) => {
                    debug!(filter_id = filter.db_id, pattern = %filter.pattern, domain,
                           "Regex filter matched");
                    return Some(filter.db_id);
                }
                Ok(false) => {}
                Err(e) => {
                    debug!(filter_id = filter.db_id, error = %e,
                           "Regex evaluation aborted, treating as non-match");
                }
            }
        }
        None
    }

    pub fn filter_counts(&self) -> (usize, usize) {
        (self.deny.load().len(), self.allow.load().len())
    }
}

#[async_trait]
impl RegexEnginePort for RegexBinder {
    #[instrument(skip(self))]
    async fn reload(&self) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;

        let deny = self.load_filters(&pool, "vw_regex_blacklist").await?;
        let allow = self.load_filters(&pool, "vw_regex_whitelist").await?;

        info!(deny = deny.len(), allow = allow.len(), "Regex filters compiled");
        self.deny.store(Arc::new(deny));
        self.allow.store(Arc::new(allow));
        // Old bindings reference stale filter ids
        self.bindings.clear();
        Ok(())
    }

    #[instrument(skip(self, group_ids))]
    async fn bind_client(&self, client_id: i64, group_ids: &[i64]) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;

        let set = ClientFilterSet {
            deny: self.enabled_ids(&pool, "vw_regex_blacklist", group_ids).await?,
            allow: self.enabled_ids(&pool, "vw_regex_whitelist", group_ids).await?,
        };
        debug!(client_id, deny = set.deny.len(), allow = set.allow.len(),
               "Regex filters bound for client");
        self.bindings.insert(client_id, set);
        Ok(())
    }

    fn unbind_client(&self, client_id: i64) {
        self.bindings.remove(&client_id);
    }

    fn match_deny(&self, domain: &str, client_id: i64) -> Option<i64> {
        let bindings = self.bindings.get(&client_id)?;
        self.match_in(&self.deny.load(), &bindings.deny, domain)
    }

    fn match_allow(&self, domain: &str, client_id: i64) -> Option<i64> {
        let bindings = self.bindings.get(&client_id)?;
        self.match_in(&self.allow.load(), &bindings.allow, domain)
    }
}
