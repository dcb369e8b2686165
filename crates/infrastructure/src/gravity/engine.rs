use crate::database::GravityDb;
use crate::gravity::client_lookup::ClientGroupResolver;
use crate::gravity::decision_cache::{CachedDecision, DecisionCache};
use crate::gravity::membership::{domain_in_view, ListLookup};
use crate::gravity::special_domains::check_special_domain;
use crate::gravity::statements::{ClientStatements, StatementCache};
use async_trait::async_trait;
use sqlx::SqlitePool;
use std::net::IpAddr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};
use umbra_dns_application::ports::{BlockingEnginePort, RegexEnginePort};
use umbra_dns_application::services::ClientRegistry;
use umbra_dns_domain::config::BlockingConfig;
use umbra_dns_domain::{
    BlockReason, BlockingDecision, BlockingStatus, Client, DnsQuery, DomainError, ForcedReply,
};

#[derive(Default)]
struct BlockCounters {
    denylist: AtomicU64,
    gravity: AtomicU64,
    regex: AtomicU64,
    special: AtomicU64,
}

impl BlockCounters {
    fn bump(&self, reason: BlockReason) {
        let counter = match reason {
            BlockReason::Denylist => &self.denylist,
            BlockReason::Gravity => &self.gravity,
            BlockReason::Regex => &self.regex,
            BlockReason::SpecialDomain => &self.special,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

/// Point-in-time view of how many queries each stage has blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterSnapshot {
    pub denylist: u64,
    pub gravity: u64,
    pub regex: u64,
    pub special: u64,
}

impl CounterSnapshot {
    pub fn total(&self) -> u64 {
        self.denylist + self.gravity + self.regex + self.special
    }
}

/// The blocking decision engine.
///
/// Verdict order for an uncached query: global switch, special domains,
/// allowlist (exact then regex), exact denylist, gravity, regex denylist,
/// then the ESNI fallback on the parent name. A store that cannot be read
/// fails open: the query passes and nothing is cached.
pub struct BlockingEngine {
    db: Arc<GravityDb>,
    resolver: ClientGroupResolver,
    regex: Arc<dyn RegexEnginePort>,
    config: BlockingConfig,
    blocking_enabled: AtomicBool,
    registry: ClientRegistry,
    statements: StatementCache,
    decisions: DecisionCache,
    counters: BlockCounters,
}

impl BlockingEngine {
    pub fn new(
        db: Arc<GravityDb>,
        resolver: ClientGroupResolver,
        regex: Arc<dyn RegexEnginePort>,
        config: BlockingConfig,
    ) -> Self {
        let enabled = config.enabled;
        Self {
            db,
            resolver,
            regex,
            config,
            blocking_enabled: AtomicBool::new(enabled),
            registry: ClientRegistry::new(),
            statements: StatementCache::new(),
            decisions: DecisionCache::new(),
            counters: BlockCounters::default(),
        }
    }

    pub fn counters(&self) -> CounterSnapshot {
        CounterSnapshot {
            denylist: self.counters.denylist.load(Ordering::Relaxed),
            gravity: self.counters.gravity.load(Ordering::Relaxed),
            regex: self.counters.regex.load(Ordering::Relaxed),
            special: self.counters.special.load(Ordering::Relaxed),
        }
    }

    pub fn cached_decisions(&self) -> usize {
        self.decisions.len()
    }

    /// Runtime client records observed by this engine.
    pub fn registry(&self) -> &ClientRegistry {
        &self.registry
    }

    /// See [`GravityDb::forget_after_replication`]. Called in a replicated
    /// child before it touches the store.
    pub fn forget_after_replication(&self) {
        self.db.forget_after_replication();
    }

    fn replay_cached(
        &self,
        domain: &str,
        cached: &CachedDecision,
        query: &mut DnsQuery,
    ) -> BlockingDecision {
        match cached.status {
            BlockingStatus::DenylistBlocked
            | BlockingStatus::GravityBlocked
            | BlockingStatus::RegexBlocked => {
                // An allow hit earlier in the resolution chain overrides a
                // remembered block for this hop
                if query.allowed {
                    return BlockingDecision::not_blocked();
                }
                let reason = match cached.status {
                    BlockingStatus::DenylistBlocked => BlockReason::Denylist,
                    BlockingStatus::RegexBlocked => BlockReason::Regex,
                    _ => BlockReason::Gravity,
                };
                self.counters.bump(reason);

                // A cached ESNI-probe block is attributed to the parent name
                let attributed = match domain.strip_prefix("_esni.") {
                    Some(parent) if cached.forced_reply == Some(ForcedReply::NxDomain) => parent,
                    _ => domain,
                };
                let mut decision = BlockingDecision::blocked(reason);
                decision.forced_reply = cached.forced_reply;
                decision.matched_id = cached.matched_id;
                decision.blocked_domain = Some(attributed.to_string());
                decision
            }
            BlockingStatus::SpecialDomain => {
                self.counters.bump(BlockReason::SpecialDomain);
                let mut decision = BlockingDecision::blocked(BlockReason::SpecialDomain);
                decision.forced_reply = cached.forced_reply;
                decision.blocked_domain = Some(domain.to_string());
                decision
            }
            BlockingStatus::Allowed => {
                query.allowed = true;
                BlockingDecision::not_blocked()
            }
            BlockingStatus::NotBlocked | BlockingStatus::Unknown => {
                BlockingDecision::not_blocked()
            }
        }
    }

    /// Re-derive group membership after the recheck delay elapsed. Cached
    /// verdicts only survive if the membership turns out unchanged.
    async fn recheck_groups(&self, client: &mut Client) {
        let before = client.group_ids.clone();
        client.reread_groups += 1;
        client.clear_groups();
        self.statements.remove(client.id);
        self.regex.unbind_client(client.id);
        debug!(client = %client.ip_address, round = client.reread_groups,
               "Re-deriving client group membership");

        if let Err(e) = self.resolver.resolve_groups(client).await {
            warn!(client = %client.ip_address, error = %e,
                  "Group recheck could not read the policy store");
            return;
        }
        if client.group_ids != before {
            info!(client = %client.ip_address,
                  "Client group membership changed, evicting cached verdicts");
            self.decisions.invalidate_client(client.id);
        }
    }

    async fn ensure_client_state(
        &self,
        client: &mut Client,
    ) -> Result<Arc<ClientStatements>, DomainError> {
        if !client.found_group {
            self.resolver.resolve_groups(client).await?;
        }
        let groups = client.group_id_vec();
        if let Some(stmts) = self.statements.get(client.id) {
            if stmts.group_ids == groups {
                return Ok(stmts);
            }
        }
        self.regex.bind_client(client.id, &groups).await?;
        Ok(self.statements.build_and_insert(client.id, groups))
    }

    /// Deny-side chain: exact denylist, gravity, regex. First hit wins.
    async fn check_domain_blocked(
        &self,
        pool: &SqlitePool,
        stmts: &ClientStatements,
        domain: &str,
        client_id: i64,
        degraded: &mut bool,
    ) -> Option<(BlockReason, Option<i64>)> {
        match domain_in_view(pool, &stmts.deny_sql, domain, &stmts.group_ids, "deny").await {
            ListLookup::Found(id) => return Some((BlockReason::Denylist, id)),
            ListLookup::NotFound => {}
            ListLookup::Unavailable => *degraded = true,
        }
        match domain_in_view(pool, &stmts.gravity_sql, domain, &stmts.group_ids, "gravity").await {
            ListLookup::Found(_) => return Some((BlockReason::Gravity, None)),
            ListLookup::NotFound => {}
            ListLookup::Unavailable => *degraded = true,
        }
        self.regex
            .match_deny(domain, client_id)
            .map(|id| (BlockReason::Regex, Some(id)))
    }

    async fn in_allowlist(
        &self,
        pool: &SqlitePool,
        stmts: &ClientStatements,
        domain: &str,
        client_id: i64,
        degraded: &mut bool,
    ) -> Option<i64> {
        match domain_in_view(pool, &stmts.allow_sql, domain, &stmts.group_ids, "allow").await {
            // The allowlist view always exposes the row id
            ListLookup::Found(id) => return id,
            ListLookup::NotFound => {}
            ListLookup::Unavailable => *degraded = true,
        }
        self.regex.match_allow(domain, client_id)
    }
}

#[async_trait]
impl BlockingEnginePort for BlockingEngine {
    #[instrument(skip(self, query), fields(client = %client_ip))]
    async fn classify(
        &self,
        domain: &str,
        client_ip: IpAddr,
        query: &mut DnsQuery,
    ) -> BlockingDecision {
        if !self.blocking_enabled() {
            return BlockingDecision::not_blocked();
        }

        let domain = domain.to_ascii_lowercase();
        let now = chrono::Utc::now().timestamp();
        let mut client = self.registry.get_or_create(client_ip, now);

        if client.found_group
            && client.needs_group_recheck(
                now,
                self.config.max_group_rechecks,
                self.config.group_recheck_delay_secs,
            )
        {
            self.recheck_groups(&mut client).await;
            self.registry.store(client.clone());
        }

        let key = self.decisions.key(&domain, client.id, query.query_type);
        if let Some(cached) = self.decisions.get(key) {
            return self.replay_cached(&domain, &cached, query);
        }

        // Protocol canaries are answered before any store access and are
        // never subject to allowlisting
        if let Some(reply) = check_special_domain(&self.config, &domain) {
            self.decisions.insert(
                key,
                CachedDecision {
                    status: BlockingStatus::SpecialDomain,
                    forced_reply: Some(reply),
                    matched_id: None,
                    client_id: client.id,
                },
            );
            self.counters.bump(BlockReason::SpecialDomain);
            let mut decision =
                BlockingDecision::blocked(BlockReason::SpecialDomain).with_forced_reply(reply);
            decision.blocked_domain = Some(domain);
            return decision;
        }

        // An earlier hop of this resolution chain already matched an
        // allowlist entry
        if query.allowed {
            return BlockingDecision::not_blocked();
        }

        let stmts = match self.ensure_client_state(&mut client).await {
            Ok(stmts) => stmts,
            Err(e) => {
                warn!(error = %e, "Cannot resolve client policy groups, failing open");
                self.registry.store(client);
                return BlockingDecision::not_blocked();
            }
        };
        self.registry.store(client.clone());

        let pool = match self.db.acquire().await {
            Ok(pool) => pool,
            Err(e) => {
                warn!(error = %e, "Policy store unavailable, failing open");
                return BlockingDecision::not_blocked();
            }
        };

        let mut degraded = false;

        let allow_id = self
            .in_allowlist(&pool, &stmts, &domain, client.id, &mut degraded)
            .await;
        if allow_id.is_some() {
            query.allowed = true;
        }

        let mut verdict = None;
        if !query.allowed {
            verdict = self
                .check_domain_blocked(&pool, &stmts, &domain, client.id, &mut degraded)
                .await;
        }

        let mut forced_reply = None;
        let mut blocked_domain = None;

        // An ESNI probe name inherits the verdict of its parent: blocking
        // _esni.X while X itself resolves would leak the SNI fallback
        if verdict.is_none() && !query.allowed && self.config.block_esni {
            if let Some(parent) = domain.strip_prefix("_esni.").filter(|p| !p.is_empty()) {
                let parent_allowed = self
                    .in_allowlist(&pool, &stmts, parent, client.id, &mut degraded)
                    .await
                    .is_some();
                if !parent_allowed {
                    if let Some(parent_verdict) = self
                        .check_domain_blocked(&pool, &stmts, parent, client.id, &mut degraded)
                        .await
                    {
                        verdict = Some(parent_verdict);
                        forced_reply = Some(ForcedReply::NxDomain);
                        blocked_domain = Some(parent.to_string());
                    }
                }
            }
        }

        match verdict {
            Some((reason, matched_id)) => {
                if !degraded {
                    self.decisions.insert(
                        key,
                        CachedDecision {
                            status: reason.status(),
                            forced_reply,
                            matched_id,
                            client_id: client.id,
                        },
                    );
                }
                self.counters.bump(reason);
                debug!(domain = %domain, reason = %reason, "Query blocked");

                let mut decision = BlockingDecision::blocked(reason);
                decision.forced_reply = forced_reply;
                decision.matched_id = matched_id;
                decision.blocked_domain = Some(blocked_domain.unwrap_or(domain));
                decision
            }
            None => {
                // A degraded store must not cache a false negative
                if !degraded {
                    let status = if query.allowed {
                        BlockingStatus::Allowed
                    } else {
                        BlockingStatus::NotBlocked
                    };
                    self.decisions.insert(
                        key,
                        CachedDecision {
                            status,
                            forced_reply: None,
                            matched_id: allow_id,
                            client_id: client.id,
                        },
                    );
                }
                BlockingDecision::not_blocked()
            }
        }
    }

    /// Flush all derived state after an administrative change: statement
    /// bundles, cached verdicts, resolved group flags and compiled regexes.
    #[instrument(skip(self))]
    async fn reset(&self) -> Result<(), DomainError> {
        info!("Resetting blocking engine after policy change");
        self.statements.clear();
        self.decisions.clear();
        self.registry.clear_group_flags();
        self.regex.reload().await
    }

    fn set_blocking_enabled(&self, enabled: bool) {
        let was = self.blocking_enabled.swap(enabled, Ordering::Relaxed);
        if was != enabled {
            info!(enabled, "Blocking switched");
        }
    }

    fn blocking_enabled(&self) -> bool {
        self.blocking_enabled.load(Ordering::Relaxed)
    }
}
