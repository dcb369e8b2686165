use ahash::RandomState;
use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use umbra_dns_domain::{BlockingStatus, ForcedReply, QueryType};

/// Memoized verdict for one (domain, client, query type) triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachedDecision {
    pub status: BlockingStatus,
    pub forced_reply: Option<ForcedReply>,
    pub matched_id: Option<i64>,
    /// Owning client, kept so membership changes can evict per client.
    pub client_id: i64,
}

/// Verdict cache in front of the decision chain.
///
/// Entries are keyed by a 64-bit hash of the triple and never expire on
/// their own; they are evicted when group membership changes for their
/// client or when an administrative change flushes everything.
pub struct DecisionCache {
    entries: DashMap<u64, CachedDecision, FxBuildHasher>,
    key_hasher: RandomState,
}

impl DecisionCache {
    pub fn new() -> Self {
        Self {
            entries: DashMap::with_hasher(FxBuildHasher),
            key_hasher: RandomState::new(),
        }
    }

    pub fn key(&self, domain: &str, client_id: i64, query_type: QueryType) -> u64 {
        self.key_hasher.hash_one((domain, client_id, query_type))
    }

    pub fn get(&self, key: u64) -> Option<CachedDecision> {
        self.entries.get(&key).map(|e| *e)
    }

    pub fn insert(&self, key: u64, decision: CachedDecision) {
        self.entries.insert(key, decision);
    }

    /// Evict every verdict held for one client.
    pub fn invalidate_client(&self, client_id: i64) {
        self.entries.retain(|_, v| v.client_id != client_id);
    }

    pub fn clear(&self) {
        self.entries.clear();
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for DecisionCache {
    fn default() -> Self {
        Self::new()
    }
}
