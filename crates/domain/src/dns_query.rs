use serde::{Deserialize, Serialize};

/// DNS record type of the query under classification. Part of the decision
/// cache key: the same domain may classify differently per type (e.g. HTTPS
/// records for special domains).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QueryType {
    A,
    AAAA,
    CNAME,
    TXT,
    SRV,
    SOA,
    PTR,
    NAPTR,
    MX,
    DS,
    RRSIG,
    DNSKEY,
    NS,
    SVCB,
    HTTPS,
    ANY,
    Other(u16),
}

/// Mutable per-query state threaded through the decision chain.
///
/// `allowed` is set as soon as any hop of the resolution chain (the queried
/// name or an alias target) matches an allowlist entry; one allow hit
/// anywhere overrides any later-stage block.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub query_type: QueryType,
    pub allowed: bool,
}

impl DnsQuery {
    pub fn new(query_type: QueryType) -> Self {
        Self {
            query_type,
            allowed: false,
        }
    }
}
