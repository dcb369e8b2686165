use async_trait::async_trait;
use umbra_dns_domain::DomainError;

/// Per-client view over the compiled regex filter sets.
///
/// Filters are compiled once from the policy store; which filters apply to a
/// given client is re-derived from its group set whenever membership changes.
#[async_trait]
pub trait RegexEnginePort: Send + Sync {
    /// (Re)compile all enabled regex filters from the policy store.
    async fn reload(&self) -> Result<(), DomainError>;

    /// Enable the filters associated with the client's groups.
    async fn bind_client(&self, client_id: i64, group_ids: &[i64]) -> Result<(), DomainError>;

    /// Drop all filter bindings for a client (group membership changed).
    fn unbind_client(&self, client_id: i64);

    /// Evaluate the deny set enabled for this client. Returns the matched
    /// filter's database id, if any.
    fn match_deny(&self, domain: &str, client_id: i64) -> Option<i64>;

    /// Evaluate the allow set enabled for this client.
    fn match_allow(&self, domain: &str, client_id: i64) -> Option<i64>;
}
