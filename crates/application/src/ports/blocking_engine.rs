use async_trait::async_trait;
use std::net::IpAddr;
use umbra_dns_domain::{BlockingDecision, DnsQuery, DomainError};

/// The decision core's surface toward the DNS-serving layer.
#[async_trait]
pub trait BlockingEnginePort: Send + Sync {
    /// Classify one query. Never fails: store problems degrade to a
    /// not-blocked decision.
    async fn classify(
        &self,
        domain: &str,
        client_ip: IpAddr,
        query: &mut DnsQuery,
    ) -> BlockingDecision;

    /// Drop cached per-client statements and force group re-resolution.
    /// Called after administrative changes are applied.
    async fn reset(&self) -> Result<(), DomainError>;

    /// Flip the global blocking switch.
    fn set_blocking_enabled(&self, enabled: bool);

    fn blocking_enabled(&self) -> bool;
}
