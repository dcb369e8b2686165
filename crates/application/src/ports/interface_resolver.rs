use async_trait::async_trait;
use std::net::IpAddr;
use umbra_dns_domain::DomainError;

/// Resolves the network interface a client address is reachable through.
#[async_trait]
pub trait InterfaceResolver: Send + Sync {
    async fn resolve_interface(&self, ip: IpAddr) -> Result<Option<String>, DomainError>;
}
