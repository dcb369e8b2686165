use async_trait::async_trait;
use std::net::IpAddr;
use umbra_dns_domain::DomainError;

#[async_trait]
pub trait HostnameResolver: Send + Sync {
    async fn resolve_hostname(&self, ip: IpAddr) -> Result<Option<String>, DomainError>;
}
