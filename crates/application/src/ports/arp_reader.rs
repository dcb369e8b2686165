use async_trait::async_trait;
use std::collections::HashMap;
use std::net::IpAddr;
use umbra_dns_domain::DomainError;

pub type ArpTable = HashMap<IpAddr, String>;

#[async_trait]
pub trait ArpReader: Send + Sync {
    async fn read_arp_table(&self) -> Result<ArpTable, DomainError>;

    /// Convenience lookup for a single address.
    async fn hw_address_for(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        Ok(self.read_arp_table().await?.remove(&ip))
    }
}
