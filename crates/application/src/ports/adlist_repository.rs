use async_trait::async_trait;
use umbra_dns_domain::{Adlist, DomainError};

#[async_trait]
pub trait AdlistRepositoryPort: Send + Sync {
    async fn get_all(&self) -> Result<Vec<Adlist>, DomainError>;

    /// Enabled adlists whose last gravity run left them unavailable.
    async fn get_unavailable(&self) -> Result<Vec<Adlist>, DomainError>;
}
