use async_trait::async_trait;
use std::net::IpAddr;
use std::str::FromStr;
use tokio::fs;
use tracing::debug;
use umbra_dns_application::ports::HostnameResolver;
use umbra_dns_domain::DomainError;

/// Hostname lookup against the local hosts file. Client rows may be
/// configured by name, so resolution only needs the names this machine
/// already knows about.
pub struct HostsFileResolver {
    hosts_path: String,
}

impl HostsFileResolver {
    pub fn new() -> Self {
        Self {
            hosts_path: "/etc/hosts".to_string(),
        }
    }

    pub fn with_path(path: String) -> Self {
        Self { hosts_path: path }
    }
}

impl Default for HostsFileResolver {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl HostnameResolver for HostsFileResolver {
    async fn resolve_hostname(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        let content = fs::read_to_string(&self.hosts_path)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to read hosts file: {e}")))?;

        for line in content.lines() {
            let line = line.split('#').next().unwrap_or("").trim();
            if line.is_empty() {
                continue;
            }
            let mut fields = line.split_whitespace();
            let Some(addr_str) = fields.next() else {
                continue;
            };
            let Ok(addr) = IpAddr::from_str(addr_str) else {
                continue;
            };
            if addr == ip {
                if let Some(name) = fields.next() {
                    debug!(ip = %ip, hostname = name, "Hostname found in hosts file");
                    return Ok(Some(name.to_string()));
                }
            }
        }
        Ok(None)
    }
}
