use async_trait::async_trait;
use std::net::IpAddr;
use std::str::FromStr;
use tokio::fs;
use tracing::{debug, warn};
use umbra_dns_application::ports::{ArpReader, ArpTable};
use umbra_dns_domain::DomainError;

/// Neighbor cache reader backed by /proc/net/arp.
pub struct ProcArpReader {
    arp_path: String,
}

impl ProcArpReader {
    pub fn new() -> Self {
        Self {
            arp_path: "/proc/net/arp".to_string(),
        }
    }

    pub fn with_path(path: String) -> Self {
        Self { arp_path: path }
    }
}

impl Default for ProcArpReader {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ArpReader for ProcArpReader {
    async fn read_arp_table(&self) -> Result<ArpTable, DomainError> {
        let content = fs::read_to_string(&self.arp_path)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to read neighbor cache: {e}")))?;

        let mut table = ArpTable::new();

        // IP address       HW type     Flags       HW address            Mask     Device
        // 192.168.1.1      0x1         0x2         aa:bb:cc:dd:ee:ff     *        eth0
        for line in content.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 4 {
                continue;
            }
            let (ip_str, flags, mac) = (fields[0], fields[2], fields[3]);

            // 0x2 = complete; incomplete entries carry an all-zero address
            if flags != "0x2" || mac == "00:00:00:00:00:00" {
                continue;
            }

            match IpAddr::from_str(ip_str) {
                Ok(ip) => {
                    table.insert(ip, mac.to_string());
                }
                Err(e) => {
                    warn!(error = %e, ip = ip_str, "Invalid IP in neighbor cache");
                }
            }
        }

        debug!(entries = table.len(), "Neighbor cache parsed");
        Ok(table)
    }
}
