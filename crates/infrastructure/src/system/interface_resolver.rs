use async_trait::async_trait;
use std::net::{IpAddr, Ipv4Addr};
use tokio::fs;
use tracing::debug;
use umbra_dns_application::ports::InterfaceResolver;
use umbra_dns_domain::DomainError;

/// Resolves the interface a client is reachable through by walking the
/// kernel routing table (/proc/net/route). IPv4 only; IPv6 clients simply
/// skip the interface step of the identity chain.
pub struct RouteTableInterfaceResolver {
    route_path: String,
}

impl RouteTableInterfaceResolver {
    pub fn new() -> Self {
        Self {
            route_path: "/proc/net/route".to_string(),
        }
    }

    pub fn with_path(path: String) -> Self {
        Self { route_path: path }
    }
}

impl Default for RouteTableInterfaceResolver {
    fn default() -> Self {
        Self::new()
    }
}

/// Fields are hex-encoded little-endian words; swap into host order.
fn parse_hex_addr(field: &str) -> Option<u32> {
    u32::from_str_radix(field, 16).ok().map(u32::swap_bytes)
}

#[async_trait]
impl InterfaceResolver for RouteTableInterfaceResolver {
    async fn resolve_interface(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        let IpAddr::V4(ipv4) = ip else {
            return Ok(None);
        };
        let addr = u32::from(ipv4);

        let content = fs::read_to_string(&self.route_path)
            .await
            .map_err(|e| DomainError::IoError(format!("Failed to read routing table: {e}")))?;

        // Iface  Destination  Gateway  Flags  RefCnt  Use  Metric  Mask  ...
        let mut best: Option<(u32, String)> = None;
        for line in content.lines().skip(1) {
            let fields: Vec<&str> = line.split_whitespace().collect();
            if fields.len() < 8 {
                continue;
            }
            let (Some(dest), Some(mask)) = (parse_hex_addr(fields[1]), parse_hex_addr(fields[7]))
            else {
                continue;
            };
            if addr & mask != dest & mask {
                continue;
            }
            // Widest mask is the most specific route
            if best.as_ref().map(|(m, _)| mask > *m).unwrap_or(true) {
                best = Some((mask, fields[0].to_string()));
            }
        }

        if let Some((_, iface)) = &best {
            debug!(ip = %ip, interface = %iface, "Route found for client");
        }
        Ok(best.map(|(_, iface)| iface))
    }
}
