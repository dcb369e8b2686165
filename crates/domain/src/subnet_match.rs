use ipnetwork::IpNetwork;
use std::net::IpAddr;

/// A configured client-table row whose address field parses as a subnet
/// (a bare IP is treated as a host route).
#[derive(Debug, Clone)]
pub struct SubnetCandidate {
    pub client_id: i64,
    pub network: IpNetwork,
}

/// Outcome of longest-prefix matching an address against the configured
/// client subnets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubnetMatch {
    pub chosen_id: i64,
    pub prefix: u8,
    /// Ids of all equally-specific candidates, the chosen one included.
    /// More than one entry means the configuration is ambiguous.
    pub tied_ids: Vec<i64>,
}

impl SubnetMatch {
    pub fn is_ambiguous(&self) -> bool {
        self.tied_ids.len() > 1
    }
}

/// Pick the most specific configured subnet containing `addr`.
///
/// Among equally-specific candidates the highest client id wins, so repeated
/// calls are deterministic; the caller is expected to surface the ambiguity.
pub fn best_subnet_match(candidates: &[SubnetCandidate], addr: IpAddr) -> Option<SubnetMatch> {
    let mut best: Option<SubnetMatch> = None;

    for candidate in candidates {
        if !candidate.network.contains(addr) {
            continue;
        }
        let prefix = candidate.network.prefix();

        match &mut best {
            None => {
                best = Some(SubnetMatch {
                    chosen_id: candidate.client_id,
                    prefix,
                    tied_ids: vec![candidate.client_id],
                });
            }
            Some(m) if prefix > m.prefix => {
                m.chosen_id = candidate.client_id;
                m.prefix = prefix;
                m.tied_ids = vec![candidate.client_id];
            }
            Some(m) if prefix == m.prefix => {
                m.tied_ids.push(candidate.client_id);
                if candidate.client_id > m.chosen_id {
                    m.chosen_id = candidate.client_id;
                }
            }
            Some(_) => {}
        }
    }

    best
}

/// Parse a client-table address field as a subnet candidate. Returns None
/// for hardware addresses, hostnames and interface markers.
pub fn parse_candidate(client_id: i64, address: &str) -> Option<SubnetCandidate> {
    if let Ok(network) = address.parse::<IpNetwork>() {
        return Some(SubnetCandidate { client_id, network });
    }
    if let Ok(ip) = address.parse::<IpAddr>() {
        let network = IpNetwork::new(ip, if ip.is_ipv4() { 32 } else { 128 }).ok()?;
        return Some(SubnetCandidate { client_id, network });
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(id: i64, cidr: &str) -> SubnetCandidate {
        SubnetCandidate {
            client_id: id,
            network: cidr.parse().unwrap(),
        }
    }

    #[test]
    fn test_most_specific_wins() {
        let candidates = vec![
            candidate(1, "10.0.0.0/8"),
            candidate(2, "10.1.0.0/16"),
            candidate(3, "10.1.1.0/24"),
        ];

        let m = best_subnet_match(&candidates, "10.1.1.50".parse().unwrap()).unwrap();
        assert_eq!(m.chosen_id, 3);
        assert_eq!(m.prefix, 24);
        assert!(!m.is_ambiguous());
    }

    #[test]
    fn test_no_match() {
        let candidates = vec![candidate(1, "192.168.1.0/24")];
        assert!(best_subnet_match(&candidates, "8.8.8.8".parse().unwrap()).is_none());
    }

    #[test]
    fn test_tie_picks_highest_id_deterministically() {
        // Two /23 networks both containing the address
        let candidates = vec![
            candidate(4, "10.8.0.0/23"),
            candidate(7, "10.8.0.0/23"),
        ];

        for _ in 0..3 {
            let m = best_subnet_match(&candidates, "10.8.0.22".parse().unwrap()).unwrap();
            assert_eq!(m.chosen_id, 7);
            assert!(m.is_ambiguous());
            assert_eq!(m.tied_ids, vec![4, 7]);
        }
    }

    #[test]
    fn test_parse_candidate() {
        assert!(parse_candidate(1, "192.168.0.0/16").is_some());
        let host = parse_candidate(1, "192.168.1.5").unwrap();
        assert_eq!(host.network.prefix(), 32);
        assert!(parse_candidate(1, "AA:BB:CC:DD:EE:FF").is_none());
        assert!(parse_candidate(1, "laptop.lan").is_none());
        assert!(parse_candidate(1, ":eth0").is_none());
    }
}
