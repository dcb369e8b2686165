use std::net::IpAddr;
use std::sync::Arc;

/// A client observed on the resolver, as tracked by the runtime registry.
///
/// Group-related fields are owned by the identity resolver: `group_ids` holds
/// the comma-joined list of policy group ids once resolution succeeded and
/// `found_group` marks the record as resolved. Everything else is identity
/// material gathered lazily (hardware address, hostname, inbound interface).
#[derive(Debug, Clone)]
pub struct Client {
    pub id: i64,
    pub ip_address: IpAddr,
    pub hw_address: Option<Arc<str>>,
    pub hostname: Option<Arc<str>>,
    pub interface: Option<Arc<str>>,
    pub group_ids: Option<Arc<str>>,
    pub found_group: bool,
    pub first_seen: i64,
    pub reread_groups: u8,
}

impl Client {
    pub fn new(id: i64, ip_address: IpAddr, first_seen: i64) -> Self {
        Self {
            id,
            ip_address,
            hw_address: None,
            hostname: None,
            interface: None,
            group_ids: None,
            found_group: false,
            first_seen,
            reread_groups: 0,
        }
    }

    /// A client's identity can only be enriched over time (a hostname may
    /// become resolvable after first contact), so group membership is
    /// re-derived a bounded number of times. Recheck N requires at least
    /// N * `delay_secs` elapsed since first contact.
    pub fn needs_group_recheck(&self, now: i64, max_rechecks: u8, delay_secs: i64) -> bool {
        let check_count = self.reread_groups + 1;
        check_count <= max_rechecks
            && now - self.first_seen > i64::from(check_count) * delay_secs
    }

    /// Parsed view of the resolved group id list. Order is irrelevant.
    pub fn group_id_vec(&self) -> Vec<i64> {
        match &self.group_ids {
            Some(ids) => ids
                .split(',')
                .filter_map(|s| s.trim().parse::<i64>().ok())
                .collect(),
            None => Vec::new(),
        }
    }

    pub fn set_groups(&mut self, ids: &str) {
        self.group_ids = Some(Arc::from(ids));
        self.found_group = true;
    }

    pub fn clear_groups(&mut self) {
        self.group_ids = None;
        self.found_group = false;
    }

    /// Preferred display identity: hostname, then a real hardware address,
    /// then the IP. Mock hardware addresses ("ip-…") are never shown.
    pub fn display_name(&self) -> String {
        if let Some(host) = &self.hostname {
            if !host.is_empty() {
                return host.to_string();
            }
        }
        if let Some(hw) = &self.hw_address {
            if !hw.to_ascii_lowercase().starts_with("ip-") {
                return hw.to_string();
            }
        }
        self.ip_address.to_string()
    }
}
