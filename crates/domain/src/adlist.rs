use std::sync::Arc;

/// Last-known availability of a subscribed aggregation source, as recorded
/// by the most recent gravity run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AdlistStatus {
    Unknown,
    Ok,
    /// Fetch failed, a cached copy was used.
    UnavailableUsedCache,
    /// Fetch failed and no cached copy exists.
    UnavailableNoCache,
}

impl AdlistStatus {
    /// Storage mapping kept for compatibility with the gravity updater:
    /// 1 = ok, 3 = unavailable (cache used), 4 = unavailable (no cache).
    pub fn from_storage(value: i64) -> Self {
        match value {
            1 => AdlistStatus::Ok,
            3 => AdlistStatus::UnavailableUsedCache,
            4 => AdlistStatus::UnavailableNoCache,
            _ => AdlistStatus::Unknown,
        }
    }

    pub fn as_storage(&self) -> i64 {
        match self {
            AdlistStatus::Unknown => 0,
            AdlistStatus::Ok => 1,
            AdlistStatus::UnavailableUsedCache => 3,
            AdlistStatus::UnavailableNoCache => 4,
        }
    }

    pub fn is_unavailable(&self) -> bool {
        matches!(
            self,
            AdlistStatus::UnavailableUsedCache | AdlistStatus::UnavailableNoCache
        )
    }
}

/// A subscribed source contributing rows to the gravity table.
#[derive(Debug, Clone)]
pub struct Adlist {
    pub id: Option<i64>,
    pub address: Arc<str>,
    pub enabled: bool,
    pub comment: Option<Arc<str>>,
    pub group_ids: Vec<i64>,
    pub date_added: Option<i64>,
    pub date_modified: Option<i64>,
    pub date_updated: Option<i64>,
    pub number: i64,
    pub invalid_domains: i64,
    pub status: AdlistStatus,
}

impl Adlist {
    pub fn new(address: String, comment: Option<String>) -> Self {
        Self {
            id: None,
            address: Arc::from(address.as_str()),
            enabled: true,
            comment: comment.map(|s| Arc::from(s.as_str())),
            group_ids: Vec::new(),
            date_added: None,
            date_modified: None,
            date_updated: None,
            number: 0,
            invalid_domains: 0,
            status: AdlistStatus::Unknown,
        }
    }

    pub fn validate_address(address: &str) -> Result<(), String> {
        if address.is_empty() {
            return Err("Adlist address cannot be empty".to_string());
        }
        if !address.starts_with("http://")
            && !address.starts_with("https://")
            && !address.starts_with("file://")
        {
            return Err(format!("Invalid adlist address: {address}"));
        }
        Ok(())
    }
}
