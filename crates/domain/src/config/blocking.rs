use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockingConfig {
    /// Global blocking switch; when off, classification is bypassed entirely.
    pub enabled: bool,

    /// Extend blocking to `_esni.<domain>` probe names when `<domain>` itself
    /// would be blocked.
    #[serde(default = "default_true")]
    pub block_esni: bool,

    /// Answer the Mozilla DoH canary domain with NXDOMAIN.
    #[serde(default = "default_true")]
    pub mozilla_canary: bool,

    /// Answer the iCloud Private Relay mask domains with NXDOMAIN.
    #[serde(default)]
    pub icloud_private_relay: bool,

    /// How many times a client's group membership is re-derived after first
    /// contact (identity may only be enriched over time).
    #[serde(default = "default_max_rechecks")]
    pub max_group_rechecks: u8,

    /// Minimum delay unit between successive rechecks, in seconds.
    #[serde(default = "default_recheck_delay")]
    pub group_recheck_delay_secs: i64,
}

fn default_true() -> bool {
    true
}

fn default_max_rechecks() -> u8 {
    5
}

fn default_recheck_delay() -> i64 {
    600
}

impl Default for BlockingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            block_esni: true,
            mozilla_canary: true,
            icloud_private_relay: false,
            max_group_rechecks: default_max_rechecks(),
            group_recheck_delay_secs: default_recheck_delay(),
        }
    }
}
