use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the gravity policy store.
    pub path: String,

    /// Busy timeout applied when the connection is first opened. The first
    /// open tolerates concurrent writers; list lookups afterwards fail fast
    /// instead of waiting.
    #[serde(default = "default_busy_timeout")]
    pub busy_timeout_ms: u64,

    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
}

fn default_busy_timeout() -> u64 {
    1000
}

fn default_max_connections() -> u32 {
    1
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: "gravity.db".to_string(),
            busy_timeout_ms: default_busy_timeout(),
            max_connections: default_max_connections(),
        }
    }
}
