use std::sync::Arc;

/// The reserved default group every unconfigured client falls back to.
pub const DEFAULT_GROUP_ID: i64 = 0;

#[derive(Debug, Clone)]
pub struct Group {
    pub id: Option<i64>,
    pub name: Arc<str>,
    pub enabled: bool,
    pub description: Option<Arc<str>>,
    pub date_added: Option<i64>,
    pub date_modified: Option<i64>,
}

impl Group {
    pub fn new(name: String, description: Option<String>) -> Self {
        Self {
            id: None,
            name: Arc::from(name.as_str()),
            enabled: true,
            description: description.map(|s| Arc::from(s.as_str())),
            date_added: None,
            date_modified: None,
        }
    }

    pub fn validate_name(name: &str) -> Result<(), String> {
        if name.is_empty() {
            return Err("Group name cannot be empty".to_string());
        }
        if name.len() > 100 {
            return Err("Group name cannot exceed 100 characters".to_string());
        }
        Ok(())
    }
}
