use thiserror::Error;

#[derive(Error, Debug, Clone)]
pub enum DomainError {
    #[error("Invalid domain name: {0}")]
    InvalidDomainName(String),

    #[error("Invalid IP address: {0}")]
    InvalidIpAddress(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Policy store not available")]
    StoreUnavailable,

    #[error("I/O error: {0}")]
    IoError(String),

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Group not found: {0}")]
    GroupNotFound(i64),

    #[error("Invalid group name: {0}")]
    InvalidGroupName(String),

    #[error("List entry not found: {0}")]
    ListEntryNotFound(String),

    #[error("Invalid list entry: {0}")]
    InvalidListEntry(String),

    #[error("Adlist not found: {0}")]
    AdlistNotFound(String),

    #[error("Invalid adlist: {0}")]
    InvalidAdlist(String),

    #[error("Client not found: {0}")]
    ClientNotFound(String),

    #[error("Invalid regex filter: {0}")]
    InvalidRegexFilter(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}
