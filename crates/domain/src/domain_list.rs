use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Whether a list entry permits or blocks matching domains.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListType {
    Allow,
    Deny,
}

/// Whether the pattern is a literal domain or a regular expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ListKind {
    Exact,
    Regex,
}

impl ListType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListType::Allow => "allow",
            ListType::Deny => "deny",
        }
    }
}

impl ListKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListKind::Exact => "exact",
            ListKind::Regex => "regex",
        }
    }
}

/// A row of the domainlist table: literal or regex pattern, allow or deny.
///
/// Type and pattern kind are orthogonal and stay consistent when a row is
/// moved between classifications. The legacy single-integer encoding (0-3)
/// exists only at the storage boundary.
#[derive(Debug, Clone)]
pub struct DomainListEntry {
    pub id: Option<i64>,
    pub domain: Arc<str>,
    pub list_type: ListType,
    pub kind: ListKind,
    pub enabled: bool,
    pub comment: Option<Arc<str>>,
    pub group_ids: Vec<i64>,
    pub date_added: Option<i64>,
    pub date_modified: Option<i64>,
}

impl DomainListEntry {
    pub fn new(domain: String, list_type: ListType, kind: ListKind) -> Self {
        Self {
            id: None,
            domain: Arc::from(domain.as_str()),
            list_type,
            kind,
            enabled: true,
            comment: None,
            group_ids: Vec::new(),
            date_added: None,
            date_modified: None,
        }
    }

    /// Historical storage mapping: 0 allow/exact, 1 deny/exact,
    /// 2 allow/regex, 3 deny/regex.
    pub fn storage_type(list_type: ListType, kind: ListKind) -> i64 {
        match (list_type, kind) {
            (ListType::Allow, ListKind::Exact) => 0,
            (ListType::Deny, ListKind::Exact) => 1,
            (ListType::Allow, ListKind::Regex) => 2,
            (ListType::Deny, ListKind::Regex) => 3,
        }
    }

    pub fn from_storage_type(value: i64) -> Option<(ListType, ListKind)> {
        match value {
            0 => Some((ListType::Allow, ListKind::Exact)),
            1 => Some((ListType::Deny, ListKind::Exact)),
            2 => Some((ListType::Allow, ListKind::Regex)),
            3 => Some((ListType::Deny, ListKind::Regex)),
            _ => None,
        }
    }

    /// Parse an optional type/kind string pair as supplied by the
    /// administrative surface. Specifying one half without the other is
    /// inconsistent input and rejected with a descriptive message.
    pub fn parse_classification(
        type_str: Option<&str>,
        kind_str: Option<&str>,
    ) -> Result<Option<(ListType, ListKind)>, String> {
        match (type_str, kind_str) {
            (None, None) => Ok(None),
            (None, Some(_)) => Err("Field type missing from request".to_string()),
            (Some(_), None) => Err("Field kind missing from request".to_string()),
            (Some(t), Some(k)) => {
                let list_type = match t.to_ascii_lowercase().as_str() {
                    "allow" => ListType::Allow,
                    "deny" => ListType::Deny,
                    _ => return Err(format!("Cannot interpret type \"{t}\"")),
                };
                let kind = match k.to_ascii_lowercase().as_str() {
                    "exact" => ListKind::Exact,
                    "regex" => ListKind::Regex,
                    _ => return Err(format!("Cannot interpret kind \"{k}\"")),
                };
                Ok(Some((list_type, kind)))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_type_round_trip() {
        for (t, k) in [
            (ListType::Allow, ListKind::Exact),
            (ListType::Deny, ListKind::Exact),
            (ListType::Allow, ListKind::Regex),
            (ListType::Deny, ListKind::Regex),
        ] {
            let v = DomainListEntry::storage_type(t, k);
            assert_eq!(DomainListEntry::from_storage_type(v), Some((t, k)));
        }
        assert_eq!(DomainListEntry::from_storage_type(4), None);
        assert_eq!(DomainListEntry::from_storage_type(-1), None);
    }

    #[test]
    fn test_parse_classification_rejects_half_pairs() {
        assert!(DomainListEntry::parse_classification(Some("allow"), None).is_err());
        assert!(DomainListEntry::parse_classification(None, Some("exact")).is_err());
        assert_eq!(
            DomainListEntry::parse_classification(None, None).unwrap(),
            None
        );
        assert_eq!(
            DomainListEntry::parse_classification(Some("Deny"), Some("REGEX")).unwrap(),
            Some((ListType::Deny, ListKind::Regex))
        );
        assert!(DomainListEntry::parse_classification(Some("block"), Some("exact")).is_err());
    }
}
