use serde::{Deserialize, Serialize};

/// Memoized verdict for a (domain, client, query type) triple.
///
/// `Unknown` is the only state from which the full decision chain runs;
/// every other state is terminal for its cache entry and short-circuits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockingStatus {
    Unknown,
    DenylistBlocked,
    GravityBlocked,
    RegexBlocked,
    SpecialDomain,
    Allowed,
    NotBlocked,
}

impl BlockingStatus {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, BlockingStatus::Unknown)
    }

    pub fn is_blocked(&self) -> bool {
        matches!(
            self,
            BlockingStatus::DenylistBlocked
                | BlockingStatus::GravityBlocked
                | BlockingStatus::RegexBlocked
                | BlockingStatus::SpecialDomain
        )
    }
}

/// Which stage of the chain attributed a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockReason {
    Denylist,
    Gravity,
    Regex,
    SpecialDomain,
}

impl BlockReason {
    pub fn to_str(&self) -> &'static str {
        match self {
            BlockReason::Denylist => "exactly denied",
            BlockReason::Gravity => "gravity blocked",
            BlockReason::Regex => "regex denied",
            BlockReason::SpecialDomain => "special domain",
        }
    }

    pub fn status(&self) -> BlockingStatus {
        match self {
            BlockReason::Denylist => BlockingStatus::DenylistBlocked,
            BlockReason::Gravity => BlockingStatus::GravityBlocked,
            BlockReason::Regex => BlockingStatus::RegexBlocked,
            BlockReason::SpecialDomain => BlockingStatus::SpecialDomain,
        }
    }
}

impl std::fmt::Display for BlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.to_str())
    }
}

/// Reply override attached to a blocked answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ForcedReply {
    NxDomain,
    Refused,
    NoData,
}

/// Outcome of a classification, handed to the DNS-serving layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockingDecision {
    pub blocked: bool,
    pub reason: Option<BlockReason>,
    pub forced_reply: Option<ForcedReply>,
    /// Domain the block is attributed to. Differs from the queried name for
    /// ESNI probe queries, where the parent domain caused the block.
    pub blocked_domain: Option<String>,
    /// Matched domainlist row or regex filter id, when known.
    pub matched_id: Option<i64>,
}

impl BlockingDecision {
    pub fn not_blocked() -> Self {
        Self {
            blocked: false,
            reason: None,
            forced_reply: None,
            blocked_domain: None,
            matched_id: None,
        }
    }

    pub fn blocked(reason: BlockReason) -> Self {
        Self {
            blocked: true,
            reason: Some(reason),
            forced_reply: None,
            blocked_domain: None,
            matched_id: None,
        }
    }

    pub fn with_forced_reply(mut self, reply: ForcedReply) -> Self {
        self.forced_reply = Some(reply);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_unknown_is_non_terminal() {
        assert!(!BlockingStatus::Unknown.is_terminal());
        for s in [
            BlockingStatus::DenylistBlocked,
            BlockingStatus::GravityBlocked,
            BlockingStatus::RegexBlocked,
            BlockingStatus::SpecialDomain,
            BlockingStatus::Allowed,
            BlockingStatus::NotBlocked,
        ] {
            assert!(s.is_terminal());
        }
    }

    #[test]
    fn test_blocked_states() {
        assert!(BlockingStatus::DenylistBlocked.is_blocked());
        assert!(BlockingStatus::SpecialDomain.is_blocked());
        assert!(!BlockingStatus::Allowed.is_blocked());
        assert!(!BlockingStatus::NotBlocked.is_blocked());
        assert!(!BlockingStatus::Unknown.is_blocked());
    }

    #[test]
    fn test_reason_maps_to_status() {
        assert_eq!(
            BlockReason::Denylist.status(),
            BlockingStatus::DenylistBlocked
        );
        assert_eq!(BlockReason::Gravity.status(), BlockingStatus::GravityBlocked);
        assert_eq!(BlockReason::Regex.status(), BlockingStatus::RegexBlocked);
    }
}
