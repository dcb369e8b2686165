use umbra_dns_domain::config::BlockingConfig;
use umbra_dns_domain::ForcedReply;

/// Mozilla's DoH canary. Answering it NXDOMAIN tells Firefox to keep using
/// the system resolver instead of bypassing local filtering.
const MOZILLA_CANARY: &str = "use-application-dns.net";

/// iCloud Private Relay availability probes.
const ICLOUD_RELAY: [&str; 2] = ["mask.icloud.com", "mask-h2.icloud.com"];

/// Protocol canary domains handled before any list lookup. These are never
/// subject to allowlisting.
pub fn check_special_domain(config: &BlockingConfig, domain: &str) -> Option<ForcedReply> {
    if config.mozilla_canary && domain.eq_ignore_ascii_case(MOZILLA_CANARY) {
        return Some(ForcedReply::NxDomain);
    }
    if config.icloud_private_relay
        && ICLOUD_RELAY.iter().any(|d| domain.eq_ignore_ascii_case(d))
    {
        return Some(ForcedReply::NxDomain);
    }
    None
}
