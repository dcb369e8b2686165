use std::net::IpAddr;
use tracing::warn;
use umbra_dns_domain::subnet_match::{best_subnet_match, SubnetCandidate, SubnetMatch};

/// Longest-prefix match over the configured client subnets, surfacing
/// configuration ambiguity.
///
/// Two configured subnets of equal specificity both containing the client
/// address is most likely unintended, e.g.
///   device 10.8.0.22, client A 10.8.0.0/23, client B 10.8.1.0/23 -- so the
/// tie is warned about and resolved deterministically (highest id wins)
/// instead of failing the lookup.
pub fn select_subnet_match(
    candidates: &[SubnetCandidate],
    addr: IpAddr,
) -> Option<SubnetMatch> {
    let m = best_subnet_match(candidates, addr)?;

    if m.is_ambiguous() {
        warn!(
            client = %addr,
            matching = m.tied_ids.len(),
            candidates = ?m.tied_ids,
            prefix = m.prefix,
            chosen = m.chosen_id,
            "Multiple equally-specific client subnets match; picking highest id"
        );
    }

    Some(m)
}
