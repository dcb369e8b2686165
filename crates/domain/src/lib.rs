//! Umbra DNS Domain Layer
pub mod adlist;
pub mod blocking;
pub mod client;
pub mod config;
pub mod dns_query;
pub mod domain_list;
pub mod errors;
pub mod group;
pub mod subnet_match;

pub use adlist::{Adlist, AdlistStatus};
pub use blocking::{BlockReason, BlockingDecision, BlockingStatus, ForcedReply};
pub use client::Client;
pub use config::UmbraConfig;
pub use dns_query::{DnsQuery, QueryType};
pub use domain_list::{DomainListEntry, ListKind, ListType};
pub use errors::DomainError;
pub use group::Group;
pub use subnet_match::{SubnetCandidate, SubnetMatch};
