pub mod adlist_repository;
pub mod arp_reader;
pub mod blocking_engine;
pub mod hostname_resolver;
pub mod interface_resolver;
pub mod regex_engine;

pub use adlist_repository::AdlistRepositoryPort;
pub use arp_reader::{ArpReader, ArpTable};
pub use blocking_engine::BlockingEnginePort;
pub use hostname_resolver::HostnameResolver;
pub use interface_resolver::InterfaceResolver;
pub use regex_engine::RegexEnginePort;
