pub mod arp_reader;
pub mod hostname_resolver;
pub mod interface_resolver;

pub use arp_reader::ProcArpReader;
pub use hostname_resolver::HostsFileResolver;
pub use interface_resolver::RouteTableInterfaceResolver;
