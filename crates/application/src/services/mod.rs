pub mod client_registry;
pub mod group_resolver;

pub use client_registry::ClientRegistry;
pub use group_resolver::select_subnet_match;
