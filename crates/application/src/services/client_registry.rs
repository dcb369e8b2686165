use dashmap::DashMap;
use rustc_hash::FxBuildHasher;
use std::net::IpAddr;
use std::sync::atomic::{AtomicI64, Ordering};
use umbra_dns_domain::Client;

/// Runtime registry of clients observed on the resolver.
///
/// Records are read out by value and written back after mutation; the
/// concurrency model is independent workers that never share a record
/// mid-resolution, so last-writer-wins on the group fields is acceptable.
pub struct ClientRegistry {
    clients: DashMap<IpAddr, Client, FxBuildHasher>,
    next_id: AtomicI64,
}

impl ClientRegistry {
    pub fn new() -> Self {
        Self {
            clients: DashMap::with_hasher(FxBuildHasher),
            next_id: AtomicI64::new(1),
        }
    }

    /// Fetch the record for `ip`, creating it on first contact.
    pub fn get_or_create(&self, ip: IpAddr, now: i64) -> Client {
        if let Some(existing) = self.clients.get(&ip) {
            return existing.clone();
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let client = Client::new(id, ip, now);
        self.clients.insert(ip, client.clone());
        client
    }

    pub fn get(&self, ip: IpAddr) -> Option<Client> {
        self.clients.get(&ip).map(|c| c.clone())
    }

    pub fn store(&self, client: Client) {
        self.clients.insert(client.ip_address, client);
    }

    /// Clear the resolved-group flag on every record, forcing the next query
    /// from each client to re-run the identity chain.
    pub fn clear_group_flags(&self) {
        for mut entry in self.clients.iter_mut() {
            entry.clear_groups();
        }
    }

    pub fn client_ids(&self) -> Vec<i64> {
        self.clients.iter().map(|c| c.id).collect()
    }

    pub fn len(&self) -> usize {
        self.clients.len()
    }

    pub fn is_empty(&self) -> bool {
        self.clients.is_empty()
    }
}

impl Default for ClientRegistry {
    fn default() -> Self {
        Self::new()
    }
}
