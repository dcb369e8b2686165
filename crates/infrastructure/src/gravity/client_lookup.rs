use crate::database::GravityDb;
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::{debug, instrument, warn};
use umbra_dns_application::ports::{ArpReader, HostnameResolver, InterfaceResolver};
use umbra_dns_application::services::select_subnet_match;
use umbra_dns_domain::subnet_match::parse_candidate;
use umbra_dns_domain::{Client, DomainError};

/// Resolves which configured client row (and so which policy groups) an
/// observed address belongs to.
///
/// The identity chain, most to least specific:
///   1. longest-prefix match over client rows configured as IP or CIDR
///   2. hardware address from the neighbor cache
///   3. resolved hostname
///   4. interface the client is reachable through (rows stored as ":name")
/// A client matching nothing falls back to the default group.
pub struct ClientGroupResolver {
    db: Arc<GravityDb>,
    arp: Arc<dyn ArpReader>,
    hostnames: Arc<dyn HostnameResolver>,
    interfaces: Arc<dyn InterfaceResolver>,
}

impl ClientGroupResolver {
    pub fn new(
        db: Arc<GravityDb>,
        arp: Arc<dyn ArpReader>,
        hostnames: Arc<dyn HostnameResolver>,
        interfaces: Arc<dyn InterfaceResolver>,
    ) -> Self {
        Self {
            db,
            arp,
            hostnames,
            interfaces,
        }
    }

    /// Run the identity chain and store the resolved group id list on the
    /// client. Only store errors propagate; failing system lookups merely
    /// skip their step.
    #[instrument(skip(self, client), fields(client = %client.ip_address))]
    pub async fn resolve_groups(&self, client: &mut Client) -> Result<(), DomainError> {
        let pool = self.db.acquire().await?;

        let row_id = self.find_client_row(&pool, client).await?;

        match row_id {
            Some(id) => {
                let groups: Option<String> = sqlx::query_scalar(
                    "SELECT GROUP_CONCAT(group_id) FROM client_by_group WHERE client_id = ?",
                )
                .bind(id)
                .fetch_one(&pool)
                .await
                .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

                let groups = groups.unwrap_or_default();
                debug!(row_id = id, groups = %groups, "Client matched a configured entry");
                client.set_groups(&groups);
            }
            None => {
                debug!("Client matches no configured entry, using default group");
                client.set_groups("0");
            }
        }
        Ok(())
    }

    async fn find_client_row(
        &self,
        pool: &SqlitePool,
        client: &mut Client,
    ) -> Result<Option<i64>, DomainError> {
        let rows: Vec<(i64, String)> = sqlx::query_as("SELECT id, ip FROM client")
            .fetch_all(pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))?;

        // 1. Most specific configured subnet containing the address
        let candidates: Vec<_> = rows
            .iter()
            .filter_map(|(id, addr)| parse_candidate(*id, addr))
            .collect();
        if let Some(m) = select_subnet_match(&candidates, client.ip_address) {
            return Ok(Some(m.chosen_id));
        }

        // 2. Hardware address. Mock addresses ("ip-…") are placeholders the
        // neighbor cache never produced a real entry for and never match.
        if client.hw_address.is_none() {
            match self.arp.hw_address_for(client.ip_address).await {
                Ok(Some(hw)) => client.hw_address = Some(Arc::from(hw.as_str())),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "Neighbor cache not readable"),
            }
        }
        if let Some(hw) = client.hw_address.clone() {
            if !hw.to_ascii_lowercase().starts_with("ip-") {
                if let Some(id) = self.row_by_identifier(pool, &hw).await? {
                    return Ok(Some(id));
                }
            }
        }

        // 3. Hostname
        if client.hostname.is_none() {
            match self.hostnames.resolve_hostname(client.ip_address).await {
                Ok(Some(name)) => client.hostname = Some(Arc::from(name.as_str())),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "Hostname lookup failed"),
            }
        }
        if let Some(host) = client.hostname.clone() {
            if !host.is_empty() {
                if let Some(id) = self.row_by_identifier(pool, &host).await? {
                    return Ok(Some(id));
                }
            }
        }

        // 4. Interface, stored with a ":" marker prefix
        if client.interface.is_none() {
            match self.interfaces.resolve_interface(client.ip_address).await {
                Ok(Some(ifname)) => client.interface = Some(Arc::from(ifname.as_str())),
                Ok(None) => {}
                Err(e) => debug!(error = %e, "Interface lookup failed"),
            }
        }
        if let Some(ifname) = client.interface.clone() {
            let id: Option<i64> =
                sqlx::query_scalar("SELECT id FROM client WHERE ip = ':' || ?1 COLLATE NOCASE")
                    .bind(ifname.as_ref())
                    .fetch_optional(pool)
                    .await
                    .map_err(|e| {
                        warn!(error = %e, "Interface-based client lookup failed");
                        DomainError::DatabaseError(e.to_string())
                    })?;
            if id.is_some() {
                return Ok(id);
            }
        }

        Ok(None)
    }

    async fn row_by_identifier(
        &self,
        pool: &SqlitePool,
        identifier: &str,
    ) -> Result<Option<i64>, DomainError> {
        sqlx::query_scalar("SELECT id FROM client WHERE ip = ?1 COLLATE NOCASE")
            .bind(identifier)
            .fetch_optional(pool)
            .await
            .map_err(|e| DomainError::DatabaseError(e.to_string()))
    }
}
