#![allow(dead_code)]

use async_trait::async_trait;
use sqlx::sqlite::SqlitePoolOptions;
use sqlx::SqlitePool;
use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::Arc;
use umbra_dns_application::ports::{
    ArpReader, ArpTable, HostnameResolver, InterfaceResolver, RegexEnginePort,
};
use umbra_dns_domain::config::BlockingConfig;
use umbra_dns_domain::DomainError;
use umbra_dns_infrastructure::database::schema::initialize_schema;
use umbra_dns_infrastructure::database::GravityDb;
use umbra_dns_infrastructure::gravity::{BlockingEngine, ClientGroupResolver, RegexBinder};

pub struct StaticArp(pub ArpTable);

#[async_trait]
impl ArpReader for StaticArp {
    async fn read_arp_table(&self) -> Result<ArpTable, DomainError> {
        Ok(self.0.clone())
    }
}

pub struct StaticHostnames(pub HashMap<IpAddr, String>);

#[async_trait]
impl HostnameResolver for StaticHostnames {
    async fn resolve_hostname(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        Ok(self.0.get(&ip).cloned())
    }
}

pub struct StaticInterfaces(pub HashMap<IpAddr, String>);

#[async_trait]
impl InterfaceResolver for StaticInterfaces {
    async fn resolve_interface(&self, ip: IpAddr) -> Result<Option<String>, DomainError> {
        Ok(self.0.get(&ip).cloned())
    }
}

/// In-memory policy store with the full schema applied. The pool is pinned
/// to one connection so every clone sees the same :memory: database.
pub async fn memory_store() -> (SqlitePool, Arc<GravityDb>) {
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .connect(":memory:")
        .await
        .unwrap();
    initialize_schema(&pool).await.unwrap();
    let db = Arc::new(GravityDb::with_pool(pool.clone()));
    (pool, db)
}

pub struct EngineFixture {
    pub pool: SqlitePool,
    pub db: Arc<GravityDb>,
    pub engine: BlockingEngine,
}

/// Engine wired to the given store with static system adapters.
pub async fn engine_for(
    db: Arc<GravityDb>,
    pool: SqlitePool,
    config: BlockingConfig,
    arp: ArpTable,
    hostnames: HashMap<IpAddr, String>,
    interfaces: HashMap<IpAddr, String>,
) -> EngineFixture {
    let regex = Arc::new(RegexBinder::new(Arc::clone(&db)));
    regex.reload().await.unwrap();

    let resolver = ClientGroupResolver::new(
        Arc::clone(&db),
        Arc::new(StaticArp(arp)),
        Arc::new(StaticHostnames(hostnames)),
        Arc::new(StaticInterfaces(interfaces)),
    );
    let engine = BlockingEngine::new(Arc::clone(&db), resolver, regex, config);
    EngineFixture { pool, db, engine }
}

pub async fn default_engine() -> EngineFixture {
    let (pool, db) = memory_store().await;
    engine_for(
        db,
        pool,
        BlockingConfig::default(),
        ArpTable::new(),
        HashMap::new(),
        HashMap::new(),
    )
    .await
}

pub async fn add_group(pool: &SqlitePool, id: i64, name: &str, enabled: bool) {
    sqlx::query("INSERT INTO \"group\" (id, enabled, name) VALUES (?1, ?2, ?3)")
        .bind(id)
        .bind(enabled)
        .bind(name)
        .execute(pool)
        .await
        .unwrap();
}

/// Insert a domainlist row; the schema trigger assigns it to group 0.
/// Types: 0 allow/exact, 1 deny/exact, 2 allow/regex, 3 deny/regex.
pub async fn add_domain(pool: &SqlitePool, stored_type: i64, domain: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO domainlist (type, domain) VALUES (?1, ?2) RETURNING id")
        .bind(stored_type)
        .bind(domain)
        .fetch_one(pool)
        .await
        .unwrap()
}

/// Move a domainlist row to exactly the given groups.
pub async fn set_domain_groups(pool: &SqlitePool, domain_id: i64, groups: &[i64]) {
    sqlx::query("DELETE FROM domainlist_by_group WHERE domainlist_id = ?1")
        .bind(domain_id)
        .execute(pool)
        .await
        .unwrap();
    for g in groups {
        sqlx::query("INSERT INTO domainlist_by_group (domainlist_id, group_id) VALUES (?1, ?2)")
            .bind(domain_id)
            .bind(g)
            .execute(pool)
            .await
            .unwrap();
    }
}

pub async fn add_adlist(pool: &SqlitePool, address: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO adlist (address) VALUES (?1) RETURNING id")
        .bind(address)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn set_adlist_groups(pool: &SqlitePool, adlist_id: i64, groups: &[i64]) {
    sqlx::query("DELETE FROM adlist_by_group WHERE adlist_id = ?1")
        .bind(adlist_id)
        .execute(pool)
        .await
        .unwrap();
    for g in groups {
        sqlx::query("INSERT INTO adlist_by_group (adlist_id, group_id) VALUES (?1, ?2)")
            .bind(adlist_id)
            .bind(g)
            .execute(pool)
            .await
            .unwrap();
    }
}

pub async fn add_gravity_domain(pool: &SqlitePool, adlist_id: i64, domain: &str) {
    sqlx::query("INSERT INTO gravity (domain, adlist_id) VALUES (?1, ?2)")
        .bind(domain)
        .bind(adlist_id)
        .execute(pool)
        .await
        .unwrap();
}

/// Insert a configured client row; the trigger assigns group 0.
pub async fn add_client_row(pool: &SqlitePool, identifier: &str) -> i64 {
    sqlx::query_scalar("INSERT INTO client (ip) VALUES (?1) RETURNING id")
        .bind(identifier)
        .fetch_one(pool)
        .await
        .unwrap()
}

pub async fn set_client_groups(pool: &SqlitePool, client_id: i64, groups: &[i64]) {
    sqlx::query("DELETE FROM client_by_group WHERE client_id = ?1")
        .bind(client_id)
        .execute(pool)
        .await
        .unwrap();
    for g in groups {
        sqlx::query("INSERT INTO client_by_group (client_id, group_id) VALUES (?1, ?2)")
            .bind(client_id)
            .bind(g)
            .execute(pool)
            .await
            .unwrap();
    }
}

pub async fn add_audit_domain(pool: &SqlitePool, domain: &str) {
    sqlx::query("INSERT INTO domain_audit (domain) VALUES (?1)")
        .bind(domain)
        .execute(pool)
        .await
        .unwrap();
}
