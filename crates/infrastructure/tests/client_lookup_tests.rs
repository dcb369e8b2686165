mod common;

use common::*;
use std::collections::HashMap;
use std::sync::Arc;
use umbra_dns_application::ports::ArpTable;
use umbra_dns_domain::Client;
use umbra_dns_infrastructure::gravity::ClientGroupResolver;

fn resolver_with(
    db: Arc<umbra_dns_infrastructure::database::GravityDb>,
    arp: ArpTable,
    hostnames: HashMap<std::net::IpAddr, String>,
    interfaces: HashMap<std::net::IpAddr, String>,
) -> ClientGroupResolver {
    ClientGroupResolver::new(
        db,
        Arc::new(StaticArp(arp)),
        Arc::new(StaticHostnames(hostnames)),
        Arc::new(StaticInterfaces(interfaces)),
    )
}

fn client(ip: &str) -> Client {
    Client::new(1, ip.parse().unwrap(), 0)
}

#[tokio::test]
async fn test_most_specific_subnet_wins() {
    let (pool, db) = memory_store().await;
    add_group(&pool, 5, "wide", true).await;
    add_group(&pool, 6, "narrow", true).await;
    let wide = add_client_row(&pool, "10.0.0.0/8").await;
    set_client_groups(&pool, wide, &[5]).await;
    let narrow = add_client_row(&pool, "10.1.0.0/16").await;
    set_client_groups(&pool, narrow, &[6]).await;

    let resolver = resolver_with(db, ArpTable::new(), HashMap::new(), HashMap::new());

    let mut c = client("10.1.2.3");
    resolver.resolve_groups(&mut c).await.unwrap();
    assert!(c.found_group);
    assert_eq!(c.group_id_vec(), vec![6]);

    let mut c = client("10.200.0.1");
    resolver.resolve_groups(&mut c).await.unwrap();
    assert_eq!(c.group_id_vec(), vec![5]);
}

#[tokio::test]
async fn test_hardware_address_match() {
    let (pool, db) = memory_store().await;
    add_group(&pool, 3, "phones", true).await;
    let row = add_client_row(&pool, "AA:BB:CC:DD:EE:FF").await;
    set_client_groups(&pool, row, &[3]).await;

    let mut arp = ArpTable::new();
    arp.insert("192.168.1.50".parse().unwrap(), "aa:bb:cc:dd:ee:ff".to_string());
    let resolver = resolver_with(db, arp, HashMap::new(), HashMap::new());

    let mut c = client("192.168.1.50");
    resolver.resolve_groups(&mut c).await.unwrap();
    // Matched despite the case difference
    assert_eq!(c.group_id_vec(), vec![3]);
    assert_eq!(c.hw_address.as_deref(), Some("aa:bb:cc:dd:ee:ff"));
}

#[tokio::test]
async fn test_mock_hardware_address_is_skipped() {
    let (pool, db) = memory_store().await;
    add_group(&pool, 3, "phones", true).await;
    let row = add_client_row(&pool, "ip-192.168.1.50").await;
    set_client_groups(&pool, row, &[3]).await;

    let mut arp = ArpTable::new();
    arp.insert("192.168.1.50".parse().unwrap(), "ip-192.168.1.50".to_string());
    let resolver = resolver_with(db, arp, HashMap::new(), HashMap::new());

    let mut c = client("192.168.1.50");
    resolver.resolve_groups(&mut c).await.unwrap();
    // The placeholder address never matches; fall through to the default
    assert_eq!(c.group_id_vec(), vec![0]);
}

#[tokio::test]
async fn test_hostname_match() {
    let (pool, db) = memory_store().await;
    add_group(&pool, 4, "laptops", true).await;
    let row = add_client_row(&pool, "laptop.lan").await;
    set_client_groups(&pool, row, &[4]).await;

    let mut hostnames = HashMap::new();
    hostnames.insert("192.168.1.60".parse().unwrap(), "Laptop.LAN".to_string());
    let resolver = resolver_with(db, ArpTable::new(), hostnames, HashMap::new());

    let mut c = client("192.168.1.60");
    resolver.resolve_groups(&mut c).await.unwrap();
    assert_eq!(c.group_id_vec(), vec![4]);
}

#[tokio::test]
async fn test_interface_match() {
    let (pool, db) = memory_store().await;
    add_group(&pool, 9, "iot", true).await;
    let row = add_client_row(&pool, ":wlan0").await;
    set_client_groups(&pool, row, &[9]).await;

    let mut interfaces = HashMap::new();
    interfaces.insert("192.168.4.17".parse().unwrap(), "wlan0".to_string());
    let resolver = resolver_with(db, ArpTable::new(), HashMap::new(), interfaces);

    let mut c = client("192.168.4.17");
    resolver.resolve_groups(&mut c).await.unwrap();
    assert_eq!(c.group_id_vec(), vec![9]);
}

#[tokio::test]
async fn test_unmatched_client_gets_default_group() {
    let (_pool, db) = memory_store().await;
    let resolver = resolver_with(db, ArpTable::new(), HashMap::new(), HashMap::new());

    let mut c = client("172.16.0.4");
    resolver.resolve_groups(&mut c).await.unwrap();
    assert!(c.found_group);
    assert_eq!(c.group_id_vec(), vec![0]);
}

#[tokio::test]
async fn test_matched_client_without_groups_matches_nothing() {
    let (pool, db) = memory_store().await;
    let row = add_client_row(&pool, "192.168.1.80").await;
    set_client_groups(&pool, row, &[]).await;
    let resolver = resolver_with(db, ArpTable::new(), HashMap::new(), HashMap::new());

    let mut c = client("192.168.1.80");
    resolver.resolve_groups(&mut c).await.unwrap();
    assert!(c.found_group);
    assert!(c.group_id_vec().is_empty());
}

#[tokio::test]
async fn test_store_loss_propagates() {
    let (_pool, db) = memory_store().await;
    db.close().await;
    let resolver = resolver_with(db, ArpTable::new(), HashMap::new(), HashMap::new());

    let mut c = client("10.0.0.1");
    assert!(resolver.resolve_groups(&mut c).await.is_err());
    assert!(!c.found_group);
}
