//! Identity loading and namespace aggregation on a multi-ASIC device.

mod common;

use common::MultiAsic;
use pretty_assertions::assert_eq;
use sonic_snmpagent::mibs::ietf::InterfacesUpdater;
use sonic_snmpagent::mibs::loader::IdentityMaps;
use sonic_snmpagent::{
    DbConnector, DbId, MemoryConnector, MibUpdater, MibValue, NamespaceDbs, SnmpAgentError,
};
use std::collections::HashMap;
use std::sync::Arc;

#[tokio::test]
async fn test_lag_members_across_namespaces() {
    let device = MultiAsic::new();
    let identity = IdentityMaps::load(&device.dbs()).await.unwrap();

    assert_eq!(
        identity.lags.members("PortChannel01"),
        &["Ethernet-BP0".to_string(), "Ethernet-BP4".to_string()]
    );
    assert_eq!(
        identity.lags.members("PortChannel03"),
        &["Ethernet-BP16".to_string(), "Ethernet-BP20".to_string()]
    );
    assert!(identity.lags.members("PortChannel_Temp").is_empty());
    assert!(identity.lags.members_by_lag.contains_key("PortChannel_Temp"));
    assert_eq!(
        identity.lags.lag_by_member.get("Ethernet-BP20").map(String::as_str),
        Some("PortChannel03")
    );

    let lag_indexes: Vec<u32> = identity.lags.lag_by_index.keys().copied().collect();
    assert_eq!(lag_indexes, vec![1001, 1003]);
}

#[tokio::test]
async fn test_interfaces_merged_from_asics_only() {
    let device = MultiAsic::new();
    // A port only the host knows about is not an ASIC port
    common::add_port(&device.host, "Ethernet96", "oid:0x1000000000999", 1);

    let identity = IdentityMaps::load(&device.dbs()).await.unwrap();
    let indexes: Vec<u32> = identity.interfaces.name_by_index.keys().copied().collect();
    assert_eq!(indexes, vec![1, 5, 9000, 9004, 9016, 9020]);
    assert_eq!(identity.mgmt.name_by_index.get(&10000).map(String::as_str), Some("eth0"));
    assert_eq!(identity.index_of("PortChannel03"), Some(1003));
}

#[tokio::test]
async fn test_get_all_last_namespace_wins_and_host_excluded() {
    let device = MultiAsic::new();
    device.host.hset(DbId::Appl, "SWITCH_TABLE:switch", [("shared", "host"), ("host_only", "1")]);
    device.asic0.hset(DbId::Appl, "SWITCH_TABLE:switch", [("shared", "asic0"), ("asic0_only", "1")]);
    device.asic1.hset(DbId::Appl, "SWITCH_TABLE:switch", [("shared", "asic1")]);

    let merged = device
        .dbs()
        .get_all(DbId::Appl, "SWITCH_TABLE:switch")
        .await
        .into_strict()
        .unwrap();

    let expected: HashMap<String, String> = [
        ("shared".to_string(), "asic1".to_string()),
        ("asic0_only".to_string(), "1".to_string()),
    ]
    .into_iter()
    .collect();
    assert_eq!(merged, expected);
}

#[tokio::test]
async fn test_single_namespace_uses_host() {
    let conn = Arc::new(MemoryConnector::new(""));
    common::add_port(&conn, "Ethernet8", "oid:0x1000000000009", 1);

    let identity = IdentityMaps::load(&NamespaceDbs::single(conn as Arc<dyn DbConnector>))
        .await
        .unwrap();
    assert_eq!(identity.interfaces.index_by_name.get("Ethernet8"), Some(&9));
}

#[tokio::test]
async fn test_only_non_matching_names_is_startup_inconsistency() {
    let conn = Arc::new(MemoryConnector::new(""));
    conn.hset(
        DbId::Counters,
        "COUNTERS_PORT_NAME_MAP",
        [("Loopback0", "oid:0x1000000000001"), ("etp1", "oid:0x1000000000002")],
    );

    let err = InterfacesUpdater::new(NamespaceDbs::single(conn as Arc<dyn DbConnector>))
        .await
        .err()
        .unwrap();
    assert!(matches!(err, SnmpAgentError::StartupInconsistency { .. }));
    assert!(err.is_fatal());
}

#[tokio::test]
async fn test_identity_load_fails_on_unavailable_namespace() {
    let device = MultiAsic::new();
    device.asic1.set_unavailable(true);

    let err = IdentityMaps::load(&device.dbs()).await.err().unwrap();
    assert!(matches!(err, SnmpAgentError::Database(_)));
    assert!(!err.is_fatal());
}

#[tokio::test]
async fn test_refresh_serves_healthy_namespaces() {
    let device = MultiAsic::new();
    let updater = InterfacesUpdater::new(device.dbs()).await.unwrap();
    assert_eq!(updater.value_at(&[2, 1, 10, 5]), Some(MibValue::Counter32(40)));

    device.asic1.set_unavailable(true);
    updater.refresh().await.unwrap();

    // Ethernet0 is in asic0: 2^32 + 7 truncated
    assert_eq!(updater.value_at(&[2, 1, 10, 1]), Some(MibValue::Counter32(7)));
    assert_eq!(updater.value_at(&[2, 1, 10, 5]), None);
}
