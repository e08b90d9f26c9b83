//! Identity maps built from store scans.
//!
//! Each `load_*` function reads one namespace through a [`DbConnector`];
//! the `*_all` variants run it over the ASIC namespaces of a
//! [`NamespaceDbs`] and union the results, later namespaces winning on
//! collisions. Loads are strict: a store error in any namespace fails the
//! whole load.

use crate::db::{DbConnector, DbId, NamespaceDbs};
use crate::error::{Result, SnmpAgentError};
use crate::tables::{
    fields, queue_counter_key, strip_sai_prefix, table_key, APP_LAG_MEMBER_TABLE, APP_LAG_TABLE,
    APP_PORT_TABLE, ASIC_ROUTER_INTERFACE_PREFIX, CFG_MGMT_PORT_TABLE, COUNTERS_LAG_NAME_MAP,
    COUNTERS_PORT_NAME_MAP, COUNTERS_QUEUE_NAME_MAP, COUNTERS_RIF_NAME_MAP,
    COUNTERS_RIF_TYPE_MAP, SEPARATOR_COLON, SEPARATOR_VBAR,
};
use sonic_types::{get_index, get_index_from_str, InterfaceKind};
use std::collections::{BTreeMap, HashMap};
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Front-panel and backplane ports.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InterfaceMaps {
    pub index_by_name: HashMap<String, u32>,
    /// Walk order.
    pub name_by_index: BTreeMap<u32, String>,
    pub alias_by_name: HashMap<String, String>,
    /// SAI object id without `oid:0x`.
    pub sai_by_name: HashMap<String, String>,
    pub name_by_sai: HashMap<String, String>,
}

impl InterfaceMaps {
    pub fn alias<'a>(&'a self, name: &'a str) -> &'a str {
        self.alias_by_name.get(name).map(String::as_str).unwrap_or(name)
    }

    pub fn len(&self) -> usize {
        self.name_by_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.name_by_index.is_empty()
    }

    fn merge(&mut self, other: InterfaceMaps) {
        self.index_by_name.extend(other.index_by_name);
        self.name_by_index.extend(other.name_by_index);
        self.alias_by_name.extend(other.alias_by_name);
        self.sai_by_name.extend(other.sai_by_name);
        self.name_by_sai.extend(other.name_by_sai);
    }
}

/// Link aggregation groups and their members.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LagMaps {
    /// Every LAG in `LAG_TABLE`, including ones without an ifindex.
    pub members_by_lag: BTreeMap<String, Vec<String>>,
    pub lag_by_member: HashMap<String, String>,
    /// Only LAGs whose name yields an ifindex.
    pub lag_by_index: BTreeMap<u32, String>,
    /// SAI object id without `oid:0x`.
    pub sai_by_lag: HashMap<String, String>,
}

impl LagMaps {
    pub fn members(&self, lag: &str) -> &[String] {
        self.members_by_lag.get(lag).map(Vec::as_slice).unwrap_or(&[])
    }

    fn merge(&mut self, other: LagMaps) {
        self.members_by_lag.extend(other.members_by_lag);
        self.lag_by_member.extend(other.lag_by_member);
        self.lag_by_index.extend(other.lag_by_index);
        self.sai_by_lag.extend(other.sai_by_lag);
    }
}

/// VLAN router interfaces.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VlanMaps {
    pub name_by_index: BTreeMap<u32, String>,
    /// RIF SAI id without `oid:0x`.
    pub sai_by_index: HashMap<u32, String>,
}

impl VlanMaps {
    fn merge(&mut self, other: VlanMaps) {
        self.name_by_index.extend(other.name_by_index);
        self.sai_by_index.extend(other.sai_by_index);
    }
}

/// Router interface to port bindings, both directions, by SAI id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RifMaps {
    pub port_by_rif: HashMap<String, String>,
    pub rif_by_port: HashMap<String, String>,
}

impl RifMaps {
    fn merge(&mut self, other: RifMaps) {
        self.port_by_rif.extend(other.port_by_rif);
        self.rif_by_port.extend(other.rif_by_port);
    }
}

/// Egress queues per port.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueueMaps {
    /// `(ifindex, queue)` to the queue's `oid:0x<sai>` as stored.
    pub oid_by_queue: HashMap<(u32, u32), String>,
    /// Sorted queue numbers per ifindex.
    pub queues_by_port: BTreeMap<u32, Vec<u32>>,
}

impl QueueMaps {
    fn merge(&mut self, other: QueueMaps) {
        self.oid_by_queue.extend(other.oid_by_queue);
        for (port, queues) in other.queues_by_port {
            let list = self.queues_by_port.entry(port).or_default();
            list.extend(queues);
            list.sort_unstable();
            list.dedup();
        }
    }
}

/// Management ports from CONFIG_DB.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MgmtMaps {
    pub name_by_index: BTreeMap<u32, String>,
    pub alias_by_name: HashMap<String, String>,
}

/// Loads the port identity set of one namespace.
///
/// Names outside `Ethernet<N>`/`Ethernet-BP<N>` are dropped with a warning;
/// a namespace with no matching port at all is an inconsistency.
#[instrument(skip_all, fields(namespace = conn.namespace()))]
pub async fn load_interfaces(conn: &dyn DbConnector) -> Result<InterfaceMaps> {
    let port_name_map = conn.get_all(DbId::Counters, COUNTERS_PORT_NAME_MAP).await?;
    let mut maps = InterfaceMaps::default();
    let mut dropped = Vec::new();

    for (name, oid) in &port_name_map {
        let index = match InterfaceKind::classify(name) {
            Some((kind, index)) if kind.is_port() => index,
            _ => {
                dropped.push(name.as_str());
                continue;
            }
        };
        let sai_id = strip_sai_prefix(oid).to_string();
        maps.index_by_name.insert(name.clone(), index);
        maps.name_by_index.insert(index, name.clone());
        maps.name_by_sai.insert(sai_id.clone(), name.clone());
        maps.sai_by_name.insert(name.clone(), sai_id);
    }

    if maps.is_empty() {
        return Err(SnmpAgentError::startup_inconsistency(
            COUNTERS_PORT_NAME_MAP,
            format!(
                "no interfaces match Ethernet<N> or Ethernet-BP<N> in namespace '{}'",
                conn.namespace()
            ),
        ));
    }
    if !dropped.is_empty() {
        dropped.sort_unstable();
        warn!(
            ?dropped,
            "Port name map contains names outside the interface pattern, ignoring them"
        );
    }

    for name in maps.index_by_name.keys() {
        let entry = conn
            .get_all(DbId::Appl, &table_key(APP_PORT_TABLE, SEPARATOR_COLON, name))
            .await?;
        let alias = entry
            .get(fields::ALIAS)
            .cloned()
            .unwrap_or_else(|| name.clone());
        maps.alias_by_name.insert(name.clone(), alias);
    }

    debug!(count = maps.len(), "Loaded interfaces");
    Ok(maps)
}

/// Loads LAGs and their members from APPL_DB and the LAG name map.
#[instrument(skip_all, fields(namespace = conn.namespace()))]
pub async fn load_lags(conn: &dyn DbConnector) -> Result<LagMaps> {
    let mut maps = LagMaps::default();
    let lag_prefix = format!("{}{}", APP_LAG_TABLE, SEPARATOR_COLON);
    let lag_keys = conn.keys(DbId::Appl, &format!("{}*", lag_prefix)).await?;
    if lag_keys.is_empty() {
        return Ok(maps);
    }

    match conn.get_all(DbId::Counters, COUNTERS_LAG_NAME_MAP).await {
        Ok(lag_name_map) => {
            for (lag, oid) in lag_name_map {
                maps.sai_by_lag.insert(lag, strip_sai_prefix(&oid).to_string());
            }
        }
        Err(e) => warn!(error = %e, "Failed to read LAG name map, LAG counters unavailable"),
    }

    for key in &lag_keys {
        let Some(lag) = key.strip_prefix(&lag_prefix) else {
            continue;
        };
        let member_prefix = format!("{}{}{}{}", APP_LAG_MEMBER_TABLE, SEPARATOR_COLON, lag, SEPARATOR_COLON);
        let member_keys = conn
            .keys(DbId::Appl, &format!("{}*", member_prefix))
            .await?;
        let members: Vec<String> = member_keys
            .iter()
            .filter_map(|k| k.strip_prefix(&member_prefix))
            .map(str::to_string)
            .collect();

        for member in &members {
            maps.lag_by_member.insert(member.clone(), lag.to_string());
        }
        if let Some(index) = get_index(lag) {
            maps.lag_by_index.insert(index, lag.to_string());
        }
        maps.members_by_lag.insert(lag.to_string(), members);
    }

    debug!(count = maps.members_by_lag.len(), "Loaded LAGs");
    Ok(maps)
}

/// Loads VLAN router interfaces from the RIF name and type maps.
#[instrument(skip_all, fields(namespace = conn.namespace()))]
pub async fn load_vlans(conn: &dyn DbConnector) -> Result<VlanMaps> {
    let rif_names = conn.get_all(DbId::Counters, COUNTERS_RIF_NAME_MAP).await?;
    let rif_types = conn.get_all(DbId::Counters, COUNTERS_RIF_TYPE_MAP).await?;
    let mut maps = VlanMaps::default();

    for (name, oid) in &rif_names {
        if rif_types.get(oid).map(String::as_str) != Some(fields::RIF_TYPE_VLAN) {
            continue;
        }
        let Some((InterfaceKind::Vlan, index)) = InterfaceKind::classify(name) else {
            continue;
        };
        maps.name_by_index.insert(index, name.clone());
        maps.sai_by_index
            .insert(index, strip_sai_prefix(oid).to_string());
    }

    debug!(count = maps.name_by_index.len(), "Loaded VLAN interfaces");
    Ok(maps)
}

/// Loads RIF to port bindings from ASIC_DB router interface objects.
#[instrument(skip_all, fields(namespace = conn.namespace()))]
pub async fn load_rifs(conn: &dyn DbConnector) -> Result<RifMaps> {
    let keys = conn
        .keys(DbId::Asic, &format!("{}*", ASIC_ROUTER_INTERFACE_PREFIX))
        .await?;
    let mut maps = RifMaps::default();

    for key in &keys {
        let Some(rif_oid) = key.strip_prefix(ASIC_ROUTER_INTERFACE_PREFIX) else {
            continue;
        };
        let entry = conn.get_all(DbId::Asic, key).await?;
        let Some(port_oid) = entry.get(fields::RIF_ATTR_PORT_ID) else {
            continue;
        };
        let rif = strip_sai_prefix(rif_oid).to_string();
        let port = strip_sai_prefix(port_oid).to_string();
        maps.rif_by_port.insert(port.clone(), rif.clone());
        maps.port_by_rif.insert(rif, port);
    }

    debug!(count = maps.port_by_rif.len(), "Loaded router interfaces");
    Ok(maps)
}

/// Loads the queue name map and checks queue counters exist.
///
/// Both an empty queue map and a map whose queues have no counter rows are
/// inconsistencies.
#[instrument(skip_all, fields(namespace = conn.namespace()))]
pub async fn load_queues(conn: &dyn DbConnector) -> Result<QueueMaps> {
    let queue_name_map = conn.get_all(DbId::Counters, COUNTERS_QUEUE_NAME_MAP).await?;
    if queue_name_map.is_empty() {
        return Err(SnmpAgentError::startup_inconsistency(
            COUNTERS_QUEUE_NAME_MAP,
            format!("no queues in namespace '{}'", conn.namespace()),
        ));
    }

    let mut maps = QueueMaps::default();
    let mut stat_rows = 0usize;

    for (queue_name, oid) in &queue_name_map {
        let Some((port, queue)) = queue_name.split_once(SEPARATOR_COLON) else {
            warn!(queue = %queue_name, "Malformed queue name, skipping");
            continue;
        };
        let digits: String = queue.chars().filter(char::is_ascii_digit).collect();
        let Ok(queue) = digits.parse::<u32>() else {
            warn!(queue = %queue_name, "Queue name has no queue number, skipping");
            continue;
        };
        let port_index = match get_index_from_str(port) {
            Ok(index) => index,
            Err(e) => {
                warn!(queue = %queue_name, error = %e, "Queue on unknown port, skipping");
                continue;
            }
        };

        if conn.exists(DbId::Counters, &queue_counter_key(oid)).await? {
            stat_rows += 1;
        }
        maps.oid_by_queue.insert((port_index, queue), oid.clone());
        maps.queues_by_port.entry(port_index).or_default().push(queue);
    }

    for queues in maps.queues_by_port.values_mut() {
        queues.sort_unstable();
        queues.dedup();
    }

    if stat_rows == 0 {
        return Err(SnmpAgentError::startup_inconsistency(
            COUNTERS_QUEUE_NAME_MAP,
            format!("no queue counters in namespace '{}'", conn.namespace()),
        ));
    }

    debug!(count = maps.oid_by_queue.len(), "Loaded queues");
    Ok(maps)
}

/// Loads management ports from CONFIG_DB.
#[instrument(skip_all, fields(namespace = conn.namespace()))]
pub async fn load_mgmt(conn: &dyn DbConnector) -> Result<MgmtMaps> {
    let prefix = format!("{}{}", CFG_MGMT_PORT_TABLE, SEPARATOR_VBAR);
    let keys = conn.keys(DbId::Config, &format!("{}*", prefix)).await?;
    let mut maps = MgmtMaps::default();

    for key in &keys {
        let Some(name) = key.strip_prefix(&prefix) else {
            continue;
        };
        let Some(index) = get_index(name) else {
            warn!(port = %name, "Management port name has no ifindex, skipping");
            continue;
        };
        let entry = conn.get_all(DbId::Config, key).await?;
        let alias = entry
            .get(fields::ALIAS)
            .cloned()
            .unwrap_or_else(|| name.to_string());
        maps.name_by_index.insert(index, name.to_string());
        maps.alias_by_name.insert(name.to_string(), alias);
    }

    Ok(maps)
}

/// Ports from every ASIC namespace.
pub async fn load_interfaces_all(dbs: &NamespaceDbs) -> Result<InterfaceMaps> {
    let mut maps = InterfaceMaps::default();
    for conn in dbs.non_host() {
        maps.merge(load_interfaces(conn.as_ref()).await?);
    }
    Ok(maps)
}

/// LAGs from every ASIC namespace.
pub async fn load_lags_all(dbs: &NamespaceDbs) -> Result<LagMaps> {
    let mut maps = LagMaps::default();
    for conn in dbs.non_host() {
        maps.merge(load_lags(conn.as_ref()).await?);
    }
    Ok(maps)
}

/// VLAN interfaces from every ASIC namespace.
pub async fn load_vlans_all(dbs: &NamespaceDbs) -> Result<VlanMaps> {
    let mut maps = VlanMaps::default();
    for conn in dbs.non_host() {
        maps.merge(load_vlans(conn.as_ref()).await?);
    }
    Ok(maps)
}

/// RIF bindings from every ASIC namespace.
pub async fn load_rifs_all(dbs: &NamespaceDbs) -> Result<RifMaps> {
    let mut maps = RifMaps::default();
    for conn in dbs.non_host() {
        maps.merge(load_rifs(conn.as_ref()).await?);
    }
    Ok(maps)
}

/// Queues from every ASIC namespace.
pub async fn load_queues_all(dbs: &NamespaceDbs) -> Result<QueueMaps> {
    let mut maps = QueueMaps::default();
    for conn in dbs.non_host() {
        maps.merge(load_queues(conn.as_ref()).await?);
    }
    Ok(maps)
}

/// Management ports live in the host namespace only.
pub async fn load_mgmt_host(dbs: &NamespaceDbs) -> Result<MgmtMaps> {
    load_mgmt(dbs.host().as_ref()).await
}

/// Everything the interfaces table needs, loaded together.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct IdentityMaps {
    pub interfaces: InterfaceMaps,
    pub lags: LagMaps,
    pub vlans: VlanMaps,
    pub rifs: RifMaps,
    pub mgmt: MgmtMaps,
}

impl IdentityMaps {
    pub async fn load(dbs: &NamespaceDbs) -> Result<Arc<Self>> {
        Ok(Arc::new(Self {
            interfaces: load_interfaces_all(dbs).await?,
            lags: load_lags_all(dbs).await?,
            vlans: load_vlans_all(dbs).await?,
            rifs: load_rifs_all(dbs).await?,
            mgmt: load_mgmt_host(dbs).await?,
        }))
    }

    /// ifindex of a port, LAG, VLAN or management interface by name.
    pub fn index_of(&self, name: &str) -> Option<u32> {
        self.interfaces
            .index_by_name
            .get(name)
            .copied()
            .or_else(|| get_index(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryConnector;
    use pretty_assertions::assert_eq;

    fn namespaces(mems: &[&Arc<MemoryConnector>]) -> NamespaceDbs {
        let conns = mems
            .iter()
            .map(|m| Arc::clone(m) as Arc<dyn DbConnector>)
            .collect();
        NamespaceDbs::new(conns).unwrap()
    }

    fn ports(conn: &MemoryConnector, names: &[(&str, &str)]) {
        conn.hset(DbId::Counters, COUNTERS_PORT_NAME_MAP, names.iter().copied());
    }

    #[tokio::test]
    async fn test_load_interfaces_filters_and_aliases() {
        let conn = MemoryConnector::new("");
        ports(
            &conn,
            &[
                ("Ethernet0", "oid:0x1000000000002"),
                ("Ethernet4", "oid:0x1000000000003"),
                ("cpu", "oid:0x1000000000001"),
            ],
        );
        conn.hset(DbId::Appl, "PORT_TABLE:Ethernet0", [("alias", "etp1")]);

        let maps = load_interfaces(&conn).await.unwrap();
        assert_eq!(maps.len(), 2);
        assert_eq!(maps.index_by_name["Ethernet0"], 1);
        assert_eq!(maps.name_by_index[&5], "Ethernet4");
        assert_eq!(maps.alias("Ethernet0"), "etp1");
        assert_eq!(maps.alias("Ethernet4"), "Ethernet4");
        assert_eq!(maps.sai_by_name["Ethernet0"], "1000000000002");
        assert_eq!(maps.name_by_sai["1000000000003"], "Ethernet4");
    }

    #[tokio::test]
    async fn test_no_matching_interfaces_is_fatal() {
        let conn = MemoryConnector::new("");
        ports(&conn, &[("cpu", "oid:0x1"), ("Ethernet0.10", "oid:0x2")]);

        let err = load_interfaces(&conn).await.unwrap_err();
        assert!(err.is_fatal());
        assert!(matches!(err, SnmpAgentError::StartupInconsistency { .. }));
    }

    #[tokio::test]
    async fn test_load_lags() {
        let conn = MemoryConnector::new("asic0");
        conn.hset(DbId::Appl, "LAG_TABLE:PortChannel01", [("admin_status", "up")]);
        conn.hset(DbId::Appl, "LAG_TABLE:PortChannel_Temp", [("admin_status", "up")]);
        conn.hset(DbId::Appl, "LAG_MEMBER_TABLE:PortChannel01:Ethernet-BP0", [("status", "enabled")]);
        conn.hset(DbId::Appl, "LAG_MEMBER_TABLE:PortChannel01:Ethernet-BP4", [("status", "enabled")]);
        conn.hset(DbId::Counters, COUNTERS_LAG_NAME_MAP, [("PortChannel01", "oid:0x1000000000d4a")]);

        let maps = load_lags(&conn).await.unwrap();
        assert_eq!(maps.members("PortChannel01"), ["Ethernet-BP0", "Ethernet-BP4"]);
        assert!(maps.members("PortChannel_Temp").is_empty());
        assert!(maps.members_by_lag.contains_key("PortChannel_Temp"));
        assert_eq!(maps.lag_by_member["Ethernet-BP4"], "PortChannel01");
        assert_eq!(
            maps.lag_by_index.values().collect::<Vec<_>>(),
            vec!["PortChannel01"]
        );
        assert_eq!(maps.sai_by_lag["PortChannel01"], "1000000000d4a");
    }

    #[tokio::test]
    async fn test_load_vlans_requires_vlan_type() {
        let conn = MemoryConnector::new("");
        conn.hset(
            DbId::Counters,
            COUNTERS_RIF_NAME_MAP,
            [("Vlan1000", "oid:0x6000000000aaa"), ("Ethernet0", "oid:0x6000000000bbb")],
        );
        conn.hset(
            DbId::Counters,
            COUNTERS_RIF_TYPE_MAP,
            [
                ("oid:0x6000000000aaa", "SAI_ROUTER_INTERFACE_TYPE_VLAN"),
                ("oid:0x6000000000bbb", "SAI_ROUTER_INTERFACE_TYPE_PORT"),
            ],
        );

        let maps = load_vlans(&conn).await.unwrap();
        assert_eq!(maps.name_by_index.len(), 1);
        assert_eq!(maps.name_by_index[&3000], "Vlan1000");
        assert_eq!(maps.sai_by_index[&3000], "6000000000aaa");
    }

    #[tokio::test]
    async fn test_load_rifs_both_directions() {
        let conn = MemoryConnector::new("");
        conn.hset(
            DbId::Asic,
            "ASIC_STATE:SAI_OBJECT_TYPE_ROUTER_INTERFACE:oid:0x6000000000a01",
            [("SAI_ROUTER_INTERFACE_ATTR_PORT_ID", "oid:0x1000000000002")],
        );
        conn.hset(
            DbId::Asic,
            "ASIC_STATE:SAI_OBJECT_TYPE_ROUTER_INTERFACE:oid:0x6000000000a02",
            [("SAI_ROUTER_INTERFACE_ATTR_TYPE", "SAI_ROUTER_INTERFACE_TYPE_LOOPBACK")],
        );

        let maps = load_rifs(&conn).await.unwrap();
        assert_eq!(maps.port_by_rif.len(), 1);
        assert_eq!(maps.port_by_rif["6000000000a01"], "1000000000002");
        assert_eq!(maps.rif_by_port["1000000000002"], "6000000000a01");
    }

    #[tokio::test]
    async fn test_load_queues() {
        let conn = MemoryConnector::new("");
        conn.hset(
            DbId::Counters,
            COUNTERS_QUEUE_NAME_MAP,
            [
                ("Ethernet0:3", "oid:0x15000000000003"),
                ("Ethernet0:1", "oid:0x15000000000001"),
                ("Ethernet4:UC0", "oid:0x15000000000010"),
                ("bogus:1", "oid:0x15000000000099"),
            ],
        );
        conn.hset(DbId::Counters, "COUNTERS:oid:0x15000000000001", [("SAI_QUEUE_STAT_PACKETS", "1")]);

        let maps = load_queues(&conn).await.unwrap();
        assert_eq!(maps.queues_by_port[&1], vec![1, 3]);
        assert_eq!(maps.queues_by_port[&5], vec![0]);
        assert_eq!(maps.oid_by_queue[&(5, 0)], "oid:0x15000000000010");
        assert_eq!(maps.oid_by_queue.len(), 3);
    }

    #[tokio::test]
    async fn test_queues_without_counters_are_fatal() {
        let conn = MemoryConnector::new("");
        assert!(load_queues(&conn).await.unwrap_err().is_fatal());

        conn.hset(DbId::Counters, COUNTERS_QUEUE_NAME_MAP, [("Ethernet0:0", "oid:0x15")]);
        assert!(load_queues(&conn).await.unwrap_err().is_fatal());
    }

    #[tokio::test]
    async fn test_load_mgmt() {
        let conn = MemoryConnector::new("");
        conn.hset(DbId::Config, "MGMT_PORT|eth0", [("alias", "mgmt0"), ("admin_status", "up")]);

        let maps = load_mgmt(&conn).await.unwrap();
        assert_eq!(maps.name_by_index[&10000], "eth0");
        assert_eq!(maps.alias_by_name["eth0"], "mgmt0");
    }

    #[tokio::test]
    async fn test_load_all_skips_host_namespace() {
        let host = Arc::new(MemoryConnector::new(""));
        let asic0 = Arc::new(MemoryConnector::new("asic0"));
        let asic1 = Arc::new(MemoryConnector::new("asic1"));
        ports(&host, &[("Ethernet0", "oid:0x1")]);
        ports(&asic0, &[("Ethernet-BP0", "oid:0x10")]);
        ports(&asic1, &[("Ethernet-BP16", "oid:0x20")]);
        let dbs = namespaces(&[&host, &asic0, &asic1]);

        let maps = load_interfaces_all(&dbs).await.unwrap();
        assert_eq!(
            maps.name_by_index.values().collect::<Vec<_>>(),
            vec!["Ethernet-BP0", "Ethernet-BP16"]
        );
    }

    #[tokio::test]
    async fn test_load_all_is_strict() {
        let host = Arc::new(MemoryConnector::new(""));
        let asic0 = Arc::new(MemoryConnector::new("asic0"));
        let asic1 = Arc::new(MemoryConnector::new("asic1"));
        ports(&asic0, &[("Ethernet-BP0", "oid:0x10")]);
        ports(&asic1, &[("Ethernet-BP16", "oid:0x20")]);
        asic1.set_unavailable(true);
        let dbs = namespaces(&[&host, &asic0, &asic1]);

        let err = load_interfaces_all(&dbs).await.unwrap_err();
        assert!(matches!(err, SnmpAgentError::Database(_)));
    }
}
