//! RFC 1213 interfaces group and ipNetToMediaPhysAddress.
//!
//! The interfaces table carries one row per front-panel port, LAG, VLAN
//! router interface and management port. Counter columns are computed at
//! query time from the committed snapshot: LAG rows sum their members, ports
//! and LAGs bound to a router interface add its error counters, VLAN rows
//! read their router interface counters.

use crate::db::{DbId, NamespaceDbs};
use crate::error::Result;
use crate::mibs::loader::IdentityMaps;
use crate::mibs::{
    next_cell, prefixed_next, truncate_counter32, MibUpdater, MibValue, Oid, SnapshotCell, SubId,
    SubIdIndex, UpdaterState, WarnOnce,
};
use crate::tables::{
    counter_key, fields, table_key, APP_LAG_TABLE, APP_PORT_TABLE, APP_VLAN_TABLE,
    CFG_MGMT_PORT_TABLE, SEPARATOR_COLON, SEPARATOR_VBAR, STATE_MGMT_PORT_TABLE,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use sonic_types::{get_index, Ipv4Address, MacAddress};
use std::collections::{BTreeMap, HashMap};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// `interfaces` (1.3.6.1.2.1.2)
pub const INTERFACES_PREFIX: [u32; 7] = [1, 3, 6, 1, 2, 1, 2];

/// `ipNetToMediaPhysAddress` (1.3.6.1.2.1.4.22.1.2)
pub const ARP_PREFIX: [u32; 10] = [1, 3, 6, 1, 2, 1, 4, 22, 1, 2];

const IF_NUMBER: [u32; 2] = [1, 0];
const IF_ENTRY: [u32; 2] = [2, 1];
const IF_COLUMNS: [u32; 22] = [
    1, 2, 3, 4, 5, 6, 7, 8, 9, 10, 11, 12, 13, 14, 15, 16, 17, 18, 19, 20, 21, 22,
];

/// ifTable counter columns and the COUNTERS_DB stat each one reads.
const IF_COUNTERS: [(u32, &str); 12] = [
    (10, "SAI_PORT_STAT_IF_IN_OCTETS"),
    (11, "SAI_PORT_STAT_IF_IN_UCAST_PKTS"),
    (12, "SAI_PORT_STAT_IF_IN_NON_UCAST_PKTS"),
    (13, "SAI_PORT_STAT_IF_IN_DISCARDS"),
    (14, "SAI_PORT_STAT_IF_IN_ERRORS"),
    (15, "SAI_PORT_STAT_IF_IN_UNKNOWN_PROTOS"),
    (16, "SAI_PORT_STAT_IF_OUT_OCTETS"),
    (17, "SAI_PORT_STAT_IF_OUT_UCAST_PKTS"),
    (18, "SAI_PORT_STAT_IF_OUT_NON_UCAST_PKTS"),
    (19, "SAI_PORT_STAT_IF_OUT_DISCARDS"),
    (20, "SAI_PORT_STAT_IF_OUT_ERRORS"),
    (21, "SAI_PORT_STAT_IF_OUT_QLEN"),
];

/// Router interface error counters added to the port (or LAG) they sit on.
const RIF_DROPS_AGGR_MAP: [(&str, &str); 2] = [
    (
        "SAI_PORT_STAT_IF_IN_ERRORS",
        "SAI_ROUTER_INTERFACE_STAT_IN_ERROR_PACKETS",
    ),
    (
        "SAI_PORT_STAT_IF_OUT_ERRORS",
        "SAI_ROUTER_INTERFACE_STAT_OUT_ERROR_PACKETS",
    ),
];

/// Router interface counters standing in for port counters on VLAN rows.
const RIF_COUNTERS_AGGR_MAP: [(&str, &str); 6] = [
    (
        "SAI_PORT_STAT_IF_IN_OCTETS",
        "SAI_ROUTER_INTERFACE_STAT_IN_OCTETS",
    ),
    (
        "SAI_PORT_STAT_IF_IN_UCAST_PKTS",
        "SAI_ROUTER_INTERFACE_STAT_IN_PACKETS",
    ),
    (
        "SAI_PORT_STAT_IF_IN_ERRORS",
        "SAI_ROUTER_INTERFACE_STAT_IN_ERROR_PACKETS",
    ),
    (
        "SAI_PORT_STAT_IF_OUT_OCTETS",
        "SAI_ROUTER_INTERFACE_STAT_OUT_OCTETS",
    ),
    (
        "SAI_PORT_STAT_IF_OUT_UCAST_PKTS",
        "SAI_ROUTER_INTERFACE_STAT_OUT_PACKETS",
    ),
    (
        "SAI_PORT_STAT_IF_OUT_ERRORS",
        "SAI_ROUTER_INTERFACE_STAT_OUT_ERROR_PACKETS",
    ),
];

fn lookup<'a>(table: &[(&'a str, &'a str)], key: &str) -> Option<&'a str> {
    table.iter().find(|(k, _)| *k == key).map(|(_, v)| *v)
}

/// IANAifType values used by the table.
mod if_type {
    pub const ETHERNET_CSMACD: i32 = 6;
    pub const L3_IPVLAN: i32 = 136;
    pub const IEEE8023AD_LAG: i32 = 161;
}

/// ifAdminStatus/ifOperStatus encoding: `up` is 1, anything else is down.
pub fn if_status(status: Option<&str>) -> i32 {
    match status {
        Some("up") => 1,
        _ => 2,
    }
}

/// ifSpeed from a speed in Mb/s, saturating at the Gauge32 maximum.
pub fn if_speed(mbps: u64) -> u32 {
    u32::try_from(mbps.saturating_mul(1_000_000)).unwrap_or(u32::MAX)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RowKind {
    Port,
    Lag,
    Vlan,
    Mgmt,
}

#[derive(Debug, Clone)]
struct IfRow {
    kind: RowKind,
    name: String,
    /// Table entry: APPL_DB for ports, LAGs and VLANs; CONFIG_DB merged
    /// with STATE_DB for management ports.
    entry: HashMap<String, String>,
}

#[derive(Debug, Default)]
struct IfSnapshot {
    identity: Arc<IdentityMaps>,
    rows: BTreeMap<u32, IfRow>,
    row_ids: Vec<SubId>,
    /// Port counters by port SAI id.
    port_counters: HashMap<String, HashMap<String, String>>,
    /// Router interface counters by RIF SAI id.
    rif_counters: HashMap<String, HashMap<String, String>>,
}

/// `ifNumber` and `ifTable`.
pub struct InterfacesUpdater {
    prefix: Oid,
    dbs: NamespaceDbs,
    identity: RwLock<Arc<IdentityMaps>>,
    snapshot: SnapshotCell<IfSnapshot>,
    warned: WarnOnce,
}

impl InterfacesUpdater {
    /// Loads interface identity and seeds the first snapshot.
    ///
    /// Fails when no port in any namespace matches the interface naming.
    pub async fn new(dbs: NamespaceDbs) -> Result<Self> {
        let identity = IdentityMaps::load(&dbs).await?;
        let updater = Self {
            prefix: Oid::new(INTERFACES_PREFIX.to_vec()),
            dbs,
            identity: RwLock::new(identity),
            snapshot: SnapshotCell::new(),
            warned: WarnOnce::default(),
        };
        updater.refresh().await?;
        Ok(updater)
    }

    async fn read_entry(&self, kind: RowKind, name: &str) -> HashMap<String, String> {
        let table = match kind {
            RowKind::Port => APP_PORT_TABLE,
            RowKind::Lag => APP_LAG_TABLE,
            RowKind::Vlan => APP_VLAN_TABLE,
            RowKind::Mgmt => return self.read_mgmt_entry(name).await,
        };
        self.dbs
            .get_all(DbId::Appl, &table_key(table, SEPARATOR_COLON, name))
            .await
            .into_partial(table)
    }

    async fn read_mgmt_entry(&self, name: &str) -> HashMap<String, String> {
        let host = self.dbs.host();
        let mut entry = HashMap::new();
        let reads = [
            (DbId::Config, table_key(CFG_MGMT_PORT_TABLE, SEPARATOR_VBAR, name)),
            (DbId::State, table_key(STATE_MGMT_PORT_TABLE, SEPARATOR_VBAR, name)),
        ];
        for (db, key) in &reads {
            match host.get_all(*db, key).await {
                Ok(fields) => entry.extend(fields),
                Err(e) => warn!(key = %key, error = %e, "Failed to read management port"),
            }
        }
        entry
    }

    async fn read_counters(&self, sai_id: &str) -> HashMap<String, String> {
        self.dbs
            .get_all(DbId::Counters, &counter_key(sai_id))
            .await
            .into_partial("COUNTERS")
    }

    async fn build_snapshot(&self, identity: Arc<IdentityMaps>) -> IfSnapshot {
        let mut rows = BTreeMap::new();
        let named = identity
            .interfaces
            .name_by_index
            .iter()
            .map(|(i, n)| (*i, RowKind::Port, n))
            .chain(identity.lags.lag_by_index.iter().map(|(i, n)| (*i, RowKind::Lag, n)))
            .chain(identity.vlans.name_by_index.iter().map(|(i, n)| (*i, RowKind::Vlan, n)))
            .chain(identity.mgmt.name_by_index.iter().map(|(i, n)| (*i, RowKind::Mgmt, n)));
        for (index, kind, name) in named {
            let entry = self.read_entry(kind, name).await;
            rows.insert(
                index,
                IfRow {
                    kind,
                    name: name.clone(),
                    entry,
                },
            );
        }

        let mut port_counters = HashMap::new();
        for sai_id in identity.interfaces.sai_by_name.values() {
            port_counters.insert(sai_id.clone(), self.read_counters(sai_id).await);
        }

        let mut rif_counters = HashMap::new();
        let rif_ids = identity
            .rifs
            .port_by_rif
            .keys()
            .chain(identity.vlans.sai_by_index.values());
        for rif_id in rif_ids {
            if !rif_counters.contains_key(rif_id) {
                rif_counters.insert(rif_id.clone(), self.read_counters(rif_id).await);
            }
        }

        let row_ids = rows.keys().map(|i| vec![*i]).collect();
        IfSnapshot {
            identity,
            rows,
            row_ids,
            port_counters,
            rif_counters,
        }
    }

    /// Raw 64-bit port counter, warning once per missing port/counter.
    fn port_counter(&self, snap: &IfSnapshot, port: &str, counter: &str) -> Option<u64> {
        let value = snap
            .identity
            .interfaces
            .sai_by_name
            .get(port)
            .and_then(|sai| snap.port_counters.get(sai))
            .and_then(|c| c.get(counter))
            .and_then(|v| v.parse::<u64>().ok());
        if value.is_none() && self.warned.first(&format!("{}:{}", port, counter)) {
            warn!(port, counter, "COUNTERS_DB is missing a port counter");
        }
        value
    }

    /// Error counter of the router interface bound to `sai_id`, or 0.
    fn rif_errors(&self, snap: &IfSnapshot, sai_id: Option<&String>, counter: &str) -> u64 {
        let Some(rif_counter) = lookup(&RIF_DROPS_AGGR_MAP, counter) else {
            return 0;
        };
        sai_id
            .and_then(|sai| snap.identity.rifs.rif_by_port.get(sai))
            .and_then(|rif| snap.rif_counters.get(rif))
            .and_then(|c| c.get(rif_counter))
            .and_then(|v| v.parse::<u64>().ok())
            .unwrap_or(0)
    }

    fn row_counter(&self, snap: &IfSnapshot, index: u32, row: &IfRow, counter: &str) -> Option<u32> {
        let identity = &snap.identity;
        match row.kind {
            RowKind::Port => {
                let value = self.port_counter(snap, &row.name, counter)?;
                let rif = self.rif_errors(snap, identity.interfaces.sai_by_name.get(&row.name), counter);
                Some(truncate_counter32(value.wrapping_add(rif)))
            }
            RowKind::Lag => {
                let members: u64 = identity
                    .lags
                    .members(&row.name)
                    .iter()
                    .filter_map(|m| self.port_counter(snap, m, counter))
                    .map(|v| u64::from(truncate_counter32(v)))
                    .sum();
                let rif = self.rif_errors(snap, identity.lags.sai_by_lag.get(&row.name), counter);
                Some(truncate_counter32(members.wrapping_add(rif)))
            }
            RowKind::Vlan => {
                let rif_counter = lookup(&RIF_COUNTERS_AGGR_MAP, counter)?;
                let value = identity
                    .vlans
                    .sai_by_index
                    .get(&index)
                    .and_then(|sai| snap.rif_counters.get(sai))
                    .and_then(|c| c.get(rif_counter))
                    .and_then(|v| v.parse::<u64>().ok());
                if value.is_none() && self.warned.first(&format!("{}:{}", row.name, rif_counter)) {
                    warn!(vlan = %row.name, counter = rif_counter, "COUNTERS_DB is missing a RIF counter");
                }
                value.map(truncate_counter32)
            }
            RowKind::Mgmt => None,
        }
    }

    fn column(&self, snap: &IfSnapshot, column: u32, index: u32) -> Option<MibValue> {
        let row = snap.rows.get(&index)?;
        let field = |name: &str| row.entry.get(name).map(String::as_str);

        match column {
            1 => i32::try_from(index).ok().map(MibValue::Integer),
            2 => {
                let descr: &str = match row.kind {
                    RowKind::Port => snap.identity.interfaces.alias(&row.name),
                    RowKind::Mgmt => snap
                        .identity
                        .mgmt
                        .alias_by_name
                        .get(&row.name)
                        .map(String::as_str)
                        .unwrap_or(&row.name),
                    RowKind::Lag | RowKind::Vlan => row.name.as_str(),
                };
                Some(MibValue::OctetString(descr.as_bytes().to_vec()))
            }
            3 => Some(MibValue::Integer(match row.kind {
                RowKind::Port | RowKind::Mgmt => if_type::ETHERNET_CSMACD,
                RowKind::Lag => if_type::IEEE8023AD_LAG,
                RowKind::Vlan => if_type::L3_IPVLAN,
            })),
            4 => {
                let mtu = field(fields::MTU)
                    .and_then(|v| v.parse::<i32>().ok())
                    .unwrap_or(0);
                Some(MibValue::Integer(mtu))
            }
            5 => {
                let mbps = field(fields::SPEED)
                    .and_then(|v| v.parse::<u64>().ok())
                    .unwrap_or(0);
                Some(MibValue::Gauge32(if_speed(mbps)))
            }
            6 => Some(MibValue::OctetString(Vec::new())),
            7 => Some(MibValue::Integer(if_status(field(fields::ADMIN_STATUS)))),
            8 => Some(MibValue::Integer(if_status(field(fields::OPER_STATUS)))),
            9 => Some(MibValue::TimeTicks(0)),
            10..=21 => {
                let (_, counter) = IF_COUNTERS.iter().find(|(c, _)| *c == column)?;
                let value = self.row_counter(snap, index, row, counter)?;
                Some(if column == 21 {
                    MibValue::Gauge32(value)
                } else {
                    MibValue::Counter32(value)
                })
            }
            22 => Some(MibValue::null_oid()),
            _ => None,
        }
    }
}

#[async_trait]
impl MibUpdater for InterfacesUpdater {
    fn name(&self) -> &'static str {
        "interfaces"
    }

    fn prefix(&self) -> &Oid {
        &self.prefix
    }

    #[instrument(skip_all)]
    async fn refresh(&self) -> Result<()> {
        let guard = self.snapshot.begin_refresh();
        let identity = self.identity.read().clone();
        let snapshot = self.build_snapshot(identity).await;
        debug!(rows = snapshot.rows.len(), "Refreshed interfaces");
        guard.commit(snapshot);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn reinit(&self) -> Result<()> {
        let identity = IdentityMaps::load(&self.dbs).await?;
        let changed = {
            let mut current = self.identity.write();
            if **current != *identity {
                *current = identity;
                true
            } else {
                false
            }
        };
        if changed {
            info!("Interface identity changed");
            self.warned.reset();
        }
        Ok(())
    }

    fn value_at(&self, sub_id: &[u32]) -> Option<MibValue> {
        let snap = self.snapshot.load();
        if sub_id == IF_NUMBER {
            return i32::try_from(snap.rows.len()).ok().map(MibValue::Integer);
        }
        match sub_id.strip_prefix(&IF_ENTRY[..])? {
            [column, index] => self.column(&snap, *column, *index),
            _ => None,
        }
    }

    fn next(&self, sub_id: &[u32]) -> Option<SubId> {
        if sub_id < &IF_NUMBER[..] {
            return Some(IF_NUMBER.to_vec());
        }
        let snap = self.snapshot.load();
        prefixed_next(&IF_ENTRY, sub_id, |rest| {
            next_cell(&IF_COLUMNS, &snap.row_ids, rest)
        })
    }

    fn state(&self) -> UpdaterState {
        self.snapshot.state()
    }
}

/// One neighbor from the kernel ARP table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArpEntry {
    pub ip: Ipv4Address,
    pub mac: MacAddress,
    pub device: String,
}

/// Source of IPv4 neighbor entries.
#[async_trait]
pub trait ArpSource: Send + Sync {
    async fn entries(&self) -> Result<Vec<ArpEntry>>;
}

/// Reads `/proc/net/arp` (or a file in the same format).
#[derive(Debug, Clone)]
pub struct ProcArpTable {
    path: PathBuf,
}

impl ProcArpTable {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

#[async_trait]
impl ArpSource for ProcArpTable {
    async fn entries(&self) -> Result<Vec<ArpEntry>> {
        let contents = tokio::fs::read_to_string(&self.path).await?;
        Ok(parse_arp_table(&contents))
    }
}

/// Parses the `/proc/net/arp` layout:
/// `IP address  HW type  Flags  HW address  Mask  Device`, one header line.
pub fn parse_arp_table(contents: &str) -> Vec<ArpEntry> {
    contents
        .lines()
        .skip(1)
        .filter_map(|line| {
            let cols: Vec<&str> = line.split_whitespace().collect();
            if cols.len() < 6 {
                return None;
            }
            let ip: Option<Ipv4Address> = cols[0].parse().ok();
            let mac: Option<MacAddress> = cols[3].parse().ok();
            match (ip, mac) {
                (Some(ip), Some(mac)) => Some(ArpEntry {
                    ip,
                    mac,
                    device: cols[5].to_string(),
                }),
                _ => {
                    debug!(line, "Skipping unparsable ARP line");
                    None
                }
            }
        })
        .collect()
}

/// `ipNetToMediaPhysAddress`, indexed by `(ifindex, ip octets)`.
pub struct ArpUpdater {
    prefix: Oid,
    source: Arc<dyn ArpSource>,
    snapshot: SnapshotCell<SubIdIndex<MacAddress>>,
}

impl ArpUpdater {
    pub async fn new(source: Arc<dyn ArpSource>) -> Result<Self> {
        let updater = Self {
            prefix: Oid::new(ARP_PREFIX.to_vec()),
            source,
            snapshot: SnapshotCell::new(),
        };
        updater.refresh().await?;
        Ok(updater)
    }
}

#[async_trait]
impl MibUpdater for ArpUpdater {
    fn name(&self) -> &'static str {
        "arp"
    }

    fn prefix(&self) -> &Oid {
        &self.prefix
    }

    #[instrument(skip_all)]
    async fn refresh(&self) -> Result<()> {
        let guard = self.snapshot.begin_refresh();
        let mut index = SubIdIndex::new();
        for entry in self.source.entries().await? {
            let Some(if_index) = get_index(&entry.device) else {
                continue;
            };
            let mut sub_id = vec![if_index];
            sub_id.extend(entry.ip.sub_ids());
            index.insert(sub_id, entry.mac);
        }
        debug!(entries = index.len(), "Refreshed ARP table");
        guard.commit(index);
        Ok(())
    }

    fn value_at(&self, sub_id: &[u32]) -> Option<MibValue> {
        self.snapshot
            .load()
            .lookup(sub_id)
            .map(|mac| MibValue::OctetString(mac.as_bytes().to_vec()))
    }

    fn next(&self, sub_id: &[u32]) -> Option<SubId> {
        self.snapshot.load().successor(sub_id).map(<[u32]>::to_vec)
    }

    fn state(&self) -> UpdaterState {
        self.snapshot.state()
    }
}
