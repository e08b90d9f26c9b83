//! Shared fixtures for the integration tests.

#![allow(dead_code)]

use sonic_snmpagent::{DbConnector, DbId, MemoryConnector, NamespaceDbs};
use std::sync::Arc;

/// A two-ASIC device: management port and platform state on the host,
/// front-panel and backplane ports split across `asic0` and `asic1`.
pub struct MultiAsic {
    pub host: Arc<MemoryConnector>,
    pub asic0: Arc<MemoryConnector>,
    pub asic1: Arc<MemoryConnector>,
}

impl MultiAsic {
    pub fn new() -> Self {
        let host = Arc::new(MemoryConnector::new(""));
        let asic0 = Arc::new(MemoryConnector::new("asic0"));
        let asic1 = Arc::new(MemoryConnector::new("asic1"));

        host.hset(DbId::Config, "MGMT_PORT|eth0", [("alias", "mgmt0"), ("admin_status", "up")]);
        host.hset(DbId::State, "MGMT_PORT_TABLE|eth0", [("oper_status", "up")]);
        host.hset(DbId::State, "CHASSIS_INFO|chassis 1", [("psu_num", "1")]);
        host.hset(DbId::State, "PSU_INFO|PSU 1", [("presence", "true"), ("status", "true")]);

        add_port(&asic0, "Ethernet0", "oid:0x1000000000001", 4_294_967_303);
        add_port(&asic0, "Ethernet-BP0", "oid:0x1000000000002", 100);
        add_port(&asic0, "Ethernet-BP4", "oid:0x1000000000003", 200);
        add_lag(&asic0, "PortChannel01", "oid:0x2000000000001", &["Ethernet-BP0", "Ethernet-BP4"]);
        asic0.hset(DbId::Appl, "LAG_TABLE:PortChannel_Temp", [("admin_status", "up")]);
        add_queue(&asic0, "Ethernet0:3", "oid:0x15000000000003", 12);

        add_port(&asic1, "Ethernet4", "oid:0x1000000000101", 40);
        add_port(&asic1, "Ethernet-BP16", "oid:0x1000000000102", 1);
        add_port(&asic1, "Ethernet-BP20", "oid:0x1000000000103", 2);
        add_lag(&asic1, "PortChannel03", "oid:0x2000000000101", &["Ethernet-BP16", "Ethernet-BP20"]);
        add_queue(&asic1, "Ethernet4:0", "oid:0x15000000000100", 5);

        Self { host, asic0, asic1 }
    }

    pub fn dbs(&self) -> NamespaceDbs {
        NamespaceDbs::new(vec![
            self.host.clone() as Arc<dyn DbConnector>,
            self.asic0.clone() as Arc<dyn DbConnector>,
            self.asic1.clone() as Arc<dyn DbConnector>,
        ])
        .unwrap()
    }
}

pub fn add_port(conn: &MemoryConnector, name: &str, oid: &str, in_octets: u64) {
    conn.hset(DbId::Counters, "COUNTERS_PORT_NAME_MAP", [(name, oid)]);
    conn.hset(
        DbId::Appl,
        &format!("PORT_TABLE:{}", name),
        [("mtu", "9100"), ("speed", "100000"), ("admin_status", "up"), ("oper_status", "up")],
    );
    set_in_octets(conn, oid, in_octets);
}

pub fn set_in_octets(conn: &MemoryConnector, oid: &str, in_octets: u64) {
    conn.hset(
        DbId::Counters,
        &format!("COUNTERS:{}", oid),
        [("SAI_PORT_STAT_IF_IN_OCTETS", in_octets.to_string())],
    );
}

pub fn add_lag(conn: &MemoryConnector, lag: &str, oid: &str, members: &[&str]) {
    conn.hset(DbId::Appl, &format!("LAG_TABLE:{}", lag), [("admin_status", "up"), ("mtu", "9100")]);
    for member in members {
        conn.hset(
            DbId::Appl,
            &format!("LAG_MEMBER_TABLE:{}:{}", lag, member),
            [("status", "enabled")],
        );
    }
    conn.hset(DbId::Counters, "COUNTERS_LAG_NAME_MAP", [(lag, oid)]);
}

pub fn add_queue(conn: &MemoryConnector, queue: &str, oid: &str, packets: u64) {
    conn.hset(DbId::Counters, "COUNTERS_QUEUE_NAME_MAP", [(queue, oid)]);
    conn.hset(
        DbId::Counters,
        &format!("COUNTERS:{}", oid),
        [("SAI_QUEUE_STAT_PACKETS", packets.to_string())],
    );
}

/// `/proc/net/arp` contents with the given `(ip, mac, device)` rows.
pub fn arp_table(rows: &[(&str, &str, &str)]) -> String {
    let mut contents =
        "IP address       HW type     Flags       HW address            Mask     Device\n"
            .to_string();
    for (ip, mac, device) in rows {
        contents.push_str(&format!(
            "{:<16} 0x1         0x2         {:<21} *        {}\n",
            ip, mac, device
        ));
    }
    contents
}
