//! Table names, key layouts and field names read by the MIB updaters

/// COUNTERS_DB hash mapping port name to `oid:0x<sai>`
pub const COUNTERS_PORT_NAME_MAP: &str = "COUNTERS_PORT_NAME_MAP";

/// COUNTERS_DB hash mapping LAG name to `oid:0x<sai>`
pub const COUNTERS_LAG_NAME_MAP: &str = "COUNTERS_LAG_NAME_MAP";

/// COUNTERS_DB hash mapping `<port>:<queue>` to `oid:0x<sai>`
pub const COUNTERS_QUEUE_NAME_MAP: &str = "COUNTERS_QUEUE_NAME_MAP";

/// COUNTERS_DB hash mapping RIF name to `oid:0x<sai>`
pub const COUNTERS_RIF_NAME_MAP: &str = "COUNTERS_RIF_NAME_MAP";

/// COUNTERS_DB hash mapping `oid:0x<sai>` to RIF type
pub const COUNTERS_RIF_TYPE_MAP: &str = "COUNTERS_RIF_TYPE_MAP";

/// SAI object id prefix on values in the name maps
pub const SAI_OID_PREFIX: &str = "oid:0x";

pub const APP_PORT_TABLE: &str = "PORT_TABLE";
pub const APP_LAG_TABLE: &str = "LAG_TABLE";
pub const APP_LAG_MEMBER_TABLE: &str = "LAG_MEMBER_TABLE";
pub const APP_VLAN_TABLE: &str = "VLAN_TABLE";
pub const APP_ROUTE_TABLE: &str = "ROUTE_TABLE";

pub const CFG_MGMT_PORT_TABLE: &str = "MGMT_PORT";
pub const STATE_MGMT_PORT_TABLE: &str = "MGMT_PORT_TABLE";
pub const STATE_CHASSIS_INFO_TABLE: &str = "CHASSIS_INFO";
pub const STATE_PSU_INFO_TABLE: &str = "PSU_INFO";
pub const STATE_TRANSCEIVER_INFO_TABLE: &str = "TRANSCEIVER_INFO";
pub const STATE_TRANSCEIVER_DOM_SENSOR_TABLE: &str = "TRANSCEIVER_DOM_SENSOR";

pub const ASIC_ROUTER_INTERFACE_PREFIX: &str = "ASIC_STATE:SAI_OBJECT_TYPE_ROUTER_INTERFACE:";
pub const ASIC_BRIDGE_PORT_PREFIX: &str = "ASIC_STATE:SAI_OBJECT_TYPE_BRIDGE_PORT:";
pub const ASIC_FDB_ENTRY_PREFIX: &str = "ASIC_STATE:SAI_OBJECT_TYPE_FDB_ENTRY:";
pub const ASIC_VLAN_PREFIX: &str = "ASIC_STATE:SAI_OBJECT_TYPE_VLAN:";

/// APPL_DB and COUNTERS_DB key separator
pub const SEPARATOR_COLON: char = ':';
/// CONFIG_DB and STATE_DB key separator
pub const SEPARATOR_VBAR: char = '|';

/// Chassis entry holding the PSU count
pub const CHASSIS_KEY: &str = "chassis 1";

/// Field names used in the tables above
pub mod fields {
    pub const ALIAS: &str = "alias";
    pub const ADMIN_STATUS: &str = "admin_status";
    pub const OPER_STATUS: &str = "oper_status";
    pub const MTU: &str = "mtu";
    pub const SPEED: &str = "speed";
    pub const NEXTHOP: &str = "nexthop";

    pub const PSU_NUM: &str = "psu_num";
    pub const PRESENCE: &str = "presence";
    pub const STATUS: &str = "status";

    pub const RIF_ATTR_PORT_ID: &str = "SAI_ROUTER_INTERFACE_ATTR_PORT_ID";
    pub const RIF_TYPE_VLAN: &str = "SAI_ROUTER_INTERFACE_TYPE_VLAN";
    pub const BRIDGE_PORT_ATTR_PORT_ID: &str = "SAI_BRIDGE_PORT_ATTR_PORT_ID";
    pub const FDB_ENTRY_ATTR_BRIDGE_PORT_ID: &str = "SAI_FDB_ENTRY_ATTR_BRIDGE_PORT_ID";
    pub const VLAN_ATTR_VLAN_ID: &str = "SAI_VLAN_ATTR_VLAN_ID";

    // SNMP_OVERLAY_DB
    pub const OVERLAY_TYPE: &str = "type";
    pub const OVERLAY_DATA: &str = "data";
}

/// `COUNTERS:oid:0x<sai>` for a port, LAG or RIF id without its prefix
pub fn counter_key(sai_id: &str) -> String {
    format!("COUNTERS:{}{}", SAI_OID_PREFIX, sai_id)
}

/// `COUNTERS:<oid>` for a queue id as stored in the queue name map
pub fn queue_counter_key(queue_oid: &str) -> String {
    format!("COUNTERS:{}", queue_oid)
}

/// `<table><sep><key>`
pub fn table_key(table: &str, separator: char, key: &str) -> String {
    format!("{}{}{}", table, separator, key)
}

/// Strips the `oid:0x` prefix if present
pub fn strip_sai_prefix(oid: &str) -> &str {
    oid.strip_prefix(SAI_OID_PREFIX).unwrap_or(oid)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counter_keys() {
        assert_eq!(counter_key("1000000000002"), "COUNTERS:oid:0x1000000000002");
        assert_eq!(
            queue_counter_key("oid:0x15000000000230"),
            "COUNTERS:oid:0x15000000000230"
        );
    }

    #[test]
    fn test_strip_sai_prefix() {
        assert_eq!(strip_sai_prefix("oid:0x1000000000002"), "1000000000002");
        // Only the literal prefix is removed, not leading characters from its set.
        assert_eq!(strip_sai_prefix("oid:0x0ab"), "0ab");
        assert_eq!(strip_sai_prefix("0ab"), "0ab");
    }

    #[test]
    fn test_table_key() {
        assert_eq!(
            table_key(STATE_PSU_INFO_TABLE, SEPARATOR_VBAR, "PSU 1"),
            "PSU_INFO|PSU 1"
        );
        assert_eq!(
            table_key(APP_PORT_TABLE, SEPARATOR_COLON, "Ethernet0"),
            "PORT_TABLE:Ethernet0"
        );
    }
}
