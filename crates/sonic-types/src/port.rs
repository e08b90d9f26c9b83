//! SONiC interface naming and the SNMP interface index scheme.
//!
//! Every interface the agent exposes is numbered by its name: the digits that
//! follow a known prefix are added to a per-kind base, so `Ethernet8` is
//! index 9 and `PortChannel01` is index 1001. Backplane ports get their own
//! range so they never collide with front-panel ports.

use crate::ParseError;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Interface families that carry an SNMP interface index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InterfaceKind {
    /// Front-panel port, `Ethernet<N>`.
    Ethernet,
    /// Backplane port on multi-ASIC devices, `Ethernet-BP<N>`.
    EthernetBackplane,
    /// Link aggregation group, `PortChannel<N>`.
    PortChannel,
    /// VLAN interface, `Vlan<N>`.
    Vlan,
    /// Management port, `eth<N>`.
    Mgmt,
}

static ETHERNET_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Ethernet(\d+)$").expect("Invalid regex pattern"));
static ETHERNET_BP_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Ethernet-BP(\d+)$").expect("Invalid regex pattern"));
static PORTCHANNEL_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^PortChannel(\d+)$").expect("Invalid regex pattern"));
static VLAN_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^Vlan(\d+)$").expect("Invalid regex pattern"));
static MGMT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^eth(\d+)$").expect("Invalid regex pattern"));

impl InterfaceKind {
    pub const ALL: [InterfaceKind; 5] = [
        InterfaceKind::Ethernet,
        InterfaceKind::EthernetBackplane,
        InterfaceKind::PortChannel,
        InterfaceKind::Vlan,
        InterfaceKind::Mgmt,
    ];

    /// Offset added to the name's trailing number.
    pub const fn base_index(&self) -> u32 {
        match self {
            InterfaceKind::Ethernet => 1,
            InterfaceKind::PortChannel => 1000,
            InterfaceKind::Vlan => 2000,
            InterfaceKind::EthernetBackplane => 9000,
            InterfaceKind::Mgmt => 10000,
        }
    }

    fn pattern(&self) -> &'static Regex {
        match self {
            InterfaceKind::Ethernet => &ETHERNET_RE,
            InterfaceKind::EthernetBackplane => &ETHERNET_BP_RE,
            InterfaceKind::PortChannel => &PORTCHANNEL_RE,
            InterfaceKind::Vlan => &VLAN_RE,
            InterfaceKind::Mgmt => &MGMT_RE,
        }
    }

    /// Classifies an interface name, returning its kind and index.
    ///
    /// Names outside the known patterns, and numbers that would overflow the
    /// index space, yield `None`.
    pub fn classify(name: &str) -> Option<(InterfaceKind, u32)> {
        Self::ALL.iter().find_map(|kind| {
            let caps = kind.pattern().captures(name)?;
            let number: u32 = caps.get(1)?.as_str().parse().ok()?;
            Some((*kind, number.checked_add(kind.base_index())?))
        })
    }

    /// Returns true for the kinds whose counters live in `COUNTERS_PORT_NAME_MAP`.
    pub const fn is_port(&self) -> bool {
        matches!(
            self,
            InterfaceKind::Ethernet | InterfaceKind::EthernetBackplane
        )
    }
}

impl fmt::Display for InterfaceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            InterfaceKind::Ethernet => "Ethernet",
            InterfaceKind::EthernetBackplane => "Ethernet-BP",
            InterfaceKind::PortChannel => "PortChannel",
            InterfaceKind::Vlan => "Vlan",
            InterfaceKind::Mgmt => "eth",
        };
        f.write_str(s)
    }
}

/// Returns the SNMP interface index for a SONiC interface name.
///
/// # Examples
///
/// ```
/// use sonic_types::get_index;
///
/// assert_eq!(get_index("Ethernet0"), Some(1));
/// assert_eq!(get_index("Ethernet-BP4"), Some(9004));
/// assert_eq!(get_index("PortChannel_Temp"), None);
/// ```
pub fn get_index(name: &str) -> Option<u32> {
    InterfaceKind::classify(name).map(|(_, index)| index)
}

/// Like [`get_index`], but reports unknown names as an error.
pub fn get_index_from_str(name: &str) -> Result<u32, ParseError> {
    get_index(name).ok_or_else(|| ParseError::InvalidInterfaceName(name.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_front_panel_index() {
        assert_eq!(get_index("Ethernet0"), Some(1));
        assert_eq!(get_index("Ethernet124"), Some(125));
    }

    #[test]
    fn test_backplane_index() {
        assert_eq!(
            InterfaceKind::classify("Ethernet-BP16"),
            Some((InterfaceKind::EthernetBackplane, 9016))
        );
    }

    #[test]
    fn test_logical_indexes() {
        assert_eq!(get_index("PortChannel01"), Some(1001));
        assert_eq!(get_index("Vlan1000"), Some(3000));
        assert_eq!(get_index("eth0"), Some(10000));
    }

    #[test]
    fn test_unknown_names() {
        assert_eq!(get_index("PortChannel_Temp"), None);
        assert_eq!(get_index("Loopback0"), None);
        assert_eq!(get_index("Ethernet"), None);
        assert_eq!(get_index("xEthernet0"), None);
        assert_eq!(get_index("Ethernet99999999999"), None);
    }

    #[test]
    fn test_is_port() {
        assert!(InterfaceKind::Ethernet.is_port());
        assert!(InterfaceKind::EthernetBackplane.is_port());
        assert!(!InterfaceKind::PortChannel.is_port());
        assert!(!InterfaceKind::Mgmt.is_port());
    }

    #[test]
    fn test_get_index_from_str_error() {
        assert_eq!(
            get_index_from_str("lo"),
            Err(ParseError::InvalidInterfaceName("lo".to_string()))
        );
        assert_eq!(get_index_from_str("Ethernet4"), Ok(5));
    }
}
