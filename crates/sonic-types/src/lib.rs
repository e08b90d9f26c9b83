//! Common SONiC types shared by the SNMP subagent crates.
//!
//! Every type here knows how to render itself as SNMP sub-identifiers, since
//! that is how table rows are addressed on the wire:
//!
//! - [`MacAddress`]: 48-bit Ethernet MAC address, six decimal sub-ids
//! - [`Ipv4Address`] / [`Ipv4Prefix`]: IPv4 address and CIDR prefix, four sub-ids each
//! - [`VlanId`]: IEEE 802.1Q VLAN identifier
//! - [`InterfaceKind`]: SONiC interface naming and the interface index scheme

mod ip;
mod mac;
mod port;
mod vlan;

pub use ip::{Ipv4Address, Ipv4Prefix};
pub use mac::MacAddress;
pub use port::{get_index, get_index_from_str, InterfaceKind};
pub use vlan::VlanId;

/// Common error type for parsing failures.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("invalid MAC address format: {0}")]
    InvalidMacAddress(String),

    #[error("invalid IPv4 address format: {0}")]
    InvalidIpAddress(String),

    #[error("invalid IPv4 prefix format: {0}")]
    InvalidIpPrefix(String),

    #[error("invalid VLAN ID: {0} (must be 1-4094)")]
    InvalidVlanId(String),

    #[error("unrecognized interface name: {0}")]
    InvalidInterfaceName(String),
}
