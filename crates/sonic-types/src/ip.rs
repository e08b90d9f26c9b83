//! IPv4 address and prefix types used by the ARP and route tables.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::Ipv4Addr;
use std::str::FromStr;

/// An IPv4 address that renders as four SNMP sub-identifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Ipv4Address(Ipv4Addr);

impl Ipv4Address {
    pub const UNSPECIFIED: Self = Ipv4Address(Ipv4Addr::UNSPECIFIED);

    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Ipv4Address(Ipv4Addr::new(a, b, c, d))
    }

    pub const fn inner(&self) -> Ipv4Addr {
        self.0
    }

    pub const fn octets(&self) -> [u8; 4] {
        self.0.octets()
    }

    /// Returns the dotted-quad octets as sub-identifiers (`10.0.0.1` -> `[10, 0, 0, 1]`).
    pub fn sub_ids(&self) -> [u32; 4] {
        self.octets().map(u32::from)
    }
}

impl fmt::Display for Ipv4Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Ipv4Address {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<Ipv4Addr>()
            .map(Ipv4Address)
            .map_err(|_| ParseError::InvalidIpAddress(s.to_string()))
    }
}

impl From<Ipv4Addr> for Ipv4Address {
    fn from(addr: Ipv4Addr) -> Self {
        Ipv4Address(addr)
    }
}

/// An IPv4 prefix in CIDR notation, as used in APPL_DB `ROUTE_TABLE` keys.
///
/// The stored address is masked to the network address on construction, so
/// `10.1.2.3/8` and `10.0.0.0/8` compare equal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Ipv4Prefix {
    network: Ipv4Address,
    prefix_len: u8,
}

impl Ipv4Prefix {
    /// The default route, `0.0.0.0/0`.
    pub const DEFAULT_ROUTE: Ipv4Prefix = Ipv4Prefix {
        network: Ipv4Address::UNSPECIFIED,
        prefix_len: 0,
    };

    pub fn new(address: Ipv4Address, prefix_len: u8) -> Result<Self, ParseError> {
        if prefix_len > 32 {
            return Err(ParseError::InvalidIpPrefix(format!(
                "{}/{}",
                address, prefix_len
            )));
        }
        let mask = mask_bits(prefix_len);
        let network = Ipv4Addr::from(u32::from(address.inner()) & mask);
        Ok(Ipv4Prefix {
            network: network.into(),
            prefix_len,
        })
    }

    pub const fn network(&self) -> Ipv4Address {
        self.network
    }

    pub const fn prefix_len(&self) -> u8 {
        self.prefix_len
    }

    /// Returns the dotted netmask for the prefix length (`/24` -> `255.255.255.0`).
    pub fn netmask(&self) -> Ipv4Address {
        Ipv4Addr::from(mask_bits(self.prefix_len)).into()
    }

    pub fn is_default(&self) -> bool {
        self.prefix_len == 0
    }
}

fn mask_bits(prefix_len: u8) -> u32 {
    match prefix_len {
        0 => 0,
        len => u32::MAX << (32 - u32::from(len)),
    }
}

impl fmt::Display for Ipv4Prefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.network, self.prefix_len)
    }
}

impl FromStr for Ipv4Prefix {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (addr_str, len_str) = s
            .rsplit_once('/')
            .ok_or_else(|| ParseError::InvalidIpPrefix(s.to_string()))?;

        let address: Ipv4Address = addr_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;
        let prefix_len: u8 = len_str
            .parse()
            .map_err(|_| ParseError::InvalidIpPrefix(s.to_string()))?;

        Ipv4Prefix::new(address, prefix_len)
    }
}
