//! MAC address type as it appears in ASIC_DB and the kernel ARP table.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A 48-bit Ethernet MAC address.
///
/// SONiC writes MACs upper-case in ASIC_DB FDB keys (`7C:FE:90:80:9F:05`)
/// while the kernel uses lower case; both parse to the same value.
///
/// # Examples
///
/// ```
/// use sonic_types::MacAddress;
///
/// let mac: MacAddress = "7C:FE:90:80:9F:05".parse().unwrap();
/// assert_eq!(mac.sub_ids(), [124, 254, 144, 128, 159, 5]);
/// assert_eq!(mac.to_string(), "7c:fe:90:80:9f:05");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MacAddress([u8; 6]);

impl MacAddress {
    pub const fn new(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }

    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Returns each octet as one SNMP sub-identifier.
    pub fn sub_ids(&self) -> [u32; 6] {
        self.0.map(u32::from)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.0;
        write!(f, "{a:02x}:{b:02x}:{c:02x}:{d:02x}:{e:02x}:{g:02x}")
    }
}

impl FromStr for MacAddress {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || ParseError::InvalidMacAddress(s.to_string());
        let separator = if s.contains('-') { '-' } else { ':' };

        let mut bytes = [0u8; 6];
        let mut count = 0;
        for part in s.trim().split(separator) {
            if count == 6 || part.is_empty() || part.len() > 2 {
                return Err(invalid());
            }
            bytes[count] = u8::from_str_radix(part, 16).map_err(|_| invalid())?;
            count += 1;
        }

        if count != 6 {
            return Err(invalid());
        }
        Ok(MacAddress(bytes))
    }
}

impl TryFrom<String> for MacAddress {
    type Error = ParseError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<MacAddress> for String {
    fn from(mac: MacAddress) -> String {
        mac.to_string()
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        MacAddress(bytes)
    }
}
