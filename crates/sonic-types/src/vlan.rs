//! VLAN identifier as found in FDB entries and `Vlan<N>` interface names.

use crate::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// IEEE 802.1Q VLAN identifier (1-4094).
///
/// ASIC_DB FDB keys carry the VLAN as a decimal string (`"vlan":"1000"`),
/// and the VLAN object's `SAI_VLAN_ATTR_VLAN_ID` attribute uses the same
/// form. Both parse through [`FromStr`].
///
/// # Examples
///
/// ```
/// use sonic_types::VlanId;
///
/// let vlan: VlanId = "1000".parse().unwrap();
/// assert_eq!(vlan.sub_id(), 1000);
/// assert!("4095".parse::<VlanId>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct VlanId(u16);

impl VlanId {
    pub const MIN: u16 = 1;
    pub const MAX: u16 = 4094;

    pub fn new(id: u16) -> Result<Self, ParseError> {
        if (Self::MIN..=Self::MAX).contains(&id) {
            Ok(VlanId(id))
        } else {
            Err(ParseError::InvalidVlanId(id.to_string()))
        }
    }

    pub const fn as_u16(&self) -> u16 {
        self.0
    }

    /// The VLAN as the leading sub-identifier of a dot1qTpFdbTable row.
    pub const fn sub_id(&self) -> u32 {
        self.0 as u32
    }
}

impl fmt::Display for VlanId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for VlanId {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        let digits = trimmed.strip_prefix("Vlan").unwrap_or(trimmed);

        let id: u16 = digits
            .parse()
            .map_err(|_| ParseError::InvalidVlanId(s.to_string()))?;

        VlanId::new(id)
    }
}

impl TryFrom<u16> for VlanId {
    type Error = ParseError;

    fn try_from(id: u16) -> Result<Self, Self::Error> {
        VlanId::new(id)
    }
}

impl From<VlanId> for u16 {
    fn from(vlan: VlanId) -> u16 {
        vlan.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_range() {
        assert!(VlanId::new(1).is_ok());
        assert!(VlanId::new(4094).is_ok());
        assert!(VlanId::new(0).is_err());
        assert!(VlanId::new(4095).is_err());
    }

    #[test]
    fn test_parse_fdb_field() {
        let vlan: VlanId = "1000".parse().unwrap();
        assert_eq!(vlan.as_u16(), 1000);
        assert_eq!(vlan.sub_id(), 1000);
    }

    #[test]
    fn test_parse_interface_name() {
        let vlan: VlanId = "Vlan100".parse().unwrap();
        assert_eq!(vlan.as_u16(), 100);
    }

    #[test]
    fn test_parse_error_keeps_input() {
        assert_eq!(
            "oid:0x26000000000013".parse::<VlanId>(),
            Err(ParseError::InvalidVlanId("oid:0x26000000000013".to_string()))
        );
    }
}
