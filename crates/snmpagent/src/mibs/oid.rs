//! Object identifiers.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid OID: {0}")]
pub struct OidParseError(pub String);

/// An SNMP object identifier, compared lexicographically arc by arc.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Oid(Vec<u32>);

impl Oid {
    pub fn new(arcs: Vec<u32>) -> Self {
        Oid(arcs)
    }

    pub fn as_slice(&self) -> &[u32] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Returns the arcs after `prefix`, or `None` if `prefix` does not lead this OID.
    pub fn strip_prefix(&self, prefix: &Oid) -> Option<&[u32]> {
        self.0.strip_prefix(prefix.as_slice())
    }

    pub fn starts_with(&self, prefix: &Oid) -> bool {
        self.0.starts_with(prefix.as_slice())
    }

    /// This OID with `sub_id` appended.
    pub fn join(&self, sub_id: &[u32]) -> Oid {
        let mut arcs = Vec::with_capacity(self.0.len() + sub_id.len());
        arcs.extend_from_slice(&self.0);
        arcs.extend_from_slice(sub_id);
        Oid(arcs)
    }
}

impl From<&[u32]> for Oid {
    fn from(arcs: &[u32]) -> Self {
        Oid(arcs.to_vec())
    }
}

impl fmt::Display for Oid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for arc in &self.0 {
            if !first {
                f.write_str(".")?;
            }
            write!(f, "{}", arc)?;
            first = false;
        }
        Ok(())
    }
}

/// Parses dotted notation with an optional leading dot (`.1.3.6.1`).
impl FromStr for Oid {
    type Err = OidParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let body = s.strip_prefix('.').unwrap_or(s);
        if body.is_empty() {
            return Err(OidParseError(s.to_string()));
        }
        body.split('.')
            .map(|arc| arc.parse::<u32>())
            .collect::<Result<Vec<_>, _>>()
            .map(Oid)
            .map_err(|_| OidParseError(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_parse_and_display() {
        let oid: Oid = ".1.3.6.1.2.1.2".parse().unwrap();
        assert_eq!(oid.as_slice(), &[1, 3, 6, 1, 2, 1, 2]);
        assert_eq!(oid.to_string(), "1.3.6.1.2.1.2");
    }

    #[test]
    fn test_parse_errors() {
        assert!("".parse::<Oid>().is_err());
        assert!("1..3".parse::<Oid>().is_err());
        assert!("1.3.x".parse::<Oid>().is_err());
    }

    #[test]
    fn test_prefix_helpers() {
        let prefix: Oid = "1.3.6.1.2.1.2".parse().unwrap();
        let oid = prefix.join(&[2, 1, 10, 1]);
        assert!(oid.starts_with(&prefix));
        assert_eq!(oid.strip_prefix(&prefix), Some(&[2, 1, 10, 1][..]));
        assert_eq!(prefix.strip_prefix(&oid), None);
    }

    #[test]
    fn test_ordering_is_lexicographic() {
        let a: Oid = "1.3.6.1.2".parse().unwrap();
        let b: Oid = "1.3.6.1.2.1".parse().unwrap();
        let c: Oid = "1.3.6.1.3".parse().unwrap();
        assert!(a < b);
        assert!(b < c);
    }
}
