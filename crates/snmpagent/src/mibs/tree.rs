//! Dispatch of GET and GET-NEXT across registered updaters.

use super::{MibUpdater, MibValue, Oid};
use crate::error::{Result, SnmpAgentError};
use std::sync::Arc;
use tracing::info;

/// Updaters ordered by prefix, covering disjoint subtrees.
#[derive(Default, Clone)]
pub struct MibTree {
    updaters: Vec<Arc<dyn MibUpdater>>,
}

impl MibTree {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds an updater. Its prefix must not contain, or sit inside, a prefix
    /// already registered.
    pub fn register(&mut self, updater: Arc<dyn MibUpdater>) -> Result<()> {
        let prefix = updater.prefix().clone();
        if let Some(existing) = self
            .updaters
            .iter()
            .find(|u| u.prefix().starts_with(&prefix) || prefix.starts_with(u.prefix()))
        {
            return Err(SnmpAgentError::config(format!(
                "{} at {} overlaps {} at {}",
                updater.name(),
                prefix,
                existing.name(),
                existing.prefix()
            )));
        }

        let pos = self
            .updaters
            .partition_point(|u| u.prefix() < &prefix);
        info!(mib = updater.name(), prefix = %prefix, "Registered MIB");
        self.updaters.insert(pos, updater);
        Ok(())
    }

    pub fn updaters(&self) -> &[Arc<dyn MibUpdater>] {
        &self.updaters
    }

    pub fn len(&self) -> usize {
        self.updaters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.updaters.is_empty()
    }

    /// Exact-match GET. `None` is "no such object".
    pub fn get(&self, oid: &Oid) -> Option<MibValue> {
        self.updaters.iter().find_map(|u| {
            let sub_id = oid.strip_prefix(u.prefix())?;
            u.value_at(sub_id)
        })
    }

    /// GET-NEXT: the first OID strictly after `oid` that has a value.
    /// `None` is "end of MIB view".
    pub fn get_next(&self, oid: &Oid) -> Option<(Oid, MibValue)> {
        for updater in &self.updaters {
            let prefix = updater.prefix();
            let mut cursor = match oid.strip_prefix(prefix) {
                Some(rest) => rest.to_vec(),
                None if oid < prefix => Vec::new(),
                None => continue,
            };

            while let Some(sub_id) = updater.next(&cursor) {
                if let Some(value) = updater.value_at(&sub_id) {
                    return Some((prefix.join(&sub_id), value));
                }
                cursor = sub_id;
            }
        }
        None
    }

    /// Every OID with a value, in walk order.
    pub fn walk(&self) -> Vec<(Oid, MibValue)> {
        let mut rows = Vec::new();
        let mut cursor = Oid::default();
        while let Some((oid, value)) = self.get_next(&cursor) {
            cursor = oid.clone();
            rows.push((oid, value));
        }
        rows
    }
}
