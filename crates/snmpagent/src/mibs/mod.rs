//! MIB updaters and the OID resolution layer.
//!
//! Each updater owns one MIB subtree. It snapshots store state into an
//! in-process index on [`MibUpdater::refresh`] and answers point and
//! GET-NEXT queries against the last committed snapshot, never against the
//! store. [`MibTree`] stitches the updaters into one ordered OID space for
//! the AgentX layer.

pub mod ietf;
mod index;
pub mod loader;
mod oid;
pub mod overlay;
mod tree;
pub mod vendor;

pub use index::{next_cell, prefixed_next, SubId, SubIdIndex};
pub use oid::{Oid, OidParseError};
pub use tree::MibTree;

use crate::error::Result;
use async_trait::async_trait;
use parking_lot::{Mutex, RwLock};
use std::collections::HashSet;
use std::sync::Arc;

/// Values an updater can answer with, tagged with their SNMP type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MibValue {
    Integer(i32),
    OctetString(Vec<u8>),
    ObjectIdentifier(Vec<u32>),
    IpAddress([u8; 4]),
    Counter32(u32),
    Gauge32(u32),
    TimeTicks(u32),
    Counter64(u64),
}

impl MibValue {
    /// `0.0`, the conventional "no specific OID" value.
    pub fn null_oid() -> Self {
        MibValue::ObjectIdentifier(vec![0, 0])
    }

    /// SNMP type name as printed by net-snmp tools.
    pub fn type_name(&self) -> &'static str {
        match self {
            MibValue::Integer(_) => "INTEGER",
            MibValue::OctetString(_) => "STRING",
            MibValue::ObjectIdentifier(_) => "OID",
            MibValue::IpAddress(_) => "IpAddress",
            MibValue::Counter32(_) => "Counter32",
            MibValue::Gauge32(_) => "Gauge32",
            MibValue::TimeTicks(_) => "Timeticks",
            MibValue::Counter64(_) => "Counter64",
        }
    }
}

impl std::fmt::Display for MibValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MibValue::Integer(v) => write!(f, "{}", v),
            MibValue::OctetString(bytes) => match std::str::from_utf8(bytes) {
                Ok(s) if s.chars().all(|c| !c.is_control()) => write!(f, "\"{}\"", s),
                _ => {
                    let hex: Vec<String> = bytes.iter().map(|b| format!("{:02X}", b)).collect();
                    write!(f, "{}", hex.join(" "))
                }
            },
            MibValue::ObjectIdentifier(arcs) => write!(f, "{}", Oid::from(arcs.as_slice())),
            MibValue::IpAddress([a, b, c, d]) => write!(f, "{}.{}.{}.{}", a, b, c, d),
            MibValue::Counter32(v) | MibValue::Gauge32(v) | MibValue::TimeTicks(v) => {
                write!(f, "{}", v)
            }
            MibValue::Counter64(v) => write!(f, "{}", v),
        }
    }
}

/// One MIB subtree backed by a refreshable snapshot.
///
/// Sub-identifiers passed to `value_at` and `next` are relative to
/// [`prefix`](MibUpdater::prefix). `next` walks the updater's keyspace in
/// lexicographic order; a row it returns may still have no value (a missing
/// counter, say), and the caller skips over it.
#[async_trait]
pub trait MibUpdater: Send + Sync {
    fn name(&self) -> &'static str;

    fn prefix(&self) -> &Oid;

    /// Rebuilds the snapshot from the store.
    async fn refresh(&self) -> Result<()>;

    /// Reloads identity maps that rarely change (interfaces, bridge ports).
    async fn reinit(&self) -> Result<()> {
        Ok(())
    }

    fn value_at(&self, sub_id: &[u32]) -> Option<MibValue>;

    fn next(&self, sub_id: &[u32]) -> Option<SubId>;

    fn state(&self) -> UpdaterState;
}

/// Lifecycle of an updater's snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdaterState {
    /// No snapshot has been committed yet.
    Uninitialized,
    /// A snapshot is committed and serving.
    Seeded,
    /// A refresh is building the next snapshot; queries see the previous one.
    Refreshing,
}

/// Committed snapshot of an updater, swapped whole on refresh.
///
/// Readers clone the `Arc` and never wait on a refresh in progress.
pub struct SnapshotCell<S> {
    current: RwLock<Arc<S>>,
    state: Mutex<UpdaterState>,
}

impl<S: Default> SnapshotCell<S> {
    pub fn new() -> Self {
        Self {
            current: RwLock::new(Arc::new(S::default())),
            state: Mutex::new(UpdaterState::Uninitialized),
        }
    }
}

impl<S: Default> Default for SnapshotCell<S> {
    fn default() -> Self {
        Self::new()
    }
}

impl<S> SnapshotCell<S> {
    pub fn load(&self) -> Arc<S> {
        self.current.read().clone()
    }

    pub fn state(&self) -> UpdaterState {
        *self.state.lock()
    }

    /// Marks a refresh in progress. Dropping the guard without committing
    /// restores the previous state.
    pub fn begin_refresh(&self) -> RefreshGuard<'_, S> {
        let previous = {
            let mut state = self.state.lock();
            std::mem::replace(&mut *state, UpdaterState::Refreshing)
        };
        RefreshGuard {
            cell: self,
            previous,
            committed: false,
        }
    }
}

pub struct RefreshGuard<'a, S> {
    cell: &'a SnapshotCell<S>,
    previous: UpdaterState,
    committed: bool,
}

impl<S> RefreshGuard<'_, S> {
    pub fn commit(mut self, next: S) {
        *self.cell.current.write() = Arc::new(next);
        *self.cell.state.lock() = UpdaterState::Seeded;
        self.committed = true;
    }
}

impl<S> Drop for RefreshGuard<'_, S> {
    fn drop(&mut self) {
        if !self.committed {
            *self.cell.state.lock() = self.previous;
        }
    }
}

/// Remembers keys already warned about so a persistently bad row logs once.
#[derive(Debug, Default)]
pub struct WarnOnce {
    seen: Mutex<HashSet<String>>,
}

impl WarnOnce {
    /// Returns true the first time `key` is seen since the last reset.
    pub fn first(&self, key: &str) -> bool {
        let mut seen = self.seen.lock();
        if seen.contains(key) {
            false
        } else {
            seen.insert(key.to_string());
            true
        }
    }

    pub fn reset(&self) {
        self.seen.lock().clear();
    }

    #[cfg(test)]
    pub(crate) fn len(&self) -> usize {
        self.seen.lock().len()
    }
}

/// Truncates a 64-bit store counter to SNMP Counter32 semantics.
pub fn truncate_counter32(value: u64) -> u32 {
    (value & 0xFFFF_FFFF) as u32
}
