//! Counters published directly into SNMP_OVERLAY_DB.
//!
//! Other daemons can expose values without a dedicated updater by writing a
//! hash keyed by the full dotted OID with a `type` and a `data` field. One
//! updater serves each configured prefix.

use crate::db::{DbConnector, DbId};
use crate::error::Result;
use crate::mibs::{MibUpdater, MibValue, Oid, SnapshotCell, SubId, SubIdIndex, UpdaterState, WarnOnce};
use crate::tables::fields;
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

const TYPE_COUNTER_32: &str = "COUNTER_32";
const TYPE_COUNTER_64: &str = "COUNTER_64";

fn decode(entry: &HashMap<String, String>) -> std::result::Result<MibValue, String> {
    let kind = entry.get(fields::OVERLAY_TYPE).map(String::as_str);
    let data = entry
        .get(fields::OVERLAY_DATA)
        .ok_or_else(|| "no data field".to_string())?;
    match kind {
        Some(TYPE_COUNTER_32) => data
            .parse()
            .map(MibValue::Counter32)
            .map_err(|e| format!("bad COUNTER_32 '{}': {}", data, e)),
        Some(TYPE_COUNTER_64) => data
            .parse()
            .map(MibValue::Counter64)
            .map_err(|e| format!("bad COUNTER_64 '{}': {}", data, e)),
        Some(other) => Err(format!("unsupported type '{}'", other)),
        None => Err("no type field".to_string()),
    }
}

pub struct OverlayUpdater {
    prefix: Oid,
    conn: Arc<dyn DbConnector>,
    snapshot: SnapshotCell<SubIdIndex<MibValue>>,
    warned: WarnOnce,
}

impl OverlayUpdater {
    pub async fn new(prefix: Oid, conn: Arc<dyn DbConnector>) -> Result<Self> {
        let updater = Self {
            prefix,
            conn,
            snapshot: SnapshotCell::new(),
            warned: WarnOnce::default(),
        };
        updater.refresh().await?;
        Ok(updater)
    }
}

#[async_trait]
impl MibUpdater for OverlayUpdater {
    fn name(&self) -> &'static str {
        "overlay"
    }

    fn prefix(&self) -> &Oid {
        &self.prefix
    }

    #[instrument(skip_all, fields(prefix = %self.prefix))]
    async fn refresh(&self) -> Result<()> {
        let guard = self.snapshot.begin_refresh();
        let keys = self.conn.keys(DbId::SnmpOverlay, "*").await?;
        let mut index = SubIdIndex::new();

        for key in &keys {
            let Ok(oid) = key.parse::<Oid>() else {
                continue;
            };
            let Some(sub_id) = oid.strip_prefix(&self.prefix).filter(|s| !s.is_empty()) else {
                continue;
            };
            let entry = self.conn.get_all(DbId::SnmpOverlay, key).await?;
            match decode(&entry) {
                Ok(value) => index.insert(sub_id.to_vec(), value),
                Err(reason) => {
                    if self.warned.first(key) {
                        warn!(key = %key, reason = %reason, "Skipping overlay entry");
                    }
                }
            }
        }

        debug!(entries = index.len(), "Refreshed overlay");
        guard.commit(index);
        Ok(())
    }

    fn value_at(&self, sub_id: &[u32]) -> Option<MibValue> {
        self.snapshot.load().lookup(sub_id).cloned()
    }

    fn next(&self, sub_id: &[u32]) -> Option<SubId> {
        self.snapshot.load().successor(sub_id).map(<[u32]>::to_vec)
    }

    fn state(&self) -> UpdaterState {
        self.snapshot.state()
    }
}
