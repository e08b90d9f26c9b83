//! Q-BRIDGE-MIB `dot1qTpFdbPort`, learned MAC entries per VLAN.
//!
//! Rows are indexed by `(vlan, mac octets)` and answer the ifindex of the
//! port the MAC was learned on. Entries come from ASIC_DB FDB objects and
//! reach a port through the bridge port map, which is reloaded on reinit.

use crate::db::{DbConnector, DbId, NamespaceDbs};
use crate::error::Result;
use crate::mibs::loader::{load_interfaces_all, InterfaceMaps};
use crate::mibs::{MibUpdater, MibValue, Oid, SnapshotCell, SubId, SubIdIndex, UpdaterState, WarnOnce};
use crate::tables::{
    fields, strip_sai_prefix, ASIC_BRIDGE_PORT_PREFIX, ASIC_FDB_ENTRY_PREFIX, ASIC_VLAN_PREFIX,
};
use async_trait::async_trait;
use parking_lot::RwLock;
use serde::Deserialize;
use sonic_types::{get_index, MacAddress, VlanId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// `dot1qTpFdbPort` (1.3.6.1.2.1.17.7.1.2.2.1.2)
pub const FDB_PREFIX: [u32; 13] = [1, 3, 6, 1, 2, 1, 17, 7, 1, 2, 2, 1, 2];

/// JSON object embedded in an FDB entry key.
#[derive(Debug, Deserialize)]
struct FdbKey {
    mac: String,
    #[serde(default)]
    vlan: Option<String>,
    #[serde(default)]
    bvid: Option<String>,
}

/// Why an FDB entry was left out, and the object it hinges on.
#[derive(Debug, PartialEq)]
struct Skip {
    reason: &'static str,
    subject: String,
}

impl Skip {
    fn new(reason: &'static str, subject: impl Into<String>) -> Self {
        Self {
            reason,
            subject: subject.into(),
        }
    }

    /// Warnings are de-duplicated per reason and subject, not per MAC.
    fn warn_key(&self) -> String {
        format!("{}|{}", self.reason, self.subject)
    }
}

#[derive(Debug, Default, PartialEq)]
struct FdbIdentity {
    interfaces: InterfaceMaps,
    /// Bridge port SAI id to port SAI id, both without `oid:0x`.
    port_by_bridge_port: HashMap<String, String>,
}

/// Reads bridge port objects of one namespace.
async fn load_bridge_ports(
    conn: &dyn DbConnector,
    warned: &WarnOnce,
) -> Result<HashMap<String, String>> {
    let keys = conn
        .keys(DbId::Asic, &format!("{}*", ASIC_BRIDGE_PORT_PREFIX))
        .await?;
    let mut map = HashMap::new();
    for key in &keys {
        let Some(bridge_port) = key.strip_prefix(ASIC_BRIDGE_PORT_PREFIX) else {
            continue;
        };
        let bridge_port = strip_sai_prefix(bridge_port);
        let entry = conn.get_all(DbId::Asic, key).await?;
        match entry.get(fields::BRIDGE_PORT_ATTR_PORT_ID) {
            Some(port) => {
                map.insert(bridge_port.to_string(), strip_sai_prefix(port).to_string());
            }
            None => {
                if warned.first(key) {
                    warn!(bridge_port, "Bridge port has no port id");
                }
            }
        }
    }
    Ok(map)
}

pub struct FdbUpdater {
    prefix: Oid,
    dbs: NamespaceDbs,
    identity: RwLock<Arc<FdbIdentity>>,
    snapshot: SnapshotCell<SubIdIndex<u32>>,
    warned: WarnOnce,
    bridge_port_warned: WarnOnce,
}

impl FdbUpdater {
    pub async fn new(dbs: NamespaceDbs) -> Result<Self> {
        let updater = Self {
            prefix: Oid::new(FDB_PREFIX.to_vec()),
            dbs,
            identity: RwLock::new(Arc::default()),
            snapshot: SnapshotCell::new(),
            warned: WarnOnce::default(),
            bridge_port_warned: WarnOnce::default(),
        };
        updater.reinit().await?;
        updater.refresh().await?;
        Ok(updater)
    }

    async fn load_identity(&self) -> Result<FdbIdentity> {
        let interfaces = load_interfaces_all(&self.dbs).await?;
        let mut port_by_bridge_port = HashMap::new();
        for conn in self.dbs.non_host() {
            let bridge_ports = load_bridge_ports(conn.as_ref(), &self.bridge_port_warned).await?;
            port_by_bridge_port.extend(bridge_ports);
        }
        Ok(FdbIdentity {
            interfaces,
            port_by_bridge_port,
        })
    }

    /// VLAN of an entry, from the key itself or through its bridge VLAN object.
    async fn vlan_of(&self, fdb: &FdbKey) -> Option<VlanId> {
        if let Some(vlan) = &fdb.vlan {
            return vlan.parse().ok();
        }
        let bvid = fdb.bvid.as_deref()?;
        let entry = self
            .dbs
            .get_all(DbId::Asic, &format!("{}{}", ASIC_VLAN_PREFIX, bvid))
            .await
            .into_partial("ASIC_STATE:SAI_OBJECT_TYPE_VLAN");
        entry.get(fields::VLAN_ATTR_VLAN_ID)?.parse().ok()
    }

    /// Resolves one FDB object to its row.
    async fn resolve(
        &self,
        identity: &FdbIdentity,
        key: &str,
    ) -> std::result::Result<(SubId, u32), Skip> {
        let json = key
            .strip_prefix(ASIC_FDB_ENTRY_PREFIX)
            .ok_or_else(|| Skip::new("key is not an FDB entry", ""))?;
        let fdb: FdbKey =
            serde_json::from_str(json).map_err(|_| Skip::new("key is not valid JSON", ""))?;
        let mac: MacAddress = fdb
            .mac
            .parse()
            .map_err(|_| Skip::new("invalid MAC address", ""))?;

        let entry = self
            .dbs
            .get_all(DbId::Asic, key)
            .await
            .into_partial("ASIC_STATE:SAI_OBJECT_TYPE_FDB_ENTRY");
        let bridge_port = entry
            .get(fields::FDB_ENTRY_ATTR_BRIDGE_PORT_ID)
            .map(|bp| strip_sai_prefix(bp))
            .ok_or_else(|| Skip::new("no bridge port", ""))?;
        let port = identity
            .port_by_bridge_port
            .get(bridge_port)
            .ok_or_else(|| Skip::new("unknown bridge port", bridge_port))?;
        let name = identity
            .interfaces
            .name_by_sai
            .get(port)
            .ok_or_else(|| Skip::new("bridge port is not on a known interface", port.as_str()))?;
        let if_index =
            get_index(name).ok_or_else(|| Skip::new("interface has no ifindex", name.as_str()))?;
        let vlan = self.vlan_of(&fdb).await.ok_or_else(|| {
            let subject = fdb.vlan.as_deref().or(fdb.bvid.as_deref()).unwrap_or_default();
            Skip::new("no VLAN id", subject)
        })?;

        let mut sub_id = vec![vlan.sub_id()];
        sub_id.extend(mac.sub_ids());
        Ok((sub_id, if_index))
    }
}

#[async_trait]
impl MibUpdater for FdbUpdater {
    fn name(&self) -> &'static str {
        "fdb"
    }

    fn prefix(&self) -> &Oid {
        &self.prefix
    }

    #[instrument(skip_all)]
    async fn refresh(&self) -> Result<()> {
        let guard = self.snapshot.begin_refresh();
        let identity = self.identity.read().clone();
        let keys = self
            .dbs
            .keys(DbId::Asic, &format!("{}*", ASIC_FDB_ENTRY_PREFIX))
            .await
            .into_partial("ASIC_STATE:SAI_OBJECT_TYPE_FDB_ENTRY");

        let mut index = SubIdIndex::new();
        for key in &keys {
            match self.resolve(&identity, key).await {
                Ok((sub_id, if_index)) => index.insert(sub_id, if_index),
                Err(skip) => {
                    if self.warned.first(&skip.warn_key()) {
                        warn!(
                            key = %key,
                            reason = skip.reason,
                            subject = %skip.subject,
                            "Skipping FDB entry"
                        );
                    }
                }
            }
        }
        debug!(entries = index.len(), "Refreshed FDB");
        guard.commit(index);
        Ok(())
    }

    #[instrument(skip_all)]
    async fn reinit(&self) -> Result<()> {
        let identity = Arc::new(self.load_identity().await?);
        let changed = {
            let mut current = self.identity.write();
            if **current != *identity {
                *current = identity;
                true
            } else {
                false
            }
        };
        if changed {
            info!("Bridge port map changed");
            self.warned.reset();
        }
        Ok(())
    }

    fn value_at(&self, sub_id: &[u32]) -> Option<MibValue> {
        let if_index = *self.snapshot.load().lookup(sub_id)?;
        i32::try_from(if_index).ok().map(MibValue::Integer)
    }

    fn next(&self, sub_id: &[u32]) -> Option<SubId> {
        self.snapshot.load().successor(sub_id).map(<[u32]>::to_vec)
    }

    fn state(&self) -> UpdaterState {
        self.snapshot.state()
    }
}
