//! IP-FORWARD-MIB `ipCidrRouteDest` for the default route.
//!
//! One row per IPv4 next hop of `ROUTE_TABLE:0.0.0.0/0`, indexed by
//! `(network, netmask, next hop)` octets.

use crate::db::{DbId, NamespaceDbs};
use crate::error::Result;
use crate::mibs::{MibUpdater, MibValue, Oid, SnapshotCell, SubId, SubIdIndex, UpdaterState};
use crate::tables::{fields, table_key, APP_ROUTE_TABLE, SEPARATOR_COLON};
use async_trait::async_trait;
use sonic_types::{InterfaceKind, Ipv4Address, Ipv4Prefix};
use tracing::{debug, instrument, warn};

/// `ipCidrRouteDest` (1.3.6.1.2.1.4.24.4.1.1)
pub const ROUTE_PREFIX: [u32; 11] = [1, 3, 6, 1, 2, 1, 4, 24, 4, 1, 1];

const IFNAME: &str = "ifname";

/// Sub-identifier of one next hop of `route`.
pub fn route_sub_id(route: &Ipv4Prefix, next_hop: &Ipv4Address) -> SubId {
    let mut sub_id = Vec::with_capacity(12);
    sub_id.extend(route.network().sub_ids());
    sub_id.extend(route.netmask().sub_ids());
    sub_id.extend(next_hop.sub_ids());
    sub_id
}

/// IPv4 next hops of a route entry, dropping IPv6 and backplane hops.
fn next_hops(entry: &std::collections::HashMap<String, String>) -> Vec<Ipv4Address> {
    let Some(nexthop) = entry.get(fields::NEXTHOP) else {
        return Vec::new();
    };
    let mut ifnames = entry
        .get(IFNAME)
        .map(|names| names.split(',').collect::<Vec<_>>())
        .unwrap_or_default()
        .into_iter();

    nexthop
        .split(',')
        .filter_map(|hop| {
            let ifname = ifnames.next();
            if let Some((InterfaceKind::EthernetBackplane, _)) =
                ifname.and_then(InterfaceKind::classify)
            {
                return None;
            }
            hop.trim().parse().ok()
        })
        .collect()
}

pub struct RouteUpdater {
    prefix: Oid,
    dbs: NamespaceDbs,
    snapshot: SnapshotCell<SubIdIndex<Ipv4Address>>,
}

impl RouteUpdater {
    pub async fn new(dbs: NamespaceDbs) -> Result<Self> {
        let updater = Self {
            prefix: Oid::new(ROUTE_PREFIX.to_vec()),
            dbs,
            snapshot: SnapshotCell::new(),
        };
        updater.refresh().await?;
        Ok(updater)
    }
}

#[async_trait]
impl MibUpdater for RouteUpdater {
    fn name(&self) -> &'static str {
        "routes"
    }

    fn prefix(&self) -> &Oid {
        &self.prefix
    }

    #[instrument(skip_all)]
    async fn refresh(&self) -> Result<()> {
        let guard = self.snapshot.begin_refresh();
        let route = Ipv4Prefix::DEFAULT_ROUTE;
        let key = table_key(APP_ROUTE_TABLE, SEPARATOR_COLON, &route.to_string());
        let mut index = SubIdIndex::new();

        // Each namespace contributes its own next hops.
        for conn in self.dbs.non_host() {
            let entry = match conn.get_all(DbId::Appl, &key).await {
                Ok(entry) => entry,
                Err(e) => {
                    warn!(namespace = conn.namespace(), error = %e, "Failed to read default route");
                    continue;
                }
            };
            for hop in next_hops(&entry) {
                index.insert(route_sub_id(&route, &hop), route.network());
            }
        }

        debug!(next_hops = index.len(), "Refreshed default route");
        guard.commit(index);
        Ok(())
    }

    fn value_at(&self, sub_id: &[u32]) -> Option<MibValue> {
        self.snapshot
            .load()
            .lookup(sub_id)
            .map(|network| MibValue::IpAddress(network.octets()))
    }

    fn next(&self, sub_id: &[u32]) -> Option<SubId> {
        self.snapshot.load().successor(sub_id).map(<[u32]>::to_vec)
    }

    fn state(&self) -> UpdaterState {
        self.snapshot.state()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{DbConnector, MemoryConnector};
    use pretty_assertions::assert_eq;
    use std::sync::Arc;

    #[test]
    fn test_route_sub_id() {
        let sub_id = route_sub_id(&Ipv4Prefix::DEFAULT_ROUTE, &Ipv4Address::new(10, 0, 0, 1));
        assert_eq!(sub_id, vec![0, 0, 0, 0, 0, 0, 0, 0, 10, 0, 0, 1]);
    }

    #[tokio::test]
    async fn test_default_route_next_hops() {
        let conn = Arc::new(MemoryConnector::new(""));
        conn.hset(
            DbId::Appl,
            "ROUTE_TABLE:0.0.0.0/0",
            [
                ("nexthop", "10.0.0.57,fc00::72,10.0.0.1"),
                ("ifname", "PortChannel0001,PortChannel0002,Ethernet0"),
            ],
        );
        let updater = RouteUpdater::new(NamespaceDbs::single(conn as Arc<dyn DbConnector>))
            .await
            .unwrap();

        let first = updater.next(&[]).unwrap();
        assert_eq!(first, vec![0, 0, 0, 0, 0, 0, 0, 0, 10, 0, 0, 1]);
        assert_eq!(updater.value_at(&first), Some(MibValue::IpAddress([0, 0, 0, 0])));
        let second = updater.next(&first).unwrap();
        assert_eq!(second[8..].to_vec(), vec![10, 0, 0, 57]);
        assert_eq!(updater.next(&second), None);
    }

    #[tokio::test]
    async fn test_missing_default_route_is_empty() {
        let conn = Arc::new(MemoryConnector::new(""));
        let updater = RouteUpdater::new(NamespaceDbs::single(conn as Arc<dyn DbConnector>))
            .await
            .unwrap();
        assert_eq!(updater.state(), UpdaterState::Seeded);
        assert_eq!(updater.next(&[]), None);
    }

    #[tokio::test]
    async fn test_backplane_next_hops_are_skipped() {
        let host = Arc::new(MemoryConnector::new(""));
        let asic0 = Arc::new(MemoryConnector::new("asic0"));
        asic0.hset(
            DbId::Appl,
            "ROUTE_TABLE:0.0.0.0/0",
            [("nexthop", "10.1.0.32,10.0.0.1"), ("ifname", "Ethernet-BP0,Ethernet0")],
        );
        let dbs = NamespaceDbs::new(vec![
            host as Arc<dyn DbConnector>,
            asic0 as Arc<dyn DbConnector>,
        ])
        .unwrap();

        let updater = RouteUpdater::new(dbs).await.unwrap();
        assert_eq!(updater.snapshot.load().len(), 1);
        assert_eq!(updater.next(&[]).unwrap()[8..].to_vec(), vec![10, 0, 0, 1]);
    }
}
