//! Builds the MIB tree from configuration.
//!
//! Every enabled MIB is constructed (and thereby seeded) against the given
//! namespaces. A MIB whose store is incoherent is left out with an error
//! log; the others still register. Any other construction failure aborts
//! startup.

use crate::config::{AgentConfig, PowerProvider};
use crate::db::NamespaceDbs;
use crate::error::{Result, SnmpAgentError};
use crate::mibs::ietf::{
    ArpUpdater, FdbUpdater, InterfacesUpdater, PhysicalSensorUpdater, ProcArpTable, RouteUpdater,
};
use crate::mibs::overlay::OverlayUpdater;
use crate::mibs::vendor::cisco::{PowerStatusUpdater, QueueStatsUpdater, StateDbPowerStatus};
use crate::mibs::{MibTree, MibUpdater, Oid};
use std::future::Future;
use std::sync::Arc;
use tracing::{error, info, instrument};

/// Constructs and registers all enabled MIBs.
#[instrument(skip_all, fields(namespaces = dbs.len()))]
pub async fn build_mib_tree(config: &AgentConfig, dbs: NamespaceDbs) -> Result<MibTree> {
    let mibs = &config.mibs;
    let mut tree = MibTree::new();

    if mibs.interfaces {
        register(&mut tree, "interfaces", InterfacesUpdater::new(dbs.clone())).await?;
    }
    if mibs.arp {
        let source = Arc::new(ProcArpTable::new(&mibs.arp_table_path));
        register(&mut tree, "arp", ArpUpdater::new(source)).await?;
    }
    if mibs.fdb {
        register(&mut tree, "fdb", FdbUpdater::new(dbs.clone())).await?;
    }
    if mibs.routes {
        register(&mut tree, "routes", RouteUpdater::new(dbs.clone())).await?;
    }
    if mibs.sensors {
        register(&mut tree, "sensors", PhysicalSensorUpdater::new(dbs.clone())).await?;
    }
    if mibs.queues {
        register(&mut tree, "queue_stats", QueueStatsUpdater::new(dbs.clone())).await?;
    }
    if mibs.power {
        match config.power.provider {
            PowerProvider::StateDb => {
                let provider = Arc::new(StateDbPowerStatus::new(dbs.host().clone()));
                register(&mut tree, "psu", PowerStatusUpdater::new(provider)).await?;
            }
            PowerProvider::None => info!("No power status provider, skipping PSU MIB"),
        }
    }

    for prefix in &mibs.overlay_prefixes {
        let oid: Oid = prefix.trim_start_matches('.').parse().map_err(|e| {
            SnmpAgentError::config(format!("invalid overlay prefix '{}': {}", prefix, e))
        })?;
        register(&mut tree, "overlay", OverlayUpdater::new(oid, dbs.host().clone())).await?;
    }

    info!(mibs = tree.len(), "MIB tree ready");
    Ok(tree)
}

async fn register<U, F>(tree: &mut MibTree, name: &str, build: F) -> Result<()>
where
    U: MibUpdater + 'static,
    F: Future<Output = Result<U>>,
{
    match build.await {
        Ok(updater) => tree.register(Arc::new(updater)),
        Err(e) if e.is_fatal() => {
            error!(mib = name, error = %e, "MIB not registered");
            Ok(())
        }
        Err(e) => Err(e),
    }
}
