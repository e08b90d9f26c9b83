//! SNMP subagent daemon.
//!
//! Connects to every configured namespace, seeds the enabled MIBs and keeps
//! them refreshed until SIGINT.

use anyhow::{Context, Result};
use clap::Parser;
use sonic_snmpagent::{
    build_mib_tree, spawn_all, AgentConfig, DbConnector, NamespaceDbs, RedisConnector,
};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::signal;
use tokio::sync::watch;
use tracing::{error, info};

/// SONiC SNMP subagent MIB updaters
#[derive(Parser, Debug)]
#[command(name = "sonic-snmpagent")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file
    #[arg(short = 'c', long, default_value = "/etc/sonic/snmpagent.toml")]
    config: PathBuf,

    /// Log level (trace, debug, info, warn, error); overrides the config file
    #[arg(short = 'l', long)]
    log_level: Option<String>,

    /// Seed every MIB, print the full walk and exit
    #[arg(long)]
    once: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = AgentConfig::load_or_default(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    init_logging(args.log_level.as_deref().unwrap_or(&config.logging.level));
    config.validate().context("invalid configuration")?;

    info!(config = %args.config.display(), "sonic-snmpagent starting");

    let dbs = connect(&config).await?;
    let tree = build_mib_tree(&config, dbs)
        .await
        .context("building MIB tree")?;

    if args.once {
        for (oid, value) in tree.walk() {
            println!("{} = {}: {}", oid, value.type_name(), value);
        }
        return Ok(());
    }

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handles = spawn_all(&tree, &config.updater, &shutdown_rx);
    info!(
        mibs = tree.len(),
        frequency = ?config.update_frequency(),
        "Updaters running"
    );

    signal::ctrl_c().await.context("waiting for shutdown signal")?;
    info!("Received SIGINT, stopping updaters");
    let _ = shutdown_tx.send(true);

    for handle in handles {
        if let Err(e) = handle.await {
            error!(error = %e, "Updater task panicked");
        }
    }
    info!("sonic-snmpagent stopped");
    Ok(())
}

fn init_logging(level: &str) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(true)
                .with_file(true)
                .with_line_number(true)
                .compact(),
        )
        .init();
}

async fn connect(config: &AgentConfig) -> Result<NamespaceDbs> {
    let namespaces = config.namespaces().context("resolving namespaces")?;

    let mut connectors: Vec<Arc<dyn DbConnector>> = Vec::with_capacity(namespaces.len());
    for ns in &namespaces {
        let conn = RedisConnector::connect(ns)
            .await
            .with_context(|| format!("connecting to namespace '{}'", ns.name))?;
        connectors.push(Arc::new(conn));
    }
    info!(namespaces = connectors.len(), "Connected to SONiC databases");

    NamespaceDbs::new(connectors).context("no namespaces configured")
}
