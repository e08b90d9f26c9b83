//! Configuration file support for the SNMP subagent.
//!
//! Loads and validates configuration from TOML files.
//! Default location: /etc/sonic/snmpagent.toml
//!
//! Database endpoints come either from an explicit `[[database.namespaces]]`
//! list or from SONiC's own `database_global.json` / `database_config.json`.

use crate::db::DbId;
use crate::error::{Result, SnmpAgentError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::warn;

/// Connection settings for one namespace.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamespaceConfig {
    /// Namespace name; empty for the host.
    #[serde(default)]
    pub name: String,

    #[serde(default = "default_redis_host")]
    pub host: String,

    #[serde(default = "default_redis_port")]
    pub port: u16,

    /// Preferred over host/port when set.
    #[serde(default)]
    pub unix_socket_path: Option<PathBuf>,

    /// Database numbers by name (`APPL_DB = 0`); missing names use the
    /// SONiC defaults.
    #[serde(default)]
    pub databases: BTreeMap<String, i64>,
}

impl NamespaceConfig {
    pub fn db_index(&self, db: DbId) -> i64 {
        self.databases
            .get(db.name())
            .copied()
            .unwrap_or_else(|| db.default_index())
    }
}

impl Default for NamespaceConfig {
    fn default() -> Self {
        Self {
            name: String::new(),
            host: default_redis_host(),
            port: default_redis_port(),
            unix_socket_path: None,
            databases: BTreeMap::new(),
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to `database_global.json` or `database_config.json`. Takes
    /// precedence over `namespaces` when set.
    #[serde(default)]
    pub sonic_db_config: Option<PathBuf>,

    /// Namespaces in order, host first.
    #[serde(default = "default_namespaces")]
    pub namespaces: Vec<NamespaceConfig>,
}

/// Refresh scheduling
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdaterConfig {
    /// Seconds between refreshes.
    #[serde(default = "default_frequency_secs")]
    pub frequency_secs: u64,

    /// Refresh ticks between identity reloads.
    #[serde(default = "default_reinit_rate")]
    pub reinit_rate: u32,
}

/// Which MIB subtrees are registered
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MibsConfig {
    #[serde(default = "default_true")]
    pub interfaces: bool,

    #[serde(default = "default_true")]
    pub arp: bool,

    #[serde(default = "default_true")]
    pub fdb: bool,

    #[serde(default = "default_true")]
    pub routes: bool,

    #[serde(default = "default_true")]
    pub power: bool,

    #[serde(default = "default_true")]
    pub sensors: bool,

    #[serde(default = "default_true")]
    pub queues: bool,

    /// Kernel ARP table read by ipNetToMediaTable.
    #[serde(default = "default_arp_table_path")]
    pub arp_table_path: PathBuf,

    /// OID prefixes served from SNMP_OVERLAY_DB.
    #[serde(default)]
    pub overlay_prefixes: Vec<String>,
}

/// Source of power supply status
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PowerProvider {
    /// `CHASSIS_INFO` and `PSU_INFO` in STATE_DB.
    #[default]
    StateDb,
    /// No platform support; the FRU power subtree is not registered.
    None,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PowerConfig {
    #[serde(default)]
    pub provider: PowerProvider,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` overrides it.
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Complete subagent configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub updater: UpdaterConfig,

    #[serde(default)]
    pub mibs: MibsConfig,

    #[serde(default)]
    pub power: PowerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

// Default functions
fn default_redis_host() -> String {
    "127.0.0.1".to_string()
}

fn default_redis_port() -> u16 {
    6379
}

fn default_namespaces() -> Vec<NamespaceConfig> {
    vec![NamespaceConfig::default()]
}

fn default_frequency_secs() -> u64 {
    5
}

fn default_reinit_rate() -> u32 {
    60
}

fn default_true() -> bool {
    true
}

fn default_arp_table_path() -> PathBuf {
    PathBuf::from("/proc/net/arp")
}

fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            sonic_db_config: None,
            namespaces: default_namespaces(),
        }
    }
}

impl Default for UpdaterConfig {
    fn default() -> Self {
        Self {
            frequency_secs: default_frequency_secs(),
            reinit_rate: default_reinit_rate(),
        }
    }
}

impl Default for MibsConfig {
    fn default() -> Self {
        Self {
            interfaces: true,
            arp: true,
            fdb: true,
            routes: true,
            power: true,
            sensors: true,
            queues: true,
            arp_table_path: default_arp_table_path(),
            overlay_prefixes: Vec::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl AgentConfig {
    /// Load configuration from file, falling back to defaults if file not found
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();

        match fs::read_to_string(path) {
            Ok(content) => toml::from_str(&content).map_err(|e| {
                SnmpAgentError::config(format!(
                    "Failed to parse config file {}: {}",
                    path.display(),
                    e
                ))
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!(path = %path.display(), "Config file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(SnmpAgentError::Io(e)),
        }
    }

    pub fn update_frequency(&self) -> Duration {
        Duration::from_secs(self.updater.frequency_secs)
    }

    /// Namespaces to connect to, resolving `sonic_db_config` if set.
    pub fn namespaces(&self) -> Result<Vec<NamespaceConfig>> {
        match &self.database.sonic_db_config {
            Some(path) => SonicDbConfig::load(path),
            None => Ok(self.database.namespaces.clone()),
        }
    }

    /// Validate configuration, including namespaces read from `sonic_db_config`
    pub fn validate(&self) -> Result<()> {
        let namespaces = self.namespaces()?;
        if namespaces.is_empty() {
            return Err(SnmpAgentError::config(
                "at least one namespace must be configured",
            ));
        }

        for ns in &namespaces {
            if ns.port == 0 && ns.unix_socket_path.is_none() {
                return Err(SnmpAgentError::config(format!(
                    "namespace '{}': port must be > 0",
                    ns.name
                )));
            }
            if let Some(name) = ns.databases.keys().find(|n| DbId::from_name(n).is_none()) {
                warn!(namespace = %ns.name, database = %name, "Ignoring unknown database name");
            }
        }

        if self.updater.frequency_secs == 0 {
            return Err(SnmpAgentError::config("frequency_secs must be > 0"));
        }

        if self.updater.reinit_rate == 0 {
            return Err(SnmpAgentError::config("reinit_rate must be > 0"));
        }

        for prefix in &self.mibs.overlay_prefixes {
            if prefix.trim_start_matches('.').parse::<crate::mibs::Oid>().is_err() {
                return Err(SnmpAgentError::config(format!(
                    "invalid overlay prefix '{}'",
                    prefix
                )));
            }
        }

        Ok(())
    }
}

/// SONiC `database_config.json`.
#[derive(Debug, Deserialize)]
struct SonicDbInstanceFile {
    #[serde(rename = "INSTANCES")]
    instances: BTreeMap<String, SonicDbInstance>,
    #[serde(rename = "DATABASES")]
    databases: BTreeMap<String, SonicDbDatabase>,
}

#[derive(Debug, Deserialize)]
struct SonicDbInstance {
    hostname: String,
    port: u16,
    #[serde(default)]
    unix_socket_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize)]
struct SonicDbDatabase {
    id: i64,
    instance: String,
}

/// SONiC `database_global.json`.
#[derive(Debug, Deserialize)]
struct SonicDbGlobalFile {
    #[serde(rename = "INCLUDES")]
    includes: Vec<SonicDbInclude>,
}

#[derive(Debug, Deserialize)]
struct SonicDbInclude {
    #[serde(default)]
    namespace: String,
    include: PathBuf,
}

/// Reader for SONiC's database configuration files.
pub struct SonicDbConfig;

impl SonicDbConfig {
    /// Loads a global file (one namespace per include) or a single
    /// per-namespace file.
    pub fn load(path: &Path) -> Result<Vec<NamespaceConfig>> {
        let content = fs::read_to_string(path)?;
        let value: serde_json::Value = serde_json::from_str(&content).map_err(|e| {
            SnmpAgentError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        if value.get("INCLUDES").is_none() {
            return Ok(vec![Self::parse_instance(path, "", value)?]);
        }

        let global: SonicDbGlobalFile = serde_json::from_value(value).map_err(|e| {
            SnmpAgentError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;
        let base = path.parent().unwrap_or_else(|| Path::new("."));

        let mut namespaces: Vec<NamespaceConfig> = Vec::with_capacity(global.includes.len());
        for include in global.includes {
            let include_path = base.join(&include.include);
            let content = fs::read_to_string(&include_path)?;
            let value = serde_json::from_str(&content).map_err(|e| {
                SnmpAgentError::config(format!(
                    "Failed to parse {}: {}",
                    include_path.display(),
                    e
                ))
            })?;
            namespaces.push(Self::parse_instance(&include_path, &include.namespace, value)?);
        }

        // Host first, whatever order the includes were listed in.
        namespaces.sort_by_key(|ns| !ns.name.is_empty());
        if namespaces.is_empty() {
            return Err(SnmpAgentError::config(format!(
                "{} lists no namespaces",
                path.display()
            )));
        }
        Ok(namespaces)
    }

    fn parse_instance(
        path: &Path,
        namespace: &str,
        value: serde_json::Value,
    ) -> Result<NamespaceConfig> {
        let file: SonicDbInstanceFile = serde_json::from_value(value).map_err(|e| {
            SnmpAgentError::config(format!("Failed to parse {}: {}", path.display(), e))
        })?;

        let instance_name = file
            .databases
            .get(DbId::Appl.name())
            .map(|db| db.instance.as_str())
            .unwrap_or("redis");
        let instance = file.instances.get(instance_name).ok_or_else(|| {
            SnmpAgentError::config(format!(
                "{}: instance '{}' not defined",
                path.display(),
                instance_name
            ))
        })?;

        let databases = file
            .databases
            .iter()
            .filter(|(name, _)| DbId::from_name(name).is_some())
            .map(|(name, db)| (name.clone(), db.id))
            .collect();

        Ok(NamespaceConfig {
            name: namespace.to_string(),
            host: instance.hostname.clone(),
            port: instance.port,
            unix_socket_path: instance.unix_socket_path.clone(),
            databases,
        })
    }
}
