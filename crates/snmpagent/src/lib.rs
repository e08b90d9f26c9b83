//! SONiC SNMP Subagent
//!
//! MIB updaters that turn SONiC database state into SNMP rows. Each updater
//! owns one OID subtree, seeds a snapshot at construction and refreshes it
//! periodically; GET and GET-NEXT are answered from the committed snapshot
//! through [`MibTree`].

pub mod agent;
pub mod config;
pub mod db;
pub mod error;
pub mod mibs;
pub mod runner;
pub mod tables;

pub use agent::build_mib_tree;
pub use config::{AgentConfig, NamespaceConfig, PowerProvider};
pub use db::{DbConnector, DbError, DbId, MemoryConnector, NamespaceDbs, RedisConnector};
pub use error::{Result, SnmpAgentError};
pub use mibs::{MibTree, MibUpdater, MibValue, Oid, SubId, UpdaterState};
pub use runner::{spawn_all, UpdaterRunner};
