//! Access to the SONiC key-value store.
//!
//! The MIB layer only ever reads. [`DbConnector`] is the seam between the
//! updaters and Redis: production uses [`RedisConnector`], tests and the
//! integration suite use [`MemoryConnector`]. Multi-ASIC devices get one
//! connector per namespace, grouped in [`NamespaceDbs`].

mod memory;
mod namespace;
mod redis_adapter;

pub use memory::MemoryConnector;
pub use namespace::{Aggregated, NamespaceDbs, NamespaceError};
pub use redis_adapter::RedisConnector;

use async_trait::async_trait;
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Result type alias for store reads.
pub type DbResult<T> = std::result::Result<T, DbError>;

/// Errors raised by a store connector.
#[derive(Debug, Error)]
pub enum DbError {
    /// Redis connection or command failed.
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// The namespace has no connection for this database.
    #[error("{db} is not configured for namespace '{namespace}'")]
    NotConfigured { db: DbId, namespace: String },

    /// The namespace could not serve the read.
    #[error("Namespace '{namespace}' unavailable: {message}")]
    Unavailable { namespace: String, message: String },
}

/// SONiC logical databases read by the subagent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum DbId {
    Appl,
    Asic,
    Counters,
    Config,
    State,
    SnmpOverlay,
}

impl DbId {
    pub const ALL: [DbId; 6] = [
        DbId::Appl,
        DbId::Asic,
        DbId::Counters,
        DbId::Config,
        DbId::State,
        DbId::SnmpOverlay,
    ];

    /// Name used in `database_config.json`.
    pub const fn name(&self) -> &'static str {
        match self {
            DbId::Appl => "APPL_DB",
            DbId::Asic => "ASIC_DB",
            DbId::Counters => "COUNTERS_DB",
            DbId::Config => "CONFIG_DB",
            DbId::State => "STATE_DB",
            DbId::SnmpOverlay => "SNMP_OVERLAY_DB",
        }
    }

    /// Redis database number when `database_config.json` does not say otherwise.
    pub const fn default_index(&self) -> i64 {
        match self {
            DbId::Appl => 0,
            DbId::Asic => 1,
            DbId::Counters => 2,
            DbId::Config => 4,
            DbId::State => 6,
            DbId::SnmpOverlay => 7,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|db| db.name() == name)
    }
}

impl fmt::Display for DbId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Read-only view of one namespace's databases.
///
/// `keys` takes a Redis glob pattern. `get_all` returns an empty map for a
/// missing key, matching `HGETALL`.
#[async_trait]
pub trait DbConnector: Send + Sync {
    /// Namespace name; the host namespace is the empty string.
    fn namespace(&self) -> &str;

    async fn keys(&self, db: DbId, pattern: &str) -> DbResult<Vec<String>>;

    async fn get_all(&self, db: DbId, key: &str) -> DbResult<HashMap<String, String>>;

    async fn exists(&self, db: DbId, key: &str) -> DbResult<bool>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_db_names_round_trip() {
        for db in DbId::ALL {
            assert_eq!(DbId::from_name(db.name()), Some(db));
        }
        assert_eq!(DbId::from_name("LOGLEVEL_DB"), None);
    }

    #[test]
    fn test_default_indexes() {
        assert_eq!(DbId::Appl.default_index(), 0);
        assert_eq!(DbId::Counters.default_index(), 2);
        assert_eq!(DbId::State.default_index(), 6);
    }
}
