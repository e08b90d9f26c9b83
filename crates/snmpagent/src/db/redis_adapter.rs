//! Redis connector for one SONiC namespace.

use super::{DbConnector, DbError, DbId, DbResult};
use crate::config::NamespaceConfig;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use redis::{AsyncCommands, Client};
use std::collections::HashMap;
use tracing::{debug, instrument};

/// Holds one [`ConnectionManager`] per logical database of a namespace.
///
/// Connection managers reconnect on their own, so a Redis restart shows up
/// as failed reads for a few refresh cycles rather than a dead agent.
pub struct RedisConnector {
    namespace: String,
    connections: HashMap<DbId, ConnectionManager>,
}

impl RedisConnector {
    /// Connects to every database the subagent reads.
    #[instrument(skip_all, fields(namespace = %config.name))]
    pub async fn connect(config: &NamespaceConfig) -> DbResult<Self> {
        let mut connections = HashMap::new();

        for db in DbId::ALL {
            let index = config.db_index(db);
            let manager = Self::connect_db(config, index).await?;
            connections.insert(db, manager);
        }

        debug!(
            host = %config.host,
            port = config.port,
            unix_socket = ?config.unix_socket_path,
            "Connected to all Redis databases"
        );

        Ok(Self {
            namespace: config.name.clone(),
            connections,
        })
    }

    async fn connect_db(config: &NamespaceConfig, index: i64) -> DbResult<ConnectionManager> {
        let url = match &config.unix_socket_path {
            Some(path) => format!("unix://{}?db={}", path.display(), index),
            None => format!("redis://{}:{}/{}", config.host, config.port, index),
        };
        let client = Client::open(url)?;
        let manager = ConnectionManager::new(client).await?;
        Ok(manager)
    }

    fn conn(&self, db: DbId) -> DbResult<ConnectionManager> {
        self.connections
            .get(&db)
            .cloned()
            .ok_or_else(|| DbError::NotConfigured {
                db,
                namespace: self.namespace.clone(),
            })
    }
}

#[async_trait]
impl DbConnector for RedisConnector {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn keys(&self, db: DbId, pattern: &str) -> DbResult<Vec<String>> {
        let mut conn = self.conn(db)?;
        let keys: Vec<String> = conn.keys(pattern).await?;
        Ok(keys)
    }

    async fn get_all(&self, db: DbId, key: &str) -> DbResult<HashMap<String, String>> {
        let mut conn = self.conn(db)?;
        let fields: HashMap<String, String> = conn.hgetall(key).await?;
        Ok(fields)
    }

    async fn exists(&self, db: DbId, key: &str) -> DbResult<bool> {
        let mut conn = self.conn(db)?;
        let exists: bool = conn.exists(key).await?;
        Ok(exists)
    }
}
