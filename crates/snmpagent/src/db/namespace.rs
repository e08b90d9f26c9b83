//! Fan-out reads across the namespaces of a multi-ASIC device.
//!
//! The first connector is always the host namespace. Interface, LAG, queue
//! and forwarding state lives in the per-ASIC namespaces, so aggregated reads
//! skip the host unless it is the only namespace.

use super::{DbConnector, DbError, DbId, DbResult};
use futures::future::join_all;
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::warn;

/// A read that failed in one namespace.
#[derive(Debug)]
pub struct NamespaceError {
    pub namespace: String,
    pub error: DbError,
}

/// Merged result of an aggregated read plus the namespaces that failed.
///
/// Callers choose how strict to be: identity loads use
/// [`into_strict`](Aggregated::into_strict), refresh reads use
/// [`into_partial`](Aggregated::into_partial) and serve what they got.
#[derive(Debug)]
pub struct Aggregated<T> {
    pub value: T,
    pub errors: Vec<NamespaceError>,
}

impl<T> Aggregated<T> {
    pub fn is_complete(&self) -> bool {
        self.errors.is_empty()
    }

    /// Fails with the first namespace error, if any.
    pub fn into_strict(self) -> DbResult<T> {
        match self.errors.into_iter().next() {
            Some(failed) => Err(failed.error),
            None => Ok(self.value),
        }
    }

    /// Logs each namespace error and returns the merged value.
    pub fn into_partial(self, context: &str) -> T {
        for failed in &self.errors {
            warn!(
                namespace = %failed.namespace,
                error = %failed.error,
                context,
                "Namespace read failed, serving partial data"
            );
        }
        self.value
    }
}

/// Ordered set of namespace connectors, host first.
#[derive(Clone)]
pub struct NamespaceDbs {
    connectors: Vec<Arc<dyn DbConnector>>,
}

impl NamespaceDbs {
    /// Returns `None` for an empty connector list.
    pub fn new(connectors: Vec<Arc<dyn DbConnector>>) -> Option<Self> {
        if connectors.is_empty() {
            return None;
        }
        Some(Self { connectors })
    }

    /// A single-namespace device.
    pub fn single(connector: Arc<dyn DbConnector>) -> Self {
        Self {
            connectors: vec![connector],
        }
    }

    pub fn len(&self) -> usize {
        self.connectors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connectors.is_empty()
    }

    /// The host namespace connector.
    pub fn host(&self) -> &Arc<dyn DbConnector> {
        &self.connectors[0]
    }

    /// Connectors holding ASIC state: all but the host, or the host alone on
    /// a single-namespace device.
    pub fn non_host(&self) -> &[Arc<dyn DbConnector>] {
        if self.connectors.len() == 1 {
            &self.connectors
        } else {
            &self.connectors[1..]
        }
    }

    /// Union of matching keys across the non-host namespaces.
    pub async fn keys(&self, db: DbId, pattern: &str) -> Aggregated<Vec<String>> {
        let reads = join_all(self.non_host().iter().map(|conn| conn.keys(db, pattern))).await;

        let mut keys = BTreeSet::new();
        let mut errors = Vec::new();
        for (conn, read) in self.non_host().iter().zip(reads) {
            match read {
                Ok(found) => keys.extend(found),
                Err(error) => errors.push(NamespaceError {
                    namespace: conn.namespace().to_string(),
                    error,
                }),
            }
        }

        Aggregated {
            value: keys.into_iter().collect(),
            errors,
        }
    }

    /// Merges the hash at `key` from every non-host namespace holding it.
    ///
    /// Namespaces are read concurrently; later namespaces overwrite earlier
    /// ones on field collisions.
    pub async fn get_all(&self, db: DbId, key: &str) -> Aggregated<HashMap<String, String>> {
        let reads = join_all(self.non_host().iter().map(|conn| async move {
            if conn.exists(db, key).await? {
                conn.get_all(db, key).await
            } else {
                Ok(HashMap::new())
            }
        }))
        .await;

        let mut merged = HashMap::new();
        let mut errors = Vec::new();
        for (conn, read) in self.non_host().iter().zip(reads) {
            match read {
                Ok(fields) => merged.extend(fields),
                Err(error) => errors.push(NamespaceError {
                    namespace: conn.namespace().to_string(),
                    error,
                }),
            }
        }

        Aggregated {
            value: merged,
            errors,
        }
    }
}
