//! In-process store used by unit and integration tests.

use super::{DbConnector, DbError, DbId, DbResult};
use async_trait::async_trait;
use parking_lot::RwLock;
use regex::Regex;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};

type Table = BTreeMap<String, HashMap<String, String>>;

/// A [`DbConnector`] backed by hash maps.
///
/// Keys come back sorted, which keeps test expectations stable. Reads can be
/// made to fail with [`MemoryConnector::set_unavailable`] to exercise the
/// namespace aggregation error paths.
#[derive(Default)]
pub struct MemoryConnector {
    namespace: String,
    tables: RwLock<HashMap<DbId, Table>>,
    unavailable: AtomicBool,
}

impl MemoryConnector {
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Writes fields into a hash, creating it if needed.
    pub fn hset<K, V>(&self, db: DbId, key: &str, fields: impl IntoIterator<Item = (K, V)>)
    where
        K: Into<String>,
        V: Into<String>,
    {
        let mut tables = self.tables.write();
        let entry = tables
            .entry(db)
            .or_default()
            .entry(key.to_string())
            .or_default();
        for (field, value) in fields {
            entry.insert(field.into(), value.into());
        }
    }

    pub fn del(&self, db: DbId, key: &str) {
        if let Some(table) = self.tables.write().get_mut(&db) {
            table.remove(key);
        }
    }

    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    fn check_available(&self) -> DbResult<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            return Err(DbError::Unavailable {
                namespace: self.namespace.clone(),
                message: "connection refused".to_string(),
            });
        }
        Ok(())
    }
}

/// Translates a Redis glob (`*`, `?`) into an anchored regex.
fn glob_to_regex(pattern: &str) -> Result<Regex, regex::Error> {
    let mut re = String::with_capacity(pattern.len() + 8);
    re.push('^');
    for c in pattern.chars() {
        match c {
            '*' => re.push_str(".*"),
            '?' => re.push('.'),
            other => re.push_str(&regex::escape(&other.to_string())),
        }
    }
    re.push('$');
    Regex::new(&re)
}

#[async_trait]
impl DbConnector for MemoryConnector {
    fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn keys(&self, db: DbId, pattern: &str) -> DbResult<Vec<String>> {
        self.check_available()?;
        let re = glob_to_regex(pattern).map_err(|e| DbError::Unavailable {
            namespace: self.namespace.clone(),
            message: format!("bad key pattern '{}': {}", pattern, e),
        })?;
        let tables = self.tables.read();
        Ok(tables
            .get(&db)
            .map(|table| table.keys().filter(|k| re.is_match(k)).cloned().collect())
            .unwrap_or_default())
    }

    async fn get_all(&self, db: DbId, key: &str) -> DbResult<HashMap<String, String>> {
        self.check_available()?;
        let tables = self.tables.read();
        Ok(tables
            .get(&db)
            .and_then(|table| table.get(key))
            .cloned()
            .unwrap_or_default())
    }

    async fn exists(&self, db: DbId, key: &str) -> DbResult<bool> {
        self.check_available()?;
        let tables = self.tables.read();
        Ok(tables.get(&db).is_some_and(|table| table.contains_key(key)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_glob_escapes_regex_metacharacters() {
        let re = glob_to_regex("ROUTE_TABLE:0.0.0.0/0").unwrap();
        assert!(re.is_match("ROUTE_TABLE:0.0.0.0/0"));
        assert!(!re.is_match("ROUTE_TABLE:0a0.0.0/0"));

        let re = glob_to_regex("SNMP_OVERLAY|1.3.6.1*").unwrap();
        assert!(re.is_match("SNMP_OVERLAY|1.3.6.1.4.1"));
    }

    #[tokio::test]
    async fn test_keys_are_sorted_and_filtered() {
        let db = MemoryConnector::new("");
        db.hset(DbId::Appl, "LAG_TABLE:PortChannel02", [("mtu", "9100")]);
        db.hset(DbId::Appl, "LAG_TABLE:PortChannel01", [("mtu", "9100")]);
        db.hset(DbId::Appl, "PORT_TABLE:Ethernet0", [("mtu", "9100")]);

        let keys = db.keys(DbId::Appl, "LAG_TABLE:*").await.unwrap();
        assert_eq!(
            keys,
            vec!["LAG_TABLE:PortChannel01", "LAG_TABLE:PortChannel02"]
        );
        assert!(db.keys(DbId::State, "*").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_get_all_missing_key_is_empty() {
        let db = MemoryConnector::new("");
        assert!(db.get_all(DbId::Counters, "COUNTERS:oid:0x1").await.unwrap().is_empty());
        assert!(!db.exists(DbId::Counters, "COUNTERS:oid:0x1").await.unwrap());
    }

    #[tokio::test]
    async fn test_unavailable_fails_reads() {
        let db = MemoryConnector::new("asic0");
        db.set_unavailable(true);
        let err = db.keys(DbId::Appl, "*").await.unwrap_err();
        assert!(matches!(err, DbError::Unavailable { ref namespace, .. } if namespace == "asic0"));

        db.set_unavailable(false);
        assert!(db.keys(DbId::Appl, "*").await.is_ok());
    }
}
