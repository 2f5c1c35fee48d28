// Datasource Registry
// Named database backends, swappable at runtime behind a stable id

use std::sync::Arc;

use crate::db::node::{DatasourceInfo, DatasourceNode};
use crate::db::traits::{ConnectionPool, DatabaseError, Dialect, DialectResolver};
use crate::registry::{normalize_key, KeyedRegistry, DEFAULT_KEY};

fn display_key(key: &str) -> &str {
    if key.trim().is_empty() {
        "default"
    } else {
        key
    }
}

/// Registry of live datasources keyed by datasource key
pub struct DatasourceRegistry {
    nodes: KeyedRegistry<DatasourceNode>,
}

impl DatasourceRegistry {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            nodes: KeyedRegistry::new(),
        }
    }

    /// Register the default datasource under the empty key
    pub fn set_default(&self, pool: Arc<dyn ConnectionPool>) -> Arc<DatasourceNode> {
        self.register(None, None, "default", pool)
    }

    /// Register `pool` under `key`, using the key as id and name
    pub fn add(&self, key: &str, pool: Arc<dyn ConnectionPool>) -> Arc<DatasourceNode> {
        self.register(Some(key), Some(key), key, pool)
    }

    /// Register a datasource.
    ///
    /// When `id` is given, any other entry carrying the same id is retired,
    /// so a backend re-keyed under a new name replaces its old entry.
    /// The replacement is not atomic: readers may briefly see both entries.
    pub fn register(
        &self,
        id: Option<&str>,
        key: Option<&str>,
        name: &str,
        pool: Arc<dyn ConnectionPool>,
    ) -> Arc<DatasourceNode> {
        let key = normalize_key(key);
        let node = Arc::new(DatasourceNode::new(
            id.map(str::to_string),
            key,
            name,
            pool,
        ));
        tracing::info!(datasource = display_key(key), url = %node.pool().url(), "registering datasource");

        match id {
            Some(id) => {
                for stale in self.nodes.put_with_identity(id, key, Arc::clone(&node)) {
                    tracing::info!(
                        datasource = display_key(stale.key()),
                        id,
                        "retired previous datasource"
                    );
                }
            }
            None => {
                self.nodes.put(key, Arc::clone(&node));
            }
        }
        node
    }

    /// Resolve the datasource for `key`; `None` means the default datasource
    pub fn resolve(&self, key: Option<&str>) -> Result<Arc<DatasourceNode>, DatabaseError> {
        self.nodes
            .get(key)
            .ok_or_else(|| DatabaseError::NotFound(normalize_key(key).to_string()))
    }

    /// Existence-check lookup
    pub fn get(&self, key: Option<&str>) -> Option<Arc<DatasourceNode>> {
        self.nodes.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.nodes.contains(key)
    }

    /// Resolve `key` and detect its dialect
    pub async fn resolve_dialect(
        &self,
        key: Option<&str>,
        resolver: &dyn DialectResolver,
    ) -> Result<Dialect, DatabaseError> {
        self.resolve(key)?.resolve_dialect(resolver).await
    }

    /// Remove a datasource. Blank keys are rejected so the default entry
    /// cannot be dropped by malformed input.
    pub fn remove(&self, key: Option<&str>) -> bool {
        let result = match key {
            Some(key) if !key.trim().is_empty() => self.nodes.delete(key),
            _ => false,
        };
        tracing::info!(datasource = ?key, removed = result, "removing datasource");
        result
    }

    /// Snapshot of registered keys
    pub fn datasources(&self) -> Vec<String> {
        self.nodes.keys()
    }

    /// Snapshot of registered nodes
    pub fn nodes(&self) -> Vec<Arc<DatasourceNode>> {
        self.nodes.values()
    }

    /// Snapshot of registered datasources, sorted by key
    pub fn infos(&self) -> Vec<DatasourceInfo> {
        let mut infos: Vec<DatasourceInfo> = self.nodes.values().iter().map(|n| n.info()).collect();
        infos.sort_by(|a, b| a.key.cmp(&b.key));
        infos
    }

    pub fn has_default(&self) -> bool {
        self.nodes.contains(DEFAULT_KEY)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Drop every datasource
    pub fn clear(&self) {
        self.nodes.clear();
    }
}

impl Default for DatasourceRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::dialect::UrlDialectResolver;
    use crate::db::traits::testing::{CountingPool, CountingResolver};

    fn wraps(node: &DatasourceNode, pool: &Arc<CountingPool>) -> bool {
        let expected: Arc<dyn ConnectionPool> = pool.clone();
        Arc::ptr_eq(node.pool(), &expected)
    }

    #[test]
    fn test_resolve_unregistered_key_is_not_found() {
        let registry = DatasourceRegistry::new();

        let err = registry.resolve(Some("missing")).unwrap_err();
        assert!(matches!(err, DatabaseError::NotFound(ref key) if key == "missing"));
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_default_resolves_by_none_and_empty() {
        let registry = DatasourceRegistry::new();
        let pool = CountingPool::new("jdbc:h2:mem:default");
        registry.set_default(pool.clone());

        let by_none = registry.resolve(None).unwrap();
        let by_empty = registry.resolve(Some("")).unwrap();

        assert!(Arc::ptr_eq(&by_none, &by_empty));
        assert!(wraps(&by_none, &pool));
        assert_eq!(by_none.key(), "");
        assert_eq!(by_none.id(), None);
        assert!(registry.has_default());
    }

    #[test]
    fn test_default_is_not_substituted_for_missing_key() {
        let registry = DatasourceRegistry::new();
        registry.set_default(CountingPool::new("jdbc:h2:mem:default"));

        assert!(registry.resolve(Some("reporting")).is_err());
    }

    #[test]
    fn test_add_uses_key_as_id_and_name() {
        let registry = DatasourceRegistry::new();
        let node = registry.add("reporting", CountingPool::new("jdbc:mysql://db/reporting"));

        assert_eq!(node.id(), Some("reporting"));
        assert_eq!(node.key(), "reporting");
        assert_eq!(node.name(), "reporting");
    }

    #[test]
    fn test_register_rekey_retires_old_entry() {
        let registry = DatasourceRegistry::new();
        let p1 = CountingPool::new("jdbc:mysql://db1/app");
        let p2 = CountingPool::new("jdbc:mysql://db2/app");

        registry.register(Some("db1"), Some("primary"), "Primary", p1);
        registry.register(Some("db1"), Some("primary2"), "Primary v2", p2.clone());

        assert!(matches!(
            registry.resolve(Some("primary")),
            Err(DatabaseError::NotFound(_))
        ));
        let node = registry.resolve(Some("primary2")).unwrap();
        assert!(wraps(&node, &p2));
        assert_eq!(node.name(), "Primary v2");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_register_same_id_many_times_leaves_one_entry() {
        let registry = DatasourceRegistry::new();
        registry.add("other", CountingPool::new("jdbc:h2:mem:other"));

        for key in ["a", "b", "c", "b", "d"] {
            registry.register(Some("shared"), Some(key), key, CountingPool::new("jdbc:h2:mem:x"));
        }

        let shared: Vec<_> = registry
            .nodes()
            .into_iter()
            .filter(|n| n.id() == Some("shared"))
            .collect();
        assert_eq!(shared.len(), 1);
        assert_eq!(shared[0].key(), "d");
        assert!(registry.contains("other"));
    }

    #[test]
    fn test_remove_existing_key() {
        let registry = DatasourceRegistry::new();
        registry.add("reporting", CountingPool::new("jdbc:h2:mem:r"));

        assert!(registry.remove(Some("reporting")));
        assert!(matches!(
            registry.resolve(Some("reporting")),
            Err(DatabaseError::NotFound(_))
        ));
        assert!(!registry.remove(Some("reporting")));
    }

    #[test]
    fn test_remove_blank_keys_keeps_default() {
        let registry = DatasourceRegistry::new();
        registry.set_default(CountingPool::new("jdbc:h2:mem:default"));

        assert!(!registry.remove(None));
        assert!(!registry.remove(Some("")));
        assert!(!registry.remove(Some("   ")));
        assert!(registry.resolve(None).is_ok());
    }

    #[tokio::test]
    async fn test_resolve_dialect_by_key() {
        let registry = DatasourceRegistry::new();
        registry.add("pg", CountingPool::new("jdbc:postgresql://db/app"));

        let dialect = registry
            .resolve_dialect(Some("pg"), &UrlDialectResolver)
            .await
            .unwrap();
        assert_eq!(dialect, Dialect::PostgreSql);

        let missing = registry
            .resolve_dialect(Some("nope"), &UrlDialectResolver)
            .await;
        assert!(matches!(missing, Err(DatabaseError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_rekey_starts_with_fresh_dialect_cache() {
        let registry = DatasourceRegistry::new();
        let resolver = CountingResolver::new(|| Ok(Some(Dialect::MySql)));

        registry.register(Some("db1"), Some("primary"), "Primary", CountingPool::new("jdbc:mysql://a"));
        registry.resolve_dialect(Some("primary"), &resolver).await.unwrap();
        registry.register(Some("db1"), Some("primary2"), "Primary", CountingPool::new("jdbc:mysql://b"));
        registry.resolve_dialect(Some("primary2"), &resolver).await.unwrap();

        assert_eq!(resolver.calls(), 2);
    }

    #[test]
    fn test_infos_sorted_by_key() {
        let registry = DatasourceRegistry::new();
        registry.add("b", CountingPool::new("jdbc:h2:mem:b"));
        registry.set_default(CountingPool::new("jdbc:h2:mem:default"));
        registry.add("a", CountingPool::new("jdbc:h2:mem:a"));

        let keys: Vec<String> = registry.infos().into_iter().map(|i| i.key).collect();
        assert_eq!(keys, vec!["", "a", "b"]);

        let mut listed = registry.datasources();
        listed.sort();
        assert_eq!(listed, vec!["", "a", "b"]);

        registry.clear();
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_concurrent_registration_keeps_one_entry_per_id() {
        let registry = Arc::new(DatasourceRegistry::new());

        let tasks = (0..16).map(|i| {
            let registry = Arc::clone(&registry);
            tokio::spawn(async move {
                let key = format!("key-{}", i % 4);
                registry.register(Some("shared"), Some(key.as_str()), &key, CountingPool::new("jdbc:h2:mem:c"));
            })
        });
        for result in futures::future::join_all(tasks).await {
            result.unwrap();
        }

        // Settle: one final registration observes every earlier insert.
        registry.register(Some("shared"), Some("final"), "final", CountingPool::new("jdbc:h2:mem:c"));

        let shared = registry
            .nodes()
            .into_iter()
            .filter(|n| n.id() == Some("shared"))
            .count();
        assert_eq!(shared, 1);
    }
}
