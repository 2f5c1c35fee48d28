// Keyed Registry
// Concurrent key -> node directory shared by the datasource and console registries

use dashmap::DashMap;
use std::sync::Arc;

/// Key used for the default, unkeyed entry
pub const DEFAULT_KEY: &str = "";

/// Nodes that carry a stable identity distinct from their lookup key
pub trait Identified {
    /// Stable logical identifier, if any
    fn identity(&self) -> Option<&str>;
}

/// Normalize an optional key to the default key
pub fn normalize_key(key: Option<&str>) -> &str {
    key.unwrap_or(DEFAULT_KEY)
}

/// Concurrent mapping from string key to an immutable-once-constructed node
pub struct KeyedRegistry<N> {
    entries: DashMap<String, Arc<N>>,
}

impl<N> KeyedRegistry<N> {
    /// Create a new empty registry
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Insert or overwrite the entry at `key`, returning the displaced node
    pub fn put(&self, key: impl Into<String>, node: Arc<N>) -> Option<Arc<N>> {
        self.entries.insert(key.into(), node)
    }

    /// Look up a node; `None` resolves the default key
    pub fn get(&self, key: Option<&str>) -> Option<Arc<N>> {
        self.entries
            .get(normalize_key(key))
            .map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Return the node at `key`, creating it with `create` if absent.
    ///
    /// Runs under the shard lock for `key`, so concurrent callers for the
    /// same key observe a single node.
    pub fn get_or_insert_with<F>(&self, key: &str, create: F) -> Arc<N>
    where
        F: FnOnce() -> Arc<N>,
    {
        if let Some(existing) = self.entries.get(key) {
            return Arc::clone(existing.value());
        }
        Arc::clone(self.entries.entry(key.to_string()).or_insert_with(create).value())
    }

    /// Remove the entry at `key`. Returns whether an entry existed.
    pub fn delete(&self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    /// Point-in-time snapshot of the registered keys
    pub fn keys(&self) -> Vec<String> {
        self.entries.iter().map(|entry| entry.key().clone()).collect()
    }

    /// Point-in-time snapshot of the registered nodes
    pub fn values(&self) -> Vec<Arc<N>> {
        self.entries
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.entries.clear();
    }
}

impl<N: Identified> KeyedRegistry<N> {
    /// Insert `node` at `key`, then evict every other entry sharing `id`.
    ///
    /// The insert and the eviction scan are two separate steps: a concurrent
    /// reader can briefly observe both the old and the new entry for `id`.
    /// Returns the evicted nodes.
    pub fn put_with_identity(&self, id: &str, key: impl Into<String>, node: Arc<N>) -> Vec<Arc<N>> {
        let key = key.into();
        self.entries.insert(key.clone(), node);

        // Collect first: removing while iterating would deadlock on the shard.
        let stale: Vec<String> = self
            .entries
            .iter()
            .filter(|entry| entry.key() != &key && entry.value().identity() == Some(id))
            .map(|entry| entry.key().clone())
            .collect();

        stale
            .into_iter()
            .filter_map(|stale_key| {
                self.entries
                    .remove_if(&stale_key, |_, node| node.identity() == Some(id))
                    .map(|(_, node)| node)
            })
            .collect()
    }
}

impl<N> Default for KeyedRegistry<N> {
    fn default() -> Self {
        Self::new()
    }
}
