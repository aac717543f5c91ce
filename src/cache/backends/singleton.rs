//! Singleton cache backend over the process-wide memory store.

use std::time::Duration;

use crate::cache::namespace::Namespace;
use crate::cache::store::MemoryStore;
use crate::cache::traits::{Cache, CacheValue, Entries};

/// Namespace used unless a custom one is given.
pub const DEFAULT_NAMESPACE: &str = "static-cache";

/// Backend over a [`MemoryStore`] shared by the whole process.
///
/// Entries support absolute, per-entry expiration. The store is shared
/// between threads, so managers over this backend lock.
#[derive(Debug, Clone)]
pub struct SingletonCache {
    store: MemoryStore,
    namespace: Namespace,
}

impl SingletonCache {
    /// Create a backend over `store` with the default namespace.
    pub fn new(store: MemoryStore) -> Self {
        Self::with_namespace(store, Namespace::builtin(DEFAULT_NAMESPACE))
    }

    /// Create a backend over `store` with a custom namespace.
    pub fn with_namespace(store: MemoryStore, namespace: Namespace) -> Self {
        Self { store, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl Cache for SingletonCache {
    fn get(&self, key: &str) -> Option<CacheValue> {
        self.store.get(&self.namespace.qualify(key))
    }

    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>) {
        self.store.insert(self.namespace.qualify(key), value, ttl);
    }

    fn contains(&self, key: &str) -> bool {
        self.store.contains(&self.namespace.qualify(key))
    }

    fn remove(&self, key: &str) {
        self.store.remove(&self.namespace.qualify(key));
    }

    fn entries(&self) -> Entries<'_> {
        Box::new(self.store.iter().filter_map(|(stored, value)| {
            self.namespace
                .strip(&stored)
                .map(|key| (key.to_string(), value))
        }))
    }

    fn is_shared(&self) -> bool {
        true
    }

    fn name(&self) -> &'static str {
        "singleton"
    }
}
