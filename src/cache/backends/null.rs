//! Null cache backend.
//!
//! Always misses, never stores. Used to switch caching off without touching
//! call sites.

use std::time::Duration;

use crate::cache::traits::{Cache, CacheValue, Entries};

/// Backend that never caches anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NullCache;

impl NullCache {
    pub fn new() -> Self {
        Self
    }
}

impl Cache for NullCache {
    fn get(&self, _key: &str) -> Option<CacheValue> {
        None
    }

    fn set(&self, _key: &str, _value: CacheValue, _ttl: Option<Duration>) {}

    fn contains(&self, _key: &str) -> bool {
        false
    }

    fn remove(&self, _key: &str) {}

    fn entries(&self) -> Entries<'_> {
        Box::new(std::iter::empty())
    }

    fn is_shared(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "null"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn test_null_never_stores() {
        let cache = NullCache::new();
        cache.set("key", Arc::new("value"), None);

        assert!(cache.get("key").is_none());
        assert!(!cache.contains("key"));
        assert_eq!(cache.entries().count(), 0);
    }

    #[test]
    fn test_null_identity() {
        let cache = NullCache::new();
        assert!(!cache.is_shared());
        assert_eq!(cache.name(), "null");
    }
}
