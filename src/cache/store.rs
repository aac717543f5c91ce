//! Process-wide in-memory store backed by Moka.

use std::sync::Arc;
use std::time::{Duration, Instant};

use moka::Expiry;
use moka::sync::Cache;
use once_cell::sync::OnceCell;
use tracing::debug;

use super::traits::{CacheValue, effective_ttl};
use super::StoreConfig;

/// A stored value with the TTL it was written with.
#[derive(Clone)]
struct StoredEntry {
    value: CacheValue,
    ttl: Option<Duration>,
}

/// Per-entry absolute expiration: an entry lives for the TTL given at its
/// last write, reads never extend it.
struct AbsoluteExpiry;

impl Expiry<String, StoredEntry> for AbsoluteExpiry {
    fn expire_after_create(
        &self,
        _key: &String,
        entry: &StoredEntry,
        _created_at: Instant,
    ) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &StoredEntry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// Shared in-memory table behind the singleton backend.
///
/// The store is:
/// - Thread-safe (Moka handles its own synchronization)
/// - Built lazily, on first access
/// - Clone-friendly (cloning is cheap, shares the same underlying table)
///
/// Construct one per process and hand clones to every backend that should
/// share it. Backends keep out of each other's way through their namespaces.
#[derive(Clone)]
pub struct MemoryStore {
    inner: Arc<OnceCell<Cache<String, StoredEntry>>>,
    config: Arc<StoreConfig>,
}

impl MemoryStore {
    /// Create a new store with the given config.
    pub fn new(config: StoreConfig) -> Self {
        Self {
            inner: Arc::new(OnceCell::new()),
            config: Arc::new(config),
        }
    }

    fn table(&self) -> &Cache<String, StoredEntry> {
        self.inner.get_or_init(|| {
            let mut builder = Cache::builder().expire_after(AbsoluteExpiry);

            if let Some(max_capacity) = self.config.max_capacity {
                builder = builder.max_capacity(max_capacity);
            }

            if let Some(initial_capacity) = self.config.initial_capacity {
                builder = builder.initial_capacity(initial_capacity);
            }

            debug!(
                max_capacity = ?self.config.max_capacity,
                "Memory store created"
            );

            builder.build()
        })
    }

    /// Whether the underlying table has been built yet.
    pub fn is_initialized(&self) -> bool {
        self.inner.get().is_some()
    }

    /// Insert a value. A `None` or zero `ttl` never expires.
    pub fn insert(&self, key: String, value: CacheValue, ttl: Option<Duration>) {
        self.table().insert(
            key,
            StoredEntry {
                value,
                ttl: effective_ttl(ttl),
            },
        );
    }

    /// Get a value.
    ///
    /// Returns `Some(value)` if the key exists and hasn't expired.
    pub fn get(&self, key: &str) -> Option<CacheValue> {
        self.table().get(key).map(|entry| entry.value)
    }

    /// Check if a key exists in the store.
    pub fn contains(&self, key: &str) -> bool {
        self.table().contains_key(key)
    }

    /// Remove a key from the store.
    pub fn remove(&self, key: &str) {
        self.table().invalidate(key);
    }

    /// Iterate over all live entries, whatever their namespace.
    pub fn iter(&self) -> impl Iterator<Item = (Arc<String>, CacheValue)> + '_ {
        self.table()
            .iter()
            .map(|(key, entry)| (key, entry.value))
    }

    /// Get the number of entries in the store.
    ///
    /// Note: This may not be perfectly accurate due to concurrent operations
    /// and pending maintenance.
    pub fn entry_count(&self) -> u64 {
        self.table().entry_count()
    }

    /// Apply pending expirations and evictions now.
    pub fn run_pending_tasks(&self) {
        self.table().run_pending_tasks();
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl std::fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryStore")
            .field("max_capacity", &self.config.max_capacity)
            .field(
                "entry_count",
                &self.inner.get().map(|table| table.entry_count()),
            )
            .finish()
    }
}
