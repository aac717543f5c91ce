//! Cache manager - locking and compute-if-absent over one backend.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

use regex::RegexBuilder;
use tracing::debug;

use super::backends::NullCache;
use super::errors::{CacheError, CacheResult, ensure_key, ensure_pattern};
use super::lock::{CacheLock, WriteScope};
use super::traits::{Cache, CacheValue};

/// Outcome of the double-checked lookup in the compute path.
enum Lookup<'a, T> {
    Hit(Arc<T>),
    /// Still absent after the re-check; holds exclusive access.
    Miss(WriteScope<'a>),
}

/// Concurrency-safe façade over exactly one [`Cache`] backend.
///
/// The manager adds:
/// - compute-if-absent (`get_or_compute` and friends) with at most one
///   writer per manager at a time
/// - a reader/writer lock, engaged only when the backend is shared
/// - bulk removal by key pattern, and full clear
///
/// Reads (`get`, `contains`, the fast path of the compute family) never
/// lock. Writes take the manager's write scope, so a factory may read the
/// manager it was called from but must not write to it.
///
/// ## Example
///
/// ```rust
/// use scopecache::cache::{CacheManager, MemoryStore, SingletonCache};
/// use std::time::Duration;
///
/// let manager = CacheManager::from_backend(SingletonCache::new(MemoryStore::default()));
///
/// let greeting = manager
///     .get_or_insert_with("greeting", Some(Duration::from_secs(300)), || "hello".to_string())
///     .unwrap();
/// assert_eq!(greeting.as_str(), "hello");
/// ```
pub struct CacheManager {
    backend: Arc<dyn Cache>,
    lock: CacheLock,
}

impl CacheManager {
    /// Create a manager over `backend`.
    ///
    /// The lock strategy is fixed here from `backend.is_shared()`.
    pub fn new(backend: Arc<dyn Cache>) -> Self {
        let lock = CacheLock::for_backend(backend.is_shared());

        debug!(
            backend = backend.name(),
            locking = lock.is_active(),
            "Cache manager created"
        );

        Self { backend, lock }
    }

    /// Create a manager that owns `backend`.
    pub fn from_backend<C>(backend: C) -> Self
    where
        C: Cache + 'static,
    {
        Self::new(Arc::new(backend))
    }

    /// A manager that always misses and never stores.
    ///
    /// Drop-in replacement when caching must be switched off.
    pub fn null() -> Self {
        Self::from_backend(NullCache)
    }

    /// Name of the wrapped backend.
    pub fn backend_name(&self) -> &'static str {
        self.backend.name()
    }

    /// Whether the wrapped backend is shared, i.e. whether this manager locks.
    pub fn is_shared(&self) -> bool {
        self.lock.is_active()
    }

    /// Get the raw value stored under `key`.
    pub fn get_value(&self, key: &str) -> Option<CacheValue> {
        self.backend.get(key)
    }

    /// Get the value stored under `key` as a `T`.
    ///
    /// Fails with `InvalidArgument` on a blank key, and with `TypeMismatch` if
    /// the stored value is of another type.
    pub fn get<T>(&self, key: &str) -> CacheResult<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        ensure_key(key)?;
        self.typed_hit(key)
    }

    /// Check if a value is stored under `key`.
    pub fn contains(&self, key: &str) -> bool {
        self.backend.contains(key)
    }

    /// Store `value` under `key`. A `None` or zero `ttl` never expires.
    pub fn set<T>(&self, key: &str, value: T, ttl: Option<Duration>) -> CacheResult<()>
    where
        T: Any + Send + Sync,
    {
        self.set_value(key, Some(Arc::new(value)), ttl)
    }

    /// Store a raw value. `None` is never cached: the call is a no-op.
    pub fn set_value(
        &self,
        key: &str,
        value: Option<CacheValue>,
        ttl: Option<Duration>,
    ) -> CacheResult<()> {
        ensure_key(key)?;

        let Some(value) = value else {
            debug!(key = key, "Cache SET skipped, no value");
            return Ok(());
        };

        let _scope = self.lock.write();
        self.backend.set(key, value, ttl);
        debug!(key = key, backend = self.backend.name(), ttl = ?ttl, "Cache SET");
        Ok(())
    }

    /// Remove `key`. No-op if absent.
    pub fn remove(&self, key: &str) -> CacheResult<()> {
        ensure_key(key)?;

        let _scope = self.lock.write();
        self.backend.remove(key);
        debug!(key = key, backend = self.backend.name(), "Cache DEL");
        Ok(())
    }

    /// Get the value under `key`, computing and storing it on a miss.
    ///
    /// A factory returning `None` is not cached, so the next call tries
    /// again.
    pub fn get_or_compute<T, F>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> CacheResult<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> Option<T>,
    {
        self.get_or_try_compute(key, ttl, || Ok::<_, CacheError>(factory()))
    }

    /// Get the value under `key`, computing and storing it on a miss.
    pub fn get_or_insert_with<T, F>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> CacheResult<Arc<T>>
    where
        T: Any + Send + Sync,
        F: FnOnce() -> T,
    {
        match self.lookup_or_lock(key)? {
            Lookup::Hit(value) => Ok(value),
            Lookup::Miss(_scope) => {
                let value = Arc::new(factory());
                self.store(key, &value, ttl);
                Ok(value)
            }
        }
    }

    /// Get the value under `key`, computing it with a fallible factory on a
    /// miss.
    ///
    /// Factory errors are returned unchanged and leave nothing behind.
    pub fn get_or_try_compute<T, E, F>(
        &self,
        key: &str,
        ttl: Option<Duration>,
        factory: F,
    ) -> Result<Option<Arc<T>>, E>
    where
        T: Any + Send + Sync,
        E: From<CacheError>,
        F: FnOnce() -> Result<Option<T>, E>,
    {
        match self.lookup_or_lock(key)? {
            Lookup::Hit(value) => Ok(Some(value)),
            Lookup::Miss(_scope) => {
                let Some(value) = factory()? else {
                    debug!(key = key, "Factory returned no value, not cached");
                    return Ok(None);
                };
                let value = Arc::new(value);
                self.store(key, &value, ttl);
                Ok(Some(value))
            }
        }
    }

    /// Remove every entry whose key matches `pattern`.
    ///
    /// The pattern is a case-insensitive regex in which `.` also matches
    /// newlines. Matching keys are collected first and removed afterwards,
    /// all under one write scope. Returns how many entries were removed.
    pub fn remove_by_pattern(&self, pattern: &str) -> CacheResult<usize> {
        ensure_pattern(pattern)?;

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .dot_matches_new_line(true)
            .build()
            .map_err(|source| CacheError::InvalidPattern {
                pattern: pattern.to_string(),
                source,
            })?;

        let _scope = self.lock.write();

        let matching: Vec<String> = self
            .backend
            .entries()
            .map(|(key, _)| key)
            .filter(|key| regex.is_match(key))
            .collect();

        for key in &matching {
            self.backend.remove(key);
        }

        debug!(
            pattern = pattern,
            backend = self.backend.name(),
            removed = matching.len(),
            "Cache entries removed by pattern"
        );

        Ok(matching.len())
    }

    /// Remove every entry the backend currently holds.
    pub fn clear(&self) {
        let _scope = self.lock.write();

        let keys: Vec<String> = self.backend.entries().map(|(key, _)| key).collect();
        for key in &keys {
            self.backend.remove(key);
        }

        debug!(
            backend = self.backend.name(),
            removed = keys.len(),
            "Cache cleared"
        );
    }

    /// Snapshot of the keys currently stored.
    pub fn keys(&self) -> Vec<String> {
        self.backend.entries().map(|(key, _)| key).collect()
    }

    /// Hold exclusive access across several operations.
    ///
    /// Only reads may be issued while the scope is held; writing through the
    /// same manager from the holding thread would deadlock on a shared
    /// backend. Dropping the scope releases it.
    pub fn enter_write_lock(&self) -> WriteScope<'_> {
        self.lock.write()
    }

    fn typed_hit<T>(&self, key: &str) -> CacheResult<Option<Arc<T>>>
    where
        T: Any + Send + Sync,
    {
        let Some(value) = self.backend.get(key) else {
            return Ok(None);
        };

        value
            .downcast::<T>()
            .map(Some)
            .map_err(|_| CacheError::TypeMismatch {
                key: key.to_string(),
                expected: std::any::type_name::<T>(),
            })
    }

    /// Fast path, then upgradeable scope and re-check.
    fn lookup_or_lock<T>(&self, key: &str) -> CacheResult<Lookup<'_, T>>
    where
        T: Any + Send + Sync,
    {
        ensure_key(key)?;

        if let Some(value) = self.typed_hit(key)? {
            debug!(key = key, backend = self.backend.name(), "Cache HIT");
            return Ok(Lookup::Hit(value));
        }

        let scope = self.lock.upgradable();

        // Another writer may have filled the entry while we waited.
        if let Some(value) = self.typed_hit(key)? {
            debug!(key = key, backend = self.backend.name(), "Cache HIT after wait");
            return Ok(Lookup::Hit(value));
        }

        debug!(key = key, backend = self.backend.name(), "Cache MISS");
        Ok(Lookup::Miss(scope.upgrade()))
    }

    // Caller holds the write scope.
    fn store<T>(&self, key: &str, value: &Arc<T>, ttl: Option<Duration>)
    where
        T: Any + Send + Sync,
    {
        let erased: CacheValue = Arc::clone(value) as CacheValue;
        self.backend.set(key, erased, ttl);
        debug!(key = key, backend = self.backend.name(), ttl = ?ttl, "Cache SET");
    }
}

impl std::fmt::Debug for CacheManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheManager")
            .field("backend", &self.backend.name())
            .field("locking", &self.lock.is_active())
            .finish()
    }
}
