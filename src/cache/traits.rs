//! Cache backend trait definition.

use std::any::Any;
use std::sync::Arc;
use std::time::Duration;

/// Opaque cached payload.
///
/// Backends never look inside values; typed access goes through
/// [`CacheManager::get`](super::CacheManager::get), which downcasts.
pub type CacheValue = Arc<dyn Any + Send + Sync>;

/// Lazy sequence of `(key, value)` pairs with the namespace prefix stripped.
pub type Entries<'a> = Box<dyn Iterator<Item = (String, CacheValue)> + 'a>;

/// Storage unit behind a [`CacheManager`](super::CacheManager).
///
/// Implemented by the singleton, scoped and null backends. Every backend
/// namespaces the caller's keys with a private prefix before touching its
/// underlying store, so unrelated data sharing that store stays invisible.
///
/// No operation fails: a missing key or an unavailable medium reads as a
/// miss, and writes against an unavailable medium are dropped.
pub trait Cache: Send + Sync {
    /// Get the value stored under `key`, if any.
    fn get(&self, key: &str) -> Option<CacheValue>;

    /// Store `value` under `key`.
    ///
    /// `None` or a zero `ttl` means the entry never expires on its own.
    fn set(&self, key: &str, value: CacheValue, ttl: Option<Duration>);

    /// Check if a value is stored under `key`.
    fn contains(&self, key: &str) -> bool;

    /// Remove `key`. No-op if absent.
    fn remove(&self, key: &str);

    /// Enumerate entries under this backend's namespace.
    ///
    /// Every call re-scans the current state of the store.
    fn entries(&self) -> Entries<'_>;

    /// Whether several threads may read and write the underlying store at
    /// once. Must stay constant for the lifetime of the backend.
    fn is_shared(&self) -> bool;

    /// Short backend name for logs.
    fn name(&self) -> &'static str;
}

/// Normalize a caller-supplied TTL: zero means "no expiration".
pub(crate) fn effective_ttl(ttl: Option<Duration>) -> Option<Duration> {
    ttl.filter(|d| !d.is_zero())
}
