//! Scoped cache backend.
//!
//! Stores entries in the current [`RequestScope`]. Entries never expire on
//! their own; they go away when the scope ends. Without an active scope every
//! operation is a silent miss or no-op.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::namespace::Namespace;
use crate::cache::scope::ScopeAccessor;
use crate::cache::traits::{Cache, CacheValue, Entries};

/// Namespace used unless a custom one is given.
pub const DEFAULT_NAMESPACE: &str = "request-cache";

/// Backend bound to the lifetime of one request/operation.
#[derive(Clone)]
pub struct ScopedCache {
    scopes: Arc<dyn ScopeAccessor>,
    namespace: Namespace,
}

impl ScopedCache {
    /// Create a backend that stores into whatever scope `scopes` reports.
    pub fn new(scopes: Arc<dyn ScopeAccessor>) -> Self {
        Self::with_namespace(scopes, Namespace::builtin(DEFAULT_NAMESPACE))
    }

    /// Create a backend with a custom namespace.
    pub fn with_namespace(scopes: Arc<dyn ScopeAccessor>, namespace: Namespace) -> Self {
        Self { scopes, namespace }
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }
}

impl Cache for ScopedCache {
    fn get(&self, key: &str) -> Option<CacheValue> {
        self.scopes
            .current()
            .and_then(|scope| scope.get(&self.namespace.qualify(key)))
    }

    // The scope owns entry lifetime, so the TTL is ignored.
    fn set(&self, key: &str, value: CacheValue, _ttl: Option<Duration>) {
        if let Some(scope) = self.scopes.current() {
            scope.insert(self.namespace.qualify(key), value);
        }
    }

    fn contains(&self, key: &str) -> bool {
        self.scopes
            .current()
            .is_some_and(|scope| scope.contains(&self.namespace.qualify(key)))
    }

    fn remove(&self, key: &str) {
        if let Some(scope) = self.scopes.current() {
            scope.remove(&self.namespace.qualify(key));
        }
    }

    fn entries(&self) -> Entries<'_> {
        let Some(scope) = self.scopes.current() else {
            return Box::new(std::iter::empty());
        };

        Box::new(scope.snapshot().into_iter().filter_map(|(stored, value)| {
            self.namespace
                .strip(&stored)
                .map(|key| (key.to_string(), value))
        }))
    }

    fn is_shared(&self) -> bool {
        false
    }

    fn name(&self) -> &'static str {
        "scoped"
    }
}

impl std::fmt::Debug for ScopedCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopedCache")
            .field("namespace", &self.namespace)
            .finish()
    }
}
