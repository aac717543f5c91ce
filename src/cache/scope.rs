//! Request scopes for the scoped backend.
//!
//! A [`RequestScope`] is a key/value bag that lives exactly as long as one
//! logical operation. The scoped backend never reaches for it through ambient
//! state: it asks an injected [`ScopeAccessor`] for the current scope, and
//! treats "no scope" as "caching unavailable".

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::debug;

use super::traits::CacheValue;

/// Items attached to one request/operation.
///
/// Other subsystems may keep their own data here too, which is why the
/// scoped backend namespaces its keys.
#[derive(Default)]
pub struct RequestScope {
    items: Mutex<HashMap<String, CacheValue>>,
}

impl RequestScope {
    /// Create an empty scope.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<CacheValue> {
        self.items.lock().get(key).cloned()
    }

    pub fn insert(&self, key: String, value: CacheValue) {
        self.items.lock().insert(key, value);
    }

    pub fn contains(&self, key: &str) -> bool {
        self.items.lock().contains_key(key)
    }

    pub fn remove(&self, key: &str) -> Option<CacheValue> {
        self.items.lock().remove(key)
    }

    /// Copy out the current items.
    ///
    /// Callers iterate the copy, so removing items while walking it is fine.
    pub fn snapshot(&self) -> Vec<(String, CacheValue)> {
        self.items
            .lock()
            .iter()
            .map(|(k, v)| (k.clone(), Arc::clone(v)))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.lock().is_empty()
    }

    /// Drop every item.
    pub fn clear(&self) {
        self.items.lock().clear();
    }
}

impl std::fmt::Debug for RequestScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestScope")
            .field("items", &self.len())
            .finish()
    }
}

/// Answers "which scope is active right now?".
pub trait ScopeAccessor: Send + Sync {
    /// The active scope, or `None` when no operation is in flight.
    fn current(&self) -> Option<Arc<RequestScope>>;
}

impl<F> ScopeAccessor for F
where
    F: Fn() -> Option<Arc<RequestScope>> + Send + Sync,
{
    fn current(&self) -> Option<Arc<RequestScope>> {
        self()
    }
}

/// Explicit holder of the current scope for one flow of execution.
///
/// Hosts create one slot per logical execution flow (a worker, a request
/// pipeline) and pass clones of it to the scoped backends that serve that
/// flow. [`ScopeSlot::enter`] opens a scope; dropping the returned guard
/// clears it and restores whatever was active before.
#[derive(Clone, Default)]
pub struct ScopeSlot {
    current: Arc<RwLock<Option<Arc<RequestScope>>>>,
}

impl ScopeSlot {
    /// Create a slot with no active scope.
    pub fn new() -> Self {
        Self::default()
    }

    /// Open a fresh scope and make it current until the guard drops.
    pub fn enter(&self) -> ScopeGuard {
        let scope = Arc::new(RequestScope::new());
        let previous = self.current.write().replace(Arc::clone(&scope));
        debug!(nested = previous.is_some(), "Request scope entered");

        ScopeGuard {
            slot: self.clone(),
            scope,
            previous,
        }
    }

    /// Whether a scope is active.
    pub fn is_active(&self) -> bool {
        self.current.read().is_some()
    }
}

impl ScopeAccessor for ScopeSlot {
    fn current(&self) -> Option<Arc<RequestScope>> {
        self.current.read().clone()
    }
}

impl std::fmt::Debug for ScopeSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeSlot")
            .field("active", &self.is_active())
            .finish()
    }
}

/// Keeps a scope current. Dropping it ends the scope.
#[must_use = "the scope ends as soon as the guard is dropped"]
pub struct ScopeGuard {
    slot: ScopeSlot,
    scope: Arc<RequestScope>,
    previous: Option<Arc<RequestScope>>,
}

impl ScopeGuard {
    /// The scope this guard keeps alive.
    pub fn scope(&self) -> &Arc<RequestScope> {
        &self.scope
    }
}

impl Drop for ScopeGuard {
    fn drop(&mut self) {
        let dropped = self.scope.len();
        self.scope.clear();
        *self.slot.current.write() = self.previous.take();
        debug!(items = dropped, "Request scope ended");
    }
}

impl std::fmt::Debug for ScopeGuard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ScopeGuard")
            .field("scope", &self.scope)
            .finish()
    }
}
