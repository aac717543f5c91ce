//! Lock strategy for the cache manager.
//!
//! A manager over a shared backend gets a real reader/writer lock; every
//! other manager gets the no-op variant, whose scopes hold nothing and never
//! block. The choice is made once, at manager construction.

use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};

/// Reader/writer lock that is only engaged for shared backends.
#[derive(Debug)]
pub(crate) enum CacheLock {
    /// Real lock, used when the backend is shared between threads.
    Exclusive(RwLock<()>),
    /// Backend is confined to one logical thread of execution.
    Noop,
}

impl CacheLock {
    /// Pick the strategy for a backend.
    pub(crate) fn for_backend(shared: bool) -> Self {
        if shared {
            Self::Exclusive(RwLock::new(()))
        } else {
            Self::Noop
        }
    }

    /// Whether acquisitions actually lock.
    pub(crate) fn is_active(&self) -> bool {
        matches!(self, Self::Exclusive(_))
    }

    /// Enter an upgradeable read scope.
    ///
    /// Only one upgradeable scope exists at a time; plain readers are not
    /// excluded until it upgrades.
    pub(crate) fn upgradable(&self) -> UpgradableScope<'_> {
        UpgradableScope {
            guard: match self {
                Self::Exclusive(lock) => Some(lock.upgradable_read()),
                Self::Noop => None,
            },
        }
    }

    /// Enter a write scope.
    pub(crate) fn write(&self) -> WriteScope<'_> {
        WriteScope {
            guard: match self {
                Self::Exclusive(lock) => Some(lock.write()),
                Self::Noop => None,
            },
        }
    }
}

/// Upgradeable read scope. Released on drop.
#[must_use = "the scope is released as soon as it is dropped"]
pub(crate) struct UpgradableScope<'a> {
    guard: Option<RwLockUpgradableReadGuard<'a, ()>>,
}

impl<'a> UpgradableScope<'a> {
    /// Atomically trade this scope for exclusive access.
    pub(crate) fn upgrade(self) -> WriteScope<'a> {
        WriteScope {
            guard: self.guard.map(RwLockUpgradableReadGuard::upgrade),
        }
    }
}

/// Exclusive access to a cache manager. Released on drop, including when
/// the holder unwinds.
#[must_use = "the scope is released as soon as it is dropped"]
pub struct WriteScope<'a> {
    guard: Option<RwLockWriteGuard<'a, ()>>,
}

impl WriteScope<'_> {
    /// `true` if this scope holds a real lock, `false` for the no-op
    /// scope handed out by managers over non-shared backends.
    pub fn is_exclusive(&self) -> bool {
        self.guard.is_some()
    }
}

impl std::fmt::Debug for WriteScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WriteScope")
            .field("exclusive", &self.is_exclusive())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_follows_shared_flag() {
        assert!(CacheLock::for_backend(true).is_active());
        assert!(!CacheLock::for_backend(false).is_active());
    }

    #[test]
    fn test_write_scope_excludes_others_until_dropped() {
        let lock = CacheLock::for_backend(true);
        let CacheLock::Exclusive(raw) = &lock else {
            panic!("expected a real lock");
        };

        let scope = lock.write();
        assert!(scope.is_exclusive());
        assert!(raw.try_read().is_none());

        drop(scope);
        assert!(raw.try_read().is_some());
    }

    #[test]
    fn test_upgradable_scope_admits_readers_then_upgrades() {
        let lock = CacheLock::for_backend(true);
        let CacheLock::Exclusive(raw) = &lock else {
            panic!("expected a real lock");
        };

        let scope = lock.upgradable();
        assert!(raw.try_read().is_some());
        assert!(raw.try_upgradable_read().is_none());

        let write = scope.upgrade();
        assert!(write.is_exclusive());
        assert!(raw.try_read().is_none());
    }

    #[test]
    fn test_noop_scopes_never_block() {
        let lock = CacheLock::for_backend(false);

        let first = lock.write();
        let second = lock.write();
        let third = lock.upgradable().upgrade();

        assert!(!first.is_exclusive());
        assert!(!second.is_exclusive());
        assert!(!third.is_exclusive());
    }
}
