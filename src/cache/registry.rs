//! Channel registry - named cache managers built from a backend factory.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use serde::Deserialize;
use serde::de::IntoDeserializer;
use serde::de::value::Error as ValueError;
use tracing::{debug, info};

use super::backends::{NullCache, ScopedCache, SingletonCache};
use super::errors::{CacheError, CacheResult};
use super::scope::ScopeAccessor;
use super::store::MemoryStore;
use super::traits::Cache;
use super::CacheManager;

/// Backend variants a channel can be built on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// Process-wide singleton cache.
    Static,
    /// Cache bound to the current request scope.
    Request,
    /// Caching disabled.
    Null,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [Self::Static, Self::Request, Self::Null];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Request => "request",
            Self::Null => "null",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BackendKind {
    type Err = CacheError;

    // Names come from the serde derive, same as for deserialized config.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Self::deserialize(normalized.as_str().into_deserializer()).map_err(|err: ValueError| {
            CacheError::InvalidArgument {
                name: "backend",
                reason: err.to_string(),
            }
        })
    }
}

/// Produces a backend for each [`BackendKind`].
///
/// The build function runs outside any registry lock, so it may call back
/// into the [`CacheChannels`] it is registered with.
#[derive(Clone)]
pub struct BackendFactory {
    build: Arc<dyn Fn(BackendKind) -> Arc<dyn Cache> + Send + Sync>,
}

impl BackendFactory {
    /// Wrap a custom build function.
    pub fn new<F>(build: F) -> Self
    where
        F: Fn(BackendKind) -> Arc<dyn Cache> + Send + Sync + 'static,
    {
        Self {
            build: Arc::new(build),
        }
    }

    /// The built-in wiring: `static` over `store`, `request` over `scopes`,
    /// `null` over nothing.
    pub fn standard(store: MemoryStore, scopes: Arc<dyn ScopeAccessor>) -> Self {
        Self::new(move |kind| -> Arc<dyn Cache> {
            match kind {
                BackendKind::Static => Arc::new(SingletonCache::new(store.clone())),
                BackendKind::Request => Arc::new(ScopedCache::new(Arc::clone(&scopes))),
                BackendKind::Null => Arc::new(NullCache),
            }
        })
    }

    /// Every kind resolves to the null backend.
    pub fn disabled() -> Self {
        Self::new(|_| -> Arc<dyn Cache> { Arc::new(NullCache) })
    }

    /// Build a backend of the given kind.
    pub fn create(&self, kind: BackendKind) -> Arc<dyn Cache> {
        (self.build)(kind)
    }
}

impl fmt::Debug for BackendFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendFactory").finish_non_exhaustive()
    }
}

/// A registered channel.
struct Channel {
    kind: BackendKind,
    manager: Arc<CacheManager>,
}

/// Registry of named cache managers ("channels").
///
/// Each channel wraps one backend built by the registry's
/// [`BackendFactory`]. Callers pick a channel by the visibility and lifetime
/// they need, e.g. `static` for process-wide data and `request` for data that
/// must not outlive the current operation.
///
/// ## Example
///
/// ```rust
/// use std::sync::Arc;
/// use scopecache::cache::{BackendFactory, BackendKind, CacheChannels, MemoryStore, ScopeSlot};
///
/// let slot = ScopeSlot::new();
/// let channels = CacheChannels::new(BackendFactory::standard(
///     MemoryStore::default(),
///     Arc::new(slot.clone()),
/// ));
///
/// let statics = channels.get_or_create("static", BackendKind::Static).unwrap();
/// statics.set("motd", "hello".to_string(), None).unwrap();
///
/// // Later, retrieve the same channel
/// let statics = channels.get("static").unwrap();
/// assert!(statics.contains("motd"));
/// ```
#[derive(Clone)]
pub struct CacheChannels {
    factory: BackendFactory,
    channels: Arc<DashMap<String, Channel>>,
}

impl CacheChannels {
    /// Create an empty registry.
    pub fn new(factory: BackendFactory) -> Self {
        info!("Cache channel registry initialized");
        Self {
            factory,
            channels: Arc::new(DashMap::new()),
        }
    }

    /// Create a registry with one channel per backend kind, named after the
    /// kind (`static`, `request`, `null`).
    pub fn with_defaults(factory: BackendFactory) -> Self {
        let registry = Self::new(factory);
        for kind in BackendKind::ALL {
            registry.register(kind.as_str(), kind);
        }
        registry
    }

    /// Get an existing channel or create a new one.
    ///
    /// Fails if `name` is blank, or if the channel exists over a different
    /// backend kind. When two callers race to create the same channel, both
    /// may build a backend but only the first one inserted is kept.
    pub fn get_or_create(&self, name: &str, kind: BackendKind) -> CacheResult<Arc<CacheManager>> {
        if name.trim().is_empty() {
            return Err(CacheError::InvalidArgument {
                name: "channel",
                reason: "must not be empty or whitespace".to_string(),
            });
        }

        if let Some(existing) = self.lookup(name, kind) {
            return existing;
        }

        // Built before taking the entry lock: the factory is user code.
        let manager = Arc::new(CacheManager::new(self.factory.create(kind)));

        match self.channels.entry(name.to_string()) {
            Entry::Occupied(entry) => Self::existing(name, entry.get(), kind),
            Entry::Vacant(entry) => {
                debug!(
                    channel = name,
                    kind = %kind,
                    backend = manager.backend_name(),
                    "Creating cache channel"
                );
                entry.insert(Channel {
                    kind,
                    manager: Arc::clone(&manager),
                });
                Ok(manager)
            }
        }
    }

    fn lookup(&self, name: &str, kind: BackendKind) -> Option<CacheResult<Arc<CacheManager>>> {
        let channel = self.channels.get(name)?;
        Some(Self::existing(name, &channel, kind))
    }

    fn existing(name: &str, channel: &Channel, kind: BackendKind) -> CacheResult<Arc<CacheManager>> {
        if channel.kind == kind {
            return Ok(Arc::clone(&channel.manager));
        }
        Err(CacheError::ChannelConflict {
            channel: name.to_string(),
            existing: channel.kind,
            requested: kind,
        })
    }

    fn register(&self, name: &str, kind: BackendKind) {
        let manager = Arc::new(CacheManager::new(self.factory.create(kind)));
        self.channels.insert(name.to_string(), Channel { kind, manager });
    }

    /// Get the channel named after `kind`, creating it if needed.
    pub fn for_kind(&self, kind: BackendKind) -> CacheResult<Arc<CacheManager>> {
        self.get_or_create(kind.as_str(), kind)
    }

    /// Get an existing channel by name.
    pub fn get(&self, name: &str) -> Option<Arc<CacheManager>> {
        self.channels
            .get(name)
            .map(|channel| Arc::clone(&channel.manager))
    }

    /// Backend kind of a channel.
    pub fn kind_of(&self, name: &str) -> Option<BackendKind> {
        self.channels.get(name).map(|channel| channel.kind)
    }

    /// Check if a channel with the given name exists.
    pub fn contains(&self, name: &str) -> bool {
        self.channels.contains_key(name)
    }

    /// Remove a channel from the registry.
    ///
    /// Returns `true` if the channel was removed. Managers already handed
    /// out keep working.
    pub fn remove(&self, name: &str) -> bool {
        let removed = self.channels.remove(name).is_some();
        if removed {
            debug!(channel = name, "Removed cache channel");
        }
        removed
    }

    /// Get the number of registered channels.
    pub fn len(&self) -> usize {
        self.channels.len()
    }

    /// Check if the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }

    /// Get a sorted list of all channel names.
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.channels.iter().map(|c| c.key().clone()).collect();
        names.sort();
        names
    }
}

impl fmt::Debug for CacheChannels {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheChannels")
            .field("channel_count", &self.len())
            .field("channel_names", &self.names())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::scope::ScopeSlot;
    use once_cell::sync::OnceCell;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::thread;
    use std::time::Duration;

    fn standard(slot: &ScopeSlot) -> BackendFactory {
        BackendFactory::standard(MemoryStore::default(), Arc::new(slot.clone()))
    }

    #[test]
    fn test_backend_kind_parsing() {
        assert_eq!("static".parse::<BackendKind>().unwrap(), BackendKind::Static);
        assert_eq!(" Request ".parse::<BackendKind>().unwrap(), BackendKind::Request);
        assert_eq!("null".parse::<BackendKind>().unwrap(), BackendKind::Null);
        assert!("redis".parse::<BackendKind>().is_err());
        assert_eq!(BackendKind::Request.to_string(), "request");
    }

    #[test]
    fn test_backend_kind_deserializes_lowercase() {
        let kind: Result<BackendKind, ValueError> =
            BackendKind::deserialize("request".into_deserializer());
        assert_eq!(kind.unwrap(), BackendKind::Request);

        let err = "Redis".parse::<BackendKind>().unwrap_err();
        assert!(matches!(err, CacheError::InvalidArgument { name: "backend", .. }));
        assert!(err.to_string().contains("redis"));

        for kind in BackendKind::ALL {
            assert_eq!(kind.as_str().parse::<BackendKind>().unwrap(), kind);
        }
    }

    #[test]
    fn test_standard_factory_wiring() {
        let factory = standard(&ScopeSlot::new());

        assert_eq!(factory.create(BackendKind::Static).name(), "singleton");
        assert_eq!(factory.create(BackendKind::Request).name(), "scoped");
        assert_eq!(factory.create(BackendKind::Null).name(), "null");
    }

    #[test]
    fn test_disabled_factory_is_all_null() {
        let factory = BackendFactory::disabled();
        for kind in BackendKind::ALL {
            assert_eq!(factory.create(kind).name(), "null");
        }
    }

    #[test]
    fn test_default_channels() {
        let channels = CacheChannels::with_defaults(standard(&ScopeSlot::new()));

        assert_eq!(channels.names(), vec!["null", "request", "static"]);
        assert!(channels.get("static").unwrap().is_shared());
        assert_eq!(channels.get("request").unwrap().backend_name(), "scoped");
        assert_eq!(channels.kind_of("null"), Some(BackendKind::Null));
    }

    #[test]
    fn test_get_or_create_returns_same_manager() {
        let channels = CacheChannels::new(standard(&ScopeSlot::new()));

        let first = channels.get_or_create("pages", BackendKind::Static).unwrap();
        first.set("home", 1u32, None).unwrap();

        let second = channels.get_or_create("pages", BackendKind::Static).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(second.contains("home"));
    }

    #[test]
    fn test_kind_conflict_is_rejected() {
        let channels = CacheChannels::new(standard(&ScopeSlot::new()));
        channels.get_or_create("pages", BackendKind::Static).unwrap();

        assert!(matches!(
            channels.get_or_create("pages", BackendKind::Request),
            Err(CacheError::ChannelConflict { .. })
        ));
        assert!(channels.get_or_create(" ", BackendKind::Null).is_err());
    }

    #[test]
    fn test_factory_may_call_back_into_registry() {
        let handle: Arc<OnceCell<CacheChannels>> = Arc::new(OnceCell::new());
        let seen = Arc::new(AtomicUsize::new(0));

        let factory = {
            let handle = Arc::clone(&handle);
            let seen = Arc::clone(&seen);
            BackendFactory::new(move |kind| -> Arc<dyn Cache> {
                if let Some(channels) = handle.get() {
                    // Same key and same shard as the channel being created.
                    assert!(!channels.contains("pages"));
                    assert!(channels.get("pages").is_none());
                    seen.store(channels.len(), Ordering::SeqCst);
                }
                BackendFactory::disabled().create(kind)
            })
        };

        let channels = CacheChannels::new(factory);
        handle.set(channels.clone()).unwrap();

        let (tx, rx) = mpsc::channel();
        let creator = channels.clone();
        thread::spawn(move || {
            let created = creator.get_or_create("pages", BackendKind::Static).is_ok();
            tx.send(created).ok();
        });

        assert_eq!(rx.recv_timeout(Duration::from_secs(5)), Ok(true));
        assert_eq!(seen.load(Ordering::SeqCst), 0);
        assert!(channels.contains("pages"));
    }

    #[test]
    fn test_static_channels_share_the_store() {
        let channels = CacheChannels::new(standard(&ScopeSlot::new()));
        let a = channels.get_or_create("a", BackendKind::Static).unwrap();
        let b = channels.get_or_create("b", BackendKind::Static).unwrap();

        a.set("k", 1u32, None).unwrap();
        assert!(b.contains("k"));
    }

    #[test]
    fn test_remove_channel() {
        let channels = CacheChannels::with_defaults(BackendFactory::disabled());
        assert_eq!(channels.len(), 3);

        assert!(channels.remove("null"));
        assert!(!channels.remove("null"));
        assert!(!channels.contains("null"));
        assert_eq!(channels.len(), 2);

        let recreated = channels.for_kind(BackendKind::Null).unwrap();
        assert_eq!(recreated.backend_name(), "null");
    }
}
