//! Cache module - pluggable backends behind a locking manager.
//!
//! ## Architecture
//!
//! ```text
//! CacheChannels (registry)           <- named managers, built per BackendKind
//!   └── CacheManager                 <- locking, compute-if-absent, pattern removal
//!         └── dyn Cache (backend)    <- namespaced storage
//!               ├── SingletonCache   <- process-wide MemoryStore (Moka), shared
//!               ├── ScopedCache      <- current RequestScope, not shared
//!               └── NullCache        <- always miss
//! ```
//!
//! - The manager only locks when its backend reports `is_shared()`.
//!   Scoped and null backends get no-op lock scopes.
//! - Backends never fail. No active scope, or the null backend, reads as a
//!   miss and drops writes.
//! - `None` values are never cached.
//!
//! ## Usage
//!
//! ```rust
//! use std::sync::Arc;
//! use scopecache::cache::{BackendFactory, BackendKind, CacheChannels, MemoryStore, ScopeSlot};
//!
//! let slot = ScopeSlot::new();
//! let channels = CacheChannels::with_defaults(BackendFactory::standard(
//!     MemoryStore::default(),
//!     Arc::new(slot.clone()),
//! ));
//!
//! let request = channels.for_kind(BackendKind::Request).unwrap();
//! let _scope = slot.enter();
//! let user = request
//!     .get_or_insert_with("user:42", None, || "alice".to_string())
//!     .unwrap();
//! assert_eq!(user.as_str(), "alice");
//! ```

pub mod backends;
mod config;
mod errors;
mod lock;
mod manager;
mod namespace;
mod registry;
mod scope;
mod store;
mod traits;

pub use backends::{NullCache, ScopedCache, SingletonCache};
pub use config::StoreConfig;
pub use errors::{CacheError, CacheResult};
pub use lock::WriteScope;
pub use manager::CacheManager;
pub use namespace::Namespace;
pub use registry::{BackendFactory, BackendKind, CacheChannels};
pub use scope::{RequestScope, ScopeAccessor, ScopeGuard, ScopeSlot};
pub use store::MemoryStore;
pub use traits::{Cache, CacheValue, Entries};
