//! scopecache - pluggable caching layer.
//!
//! ## Architecture
//!
//! - `cache` - Backends (singleton, scoped, null), the locking cache manager
//!   and the channel registry
//! - `config` - Environment configuration
//!
//! Managers over the process-wide store lock; managers over request scopes
//! don't. See [`cache::CacheManager`] for the compute-if-absent contract.

pub mod cache;
pub mod config;
