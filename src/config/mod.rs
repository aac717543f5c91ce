//! Configuration module for scopecache.
//!
//! Loads configuration from environment variables.

use std::env;
use std::sync::Arc;

use tracing::warn;

use crate::cache::{BackendFactory, BackendKind, MemoryStore, ScopeAccessor, StoreConfig};

/// Cache configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheSettings {
    /// When `false`, every channel is built on the null backend.
    pub enabled: bool,

    /// Maximum entries of the singleton store. `None` = unbounded.
    pub store_capacity: Option<u64>,

    /// Backend kind used when a caller doesn't name one.
    pub default_channel: BackendKind,
}

impl Default for CacheSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            store_capacity: None,
            default_channel: BackendKind::Static,
        }
    }
}

impl CacheSettings {
    /// Load configuration from environment variables.
    ///
    /// Malformed values are logged and replaced by their defaults.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let enabled = lookup("CACHE_ENABLED")
            .map(|raw| match raw.trim().to_lowercase().as_str() {
                "true" | "1" | "on" | "yes" => true,
                "false" | "0" | "off" | "no" => false,
                other => {
                    warn!(value = other, "Invalid CACHE_ENABLED, caching stays enabled");
                    defaults.enabled
                }
            })
            .unwrap_or(defaults.enabled);

        let store_capacity = lookup("CACHE_STORE_CAPACITY")
            .filter(|raw| !raw.trim().is_empty())
            .and_then(|raw| match raw.trim().parse::<u64>() {
                Ok(capacity) => Some(capacity),
                Err(_) => {
                    warn!(value = %raw, "Invalid CACHE_STORE_CAPACITY, store stays unbounded");
                    None
                }
            });

        let default_channel = lookup("CACHE_DEFAULT_CHANNEL")
            .map(|raw| {
                raw.parse::<BackendKind>().unwrap_or_else(|_| {
                    warn!(value = %raw, "Invalid CACHE_DEFAULT_CHANNEL, using static");
                    defaults.default_channel
                })
            })
            .unwrap_or(defaults.default_channel);

        Self {
            enabled,
            store_capacity,
            default_channel,
        }
    }

    /// Config for the singleton memory store.
    pub fn store_config(&self) -> StoreConfig {
        match self.store_capacity {
            Some(capacity) => StoreConfig::with_capacity(capacity),
            None => StoreConfig::default(),
        }
    }

    /// Backend factory matching these settings.
    ///
    /// Disabled settings resolve every kind to the null backend.
    pub fn backend_factory(&self, scopes: Arc<dyn ScopeAccessor>) -> BackendFactory {
        if !self.enabled {
            return BackendFactory::disabled();
        }
        BackendFactory::standard(MemoryStore::new(self.store_config()), scopes)
    }
}
