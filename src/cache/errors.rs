//! Cache error types.

use thiserror::Error;

use super::registry::BackendKind;

/// Errors raised by the cache manager.
///
/// Backend failures never show up here: an unavailable storage medium
/// degrades to a miss or a no-op instead.
#[derive(Debug, Error)]
pub enum CacheError {
    /// A key or pattern argument was empty or whitespace-only.
    #[error("Invalid argument `{name}`: {reason}")]
    InvalidArgument { name: &'static str, reason: String },

    /// The pattern passed to `remove_by_pattern` is not a valid regex.
    #[error("Invalid key pattern `{pattern}`: {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A channel name is already taken by another backend kind.
    #[error("Cache channel `{channel}` already uses the {existing} backend, not {requested}")]
    ChannelConflict {
        channel: String,
        existing: BackendKind,
        requested: BackendKind,
    },

    /// A typed read found a value of another type under the key.
    #[error("Cached value for `{key}` is not a {expected}")]
    TypeMismatch { key: String, expected: &'static str },
}

/// Result type for cache operations
pub type CacheResult<T> = Result<T, CacheError>;

/// Reject keys that are empty or whitespace-only.
pub(crate) fn ensure_key(key: &str) -> CacheResult<()> {
    ensure_not_blank("key", key)
}

/// Reject patterns that are empty or whitespace-only.
pub(crate) fn ensure_pattern(pattern: &str) -> CacheResult<()> {
    ensure_not_blank("pattern", pattern)
}

fn ensure_not_blank(name: &'static str, value: &str) -> CacheResult<()> {
    if value.trim().is_empty() {
        return Err(CacheError::InvalidArgument {
            name,
            reason: "must not be empty or whitespace".to_string(),
        });
    }
    Ok(())
}
