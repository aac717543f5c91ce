//! Memory store configuration.

/// Configuration for a [`MemoryStore`](super::MemoryStore).
#[derive(Debug, Clone, Default)]
pub struct StoreConfig {
    /// Maximum number of entries in the store.
    /// `None` leaves the store unbounded; entries then only leave through
    /// expiration or explicit removal.
    pub max_capacity: Option<u64>,

    /// Number of entries to pre-allocate room for.
    pub initial_capacity: Option<usize>,
}

impl StoreConfig {
    /// Create a store config with the given max capacity.
    pub fn with_capacity(max_capacity: u64) -> Self {
        Self {
            max_capacity: Some(max_capacity),
            ..Default::default()
        }
    }

    /// Set max capacity for the store (builder pattern).
    #[must_use]
    pub fn max_capacity(mut self, max_capacity: u64) -> Self {
        self.max_capacity = Some(max_capacity);
        self
    }

    /// Pre-allocate room for `capacity` entries.
    #[must_use]
    pub fn initial_capacity(mut self, capacity: usize) -> Self {
        self.initial_capacity = Some(capacity);
        self
    }

    /// Remove the capacity bound.
    #[must_use]
    pub fn unbounded(mut self) -> Self {
        self.max_capacity = None;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_unbounded() {
        let config = StoreConfig::default();
        assert_eq!(config.max_capacity, None);
        assert_eq!(config.initial_capacity, None);
    }

    #[test]
    fn test_builder_chain() {
        let config = StoreConfig::with_capacity(100).initial_capacity(16);
        assert_eq!(config.max_capacity, Some(100));
        assert_eq!(config.initial_capacity, Some(16));

        assert_eq!(config.unbounded().max_capacity, None);
    }
}
