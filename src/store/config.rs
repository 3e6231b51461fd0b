//! Store Configuration

use crate::storage::{ExpiryConfig, NUM_SHARDS};
use std::time::Duration;

/// Options accepted by [`Store::open`](crate::Store::open).
#[derive(Debug, Clone)]
pub struct StoreOptions {
    /// Prefix transparently applied to every key issued through the store.
    /// For shared stores it is also the name the instance is registered under.
    pub namespace: String,

    /// `true` creates a private engine; `false` attaches to (or creates) the
    /// process-wide instance registered under `namespace`.
    pub isolate: bool,

    /// Number of engine shards (ignored when attaching to an existing instance)
    pub shards: usize,

    /// Reaper tuning (ignored when attaching to an existing instance)
    pub expiry: ExpiryConfig,
}

impl Default for StoreOptions {
    fn default() -> Self {
        Self {
            namespace: String::new(),
            isolate: false,
            shards: NUM_SHARDS,
            expiry: ExpiryConfig::default(),
        }
    }
}

impl StoreOptions {
    /// Options for the given namespace, shared by default.
    pub fn new(namespace: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            ..Default::default()
        }
    }

    /// Selects a private (`true`) or shared (`false`) instance.
    pub fn isolated(mut self, isolate: bool) -> Self {
        self.isolate = isolate;
        self
    }

    /// Sets the shard count.
    pub fn with_shards(mut self, shards: usize) -> Self {
        self.shards = shards;
        self
    }

    /// Sets the reaper's base sweep interval.
    pub fn with_sweep_interval(mut self, interval: Duration) -> Self {
        self.expiry = self.expiry.with_interval(interval);
        self
    }

    /// Replaces the whole reaper configuration.
    pub fn with_expiry(mut self, expiry: ExpiryConfig) -> Self {
        self.expiry = expiry;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let options = StoreOptions::default();
        assert!(options.namespace.is_empty());
        assert!(!options.isolate);
        assert_eq!(options.shards, NUM_SHARDS);
    }

    #[test]
    fn test_builder() {
        let options = StoreOptions::new("jobs:")
            .isolated(true)
            .with_shards(8)
            .with_sweep_interval(Duration::from_millis(250));

        assert_eq!(options.namespace, "jobs:");
        assert!(options.isolate);
        assert_eq!(options.shards, 8);
        assert_eq!(options.expiry.base_interval, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_sweep_interval_is_raised() {
        let options = StoreOptions::default().with_sweep_interval(Duration::ZERO);
        assert!(options.expiry.base_interval > Duration::ZERO);
        assert!(options.expiry.min_interval > Duration::ZERO);
    }
}
