//! The public store handle.

use crate::error::{Result, StoreError};
use crate::storage::{PrefixView, StorageEngine, StorageStats};
use crate::store::config::StoreOptions;
use crate::store::{registry, Shared};
use bytes::{Bytes, BytesMut};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// A handle to a key-value store.
///
/// `Store` is cheap to clone and safe to share across threads; every clone
/// talks to the same engine. All keys passed in are prefixed with the
/// handle's namespace, and keys handed back by [`view_prefix`](Self::view_prefix)
/// have it stripped again, so callers never see it.
///
/// # Example
///
/// ```
/// use emberkv::Store;
///
/// let store = Store::isolated().unwrap();
///
/// store.set("hello_1", "world").unwrap();
/// assert_eq!(store.get("hello_1").unwrap(), "world");
///
/// store.delete("hello_1").unwrap();
/// assert!(store.get("hello_1").unwrap_err().is_not_found());
///
/// store.set_with_ttl("ttl_1", "ttl_1", 5).unwrap();
/// assert_eq!(store.view_prefix("ttl").len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct Store {
    shared: Arc<Shared>,
    namespace: Arc<str>,
}

impl Store {
    /// Opens a store for `namespace`.
    ///
    /// With `isolate = true` a private store is created. Otherwise the
    /// handle attaches to the process-wide store registered under
    /// `namespace`, creating it on first use; `""` names the default one.
    /// Shared handles with different namespaces get different engines.
    pub fn new(namespace: impl Into<String>, isolate: bool) -> Result<Self> {
        Self::open(StoreOptions::new(namespace).isolated(isolate))
    }

    /// Opens a private store with no namespace.
    pub fn isolated() -> Result<Self> {
        Self::open(StoreOptions::default().isolated(true))
    }

    /// Opens a store with explicit options.
    pub fn open(options: StoreOptions) -> Result<Self> {
        let shared = if options.isolate {
            Shared::create(&options)?
        } else {
            registry::attach(&options)?
        };

        Ok(Self {
            shared,
            namespace: Arc::from(options.namespace),
        })
    }

    /// The namespace applied to this handle's keys.
    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    /// The underlying engine.
    pub fn engine(&self) -> &StorageEngine {
        &self.shared.engine
    }

    fn owned_key(&self, key: &[u8]) -> Bytes {
        let mut buf = BytesMut::with_capacity(self.namespace.len() + key.len());
        buf.extend_from_slice(self.namespace.as_bytes());
        buf.extend_from_slice(key);
        buf.freeze()
    }

    /// Runs `f` on the namespaced form of `key`, without allocating when
    /// there is no namespace.
    fn with_key<R>(&self, key: &[u8], f: impl FnOnce(&[u8]) -> R) -> R {
        if self.namespace.is_empty() {
            f(key)
        } else {
            f(&self.owned_key(key))
        }
    }

    /// Sets `key` to `value` with no expiry, clearing any TTL the key had.
    pub fn set(&self, key: impl AsRef<[u8]>, value: impl Into<Bytes>) -> Result<()> {
        let key = self.owned_key(key.as_ref());
        self.shared.engine.set(key, value.into())?;
        Ok(())
    }

    /// Sets `key` to `value`, expiring `ttl_seconds` from now.
    ///
    /// A zero or negative TTL, or one too large to turn into a deadline,
    /// fails with [`StoreError::InvalidArgument`] and leaves the store
    /// untouched.
    pub fn set_with_ttl(
        &self,
        key: impl AsRef<[u8]>,
        value: impl Into<Bytes>,
        ttl_seconds: i64,
    ) -> Result<()> {
        if ttl_seconds <= 0 {
            debug!(ttl_seconds, "Rejected non-positive ttl");
            return Err(StoreError::InvalidArgument(format!(
                "ttl must be a positive number of seconds, got {ttl_seconds}"
            )));
        }

        let key = self.owned_key(key.as_ref());
        let ttl = Duration::from_secs(ttl_seconds.unsigned_abs());
        self.shared.engine.set_with_ttl(key, value.into(), ttl)?;
        Ok(())
    }

    /// Returns the value of `key`.
    ///
    /// Fails with [`StoreError::NotFound`] when the key is absent or its TTL
    /// has elapsed, even if the reaper has not removed it yet.
    pub fn get(&self, key: impl AsRef<[u8]>) -> Result<Bytes> {
        let key = key.as_ref();
        self.with_key(key, |full| self.shared.engine.get(full))
            .map_err(|e| match e {
                StoreError::NotFound { .. } => StoreError::not_found(key),
                other => other,
            })
    }

    /// Returns true if `key` is present and not expired.
    pub fn exists(&self, key: impl AsRef<[u8]>) -> bool {
        self.with_key(key.as_ref(), |full| self.shared.engine.exists(full))
    }

    /// Removes `key`. Removing an absent key succeeds.
    pub fn delete(&self, key: impl AsRef<[u8]>) -> Result<()> {
        let removed = self.with_key(key.as_ref(), |full| self.shared.engine.delete(full))?;
        trace!(removed, "Delete");
        Ok(())
    }

    /// Returns a snapshot of every live key in this namespace starting with
    /// `prefix`, namespace stripped. An empty prefix returns everything.
    pub fn view_prefix(&self, prefix: impl AsRef<[u8]>) -> PrefixView {
        let view = self.with_key(prefix.as_ref(), |full| self.shared.engine.view_prefix(full));

        let strip = self.namespace.len();
        if strip == 0 {
            view
        } else {
            view.map_keys(|key| key.slice(strip..))
        }
    }

    /// Number of live keys in this namespace.
    pub fn len(&self) -> usize {
        self.shared.engine.count_prefix(self.namespace.as_bytes())
    }

    /// Returns true if this namespace holds no live keys.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Deletes every key in this namespace, returning how many live keys went.
    pub fn clear(&self) -> Result<usize> {
        let removed = self.shared.engine.delete_prefix(self.namespace.as_bytes())?;
        debug!(namespace = %self.namespace, removed, "Cleared namespace");
        Ok(removed)
    }

    /// Engine-wide operation counters.
    pub fn stats(&self) -> StorageStats {
        self.shared.engine.stats()
    }
}
