//! Ordered Prefix Index
//!
//! The entry table is a set of hash maps, which are great for point lookups
//! but useless for "every key starting with `user:`". The prefix index keeps
//! an ordered copy of the key space so a prefix scan becomes a range walk:
//!
//! ```text
//!   BTreeSet<Bytes>
//!   ┌───────────┬───────────┬───────────┬───────────┬──────────┐
//!   │ hello_1   │ hello_2   │ ttl_1     │ ttl_2     │ user:9   │
//!   └───────────┴───────────┴───────────┴───────────┴──────────┘
//!         ▲ range("ttl"..) ────────────▶ stop at first key
//!                                         not starting with "ttl"
//! ```
//!
//! The index only stores keys. Values and expiry live in the entry table,
//! and the engine updates both inside the same shard critical section, so a
//! key is in the index exactly when it is physically present in a shard.
//!
//! Lock order is always shard lock first, index lock second. Scans take the
//! index lock alone and release it before touching any shard.

use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::BTreeSet;
use std::ops::Bound;

/// Ordered set of every physically present key.
#[derive(Debug, Default)]
pub struct PrefixIndex {
    keys: RwLock<BTreeSet<Bytes>>,
}

impl PrefixIndex {
    /// Creates an empty index.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a key. Returns `false` if it was already indexed.
    pub fn insert(&self, key: Bytes) -> bool {
        self.keys.write().insert(key)
    }

    /// Removes a key. Returns `false` if it was not indexed.
    pub fn remove(&self, key: &[u8]) -> bool {
        self.keys.write().remove(key)
    }

    /// Returns true if the key is indexed.
    pub fn contains(&self, key: &[u8]) -> bool {
        self.keys.read().contains(key)
    }

    /// Returns every indexed key starting with `prefix`, in ascending order.
    ///
    /// An empty prefix returns the whole key space.
    pub fn keys_with_prefix(&self, prefix: &[u8]) -> Vec<Bytes> {
        let keys = self.keys.read();
        keys.range::<[u8], _>((Bound::Included(prefix), Bound::Unbounded))
            .take_while(|key| key.starts_with(prefix))
            .cloned()
            .collect()
    }

    /// Number of indexed keys.
    pub fn len(&self) -> usize {
        self.keys.read().len()
    }

    /// Returns true if nothing is indexed.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops every key.
    pub fn clear(&self) {
        self.keys.write().clear();
    }
}
