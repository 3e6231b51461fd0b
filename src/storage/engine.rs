//! Thread-Safe Storage Engine with Expiry Support
//!
//! This module implements the core storage engine for EmberKV.
//! It provides a concurrent key table with TTL (Time-To-Live) support and an
//! ordered prefix index for range lookups.
//!
//! ## Design Decisions
//!
//! 1. **Sharded Locks**: Instead of one big lock, we use multiple shards to reduce contention.
//! 2. **Lazy Expiry**: Keys are checked for expiry on access (lazy) plus background cleanup.
//! 3. **Generations**: Every write stamps its entry with a fresh generation, so the
//!    reaper can remove "this exact expired entry" and never a replacement.
//! 4. **Single Ordered Index**: Scans walk one `BTreeSet` instead of every shard.
//!
//! ## Concurrency Model
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │ Shard N │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ RwLock  │           │
//! │  │ HashMap │ │ HashMap │ │ HashMap │ │ HashMap │           │
//! │  └────┬────┘ └────┬────┘ └────┬────┘ └────┬────┘           │
//! │       └───────────┴─────┬─────┴───────────┘                │
//! │                         ▼                                   │
//! │              ┌─────────────────────┐                        │
//! │              │ PrefixIndex (BTree) │                        │
//! │              └─────────────────────┘                        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! Keys are distributed across shards using a hash function. A key's shard
//! lock is held for the whole of any operation on that key, including the
//! index update when the key appears or disappears. That makes every
//! single-key operation linearizable and keeps table and index in step.

use crate::error::{Result, StoreError};
use crate::storage::index::PrefixIndex;
use crate::storage::view::PrefixView;
use bytes::Bytes;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::hash::{DefaultHasher, Hash, Hasher};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::error;

/// Number of shards for the storage engine.
/// More shards = less lock contention, but more memory overhead.
/// 64 is a good balance for most workloads.
pub const NUM_SHARDS: usize = 64;

/// Represents a stored value with optional expiry time.
#[derive(Debug, Clone)]
pub struct Entry {
    /// The actual value stored
    pub value: Bytes,
    /// When this entry expires (None = never expires)
    pub expires_at: Option<Instant>,
    /// Stamp of the write that produced this entry
    pub generation: u64,
}

impl Entry {
    /// Returns true if the entry is still visible at `now`.
    #[inline]
    pub fn is_live_at(&self, now: Instant) -> bool {
        self.expires_at.map_or(true, |exp| now < exp)
    }

    /// Checks if this entry has expired.
    #[inline]
    pub fn is_expired(&self) -> bool {
        !self.is_live_at(Instant::now())
    }

    /// Returns the remaining TTL, or None if no expiry.
    pub fn ttl(&self) -> Option<Duration> {
        self.expires_at
            .map(|exp| exp.saturating_duration_since(Instant::now()))
    }
}

/// A single shard containing a portion of the key-value pairs.
#[derive(Debug, Default)]
struct Shard {
    data: RwLock<HashMap<Bytes, Entry>>,
}

/// The main storage engine for EmberKV.
///
/// This struct is designed to be wrapped in an `Arc` and shared across
/// every caller thread. All operations are thread-safe.
///
/// # Example
///
/// ```
/// use emberkv::storage::StorageEngine;
/// use bytes::Bytes;
/// use std::time::Duration;
///
/// let engine = StorageEngine::new();
///
/// engine.set(Bytes::from("name"), Bytes::from("Ariz")).unwrap();
/// assert_eq!(engine.get(b"name").unwrap(), Bytes::from("Ariz"));
///
/// engine
///     .set_with_ttl(Bytes::from("session"), Bytes::from("abc123"), Duration::from_secs(60))
///     .unwrap();
/// assert_eq!(engine.view_prefix(b"").len(), 2);
/// ```
pub struct StorageEngine {
    /// Sharded storage for reduced lock contention
    shards: Vec<Shard>,

    /// Ordered key set for prefix scans
    index: PrefixIndex,

    /// Source of entry generations
    next_generation: AtomicU64,

    /// Statistics: physically present keys (may include unreaped expired ones)
    key_count: AtomicU64,

    /// Statistics: total GET operations
    get_count: AtomicU64,

    /// Statistics: total SET operations
    set_count: AtomicU64,

    /// Statistics: total DEL operations
    del_count: AtomicU64,

    /// Statistics: number of expired keys cleaned up
    expired_count: AtomicU64,
}

impl std::fmt::Debug for StorageEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StorageEngine")
            .field("shards", &self.shards.len())
            .field("key_count", &self.key_count.load(Ordering::Relaxed))
            .field("get_count", &self.get_count.load(Ordering::Relaxed))
            .field("set_count", &self.set_count.load(Ordering::Relaxed))
            .finish()
    }
}

impl Default for StorageEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl StorageEngine {
    /// Creates a new storage engine with default settings.
    pub fn new() -> Self {
        Self::with_shards(NUM_SHARDS)
    }

    /// Creates a storage engine with a custom shard count (at least one).
    pub fn with_shards(shard_count: usize) -> Self {
        let shards = (0..shard_count.max(1)).map(|_| Shard::default()).collect();

        Self {
            shards,
            index: PrefixIndex::new(),
            next_generation: AtomicU64::new(0),
            key_count: AtomicU64::new(0),
            get_count: AtomicU64::new(0),
            set_count: AtomicU64::new(0),
            del_count: AtomicU64::new(0),
            expired_count: AtomicU64::new(0),
        }
    }

    /// Number of shards.
    pub fn shard_count(&self) -> usize {
        self.shards.len()
    }

    /// Determines which shard a key belongs to.
    #[inline]
    fn shard_index(&self, key: &[u8]) -> usize {
        let mut hasher = DefaultHasher::new();
        key.hash(&mut hasher);
        (hasher.finish() as usize) % self.shards.len()
    }

    /// Gets the shard for a given key.
    #[inline]
    fn get_shard(&self, key: &[u8]) -> &Shard {
        &self.shards[self.shard_index(key)]
    }

    fn new_entry(&self, value: Bytes, expires_at: Option<Instant>) -> Entry {
        Entry {
            value,
            expires_at,
            generation: self.next_generation.fetch_add(1, Ordering::Relaxed) + 1,
        }
    }

    /// Removes `key` from the index; the caller holds the key's shard lock
    /// and has just removed it from the shard.
    fn unindex(&self, key: &[u8]) -> Result<()> {
        if self.index.remove(key) {
            return Ok(());
        }
        let key = String::from_utf8_lossy(key);
        error!(key = %key, "key present in table but missing from prefix index");
        Err(StoreError::Corrupted(format!(
            "key {key:?} missing from prefix index"
        )))
    }

    fn insert_entry(&self, key: Bytes, entry: Entry) -> Result<bool> {
        self.set_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(&key);
        let mut data = shard.data.write();

        match data.insert(key.clone(), entry) {
            Some(previous) => {
                if previous.is_expired() {
                    self.expired_count.fetch_add(1, Ordering::Relaxed);
                    return Ok(true);
                }
                Ok(false)
            }
            None => {
                self.key_count.fetch_add(1, Ordering::Relaxed);
                if !self.index.insert(key.clone()) {
                    let key = String::from_utf8_lossy(&key);
                    error!(key = %key, "new key was already in the prefix index");
                    return Err(StoreError::Corrupted(format!(
                        "key {key:?} indexed without a table entry"
                    )));
                }
                Ok(true)
            }
        }
    }

    /// Sets a key-value pair without expiry.
    ///
    /// If the key already exists, its value is overwritten and any TTL it
    /// carried is cleared.
    ///
    /// # Returns
    ///
    /// Returns `true` if a new live key was created, `false` if a live key was updated.
    pub fn set(&self, key: Bytes, value: Bytes) -> Result<bool> {
        let entry = self.new_entry(value, None);
        self.insert_entry(key, entry)
    }

    /// Sets a key-value pair with a TTL (Time-To-Live).
    ///
    /// The key will automatically expire after the specified duration.
    /// A zero TTL, or one too large to represent as a deadline, is rejected
    /// with [`StoreError::InvalidArgument`] and the store is left untouched.
    pub fn set_with_ttl(&self, key: Bytes, value: Bytes, ttl: Duration) -> Result<bool> {
        if ttl.is_zero() {
            return Err(StoreError::InvalidArgument(
                "ttl must be greater than zero".to_string(),
            ));
        }
        let expires_at = Instant::now().checked_add(ttl).ok_or_else(|| {
            StoreError::InvalidArgument(format!("ttl of {}s is too large", ttl.as_secs()))
        })?;
        let entry = self.new_entry(value, Some(expires_at));
        self.insert_entry(key, entry)
    }

    /// Gets the value for a key.
    ///
    /// Fails with [`StoreError::NotFound`] if the key doesn't exist or has
    /// expired. An expired entry found here is reclaimed on the spot.
    pub fn get(&self, key: &[u8]) -> Result<Bytes> {
        self.get_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(key);

        // Fast path under the read lock
        let generation = {
            let data = shard.data.read();
            match data.get(key) {
                None => return Err(StoreError::not_found(key)),
                Some(entry) if !entry.is_expired() => return Ok(entry.value.clone()),
                Some(entry) => entry.generation,
            }
        };

        // Expired: reclaim it unless a writer replaced it in the meantime
        self.remove_if_expired(key, generation)?;
        Err(StoreError::not_found(key))
    }

    /// Gets the full entry for a key (including metadata).
    pub fn get_entry(&self, key: &[u8]) -> Option<Entry> {
        let data = self.get_shard(key).data.read();
        data.get(key).filter(|e| !e.is_expired()).cloned()
    }

    /// Checks if a key exists (and is not expired).
    pub fn exists(&self, key: &[u8]) -> bool {
        let data = self.get_shard(key).data.read();
        data.get(key).map(|e| !e.is_expired()).unwrap_or(false)
    }

    /// Deletes a key from the database.
    ///
    /// Deleting an absent key is a successful no-op.
    ///
    /// # Returns
    ///
    /// Returns `true` if a live key was deleted.
    pub fn delete(&self, key: &[u8]) -> Result<bool> {
        self.del_count.fetch_add(1, Ordering::Relaxed);

        let shard = self.get_shard(key);
        let mut data = shard.data.write();

        match data.remove(key) {
            Some(entry) => {
                self.unindex(key)?;
                self.key_count.fetch_sub(1, Ordering::Relaxed);
                if entry.is_expired() {
                    self.expired_count.fetch_add(1, Ordering::Relaxed);
                    return Ok(false);
                }
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Removes `key` only if it still holds the entry stamped `generation`
    /// and that entry has expired.
    ///
    /// This is the compare-and-delete used by the reaper and by lazy expiry:
    /// an entry that was overwritten after the caller looked at it carries a
    /// new generation and is left alone.
    pub fn remove_if_expired(&self, key: &[u8], generation: u64) -> Result<bool> {
        let shard = self.get_shard(key);
        let mut data = shard.data.write();

        let stale = data
            .get(key)
            .is_some_and(|e| e.generation == generation && e.is_expired());
        if !stale {
            return Ok(false);
        }

        data.remove(key);
        self.unindex(key)?;
        self.key_count.fetch_sub(1, Ordering::Relaxed);
        self.expired_count.fetch_add(1, Ordering::Relaxed);
        Ok(true)
    }

    /// Walks every live key under `prefix`, each read under its shard lock.
    fn scan(&self, prefix: &[u8], mut f: impl FnMut(Bytes, &Entry)) {
        // The index lock is released before any shard lock is taken.
        let keys = self.index.keys_with_prefix(prefix);

        for key in keys {
            let data = self.get_shard(&key).data.read();
            if let Some(entry) = data.get(&key) {
                if entry.is_live_at(Instant::now()) {
                    f(key.clone(), entry);
                }
            }
        }
    }

    /// Returns a snapshot of every live key starting with `prefix`.
    ///
    /// Each key's value is read under its shard lock and checked for expiry
    /// at that moment. Writes racing with the scan may or may not show up.
    pub fn view_prefix(&self, prefix: &[u8]) -> PrefixView {
        let mut pairs = Vec::new();
        self.scan(prefix, |key, entry| pairs.push((key, entry.value.clone())));
        PrefixView::from_sorted(pairs)
    }

    /// Counts the live keys starting with `prefix`.
    pub fn count_prefix(&self, prefix: &[u8]) -> usize {
        let mut count = 0;
        self.scan(prefix, |_, _| count += 1);
        count
    }

    /// Deletes every key starting with `prefix`.
    ///
    /// # Returns
    ///
    /// Returns the number of live keys that were deleted.
    pub fn delete_prefix(&self, prefix: &[u8]) -> Result<usize> {
        let mut deleted = 0;
        for key in self.index.keys_with_prefix(prefix) {
            if self.delete(&key)? {
                deleted += 1;
            }
        }
        Ok(deleted)
    }

    /// Clears all data from the database.
    pub fn flush(&self) {
        let mut guards: Vec<_> = self.shards.iter().map(|s| s.data.write()).collect();
        for data in guards.iter_mut() {
            data.clear();
        }
        self.index.clear();
        self.key_count.store(0, Ordering::Relaxed);
    }

    /// Returns the approximate number of keys in the database.
    ///
    /// This counts physically present entries, so expired keys that have
    /// not been reaped yet are included.
    pub fn len(&self) -> u64 {
        self.key_count.load(Ordering::Relaxed)
    }

    /// Returns true if the database is empty.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Returns database statistics.
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            keys: self.key_count.load(Ordering::Relaxed),
            get_ops: self.get_count.load(Ordering::Relaxed),
            set_ops: self.set_count.load(Ordering::Relaxed),
            del_ops: self.del_count.load(Ordering::Relaxed),
            expired: self.expired_count.load(Ordering::Relaxed),
        }
    }

    /// Cleans up expired keys from all shards.
    ///
    /// This is called by the background expiry reaper. Candidates are
    /// gathered under each shard's read lock and then removed one by one
    /// with [`remove_if_expired`](Self::remove_if_expired), so writers are
    /// never blocked for a whole-shard scan.
    ///
    /// # Returns
    ///
    /// Returns the number of keys that were cleaned up.
    pub fn cleanup_expired(&self) -> Result<u64> {
        let mut cleaned = 0u64;

        for shard in &self.shards {
            let now = Instant::now();
            let candidates: Vec<(Bytes, u64)> = shard
                .data
                .read()
                .iter()
                .filter(|(_, entry)| !entry.is_live_at(now))
                .map(|(key, entry)| (key.clone(), entry.generation))
                .collect();

            for (key, generation) in candidates {
                if self.remove_if_expired(&key, generation)? {
                    cleaned += 1;
                }
            }
        }

        Ok(cleaned)
    }
}

/// Database statistics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StorageStats {
    /// Number of keys currently stored
    pub keys: u64,
    /// Total GET operations
    pub get_ops: u64,
    /// Total SET operations
    pub set_ops: u64,
    /// Total DEL operations
    pub del_ops: u64,
    /// Total expired keys cleaned up
    pub expired: u64,
}
