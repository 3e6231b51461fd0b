//! # EmberKV - An Embeddable Concurrent Key-Value Store
//!
//! EmberKV is an in-process key-value store for programs where many threads
//! (or many simulated users) read and write a shared key space at once.
//! It supports plain keys, keys with a time-to-live, prefix scans, and
//! deletion, with no network hop and no persistence.
//!
//! ## Features
//!
//! - **Linearizable single-key operations**: sharded storage with one RwLock per shard
//! - **TTL Support**: keys can expire; expired keys are never returned
//! - **Prefix Scans**: ordered index answers "every key starting with P"
//! - **Background Reaping**: expired keys are reclaimed even if never read again
//! - **Namespaces**: several logical stores over shared or private engines
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                              EmberKV                                    │
//! │                                                                         │
//! │   caller threads ──▶ ┌──────────────┐     ┌──────────────────┐          │
//! │                      │    Store     │────▶│  Store Registry  │          │
//! │                      │ (namespace)  │     │ (shared by name) │          │
//! │                      └──────┬───────┘     └──────────────────┘          │
//! │                             │                                           │
//! │                             ▼                                           │
//! │   ┌──────────────────────────────────────────────────────────────┐     │
//! │   │                       StorageEngine                          │     │
//! │   │  ┌────────┐ ┌────────┐ ┌────────┐ ┌────────┐                 │     │
//! │   │  │Shard 0 │ │Shard 1 │ │Shard 2 │ │...N    │ ──▶ PrefixIndex │     │
//! │   │  │RwLock  │ │RwLock  │ │RwLock  │ │shards  │     (BTreeSet)  │     │
//! │   │  └────────┘ └────────┘ └────────┘ └────────┘                 │     │
//! │   └──────────────────────────────────────────────────────────────┘     │
//! │                             ▲                                           │
//! │                             │ compare-and-delete                        │
//! │               ┌─────────────┴───────────────────┐                       │
//! │               │          ExpiryReaper           │                       │
//! │               │    (Background Tokio Task)      │                       │
//! │               └─────────────────────────────────┘                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use emberkv::Store;
//!
//! // Attach to the default process-wide store
//! let store = Store::new("", false).unwrap();
//!
//! store.set("hello_1", "world").unwrap();
//! store.set_with_ttl("ttl_1", "ttl_1", 5).unwrap();
//!
//! assert_eq!(store.get("hello_1").unwrap(), "world");
//!
//! for (key, value) in store.view_prefix("hello") {
//!     println!("{:?} => {:?}", key, value);
//! }
//! ```
//!
//! ## Module Overview
//!
//! - [`storage`]: sharded engine, prefix index, and expiry reaper
//! - [`store`]: the public [`Store`] handle, options, and shared registry
//! - [`error`]: the [`StoreError`] taxonomy
//!
//! ## Design Highlights
//!
//! ### Thread Safety
//!
//! The storage engine uses a sharded design with 64 independent RwLocks.
//! Every operation on a key runs under that key's shard lock, so it takes
//! effect at a single instant.
//!
//! ### Lazy + Active Expiry
//!
//! Keys with TTL are expired in two ways:
//! 1. **Lazy**: reads check expiry against the clock and never return an expired value
//! 2. **Active**: a background task periodically reclaims expired keys
//!
//! The background task removes an entry only if it is still the same expired
//! entry it saw, so a key rewritten in the meantime is never lost.

pub mod error;
pub mod storage;
pub mod store;

// Re-export commonly used types for convenience
pub use error::{Result, StoreError};
pub use storage::{ExpiryConfig, ExpiryReaper, PrefixView, StorageEngine, StorageStats};
pub use store::{Store, StoreOptions};

/// Version of EmberKV
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
