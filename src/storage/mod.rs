//! Storage Engine Module
//!
//! This module provides the core storage functionality for EmberKV.
//! It includes a thread-safe, sharded key table with TTL support, an
//! ordered prefix index, and a background expiry reaper.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                     StorageEngine                           │
//! │  ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐           │
//! │  │ Shard 0 │ │ Shard 1 │ │ Shard 2 │ │...64    │           │
//! │  │ RwLock  │ │ RwLock  │ │ RwLock  │ │ shards  │           │
//! │  └─────────┘ └─────────┘ └─────────┘ └─────────┘           │
//! │                  PrefixIndex (ordered keys)                 │
//! └─────────────────────────────────────────────────────────────┘
//!                            ▲
//!                            │
//!              ┌─────────────┴─────────────┐
//!              │      ExpiryReaper         │
//!              │  (Background Tokio Task)  │
//!              └───────────────────────────┘
//! ```
//!
//! ## Features
//!
//! - **Sharded Storage**: 64 independent shards reduce lock contention
//! - **RwLock**: Multiple concurrent readers, exclusive writers
//! - **TTL Support**: Keys can have time-to-live expiry
//! - **Lazy Expiry**: Expired keys are invisible and cleaned on access
//! - **Active Expiry**: Background reaper cleans orphaned expired keys
//! - **Prefix Scans**: Ordered snapshots of every live key under a prefix
//!
//! ## Example
//!
//! ```
//! use emberkv::storage::StorageEngine;
//! use bytes::Bytes;
//! use std::time::Duration;
//!
//! let engine = StorageEngine::new();
//!
//! engine.set(Bytes::from("user:1"), Bytes::from("Ariz")).unwrap();
//! engine
//!     .set_with_ttl(Bytes::from("user:2"), Bytes::from("token123"), Duration::from_secs(3600))
//!     .unwrap();
//!
//! let users = engine.view_prefix(b"user:");
//! assert_eq!(users.len(), 2);
//! ```

pub mod engine;
pub mod expiry;
pub mod index;
pub mod view;

// Re-export commonly used types
pub use engine::{Entry, StorageEngine, StorageStats, NUM_SHARDS};
pub use expiry::{ExpiryConfig, ExpiryReaper, MIN_SWEEP_INTERVAL};
pub use index::PrefixIndex;
pub use view::PrefixView;
