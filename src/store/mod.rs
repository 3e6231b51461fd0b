//! Store Facade Module
//!
//! The public entry point callers use. A [`Store`] wraps an engine and its
//! expiry reaper, applies a namespace to every key, and defines the error
//! behavior of each operation.
//!
//! ```text
//!   Store("app:", isolate=false) ──┐
//!   Store("app:", isolate=false) ──┼──▶ registry["app:"] ──▶ Shared { engine, reaper }
//!   Store("",     isolate=false) ─────▶ registry[""]     ──▶ Shared { engine, reaper }
//!   Store("",     isolate=true)  ─────────────────────────▶ Shared { engine, reaper }
//! ```
//!
//! Shared instances live in a process-wide registry until exit. Private
//! instances go away, reaper included, when the last handle is dropped.

pub mod client;
pub mod config;
pub mod registry;

pub use client::Store;
pub use config::StoreOptions;

use crate::error::Result;
use crate::storage::{ExpiryReaper, StorageEngine};
use std::sync::Arc;

/// An engine together with the reaper that sweeps it.
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) engine: Arc<StorageEngine>,
    _reaper: ExpiryReaper,
}

impl Shared {
    pub(crate) fn create(options: &StoreOptions) -> Result<Arc<Self>> {
        let engine = Arc::new(StorageEngine::with_shards(options.shards));
        let reaper = ExpiryReaper::spawn_dedicated(Arc::clone(&engine), options.expiry.clone())?;

        Ok(Arc::new(Self {
            engine,
            _reaper: reaper,
        }))
    }
}
