//! Background Expiry Reaper
//!
//! This module implements a background task that periodically scans the
//! engine for expired keys and removes them. This is "active expiry" as
//! opposed to "lazy expiry" (which happens on access).
//!
//! ## Why Do We Need This?
//!
//! Lazy expiry keeps reads correct, but a key that expires and is never
//! read again would otherwise stay in memory forever. The reaper reclaims
//! those entries. It never affects what readers see: `get` and prefix scans
//! enforce expiry on their own, whatever the sweep cadence.
//!
//! ## Design
//!
//! The reaper runs as a Tokio task and:
//! 1. Sleeps for a configurable interval (default: 100ms)
//! 2. Wakes up and collects expired `(key, generation)` candidates per shard
//! 3. Removes each candidate with compare-and-delete, so an entry that a
//!    writer replaced in the meantime survives
//! 4. Logs statistics about the cleanup
//!
//! ## Adaptive Frequency
//!
//! If many keys are expiring, the reaper will run more frequently.
//! If nothing is expiring, it will back off to save CPU.

use crate::storage::StorageEngine;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, error, info, trace};

/// Shortest interval the reaper will ever sleep between sweeps.
pub const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(1);

/// Configuration for the expiry reaper.
#[derive(Debug, Clone)]
pub struct ExpiryConfig {
    /// Base interval between sweeps (default: 100ms)
    pub base_interval: Duration,

    /// Minimum interval between sweeps (default: 10ms)
    pub min_interval: Duration,

    /// Maximum interval between sweeps (default: 1s)
    pub max_interval: Duration,

    /// If this fraction of scanned keys are expired, speed up sweeping
    pub speedup_threshold: f64,

    /// If this fraction of scanned keys are expired, slow down sweeping
    pub slowdown_threshold: f64,
}

impl Default for ExpiryConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(100),
            min_interval: Duration::from_millis(10),
            max_interval: Duration::from_secs(1),
            speedup_threshold: 0.25,  // Speed up if >25% of keys are expired
            slowdown_threshold: 0.01, // Slow down if <1% of keys are expired
        }
    }
}

impl ExpiryConfig {
    /// Sets the base sweep interval, widening the bounds if needed.
    ///
    /// Intervals below [`MIN_SWEEP_INTERVAL`] are raised to it.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        let interval = interval.max(MIN_SWEEP_INTERVAL);
        self.base_interval = interval;
        self.min_interval = self.min_interval.min(interval);
        self.max_interval = self.max_interval.max(interval);
        self
    }
}

/// A handle to the running expiry reaper.
///
/// When this handle is dropped, the reaper will be stopped.
#[derive(Debug)]
pub struct ExpiryReaper {
    /// Sender to signal shutdown
    shutdown_tx: watch::Sender<bool>,
}

impl ExpiryReaper {
    /// Starts the reaper as a task on the current Tokio runtime.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime. Use
    /// [`spawn_dedicated`](Self::spawn_dedicated) from synchronous code.
    ///
    /// # Example
    ///
    /// ```ignore
    /// use emberkv::storage::{StorageEngine, ExpiryReaper, ExpiryConfig};
    /// use std::sync::Arc;
    ///
    /// let engine = Arc::new(StorageEngine::new());
    /// let reaper = ExpiryReaper::start(engine, ExpiryConfig::default());
    ///
    /// // Reaper runs in the background...
    ///
    /// // Dropping the reaper will stop it
    /// drop(reaper);
    /// ```
    pub fn start(engine: Arc<StorageEngine>, config: ExpiryConfig) -> Self {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        tokio::spawn(reaper_loop(engine, config, shutdown_rx));

        info!("Background expiry reaper started");

        Self { shutdown_tx }
    }

    /// Starts the reaper on its own OS thread driving a current-thread
    /// runtime.
    ///
    /// The reaper then lives exactly as long as the returned handle, no
    /// matter which runtime (if any) the caller happens to be on.
    pub fn spawn_dedicated(
        engine: Arc<StorageEngine>,
        config: ExpiryConfig,
    ) -> std::io::Result<Self> {
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()?;

        std::thread::Builder::new()
            .name("emberkv-reaper".to_string())
            .spawn(move || runtime.block_on(reaper_loop(engine, config, shutdown_rx)))?;

        info!("Dedicated expiry reaper thread started");

        Ok(Self { shutdown_tx })
    }

    /// Stops the expiry reaper.
    ///
    /// This is called automatically when the handle is dropped.
    pub fn stop(&self) {
        if self.shutdown_tx.send(true).is_ok() {
            info!("Background expiry reaper stopped");
        }
    }
}

impl Drop for ExpiryReaper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// The main reaper loop.
async fn reaper_loop(
    engine: Arc<StorageEngine>,
    config: ExpiryConfig,
    mut shutdown_rx: watch::Receiver<bool>,
) {
    // A hand-built config may still carry a zero bound
    let min_interval = config.min_interval.max(MIN_SWEEP_INTERVAL);
    let max_interval = config.max_interval.max(min_interval);
    let mut current_interval = config.base_interval.clamp(min_interval, max_interval);

    loop {
        // Wait for the interval or shutdown signal
        tokio::select! {
            _ = tokio::time::sleep(current_interval) => {}
            result = shutdown_rx.changed() => {
                if result.is_err() || *shutdown_rx.borrow() {
                    debug!("Expiry reaper received shutdown signal");
                    return;
                }
            }
        }

        // Get current key count before cleanup
        let keys_before = engine.len();

        let expired = match engine.cleanup_expired() {
            Ok(expired) => expired,
            Err(e) => {
                error!(error = %e, "Expiry sweep aborted, stopping reaper");
                return;
            }
        };

        // Adjust interval based on expiry rate
        if keys_before > 0 {
            let expiry_rate = expired as f64 / keys_before as f64;

            if expiry_rate > config.speedup_threshold {
                // Many keys expiring - speed up
                current_interval = (current_interval / 2).max(min_interval);
                debug!(
                    expired = expired,
                    rate = %format!("{:.2}%", expiry_rate * 100.0),
                    new_interval_ms = current_interval.as_millis(),
                    "High expiry rate, speeding up reaper"
                );
            } else if expiry_rate < config.slowdown_threshold && expired == 0 {
                // Nothing expiring - slow down
                current_interval = (current_interval * 2).min(max_interval);
                trace!(
                    new_interval_ms = current_interval.as_millis(),
                    "Low expiry rate, slowing down reaper"
                );
            }
        }

        if expired > 0 {
            debug!(
                expired = expired,
                keys_remaining = engine.len(),
                "Expired keys cleaned up"
            );
        }
    }
}
