//! EmberKV scenario driver
//!
//! Replays a small load-test script against an embedded store: a batch of
//! virtual users writes plain and TTL'd keys, a reader checks get/delete
//! semantics, and a watcher counts TTL'd keys until they have all expired.

use anyhow::Context;
use clap::Parser;
use emberkv::{Store, StoreOptions};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

/// EmberKV scenario driver
#[derive(Parser, Debug, Clone)]
#[command(author, version, about)]
struct Args {
    /// Number of virtual users in the generator scenario
    #[arg(long, default_value_t = 5)]
    vus: u32,

    /// TTL given to each generated ttl_* key, in seconds
    #[arg(long, default_value_t = 5)]
    ttl_seconds: i64,

    /// Delay before the results scenario starts
    #[arg(long, default_value_t = 1000)]
    results_delay_ms: u64,

    /// Delay before the ttl watcher starts
    #[arg(long, default_value_t = 3000)]
    ttl_start_ms: u64,

    /// How long the ttl watcher keeps polling
    #[arg(long, default_value_t = 5)]
    ttl_window_secs: u64,

    /// Base interval of the background expiry reaper
    #[arg(long, default_value_t = 100)]
    sweep_interval_ms: u64,

    /// Namespace applied to every key
    #[arg(long, default_value = "")]
    namespace: String,

    /// Use a private store instead of the shared instance for the namespace
    #[arg(long)]
    isolate: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("emberkv=info".parse()?))
        .with_target(false)
        .init();

    let args = Args::parse();

    let options = StoreOptions::new(args.namespace.clone())
        .isolated(args.isolate)
        .with_sweep_interval(Duration::from_millis(args.sweep_interval_ms));
    let store = Store::open(options).context("failed to open store")?;

    info!(
        version = emberkv::VERSION,
        namespace = %store.namespace(),
        isolate = args.isolate,
        "Store ready"
    );

    let mut scenarios: Vec<(&str, JoinHandle<anyhow::Result<()>>)> = Vec::new();

    for vu in 1..=args.vus {
        let store = store.clone();
        let ttl = args.ttl_seconds;
        scenarios.push(("generator", tokio::spawn(async move { generator(&store, vu, ttl) })));
    }

    {
        let store = store.clone();
        let delay = Duration::from_millis(args.results_delay_ms);
        scenarios.push((
            "results",
            tokio::spawn(async move {
                tokio::time::sleep(delay).await;
                results(&store)
            }),
        ));
    }

    {
        let store = store.clone();
        let start = Duration::from_millis(args.ttl_start_ms);
        let window = Duration::from_secs(args.ttl_window_secs);
        scenarios.push((
            "ttl",
            tokio::spawn(async move {
                tokio::time::sleep(start).await;
                ttl_watch(&store, window).await;
                Ok::<_, anyhow::Error>(())
            }),
        ));
    }

    for (name, handle) in scenarios {
        handle
            .await
            .with_context(|| format!("{name} scenario panicked"))?
            .with_context(|| format!("{name} scenario failed"))?;
    }

    let stats = store.stats();
    info!(
        keys = stats.keys,
        gets = stats.get_ops,
        sets = stats.set_ops,
        deletes = stats.del_ops,
        expired = stats.expired,
        "All scenarios finished"
    );

    Ok(())
}

/// One virtual user writing its plain and TTL'd keys.
fn generator(store: &Store, vu: u32, ttl_seconds: i64) -> anyhow::Result<()> {
    store.set(format!("hello_{vu}"), "world")?;
    store.set_with_ttl(format!("ttl_{vu}"), format!("ttl_{vu}"), ttl_seconds)?;
    Ok(())
}

/// Reads, deletes, and re-reads `hello_1`, then lists the `hello` prefix.
fn results(store: &Store) -> anyhow::Result<()> {
    match store.get("hello_1") {
        Ok(value) => info!(value = ?value, "hello_1"),
        Err(e) if e.is_not_found() => warn!(error = %e, "empty value"),
        Err(e) => return Err(e.into()),
    }

    store.delete("hello_1")?;

    match store.get("hello_1") {
        Ok(value) => warn!(value = ?value, "hello_1 still readable after delete"),
        Err(e) if e.is_not_found() => info!(error = %e, "empty value"),
        Err(e) => return Err(e.into()),
    }

    for (key, value) in store.view_prefix("hello") {
        info!(key = ?key, value = ?value, "hello prefix");
    }

    Ok(())
}

/// Counts the live `ttl` keys once a second for `window`.
async fn ttl_watch(store: &Store, window: Duration) {
    let deadline = tokio::time::Instant::now() + window;

    while tokio::time::Instant::now() < deadline {
        let count = store.view_prefix("ttl").len();
        info!(count, "ttl keys");
        tokio::time::sleep(Duration::from_secs(1)).await;
    }
}
