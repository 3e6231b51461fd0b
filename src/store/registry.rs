//! Process-wide registry of shared store instances.
//!
//! Stores opened with `isolate = false` are looked up here by namespace.
//! The first open of a namespace creates the engine and its reaper; every
//! later open attaches to the same instance. Instances are never removed,
//! so they live until the process exits.

use crate::error::Result;
use crate::store::config::StoreOptions;
use crate::store::Shared;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::{Arc, OnceLock};
use tracing::{debug, info};

static REGISTRY: OnceLock<Mutex<HashMap<String, Arc<Shared>>>> = OnceLock::new();

fn registry() -> &'static Mutex<HashMap<String, Arc<Shared>>> {
    REGISTRY.get_or_init(|| Mutex::new(HashMap::new()))
}

/// Returns the shared instance for `options.namespace`, creating it on
/// first reference.
pub(crate) fn attach(options: &StoreOptions) -> Result<Arc<Shared>> {
    let mut instances = registry().lock();

    if let Some(shared) = instances.get(&options.namespace) {
        debug!(namespace = %options.namespace, "Attached to shared store");
        return Ok(Arc::clone(shared));
    }

    let shared = Shared::create(options)?;
    instances.insert(options.namespace.clone(), Arc::clone(&shared));
    info!(namespace = %options.namespace, "Created shared store");

    Ok(shared)
}

/// Number of shared instances created so far in this process.
pub fn shared_count() -> usize {
    registry().lock().len()
}

/// Returns true if a shared instance is registered under `namespace`.
pub fn is_registered(namespace: &str) -> bool {
    registry().lock().contains_key(namespace)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attach_reuses_instance() {
        let options = StoreOptions::new("registry-test-reuse:");
        assert!(!is_registered("registry-test-reuse:"));

        let first = attach(&options).unwrap();
        let second = attach(&options).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert!(is_registered("registry-test-reuse:"));
        assert!(shared_count() >= 1);
    }

    #[test]
    fn test_distinct_namespaces_get_distinct_instances() {
        let a = attach(&StoreOptions::new("registry-test-a:")).unwrap();
        let b = attach(&StoreOptions::new("registry-test-b:")).unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
    }
}
