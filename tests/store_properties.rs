//! End-to-end behavior of the public `Store` handle under concurrent use.

use bytes::Bytes;
use emberkv::{Store, StoreError, StoreOptions};
use std::collections::HashSet;
use std::sync::{Arc, Barrier};
use std::thread;
use std::time::Duration;

fn private_store() -> Store {
    Store::open(StoreOptions::default().isolated(true)).unwrap()
}

#[test]
fn hello_scenario() {
    let store = private_store();

    store.set("hello_1", "world").unwrap();
    store.set("hello_2", "world").unwrap();
    assert_eq!(store.get("hello_1").unwrap(), Bytes::from("world"));

    store.delete("hello_1").unwrap();
    assert!(store.get("hello_1").unwrap_err().is_not_found());

    let view = store.view_prefix("hello");
    assert!(!view.contains_key("hello_1"));
    assert_eq!(view.get("hello_2"), Some(&Bytes::from("world")));
}

#[test]
fn delete_is_idempotent() {
    let store = private_store();

    store.delete("never-set").unwrap();
    store.set("k", "v").unwrap();
    store.delete("k").unwrap();
    store.delete("k").unwrap();
    assert!(store.get("k").unwrap_err().is_not_found());
}

#[test]
fn empty_value_is_distinct_from_missing() {
    let store = private_store();

    store.set("empty", Bytes::new()).unwrap();
    assert_eq!(store.get("empty").unwrap(), Bytes::new());
    assert!(store.get("missing").unwrap_err().is_not_found());
}

#[test]
fn invalid_ttl_is_rejected() {
    let store = private_store();

    for ttl in [0, -1, i64::MIN] {
        let err = store.set_with_ttl("k", "v", ttl).unwrap_err();
        assert!(matches!(err, StoreError::InvalidArgument(_)), "ttl {ttl}");
    }
    assert!(store.is_empty());
    assert_eq!(store.stats().set_ops, 0);
}

#[test]
fn oversized_ttl_is_rejected_without_side_effect() {
    let store = private_store();

    store.set("k", "kept").unwrap();
    let err = store.set_with_ttl("k", "v", i64::MAX).unwrap_err();
    assert!(matches!(err, StoreError::InvalidArgument(_)));

    assert_eq!(store.get("k").unwrap(), Bytes::from("kept"));
    assert!(store.engine().get_entry(b"k").unwrap().expires_at.is_none());
    assert_eq!(store.stats().set_ops, 1);

    // Large but representable TTLs are still accepted
    store.set_with_ttl("long", "v", 10 * 365 * 24 * 3600).unwrap();
    assert_eq!(store.get("long").unwrap(), Bytes::from("v"));
}

#[test]
fn ttl_keys_expire_without_a_sweep() {
    // Reaper effectively parked, so only read-time checks can hide the key
    let options = StoreOptions::default()
        .isolated(true)
        .with_sweep_interval(Duration::from_secs(3600));
    let store = Store::open(options).unwrap();

    store.set_with_ttl("ttl_1", "ttl_1", 1).unwrap();
    store.set("hello_1", "world").unwrap();
    assert_eq!(store.get("ttl_1").unwrap(), Bytes::from("ttl_1"));
    assert_eq!(store.view_prefix("").len(), 2);

    thread::sleep(Duration::from_millis(1100));

    assert!(!store.exists("ttl_1"));
    assert!(store.view_prefix("ttl").is_empty());
    assert_eq!(store.len(), 1);
    assert!(store.get("ttl_1").unwrap_err().is_not_found());
}

#[test]
fn reaper_reclaims_unread_keys() {
    let options = StoreOptions::default()
        .isolated(true)
        .with_sweep_interval(Duration::from_millis(20));
    let store = Store::open(options).unwrap();

    for vu in 1..=5 {
        store
            .set_with_ttl(format!("ttl_{vu}"), format!("ttl_{vu}"), 1)
            .unwrap();
    }
    store.set("hello_1", "world").unwrap();
    assert_eq!(store.engine().len(), 6);

    thread::sleep(Duration::from_millis(1600));

    // Physically gone, not just hidden
    assert_eq!(store.engine().len(), 1);
    assert!(store.stats().expired >= 5);
}

#[test]
fn plain_set_clears_ttl() {
    let store = private_store();

    store.set_with_ttl("k", "short-lived", 1).unwrap();
    store.set("k", "forever").unwrap();

    thread::sleep(Duration::from_millis(1100));
    assert_eq!(store.get("k").unwrap(), Bytes::from("forever"));
}

#[test]
fn prefix_view_is_complete_and_exact() {
    let store = private_store();

    let expected: HashSet<String> = (0..50).map(|i| format!("user:{i}")).collect();
    for key in &expected {
        store.set(key, key.clone()).unwrap();
    }
    store.set("users", "not a match").unwrap();
    store.set("admin:1", "unrelated").unwrap();

    let view = store.view_prefix("user:");
    assert_eq!(view.len(), expected.len());
    for (key, value) in &view {
        assert_eq!(key, value);
        assert!(expected.contains(std::str::from_utf8(key).unwrap()));
    }

    assert!(store.view_prefix("nobody").is_empty());
    assert_eq!(store.view_prefix("").len(), 52);
}

#[test]
fn concurrent_callers_on_distinct_keys() {
    let store = private_store();
    let threads = 16;
    let barrier = Arc::new(Barrier::new(threads));

    let handles: Vec<_> = (0..threads)
        .map(|vu| {
            let store = store.clone();
            let barrier = Arc::clone(&barrier);
            thread::spawn(move || {
                let key = format!("vu_{vu}");
                let value = format!("value_{vu}");
                barrier.wait();
                store.set(&key, value.clone()).unwrap();
                barrier.wait();
                assert_eq!(store.get(&key).unwrap(), Bytes::from(value));
            })
        })
        .collect();

    for handle in handles {
        handle.join().unwrap();
    }

    assert_eq!(store.view_prefix("vu_").len(), threads);
}

#[test]
fn scans_never_return_stale_values_under_writes() {
    let store = private_store();
    let writers = 4;
    let rounds = 500u64;

    for w in 0..writers {
        store.set(format!("counter:{w}"), "0").unwrap();
    }

    let handles: Vec<_> = (0..writers)
        .map(|w| {
            let store = store.clone();
            thread::spawn(move || {
                for round in 1..=rounds {
                    store.set(format!("counter:{w}"), round.to_string()).unwrap();
                }
            })
        })
        .collect();

    // Each key's value only ever goes up, so successive scans must never
    // observe a smaller value for the same key.
    let mut last_seen = vec![0u64; writers];
    for _ in 0..200 {
        let view = store.view_prefix("counter:");
        assert_eq!(view.len(), writers);
        for (key, value) in &view {
            let w: usize = std::str::from_utf8(&key[8..]).unwrap().parse().unwrap();
            let v: u64 = std::str::from_utf8(value).unwrap().parse().unwrap();
            assert!(v >= last_seen[w], "key {w} went from {} to {v}", last_seen[w]);
            last_seen[w] = v;
        }
    }

    for handle in handles {
        handle.join().unwrap();
    }

    for w in 0..writers {
        assert_eq!(
            store.get(format!("counter:{w}")).unwrap(),
            Bytes::from(rounds.to_string())
        );
    }
}

#[test]
fn shared_default_instance_spans_handles() {
    let writer = Store::new("", false).unwrap();
    let reader = Store::new("", false).unwrap();

    writer.set("it-shared-default:key", "v").unwrap();
    assert_eq!(reader.get("it-shared-default:key").unwrap(), Bytes::from("v"));
    reader.delete("it-shared-default:key").unwrap();
}

#[test]
fn shared_instance_survives_dropped_handles() {
    {
        let store = Store::new("it-survives:", false).unwrap();
        store.set("k", "v").unwrap();
    }

    let store = Store::new("it-survives:", false).unwrap();
    assert_eq!(store.get("k").unwrap(), Bytes::from("v"));
}
