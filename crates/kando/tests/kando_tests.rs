//! End-to-end behaviour of the kando adapter.
//!
//! Every test builds its own mediums so nothing leaks through the shared
//! fallback.

use kando::{Kando, KandoConfig, Medium, MemoryMedium};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

struct Fixture {
    kando: Kando,
    local: Arc<MemoryMedium>,
    session: Arc<MemoryMedium>,
}

fn fixture() -> Fixture {
    fixture_with(KandoConfig::default())
}

fn fixture_with(config: KandoConfig) -> Fixture {
    let local = Arc::new(MemoryMedium::new());
    let session = Arc::new(MemoryMedium::new());
    let kando = Kando::builder()
        .local(local.clone())
        .session(session.clone())
        .fallback(Arc::new(MemoryMedium::new()))
        .config(config)
        .build();
    Fixture {
        kando,
        local,
        session,
    }
}

/// Test the profile scenario from write through namespace removal.
#[test]
fn test_profile_scenario() {
    let Fixture { kando, local, .. } = fixture();

    kando
        .set("local.user.profile", &json!({"name": "Alice", "age": 30}))
        .unwrap();
    assert_eq!(
        kando.get("local.user.profile").unwrap(),
        Some(json!({"name": "Alice", "age": 30}))
    );

    kando
        .set("local.user.profile.name", "Alice Johnson")
        .unwrap();
    assert_eq!(
        kando.get("local.user.profile").unwrap(),
        Some(json!({"name": "Alice Johnson", "age": 30}))
    );

    kando.delete("local.user.profile.name").unwrap();
    assert_eq!(
        kando.get("local.user.profile").unwrap(),
        Some(json!({"age": 30}))
    );

    kando.delete("local.user").unwrap();
    assert_eq!(kando.get("local.user").unwrap(), None);
    assert_eq!(local.get_item("user").unwrap(), None);
}

/// Test that written values read back unchanged.
#[test]
fn test_round_trip_values() {
    let Fixture { kando, .. } = fixture();

    let values = [
        json!("dark"),
        json!(0),
        json!(-12.5),
        json!(false),
        json!(""),
        json!([1, "two", {"three": 3}]),
        json!({"nested": {"deep": [true, null]}}),
    ];

    for (i, value) in values.iter().enumerate() {
        let path = format!("local.appSettings.value{i}");
        kando.set(&path, value).unwrap();
        assert_eq!(kando.get(&path).unwrap().as_ref(), Some(value), "{path}");
    }
}

/// Test that a second delete changes nothing.
#[test]
fn test_delete_is_idempotent() {
    let Fixture { kando, local, .. } = fixture();
    kando.set("local.ns.a", &1).unwrap();
    kando.set("local.ns.b", &2).unwrap();

    kando.delete("local.ns.a").unwrap();
    let once = local.get_item("ns").unwrap();
    kando.delete("local.ns.a").unwrap();
    assert_eq!(local.get_item("ns").unwrap(), once);
    assert_eq!(kando.get("local.ns").unwrap(), Some(json!({"b": 2})));
}

/// Test that removing the last field drops the root entry.
#[test]
fn test_last_field_delete_collapses_root() {
    let Fixture { kando, local, .. } = fixture();
    kando.set("local.ns.only", "value").unwrap();

    kando.delete("local.ns.only").unwrap();
    assert_eq!(local.get_item("ns").unwrap(), None);
    assert_eq!(kando.get("local.ns").unwrap(), None);
}

/// Test array element assignment and shift-left removal.
#[test]
fn test_array_index_set_and_remove() {
    let Fixture { kando, .. } = fixture();

    kando
        .set("local.user.permissions", &json!(["read", "write", "delete"]))
        .unwrap();
    kando.set("local.user.permissions[1]", "view").unwrap();
    assert_eq!(
        kando.get("local.user.permissions").unwrap(),
        Some(json!(["read", "view", "delete"]))
    );

    kando.delete("local.user.permissions[1]").unwrap();
    assert_eq!(
        kando.get("local.user.permissions").unwrap(),
        Some(json!(["read", "delete"]))
    );
}

/// Test that writing past the end extends the array.
#[test]
fn test_sparse_extend() {
    let Fixture { kando, .. } = fixture();

    kando.set("local.list[2]", "x").unwrap();
    let list = kando.get("local.list").unwrap().unwrap();
    let items = list.as_array().unwrap();
    assert_eq!(items.len(), 3);
    assert_eq!(items[2], json!("x"));
    assert_eq!(kando.get("local.list[0]").unwrap(), Some(Value::Null));
}

/// Test that an indexed namespace root shares the entry of its base key.
#[test]
fn test_indexed_root_uses_base_key() {
    let Fixture { kando, local, .. } = fixture();

    kando.set("local.p", &json!(["a", "b", "c"])).unwrap();
    kando.set("local.p[3]", "d").unwrap();
    assert_eq!(kando.get("local.p[3]").unwrap(), Some(json!("d")));

    kando.delete("local.p[1]").unwrap();
    assert_eq!(kando.get("local.p").unwrap(), Some(json!(["a", "c", "d"])));
    assert_eq!(local.keys().unwrap(), vec!["p".to_string()]);
}

/// Test that oversized indices fail cleanly and leave the medium untouched.
#[test]
fn test_oversized_index_is_rejected() {
    let Fixture { kando, local, .. } = fixture();
    kando.set("local.ns.list", &json!(["a"])).unwrap();
    let before = local.get_item("ns").unwrap();

    for path in [
        "local.ns.list[18446744073709551615]",
        "local.ns.list[1000000]",
        "local.big[1000000]",
    ] {
        assert!(
            matches!(kando.set(path, "x"), Err(kando::KandoError::InvalidPath { .. })),
            "{path}"
        );
    }

    assert_eq!(local.get_item("ns").unwrap(), before);
    assert_eq!(local.get_item("big").unwrap(), None);
}

/// Test that building an indexed path from nothing works.
#[test]
fn test_deep_indexed_write() {
    let Fixture { kando, .. } = fixture();

    kando.set("local.cart.items[0].sku", "A-1").unwrap();
    kando.set("local.cart.items[0].qty", &2).unwrap();
    assert_eq!(
        kando.get("local.cart.items").unwrap(),
        Some(json!([{"sku": "A-1", "qty": 2}]))
    );
}

/// Test reads of paths that do not exist.
#[test]
fn test_missing_paths_read_none() {
    let Fixture { kando, .. } = fixture();

    assert_eq!(
        kando
            .get("local.some.deep.path.that.does.not.exist")
            .unwrap(),
        None
    );

    kando.set("local.example.array", &json!(["a", "b"])).unwrap();
    assert_eq!(kando.get("local.example.array[5]").unwrap(), None);
}

/// Test that a read never writes to the medium.
#[test]
fn test_read_does_not_mutate() {
    let Fixture { kando, local, .. } = fixture();
    kando.set("local.ns.a", &1).unwrap();
    let before = local.get_item("ns").unwrap();

    kando.get("local.ns.a").unwrap();
    kando.get("local.ns.missing").unwrap();
    kando.get("local.other.key").unwrap();

    assert_eq!(local.get_item("ns").unwrap(), before);
    assert_eq!(local.len().unwrap(), 1);
}

/// Test that local and session are separate mediums.
#[test]
fn test_mediums_are_isolated() {
    let Fixture {
        kando,
        local,
        session,
    } = fixture();

    kando.set("local.ns.key", "local").unwrap();
    kando.set("session.ns.key", "session").unwrap();

    assert_eq!(kando.get("local.ns.key").unwrap(), Some(json!("local")));
    assert_eq!(kando.get("session.ns.key").unwrap(), Some(json!("session")));
    assert_eq!(local.len().unwrap(), 1);
    assert_eq!(session.len().unwrap(), 1);
}

/// Test lazy eviction of an expired session value on read.
#[test]
fn test_session_expiration_on_read() {
    let Fixture { kando, session, .. } = fixture();

    kando.set_expiring("session.ns.key", "v", 1).unwrap();
    kando.set("session.ns.other", "stays").unwrap();
    assert_eq!(kando.get("session.ns.key").unwrap(), Some(json!("v")));

    // Move the record into the past
    let past = kando_util::now_millis() - 5_000;
    session
        .set_item("ns.key.expires", &past.to_string())
        .unwrap();

    assert_eq!(kando.get("session.ns.key").unwrap(), None);
    assert_eq!(session.get_item("ns.key.expires").unwrap(), None);
    assert_eq!(
        kando.get("session.ns").unwrap(),
        Some(json!({"other": "stays"}))
    );
}

/// Test that rewriting a path over an expired record keeps the new value.
#[test]
fn test_session_rewrite_over_expired_record() {
    let Fixture { kando, session, .. } = fixture();

    kando.set_expiring("session.ns.key", "old", 1).unwrap();
    let past = kando_util::now_millis() - 5_000;
    session
        .set_item("ns.key.expires", &past.to_string())
        .unwrap();

    kando.set("session.ns.key", "new").unwrap();
    assert_eq!(kando.get("session.ns.key").unwrap(), Some(json!("new")));
    assert_eq!(kando.sweep_now().unwrap().evicted, 0);
    assert_eq!(kando.get("session.ns.key").unwrap(), Some(json!("new")));
}

/// Test that an expired parent record evicts reads beneath it.
#[test]
fn test_session_expiration_of_parent_path() {
    let Fixture { kando, session, .. } = fixture();

    kando
        .set_expiring("session.expiringKey", &json!({"tempKey": "willExpire"}), 1)
        .unwrap();
    let past = kando_util::now_millis() - 5_000;
    session
        .set_item("expiringKey.expires", &past.to_string())
        .unwrap();

    assert_eq!(kando.get("session.expiringKey.tempKey").unwrap(), None);
    assert!(session.is_empty().unwrap());
}

/// Test the synchronous sweep pass.
#[test]
fn test_sweep_now() {
    let Fixture { kando, session, .. } = fixture();

    kando.set_expiring("session.ns.old", "a", 60).unwrap();
    kando.set_expiring("session.ns.new", "b", 60).unwrap();
    let past = kando_util::now_millis() - 1;
    session.set_item("ns.old.expires", &past.to_string()).unwrap();

    let report = kando.sweep_now().unwrap();
    assert_eq!(report.evicted, 1);
    assert_eq!(report.live, 1);
    assert_eq!(kando.get("session.ns").unwrap(), Some(json!({"new": "b"})));
}

/// Test that the background sweep evicts unread values and then stops.
#[tokio::test]
async fn test_background_sweep_lifecycle() {
    let config = KandoConfig {
        sweep_interval_ms: 10,
        ..KandoConfig::default()
    };
    let Fixture { kando, session, .. } = fixture_with(config);

    assert!(!kando.is_sweeping());
    kando.set_expiring("session.ns.key", "v", 60).unwrap();
    assert!(kando.is_sweeping());

    let past = kando_util::now_millis() - 1_000;
    session
        .set_item("ns.key.expires", &past.to_string())
        .unwrap();

    for _ in 0..100 {
        if !kando.is_sweeping() {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }

    assert!(!kando.is_sweeping());
    assert!(session.is_empty().unwrap());

    // A new expiring write starts it again
    kando.set_expiring("session.ns.key", "v", 60).unwrap();
    assert!(kando.is_sweeping());
}

/// Test that an unusable medium falls back to memory with the same behaviour.
#[test]
fn test_fallback_behaves_identically() {
    let fallback = Arc::new(MemoryMedium::new());
    let kando = Kando::builder()
        .local(Arc::new(MemoryMedium::with_quota(0)))
        .session(Arc::new(MemoryMedium::with_quota(0)))
        .fallback(fallback.clone())
        .build();

    kando.set("local.fallbackTest", "value").unwrap();
    assert_eq!(
        kando.get("local.fallbackTest").unwrap(),
        Some(json!("value"))
    );

    kando.set("local.p", &json!(["a", "b", "c"])).unwrap();
    kando.delete("local.p[1]").unwrap();
    assert_eq!(kando.get("local.p").unwrap(), Some(json!(["a", "c"])));

    kando.delete("local.fallbackTest").unwrap();
    kando.delete("local.fallbackTest").unwrap();
    assert_eq!(kando.get("local.fallbackTest").unwrap(), None);

    kando.set_expiring("session.ns.key", "v", 1).unwrap();
    let past = kando_util::now_millis() - 5_000;
    fallback
        .set_item("ns.key.expires", &past.to_string())
        .unwrap();
    assert_eq!(kando.get("session.ns.key").unwrap(), None);
}

/// Test that corrupt stored JSON is reported, not replaced.
#[test]
fn test_corrupt_root_is_an_error() {
    let Fixture { kando, local, .. } = fixture();
    local.set_item("broken", "{\"broken\":").unwrap();

    assert!(matches!(
        kando.get("local.broken.key"),
        Err(kando::KandoError::Json(_))
    ));
    assert!(kando.set("local.broken.key", &1).is_err());
    assert_eq!(
        local.get_item("broken").unwrap(),
        Some("{\"broken\":".to_string())
    );
}
