//! Property-based tests for predicate invariants.

#![allow(clippy::expect_used, clippy::unwrap_used)]

use kgate_config::GateConfig;
use kgate_core::{OwnerReference, WatchedObject};
use kgate_predicate::{Differ, EventFilter, PredicateFactory, semantic_diff};
use proptest::prelude::*;
use serde_json::{Map, Value, json};

fn factory() -> PredicateFactory {
    PredicateFactory::from_config(GateConfig::default()).unwrap()
}

/// Scalar leaves, including quantity-looking strings.
fn arb_leaf() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<bool>().prop_map(Value::Bool),
        (-1000i64..1000).prop_map(|n| json!(n)),
        "[a-z0-9]{0,8}".prop_map(Value::String),
        prop::sample::select(vec!["1Gi", "1024Mi", "500m", "0.5", "2", "host"])
            .prop_map(|s| Value::String(s.to_string())),
    ]
}

fn arb_value() -> impl Strategy<Value = Value> {
    arb_leaf().prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-z]{1,6}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// An object-shaped spec.
fn arb_spec() -> impl Strategy<Value = Value> {
    prop::collection::btree_map("[a-z]{1,8}", arb_value(), 0..5)
        .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>()))
}

fn arb_resource_version() -> impl Strategy<Value = String> {
    (1u64..1_000_000).prop_map(|v| v.to_string())
}

fn arb_primary_kind() -> impl Strategy<Value = &'static str> {
    prop::sample::select(vec![
        "CephCluster",
        "CephBlockPool",
        "CephFilesystem",
        "CephNFS",
        "CephObjectStore",
        "CephObjectStoreUser",
        "CephObjectRealm",
        "CephObjectZoneGroup",
        "CephObjectZone",
        "CephRBDMirror",
    ])
}

fn primary(kind: &str, spec: Value, status: Value, resource_version: &str) -> WatchedObject {
    WatchedObject::new("ceph.rook.io/v1", kind, "subject")
        .with_namespace("rook-ceph")
        .with_resource_version(resource_version)
        .with_spec(spec)
        .with_status(status)
}

fn owned_secret(data: Value, status: Value, resource_version: &str) -> WatchedObject {
    WatchedObject::new("v1", "Secret", "rook-ceph-mons-keyring")
        .with_namespace("rook-ceph")
        .with_resource_version(resource_version)
        .with_owner(OwnerReference::new("ceph.rook.io/v1", "CephCluster", "rook-ceph", "c-1"))
        .with_field("data", data)
        .with_status(status)
}

proptest! {
    #[test]
    fn status_and_resource_version_never_trigger(
        kind in arb_primary_kind(),
        spec in arb_spec(),
        (old_status, new_status) in (arb_value(), arb_value()),
        (old_rv, new_rv) in (arb_resource_version(), arb_resource_version()),
    ) {
        let factory = factory();
        let old = primary(kind, spec.clone(), old_status.clone(), &old_rv);
        let new = primary(kind, spec.clone(), new_status.clone(), &new_rv);
        prop_assert!(!factory.primary().on_update(&old, &new));

        let old = owned_secret(spec.clone(), old_status, &old_rv);
        let new = owned_secret(spec, new_status, &new_rv);
        prop_assert!(!factory.secondary("CephCluster").on_update(&old, &new));
    }

    #[test]
    fn update_is_idempotent_and_does_not_mutate(
        kind in arb_primary_kind(),
        (old_spec, new_spec) in (arb_spec(), arb_spec()),
        (old_rv, new_rv) in (arb_resource_version(), arb_resource_version()),
    ) {
        let factory = factory();
        let primary_filter = factory.primary();
        let secondary_filter = factory.secondary("CephCluster");

        let old = primary(kind, old_spec.clone(), json!({}), &old_rv);
        let new = primary(kind, new_spec.clone(), json!({}), &new_rv);
        let (old_copy, new_copy) = (old.clone(), new.clone());
        let first = primary_filter.on_update(&old, &new);
        prop_assert_eq!(first, primary_filter.on_update(&old, &new));
        prop_assert_eq!(&old, &old_copy);
        prop_assert_eq!(&new, &new_copy);

        let old = owned_secret(old_spec, json!({}), &old_rv);
        let new = owned_secret(new_spec, json!({}), &new_rv);
        let (old_copy, new_copy) = (old.clone(), new.clone());
        let first = secondary_filter.on_update(&old, &new);
        prop_assert_eq!(first, secondary_filter.on_update(&old, &new));
        prop_assert_eq!(&old, &old_copy);
        prop_assert_eq!(&new, &new_copy);
    }

    #[test]
    fn do_not_reconcile_dominates_updates(
        kind in arb_primary_kind(),
        (old_spec, new_spec) in (arb_spec(), arb_spec()),
        upgraded in any::<bool>(),
        deleting in any::<bool>(),
    ) {
        let factory = factory();
        let old = primary(kind, old_spec.clone(), json!({}), "1");
        let mut new = primary(kind, new_spec.clone(), json!({}), "2")
            .with_label("do_not_reconcile", "true");
        if upgraded {
            new = new.with_label("ceph_version", "18.2.1-0");
        }
        if deleting {
            new = new.with_deletion_timestamp(time::OffsetDateTime::UNIX_EPOCH);
        }
        prop_assert!(!factory.primary().on_update(&old, &new));

        let old = owned_secret(old_spec, json!({}), "1");
        let new = owned_secret(new_spec, json!({}), "2").with_label("do_not_reconcile", "true");
        prop_assert!(!factory.secondary("CephCluster").on_update(&old, &new));
    }

    #[test]
    fn identical_values_never_differ(value in arb_value()) {
        prop_assert!(semantic_diff(&value, &value).is_empty());
        let snapshot = json!({"metadata": {"name": "x"}, "spec": value});
        let diff = Differ::default().changed_snapshots(&snapshot, &snapshot).unwrap();
        prop_assert!(diff.is_empty());
    }
}
