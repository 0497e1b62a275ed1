//! Predicate for the top-level managed resources.
//!
//! Every primary kind goes through the same update algorithm; per-kind
//! differences (where desired state lives, upgrade tracking) come from the
//! [`KindAdapter`](crate::registry::KindAdapter) registered for the kind.

use kgate_config::GateConfig;
use kgate_core::{Result, WatchedObject};
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, info};

use crate::diff::semantic_diff;
use crate::filter::EventFilter;
use crate::labels::LabelPolicy;
use crate::registry::{KindRegistry, KindRole};

#[derive(Debug, Clone)]
pub struct PrimaryPredicate {
    registry: Arc<KindRegistry>,
    labels: LabelPolicy,
}

impl PrimaryPredicate {
    pub fn new(registry: Arc<KindRegistry>, labels: LabelPolicy) -> Self {
        Self { registry, labels }
    }

    pub fn from_config(config: &GateConfig) -> Result<Self> {
        let registry = KindRegistry::from_config(config)?;
        Ok(Self::new(
            Arc::new(registry),
            LabelPolicy::from_config(&config.labels),
        ))
    }

    pub fn registry(&self) -> &Arc<KindRegistry> {
        &self.registry
    }
}

impl EventFilter for PrimaryPredicate {
    fn name(&self) -> &str {
        "primary"
    }

    fn on_create(&self, object: &WatchedObject) -> bool {
        debug!(object = %object.identity(), "create event from a primary resource");
        true
    }

    fn on_delete(&self, object: &WatchedObject) -> bool {
        debug!(object = %object.identity(), "delete event from a primary resource");
        true
    }

    fn on_update(&self, old: &WatchedObject, new: &WatchedObject) -> bool {
        let object = new.identity();
        let Some(adapter) = self.registry.get(&new.kind) else {
            debug!(object = %object, kind = %new.kind, "update event for an unregistered kind, skipping");
            return false;
        };
        if adapter.role() != KindRole::Primary {
            debug!(
                object = %object,
                kind = %adapter.kind(),
                role = %adapter.role(),
                "update event for a non-primary kind, skipping"
            );
            return false;
        }
        debug!(object = %object, kind = %adapter.kind(), "update event from a primary resource");

        if self.labels.is_do_not_reconcile(adapter.labels(new)) {
            debug!(
                object = %object,
                label = %self.labels.do_not_reconcile_key(),
                "object matched on update but do-not-reconcile label is set, doing nothing"
            );
            return false;
        }

        let diff = semantic_diff(
            adapter.spec(old).unwrap_or(&Value::Null),
            adapter.spec(new).unwrap_or(&Value::Null),
        );
        if !diff.is_empty() {
            info!(object = %object, diff = %diff, "spec has changed, reconciling");
            return true;
        }

        if adapter.deletion_timestamp(old) != adapter.deletion_timestamp(new) {
            debug!(object = %object, "resource is going to be deleted, reconciling");
            return true;
        }

        // Generation is informational only: a bump without a spec change
        // does not trigger on its own.
        let (old_generation, new_generation) = (adapter.generation(old), adapter.generation(new));
        if old_generation == new_generation {
            debug!(object = %object, generation = new_generation, "skipping update with unchanged spec");
        } else {
            debug!(
                object = %object,
                old_generation,
                new_generation,
                "generation changed without a spec change"
            );
        }

        if adapter.tracks_upgrade() && self.labels.is_upgrade(adapter.labels(old), adapter.labels(new)) {
            info!(
                object = %object,
                version = ?new.label(self.labels.version_key()),
                "version label changed, reconciling for upgrade"
            );
            return true;
        }

        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use time::macros::datetime;

    fn predicate() -> PrimaryPredicate {
        PrimaryPredicate::from_config(&GateConfig::default()).unwrap()
    }

    fn filesystem() -> WatchedObject {
        WatchedObject::new("ceph.rook.io/v1", "CephFilesystem", "myfs")
            .with_namespace("rook-ceph")
            .with_generation(2)
            .with_resource_version("1000")
            .with_spec(json!({
                "metadataPool": {"replicated": {"size": 3}},
                "metadataServer": {"activeCount": 1, "resources": {"limits": {"memory": "4Gi"}}}
            }))
            .with_status(json!({"phase": "Ready"}))
    }

    #[test]
    fn test_create_and_delete_always_trigger() {
        let predicate = predicate();
        assert!(predicate.on_create(&filesystem()));
        assert!(predicate.on_delete(&filesystem()));
        assert!(!predicate.on_generic(&filesystem()));
    }

    #[test]
    fn test_status_only_update_is_skipped() {
        let old = filesystem();
        let new = filesystem()
            .with_resource_version("1001")
            .with_status(json!({"phase": "Progressing"}));
        assert!(!predicate().on_update(&old, &new));
    }

    #[test]
    fn test_spec_change_triggers() {
        let old = filesystem();
        let new = filesystem().with_spec(json!({
            "metadataPool": {"replicated": {"size": 2}},
            "metadataServer": {"activeCount": 1, "resources": {"limits": {"memory": "4Gi"}}}
        }));
        assert!(predicate().on_update(&old, &new));
    }

    #[test]
    fn test_equivalent_quantity_is_skipped() {
        let old = filesystem();
        let new = filesystem().with_spec(json!({
            "metadataPool": {"replicated": {"size": 3}},
            "metadataServer": {"activeCount": 1, "resources": {"limits": {"memory": "4096Mi"}}}
        }));
        assert!(!predicate().on_update(&old, &new));
    }

    #[test]
    fn test_deletion_timestamp_triggers() {
        let old = filesystem();
        let new = filesystem().with_deletion_timestamp(datetime!(2026-10-15 12:00 UTC));
        assert!(predicate().on_update(&old, &new));
    }

    #[test]
    fn test_generation_bump_alone_is_skipped() {
        let old = filesystem();
        let new = filesystem().with_generation(3);
        assert!(!predicate().on_update(&old, &new));
    }

    #[test]
    fn test_upgrade_label_only_for_tracking_kinds() {
        let predicate = predicate();
        let old = filesystem();
        let new = filesystem().with_label("ceph_version", "18.2.0-0");
        assert!(predicate.on_update(&old, &new));

        let cluster = |version: Option<&str>| {
            let object = WatchedObject::new("ceph.rook.io/v1", "CephCluster", "rook-ceph")
                .with_spec(json!({"mon": {"count": 3}}));
            match version {
                Some(v) => object.with_label("ceph_version", v),
                None => object,
            }
        };
        assert!(!predicate.on_update(&cluster(None), &cluster(Some("18.2.0-0"))));
    }

    #[test]
    fn test_do_not_reconcile_beats_spec_change() {
        let old = filesystem();
        let new = filesystem()
            .with_label("do_not_reconcile", "true")
            .with_deletion_timestamp(datetime!(2026-10-15 12:00 UTC))
            .with_spec(json!({"metadataPool": {"replicated": {"size": 1}}}));
        assert!(!predicate().on_update(&old, &new));
    }

    #[test]
    fn test_unknown_kind_is_skipped() {
        let old = WatchedObject::new("ceph.rook.io/v1", "CephWidget", "w").with_spec(json!({"a": 1}));
        let new = WatchedObject::new("ceph.rook.io/v1", "CephWidget", "w").with_spec(json!({"a": 2}));
        assert!(!predicate().on_update(&old, &new));
    }

    #[test]
    fn test_secondary_kinds_are_skipped() {
        let predicate = predicate();
        let secret = WatchedObject::new("v1", "Secret", "rook-ceph-mons-keyring")
            .with_field("data", json!({"k": "YQ=="}));
        let rotated = secret.clone().with_field("data", json!({"k": "Yg=="}));
        assert!(!predicate.on_update(&secret, &rotated));

        let config = WatchedObject::new("v1", "ConfigMap", "rook-config-override")
            .with_field("data", json!({"config": ""}));
        let edited = config.clone().with_field("data", json!({"config": "[global]"}));
        assert!(!predicate.on_update(&config, &edited));
    }
}
