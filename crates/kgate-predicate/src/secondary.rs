//! Predicate for objects owned by a primary resource.

use kgate_core::WatchedObject;
use std::sync::Arc;
use tracing::{debug, error, info};

use crate::diff::Differ;
use crate::exclusion::{EventPhase, ExclusionRuleSet};
use crate::filter::EventFilter;
use crate::owner::OwnerReferenceMatcher;
use crate::registry::KindRegistry;

/// Triggers a reconcile of the owner when one of its secondary objects is
/// deleted or meaningfully updated.
///
/// Built once per tracked owner kind. If the owner kind cannot be resolved
/// the predicate is still built but never matches anything.
#[derive(Debug, Clone)]
pub struct SecondaryPredicate {
    name: String,
    owner_kind: String,
    matcher: Option<OwnerReferenceMatcher>,
    registry: Arc<KindRegistry>,
    rules: Arc<ExclusionRuleSet>,
    differ: Arc<Differ>,
}

impl SecondaryPredicate {
    pub fn new(
        owner_kind: &str,
        registry: Arc<KindRegistry>,
        rules: Arc<ExclusionRuleSet>,
        differ: Arc<Differ>,
    ) -> Self {
        let matcher = match OwnerReferenceMatcher::new(owner_kind, &registry) {
            Ok(matcher) => Some(matcher),
            Err(e) => {
                error!(
                    owner = %owner_kind,
                    error = %e,
                    category = %e.category(),
                    "failed to initialize owner matcher"
                );
                None
            }
        };
        Self {
            name: format!("secondary/{owner_kind}"),
            owner_kind: owner_kind.to_string(),
            matcher,
            registry,
            rules,
            differ,
        }
    }

    pub fn owner_kind(&self) -> &str {
        &self.owner_kind
    }

    /// False when the owner kind could not be resolved at construction.
    pub fn is_active(&self) -> bool {
        self.matcher.is_some()
    }

    fn is_owned(&self, object: &WatchedObject) -> bool {
        self.matcher
            .as_ref()
            .is_some_and(|matcher| matcher.is_owned(object))
    }

    /// `Some(trigger)` when an exclusion rule decided the event.
    fn excluded(&self, phase: EventPhase, object: &WatchedObject) -> Option<bool> {
        let role = self.registry.role_of(&object.kind);
        self.rules
            .evaluate(phase, role, object)
            .map(|rule| rule.verdict().triggers())
    }
}

impl EventFilter for SecondaryPredicate {
    fn name(&self) -> &str {
        &self.name
    }

    fn on_create(&self, _object: &WatchedObject) -> bool {
        false
    }

    fn on_delete(&self, object: &WatchedObject) -> bool {
        let identity = object.identity();
        if !self.is_owned(object) {
            debug!(object = %identity, owner = %self.owner_kind, "object did not match on delete");
            return false;
        }
        if let Some(trigger) = self.excluded(EventPhase::Delete, object) {
            return trigger;
        }
        info!(object = %identity, owner = %self.owner_kind, "object matched on delete, reconciling");
        true
    }

    fn on_update(&self, old: &WatchedObject, new: &WatchedObject) -> bool {
        let identity = new.identity();
        if !self.is_owned(new) {
            return false;
        }
        debug!(object = %identity, owner = %self.owner_kind, "object matched on update");
        if let Some(trigger) = self.excluded(EventPhase::Update, new) {
            return trigger;
        }
        self.differ.object_changed(old, new)
    }
}
