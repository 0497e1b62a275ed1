//! Owner reference matching for secondary objects.

use kgate_core::{GateError, ObjectIdentity, OwnerReference, Result, WatchedObject};
use tracing::{debug, error};

use crate::registry::KindRegistry;

/// Result of resolving a candidate's owner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerMatch {
    pub matched: bool,
    /// Identity of the candidate object, kept for logging and label checks
    pub identity: ObjectIdentity,
    /// The first owner reference that matched
    pub owner: Option<OwnerReference>,
}

/// Decides whether an object is owned by a tracked primary kind.
///
/// Only declared owner references count: an object with none is never
/// matched, whatever its name looks like.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OwnerReferenceMatcher {
    owner_kind: String,
    owner_group: String,
}

impl OwnerReferenceMatcher {
    /// The owner kind must be registered so its API group is known.
    pub fn new(owner_kind: &str, registry: &KindRegistry) -> Result<Self> {
        let adapter = registry.lookup(owner_kind)?;
        Ok(Self {
            owner_kind: owner_kind.to_string(),
            owner_group: adapter.api_group().to_string(),
        })
    }

    pub fn owner_kind(&self) -> &str {
        &self.owner_kind
    }

    pub fn owner_group(&self) -> &str {
        &self.owner_group
    }

    /// Scan owner references in order and return the first one whose kind
    /// and API group both match.
    ///
    /// A reference of the tracked kind with an unparseable `apiVersion` is
    /// an error; callers treat it as no match.
    pub fn matches(&self, candidate: &WatchedObject) -> Result<OwnerMatch> {
        let identity = candidate.identity();
        for reference in &candidate.metadata.owner_references {
            if reference.kind != self.owner_kind {
                continue;
            }
            let group = reference.api_group()?;
            if group == self.owner_group {
                debug!(object = %identity, owner = %reference, "Owner reference matched");
                return Ok(OwnerMatch {
                    matched: true,
                    identity,
                    owner: Some(reference.clone()),
                });
            }
            debug!(
                object = %identity,
                owner = %reference,
                group = %group,
                expected = %self.owner_group,
                "Owner kind matches but API group differs"
            );
        }
        Ok(OwnerMatch {
            matched: false,
            identity,
            owner: None,
        })
    }

    /// Like [`matches`](Self::matches), but a resolution error is logged
    /// and reported as not owned.
    pub fn is_owned(&self, candidate: &WatchedObject) -> bool {
        match self.matches(candidate) {
            Ok(found) => found.matched,
            Err(e) => {
                log_resolution_error(candidate, &e);
                false
            }
        }
    }
}

pub(crate) fn log_resolution_error(candidate: &WatchedObject, e: &GateError) {
    error!(
        object = %candidate.identity(),
        error = %e,
        category = %e.category(),
        "failed to resolve owner, ignoring event"
    );
}
