//! Normalized structural diffing of object snapshots.
//!
//! A [`Diff`] groups RFC 6902 operations by the top-level field they touch so
//! volatile fields (`status`, `metadata`) can be dropped as a whole.
//! [`semantic_diff`] additionally ignores values that differ only in
//! representation (`1Gi` vs `1024Mi`, `1` vs `1.0`); [`Differ`] does not.

use json_patch::{Patch, PatchOperation};
use kgate_config::DiffConfig;
use kgate_core::{GateError, Quantity, Result, WatchedObject};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, error, info};

/// Structural difference between two snapshots, keyed by top-level field.
///
/// A change that replaces the whole document is keyed by `""`.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Diff {
    fields: BTreeMap<String, Vec<PatchOperation>>,
}

impl Diff {
    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Number of top-level fields that changed.
    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn operations(&self, field: &str) -> Option<&[PatchOperation]> {
        self.fields.get(field).map(Vec::as_slice)
    }

    /// Drop every operation under the given top-level fields.
    pub fn without_fields<S: AsRef<str>>(mut self, fields: &[S]) -> Self {
        for field in fields {
            self.fields.remove(field.as_ref());
        }
        self
    }

    /// JSON rendering for log lines.
    pub fn to_json_string(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|_| format!("{:?}", self.fields))
    }

    fn push(&mut self, operation: PatchOperation) {
        let field = top_level_field(operation_path(&operation));
        self.fields.entry(field).or_default().push(operation);
    }
}

impl fmt::Display for Diff {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_json_string())
    }
}

/// Quantity-aware structural diff of two arbitrary JSON values.
///
/// Never fails: any two values can be compared.
pub fn semantic_diff(old: &Value, new: &Value) -> Diff {
    let Patch(operations) = json_patch::diff(old, new);
    let mut diff = Diff::default();
    for operation in operations {
        if let PatchOperation::Replace(replace) = &operation {
            let previous = old.pointer(replace.path.as_str());
            if previous.is_some_and(|previous| values_equivalent(previous, &replace.value)) {
                continue;
            }
        }
        diff.push(operation);
    }
    diff
}

/// Plain structural diff: every differing value is reported as is.
pub fn structural_diff(old: &Value, new: &Value) -> Diff {
    let Patch(operations) = json_patch::diff(old, new);
    let mut diff = Diff::default();
    for operation in operations {
        diff.push(operation);
    }
    diff
}

/// True when two leaf values denote the same thing.
///
/// Numbers compare by decimal value. Strings compare as quantities when both
/// parse and at least one carries a suffix, so plain numeric strings such as
/// versions keep their lexical identity.
pub fn values_equivalent(old: &Value, new: &Value) -> bool {
    if old == new {
        return true;
    }
    match (old, new) {
        (Value::Number(a), Value::Number(b)) => {
            match (Quantity::parse(&a.to_string()), Quantity::parse(&b.to_string())) {
                (Ok(a), Ok(b)) => a == b,
                _ => false,
            }
        }
        (Value::String(a), Value::String(b)) => match (Quantity::parse(a), Quantity::parse(b)) {
            (Ok(a), Ok(b)) if a.has_suffix() || b.has_suffix() => a == b,
            _ => false,
        },
        _ => false,
    }
}

/// Whole-object differ that strips volatile fields.
///
/// Values are compared structurally: secondary object payloads such as
/// `data` are opaque, so `"1k"` and `"1000"` are different there.
#[derive(Debug, Clone)]
pub struct Differ {
    volatile_fields: Vec<String>,
}

impl Default for Differ {
    fn default() -> Self {
        Self::from_config(&DiffConfig::default())
    }
}

impl Differ {
    pub fn new<I, S>(volatile_fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            volatile_fields: volatile_fields.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(config: &DiffConfig) -> Self {
        Self::new(config.volatile_fields.iter().cloned())
    }

    pub fn volatile_fields(&self) -> &[String] {
        &self.volatile_fields
    }

    /// Diff two objects after normalization. An empty diff means unchanged.
    pub fn changed(&self, old: &WatchedObject, new: &WatchedObject) -> Result<Diff> {
        let old_snapshot = serde_json::to_value(old)?;
        let new_snapshot = serde_json::to_value(new)?;
        self.changed_snapshots(&old_snapshot, &new_snapshot)
    }

    /// Diff two raw snapshots. Both roots must be JSON objects.
    pub fn changed_snapshots(&self, old: &Value, new: &Value) -> Result<Diff> {
        if !old.is_object() || !new.is_object() {
            return Err(GateError::malformed_snapshot(
                "object snapshots must be JSON objects",
            ));
        }

        // Work on copies so the caller's cache is never aliased
        let old = old.clone();
        let mut new = new.clone();
        align_resource_version(&old, &mut new);

        Ok(structural_diff(&old, &new).without_fields(&self.volatile_fields))
    }

    /// Fail-open change check used by the predicates.
    ///
    /// Returns `true` on any non-empty diff and also when the diff cannot be
    /// computed, so no real change is silently dropped.
    pub fn object_changed(&self, old: &WatchedObject, new: &WatchedObject) -> bool {
        let object = new.identity().to_string();
        let snapshots = serde_json::to_value(old)
            .and_then(|old| serde_json::to_value(new).map(|new| (old, new)));
        match snapshots {
            Ok((old, new)) => self.snapshot_changed(&object, &old, &new),
            Err(e) => {
                log_fail_open(&object, &GateError::from(e));
                true
            }
        }
    }

    /// Fail-open change check over raw snapshots; `object` names them in logs.
    pub fn snapshot_changed(&self, object: &str, old: &Value, new: &Value) -> bool {
        match self.changed_snapshots(old, new) {
            Ok(diff) if diff.is_empty() => {
                debug!(object = %object, "no relevant change after normalization");
                false
            }
            Ok(diff) => {
                info!(object = %object, diff = %diff, "controller will reconcile resource based on patch");
                true
            }
            Err(e) => {
                log_fail_open(object, &e);
                true
            }
        }
    }
}

fn log_fail_open(object: &str, e: &GateError) {
    error!(
        object = %object,
        error = %e,
        category = %e.category(),
        "failed to check if object changed, reconciling"
    );
}

/// Copy old's resource version onto the new snapshot so version churn alone
/// never shows up in the diff.
fn align_resource_version(old: &Value, new: &mut Value) {
    let version = old
        .pointer("/metadata/resourceVersion")
        .and_then(Value::as_str)
        .map(str::to_owned);
    let Some(version) = version else {
        let name = old
            .pointer("/metadata/name")
            .and_then(Value::as_str)
            .unwrap_or_default();
        let e = GateError::accessor(name, "metadata.resourceVersion", "missing on old snapshot");
        debug!(error = %e, "skipping resource version alignment");
        return;
    };

    match new.get_mut("metadata") {
        Some(Value::Object(metadata)) => {
            metadata.insert("resourceVersion".into(), Value::String(version));
        }
        _ => {
            debug!("new snapshot has no metadata object, skipping resource version alignment");
        }
    }
}

fn operation_path(operation: &PatchOperation) -> &str {
    match operation {
        PatchOperation::Add(op) => op.path.as_str(),
        PatchOperation::Remove(op) => op.path.as_str(),
        PatchOperation::Replace(op) => op.path.as_str(),
        PatchOperation::Move(op) => op.path.as_str(),
        PatchOperation::Copy(op) => op.path.as_str(),
        PatchOperation::Test(op) => op.path.as_str(),
    }
}

/// First reference token of a JSON pointer, unescaped.
fn top_level_field(path: &str) -> String {
    path.strip_prefix('/')
        .map(|rest| rest.split('/').next().unwrap_or_default())
        .unwrap_or_default()
        .replace("~1", "/")
        .replace("~0", "~")
}
