//! Watch event types delivered by the control-loop substrate.
//!
//! Events are snapshots captured at delivery time. They serialize with a
//! `type` tag so captured events can be replayed from JSON files:
//!
//! ```json
//! {"type": "update", "old": {...}, "new": {...}}
//! ```

use serde::{Deserialize, Serialize};

use crate::object::WatchedObject;

/// Type of watch event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WatchEventType {
    /// Object appeared
    Create,
    /// Object changed
    Update,
    /// Object disappeared
    Delete,
    /// Externally triggered event with no identity change
    Generic,
}

impl WatchEventType {
    /// Returns the string representation of the event type.
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchEventType::Create => "create",
            WatchEventType::Update => "update",
            WatchEventType::Delete => "delete",
            WatchEventType::Generic => "generic",
        }
    }
}

impl std::fmt::Display for WatchEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A single observed event for a watched object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum WatchEvent {
    Create { object: WatchedObject },
    Update { old: WatchedObject, new: WatchedObject },
    Delete { object: WatchedObject },
    Generic { object: WatchedObject },
}

impl WatchEvent {
    /// Create a "create" event.
    pub fn created(object: WatchedObject) -> Self {
        WatchEvent::Create { object }
    }

    /// Create an "update" event.
    pub fn updated(old: WatchedObject, new: WatchedObject) -> Self {
        WatchEvent::Update { old, new }
    }

    /// Create a "delete" event.
    pub fn deleted(object: WatchedObject) -> Self {
        WatchEvent::Delete { object }
    }

    /// Create a "generic" event.
    pub fn generic(object: WatchedObject) -> Self {
        WatchEvent::Generic { object }
    }

    pub fn event_type(&self) -> WatchEventType {
        match self {
            WatchEvent::Create { .. } => WatchEventType::Create,
            WatchEvent::Update { .. } => WatchEventType::Update,
            WatchEvent::Delete { .. } => WatchEventType::Delete,
            WatchEvent::Generic { .. } => WatchEventType::Generic,
        }
    }

    /// The current version of the object (the new side of an update).
    pub fn object(&self) -> &WatchedObject {
        match self {
            WatchEvent::Create { object }
            | WatchEvent::Delete { object }
            | WatchEvent::Generic { object } => object,
            WatchEvent::Update { new, .. } => new,
        }
    }

    /// Check if this event matches a filter by object kind.
    pub fn matches_kind(&self, filter_kind: Option<&str>) -> bool {
        match filter_kind {
            Some(kind) => self.object().kind == kind,
            None => true,
        }
    }
}
