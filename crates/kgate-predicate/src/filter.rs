use kgate_core::{WatchEvent, WatchedObject};

/// Decides whether a watch event should trigger a reconcile.
///
/// Implementations hold only read-only shared state, so one instance can be
/// called from any number of threads at once.
pub trait EventFilter: Send + Sync {
    /// Name used in log lines.
    fn name(&self) -> &str;

    fn on_create(&self, object: &WatchedObject) -> bool;

    fn on_update(&self, old: &WatchedObject, new: &WatchedObject) -> bool;

    fn on_delete(&self, object: &WatchedObject) -> bool;

    fn on_generic(&self, _object: &WatchedObject) -> bool {
        false
    }

    /// Dispatch on the event variant.
    fn filter(&self, event: &WatchEvent) -> bool {
        match event {
            WatchEvent::Create { object } => self.on_create(object),
            WatchEvent::Update { old, new } => self.on_update(old, new),
            WatchEvent::Delete { object } => self.on_delete(object),
            WatchEvent::Generic { object } => self.on_generic(object),
        }
    }
}
