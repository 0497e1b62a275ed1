pub mod error;
pub mod events;
pub mod object;
pub mod quantity;

pub use error::{ErrorCategory, FailurePolicy, GateError, Result};
pub use events::{WatchEvent, WatchEventType};
pub use object::{ObjectIdentity, ObjectMeta, OwnerReference, WatchedObject};
pub use quantity::Quantity;
