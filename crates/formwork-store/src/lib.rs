//! Formwork Store
//!
//! The value store owns the live form data. Every component of the form
//! engine reads and writes values through [`ValueStore`]; none keeps a
//! private copy.
//!
//! [`MemoryStore`] is the in-process implementation used by hosts that do
//! not bring their own reactive store.
//!
//! # Example
//!
//! ```rust
//! use formwork_store::{MemoryStore, ValueStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::new();
//! store.set(&"requests.0.endpoint".parse().unwrap(), json!("/users"));
//! assert_eq!(store.get_all(), json!({"requests": [{"endpoint": "/users"}]}));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod memory;

pub use memory::MemoryStore;

use formwork_schema::FieldPath;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Change notification: subscribed path and its current value
pub type ChangeCallback = Arc<dyn Fn(&FieldPath, &Value) + Send + Sync>;

/// Handle returned by [`ValueStore::subscribe`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SubscriptionId(u64);

impl SubscriptionId {
    /// Create from a raw counter value
    #[inline]
    #[must_use]
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    /// Raw counter value
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for SubscriptionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sub-{}", self.0)
    }
}

/// Reactive store holding the form's value tree
///
/// Writes are infallible: missing containers along a path are created, and
/// an intermediate value of the wrong shape is replaced.
pub trait ValueStore: Send + Sync {
    /// Value at `path`, if present
    fn get(&self, path: &FieldPath) -> Option<Value>;

    /// Write `value` at `path` and notify overlapping subscribers
    fn set(&self, path: &FieldPath, value: Value);

    /// Watch `path`; fires when it, an ancestor or a descendant is written
    fn subscribe(&self, path: &FieldPath, callback: ChangeCallback) -> SubscriptionId;

    /// Stop a subscription; `false` if it was already gone
    fn unsubscribe(&self, id: SubscriptionId) -> bool;

    /// Snapshot of the whole value tree
    fn get_all(&self) -> Value;

    /// Items of the array at `path`; empty when absent or not an array
    fn get_array(&self, path: &FieldPath) -> Vec<Value> {
        match self.get(path) {
            Some(Value::Array(items)) => items,
            _ => Vec::new(),
        }
    }
}
