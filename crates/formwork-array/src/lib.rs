//! Formwork Array
//!
//! Repeating-group editing over a shared value store.
//!
//! # Core Concepts
//!
//! - [`FieldArrayManager`]: Add, remove-or-reset and reorder items
//! - [`ItemId`]: Stable identity that survives reorders and removals
//! - [`Presentation`]: Plain list, or accordion with expansion and focus
//!
//! Item count never drops below `min_items`: removing at the minimum resets
//! the item to its default value instead. Adding at `max_items` does nothing.
//! The store stays the source of truth: every operation first adopts the
//! array as stored, so values written by the host are never discarded.
//!
//! # Example
//!
//! ```rust
//! use formwork_array::{FieldArrayManager, Removal};
//! use formwork_schema::{FieldArrayDescriptor, FieldDescriptor, FieldPath};
//! use formwork_store::{MemoryStore, ValueStore};
//! use serde_json::json;
//! use std::sync::Arc;
//!
//! let store = Arc::new(MemoryStore::new());
//! let descriptor = FieldArrayDescriptor::of(FieldDescriptor::text_input("Tag"))
//!     .min_items(1)
//!     .default_item(json!(""));
//!
//! let mut tags = FieldArrayManager::new(FieldPath::single("tags"), &descriptor, store.clone());
//! tags.initialize();
//! store.set(&"tags.0".parse().unwrap(), json!("rust"));
//!
//! let only = tags.items()[0];
//! assert_eq!(tags.remove(only), Removal::Reset { index: 0 });
//! assert_eq!(store.get_all(), json!({"tags": [""]}));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod accordion;
mod id;
mod manager;

// Re-exports
pub use accordion::AccordionState;
pub use id::ItemId;
pub use manager::{FieldArrayManager, Presentation, Removal};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
