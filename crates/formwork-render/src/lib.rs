//! Formwork Render
//!
//! Headless field rendering for schema-driven forms.
//!
//! # Core Concepts
//!
//! - [`RenderStrategy`]: Turns one field into a [`RenderedField`]
//! - [`RendererRegistry`]: Field kind → strategy mapping
//! - [`Dispatcher`]: Per-form overrides over a shared registry, plus visibility
//! - [`ValidationTracker`]: Sync errors and last-invocation-wins async errors
//!
//! # Example
//!
//! ```rust
//! use formwork_render::Dispatcher;
//! use formwork_schema::{FieldDescriptor, FieldPath, VisibilityScope, VisibleWhen};
//! use formwork_store::{MemoryStore, ValueStore};
//! use serde_json::json;
//!
//! let store = MemoryStore::with_values(json!({"type": "select", "options": "a,b"}));
//! let dispatcher = Dispatcher::with_defaults();
//! let options = FieldDescriptor::textarea("Options")
//!     .visible_when(VisibleWhen::equals(FieldPath::single("type"), "select"));
//!
//! let values = store.get_all();
//! let rendered = dispatcher
//!     .render(&FieldPath::single("options"), &options, &VisibilityScope::new(&values), &store)
//!     .unwrap()
//!     .unwrap();
//! assert_eq!(rendered.widget, "text-area");
//! assert_eq!(rendered.value, json!("a,b"));
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod dispatcher;
mod registry;
mod strategy;
mod validation;

// Re-exports
pub use dispatcher::Dispatcher;
pub use registry::{default_widget, RendererRegistry};
pub use strategy::{RenderContext, RenderError, RenderStrategy, RenderedField, WidgetStrategy};
pub use validation::{
    check_rules, validate_field, Settlement, ValidationTicket, ValidationTracker,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
