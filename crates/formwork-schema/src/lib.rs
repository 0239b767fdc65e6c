//! Formwork Schema
//!
//! Declarative form configuration that mirrors the shape of the data it
//! edits, plus the resolver that turns it into addressable value paths.
//!
//! # Core Concepts
//!
//! - [`FieldDescriptor`]: One leaf field (kind, label, visibility, validation)
//! - [`FieldGroup`]: Nested record of named child nodes
//! - [`FieldArrayDescriptor`]: Repeating group over an item template
//! - [`FieldPath`]: Dot/index address into the value tree
//! - [`resolve`]: Schema → [`FieldNameNode`] tree of paths
//!
//! # Example
//!
//! ```rust
//! use formwork_schema::{resolve, FieldArrayDescriptor, FieldDescriptor, FieldGroup};
//!
//! let schema = FieldGroup::new().field(
//!     "requests",
//!     FieldArrayDescriptor::of(
//!         FieldGroup::new().field("endpoint", FieldDescriptor::text_input("Endpoint")),
//!     )
//!     .min_items(1),
//! );
//!
//! let names = resolve(&schema).unwrap();
//! let requests = names.get("requests").unwrap().as_array().unwrap();
//! let endpoint = requests.fields.get("endpoint").unwrap().as_leaf().unwrap();
//! assert_eq!(requests.field_path(1, endpoint).to_string(), "requests.1.endpoint");
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod descriptor;
mod error;
mod load;
mod path;
mod resolver;
mod visibility;

// Re-exports
pub use descriptor::{
    validator_fn, ArrayLayout, AsyncValidator, FieldArrayDescriptor, FieldDescriptor, FieldGroup,
    FieldKind, FnValidator, PatternRule, SchemaNode, SelectOption, SharedValidator,
    ValidationRule, ARRAY_TAG,
};
pub use error::ConfigError;
pub use path::{FieldPath, PathError, PathSegment};
pub use resolver::{resolve, resolve_with, ArrayNames, BuiltinKinds, FieldNameNode, KindCatalog};
pub use visibility::{is_truthy, Predicate, VisibilityError, VisibilityScope, VisibleWhen};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
