//! Formwork Core
//!
//! Mounted forms: one schema, one value store, rendering, repeating groups,
//! validation and submission.
//!
//! # Core Concepts
//!
//! - [`FormSession`]: A mounted form over a [`ValueStore`](formwork_store::ValueStore)
//! - [`RenderedForm`]: Headless tree of visible fields, groups and arrays
//! - [`Submission`]: Value snapshot plus validity for the host
//! - [`FormConfig`]: Per-form validation settings, loadable from TOML
//! - [`SubtaskType`]: The product's built-in subtask forms
//!
//! # Example
//!
//! ```rust
//! use formwork_core::{FormConfig, FormSession, SubtaskType};
//! use formwork_render::Dispatcher;
//! use formwork_store::MemoryStore;
//! use std::sync::Arc;
//!
//! let mut form = FormSession::mount(
//!     SubtaskType::Request.schema(),
//!     Arc::new(MemoryStore::new()),
//!     Dispatcher::with_defaults(),
//!     FormConfig::default(),
//! )
//! .unwrap();
//!
//! let requests = "requests".parse().unwrap();
//! form.add_item(&requests).unwrap();
//!
//! let rendered = form.render().unwrap();
//! assert!(rendered.field(&"requests.1.endpoint".parse().unwrap()).is_some());
//! assert!(!form.submission().valid); // endpoints are required
//! ```

#![warn(missing_docs)]
#![warn(unreachable_pub)]

mod config;
mod error;
pub mod forms;
mod output;
mod session;
pub mod telemetry;

// Re-exports
pub use config::{FormConfig, ValidateOn};
pub use error::FormError;
pub use forms::SubtaskType;
pub use output::{RenderedArray, RenderedForm, RenderedItem, RenderedNode, Submission};
pub use session::FormSession;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
