//! Configuration errors
//!
//! Everything here is an authoring mistake in a form schema. These are
//! reported when the schema is loaded or resolved, before any user input.

use crate::path::FieldPath;

/// Schema configuration error
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Descriptor kind that no renderer knows
    #[error("unknown field kind '{kind}' at '{path}'")]
    UnknownKind {
        /// Offending field
        path: FieldPath,
        /// The unrecognized tag
        kind: String,
    },

    /// Array node without an item template
    #[error("array at '{path}' has no item template")]
    MissingItemTemplate {
        /// Offending array
        path: FieldPath,
    },

    /// Array node whose item template cannot describe an element
    #[error("array at '{path}' has an invalid item template: {reason}")]
    InvalidItemTemplate {
        /// Offending array
        path: FieldPath,
        /// What is wrong with it
        reason: String,
    },

    /// Same property declared twice in one group
    #[error("duplicate property '{name}' in group '{path}'")]
    DuplicateProperty {
        /// Group containing the duplicate
        path: FieldPath,
        /// Repeated property name
        name: String,
    },

    /// Property name that cannot be written as a path segment
    #[error("property name '{name}' in group '{path}' is not addressable")]
    InvalidPropertyName {
        /// Group containing the property
        path: FieldPath,
        /// The rejected name
        name: String,
    },

    /// `min_items` greater than `max_items`
    #[error("array at '{path}' requires min_items ({min}) <= max_items ({max})")]
    InvalidLimits {
        /// Offending array
        path: FieldPath,
        /// Declared minimum
        min: usize,
        /// Declared maximum
        max: usize,
    },

    /// `default_item` does not fit the item template
    #[error("array at '{path}' has an invalid default item: {reason}")]
    InvalidDefaultItem {
        /// Offending array
        path: FieldPath,
        /// What is wrong with it
        reason: String,
    },

    /// `pattern` rule that does not compile
    #[error("invalid pattern '{pattern}' at '{path}': {message}")]
    InvalidPattern {
        /// Offending field
        path: FieldPath,
        /// The pattern source
        pattern: String,
        /// Regex compiler message
        message: String,
    },

    /// Hidden field with a visibility condition
    #[error("hidden field at '{path}' cannot declare visible_when")]
    HiddenWithVisibility {
        /// Offending field
        path: FieldPath,
    },

    /// Schema document could not be parsed
    #[error("schema parse error: {0}")]
    Parse(String),
}

impl ConfigError {
    /// Path of the offending node, if the error has one
    #[must_use]
    pub fn path(&self) -> Option<&FieldPath> {
        match self {
            Self::UnknownKind { path, .. }
            | Self::MissingItemTemplate { path }
            | Self::InvalidItemTemplate { path, .. }
            | Self::DuplicateProperty { path, .. }
            | Self::InvalidPropertyName { path, .. }
            | Self::InvalidLimits { path, .. }
            | Self::InvalidDefaultItem { path, .. }
            | Self::InvalidPattern { path, .. }
            | Self::HiddenWithVisibility { path } => Some(path),
            Self::Parse(_) => None,
        }
    }
}
