//! Error types for form sessions

use formwork_render::RenderError;
use formwork_schema::{ConfigError, FieldPath};

/// Main form error type
#[derive(Debug, thiserror::Error)]
pub enum FormError {
    /// Schema is misconfigured
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Rendering failed
    #[error("render failed: {0}")]
    Render(#[from] RenderError),

    /// Path does not name a mounted array field
    #[error("no array field at '{0}'")]
    UnknownArray(FieldPath),

    /// Path does not name a field of the schema
    #[error("no field at '{0}'")]
    UnknownField(FieldPath),

    /// Subtask type tag not recognised
    #[error("unknown subtask type '{0}'")]
    UnknownSubtaskType(String),

    /// Form configuration could not be parsed
    #[error("invalid form configuration: {0}")]
    InvalidConfig(String),
}

impl FormError {
    /// Check if the error comes from the schema rather than from usage
    ///
    /// Configuration errors abort the form; the others reject one call.
    #[inline]
    #[must_use]
    pub fn is_configuration(&self) -> bool {
        match self {
            Self::Config(_) | Self::InvalidConfig(_) => true,
            Self::Render(e) => e.is_config(),
            Self::UnknownArray(_) | Self::UnknownField(_) | Self::UnknownSubtaskType(_) => false,
        }
    }
}
