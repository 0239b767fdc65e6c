//! Per-form host settings

use crate::error::FormError;
use serde::{Deserialize, Serialize};

/// When field values are checked against their rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidateOn {
    /// Host calls validation when a control loses focus
    #[default]
    Blur,
    /// Every `set_value` re-checks the written field
    Change,
    /// Only on submission
    Submit,
}

/// Form configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormConfig {
    /// Validation trigger
    pub validate_on: ValidateOn,
    /// Also validate fields that are not currently rendered
    pub validate_hidden: bool,
    /// Treat a still-running async validation as invalid on submit
    pub block_submit_while_pending: bool,
}

impl FormConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse from TOML; missing keys take their defaults
    ///
    /// # Errors
    /// [`FormError::InvalidConfig`] when the document does not parse
    pub fn from_toml_str(source: &str) -> Result<Self, FormError> {
        toml::from_str(source).map_err(|e| FormError::InvalidConfig(e.to_string()))
    }

    /// With validation trigger
    #[inline]
    #[must_use]
    pub fn with_validate_on(mut self, validate_on: ValidateOn) -> Self {
        self.validate_on = validate_on;
        self
    }

    /// With hidden-field validation
    #[inline]
    #[must_use]
    pub fn with_validate_hidden(mut self, validate_hidden: bool) -> Self {
        self.validate_hidden = validate_hidden;
        self
    }

    /// With submit blocking while async validation runs
    #[inline]
    #[must_use]
    pub fn with_block_submit_while_pending(mut self, block: bool) -> Self {
        self.block_submit_while_pending = block;
        self
    }
}

impl Default for FormConfig {
    fn default() -> Self {
        Self {
            validate_on: ValidateOn::Blur,
            validate_hidden: false,
            block_submit_while_pending: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = FormConfig::new();
        assert_eq!(config.validate_on, ValidateOn::Blur);
        assert!(!config.validate_hidden);
        assert!(config.block_submit_while_pending);
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = FormConfig::from_toml_str("validate_on = \"change\"\n").unwrap();
        assert_eq!(config.validate_on, ValidateOn::Change);
        assert!(config.block_submit_while_pending);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let err = FormConfig::from_toml_str("validate_on = \"sometimes\"").unwrap_err();
        assert!(matches!(err, FormError::InvalidConfig(_)));
    }

    #[test]
    fn builders() {
        let config = FormConfig::new()
            .with_validate_on(ValidateOn::Submit)
            .with_validate_hidden(true)
            .with_block_submit_while_pending(false);
        assert_eq!(
            config,
            FormConfig {
                validate_on: ValidateOn::Submit,
                validate_hidden: true,
                block_submit_while_pending: false,
            }
        );
    }
}
