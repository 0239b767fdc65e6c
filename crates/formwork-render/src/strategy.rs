//! Rendering strategy trait and render output
//!
//! A [`RenderStrategy`] turns one field into a headless [`RenderedField`]:
//! the widget to use plus everything that widget needs to draw itself.

use formwork_schema::{ConfigError, FieldDescriptor, FieldKind, FieldPath, SelectOption};
use formwork_store::ValueStore;
use indexmap::IndexMap;
use serde::Serialize;
use serde_json::Value;

/// Everything a strategy may look at while rendering one field
pub struct RenderContext<'a> {
    /// Concrete path of the field
    pub path: &'a FieldPath,

    /// Field configuration
    pub descriptor: &'a FieldDescriptor,

    /// Store holding the field's value
    pub store: &'a dyn ValueStore,
}

impl RenderContext<'_> {
    /// Current value at the field's path, `null` when absent
    #[inline]
    #[must_use]
    pub fn value(&self) -> Value {
        self.store.get(self.path).unwrap_or(Value::Null)
    }
}

/// Headless description of a rendered control
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedField {
    /// Concrete path the control reads and writes
    pub path: FieldPath,

    /// Descriptor kind
    pub kind: FieldKind,

    /// Widget chosen by the strategy
    pub widget: String,

    /// Label
    pub label: Option<String>,

    /// Help text
    pub description: Option<String>,

    /// Placeholder
    pub placeholder: Option<String>,

    /// Current value
    pub value: Value,

    /// Choices for select-like widgets
    pub options: Vec<SelectOption>,

    /// Kind-specific attributes
    pub attributes: IndexMap<String, Value>,

    /// Whether a value is required
    pub required: bool,

    /// Message to show next to the control
    pub error: Option<String>,
}

impl RenderedField {
    /// Build output from the context, copying descriptor metadata
    #[must_use]
    pub fn from_context(ctx: &RenderContext<'_>, widget: impl Into<String>) -> Self {
        let descriptor = ctx.descriptor;
        Self {
            path: ctx.path.clone(),
            kind: descriptor.kind.clone(),
            widget: widget.into(),
            label: descriptor.label.clone(),
            description: descriptor.description.clone(),
            placeholder: descriptor.placeholder.clone(),
            value: ctx.value(),
            options: descriptor.options.clone(),
            attributes: descriptor.attributes.clone(),
            required: descriptor.is_required(),
            error: None,
        }
    }
}

/// Strategy that renders one field kind
///
/// Closures with the `render` signature implement this trait.
pub trait RenderStrategy: Send + Sync {
    /// Render the field described by `ctx`
    ///
    /// # Errors
    /// Strategy-specific failures, reported as [`RenderError::Strategy`]
    fn render(&self, ctx: &RenderContext<'_>) -> Result<RenderedField, RenderError>;

    /// Strategy name (for debugging)
    fn name(&self) -> &str {
        "custom"
    }
}

impl<F> RenderStrategy for F
where
    F: Fn(&RenderContext<'_>) -> Result<RenderedField, RenderError> + Send + Sync,
{
    fn render(&self, ctx: &RenderContext<'_>) -> Result<RenderedField, RenderError> {
        self(ctx)
    }
}

/// Built-in strategy: a fixed widget name plus descriptor metadata
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WidgetStrategy {
    widget: &'static str,
}

impl WidgetStrategy {
    /// Create strategy for a widget
    #[inline]
    #[must_use]
    pub const fn new(widget: &'static str) -> Self {
        Self { widget }
    }

    /// Widget name
    #[inline]
    #[must_use]
    pub const fn widget(&self) -> &'static str {
        self.widget
    }
}

impl RenderStrategy for WidgetStrategy {
    fn render(&self, ctx: &RenderContext<'_>) -> Result<RenderedField, RenderError> {
        Ok(RenderedField::from_context(ctx, self.widget))
    }

    fn name(&self) -> &str {
        self.widget
    }
}

/// Rendering error
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    /// Schema problem found while rendering
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Strategy reported a failure
    #[error("strategy '{strategy}' failed at '{path}': {message}")]
    Strategy {
        /// Strategy name
        strategy: String,
        /// Field being rendered
        path: FieldPath,
        /// What went wrong
        message: String,
    },
}

impl RenderError {
    /// Check if this is a configuration error
    #[inline]
    #[must_use]
    pub fn is_config(&self) -> bool {
        matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_store::MemoryStore;
    use serde_json::json;

    #[test]
    fn widget_strategy_copies_metadata_and_value() {
        let store = MemoryStore::with_values(json!({"title": "Quarterly report"}));
        let path = FieldPath::single("title");
        let descriptor = FieldDescriptor::text_input("Title")
            .with_placeholder("Name it")
            .required();
        let ctx = RenderContext {
            path: &path,
            descriptor: &descriptor,
            store: &store,
        };

        let rendered = WidgetStrategy::new("text-field").render(&ctx).unwrap();
        assert_eq!(rendered.widget, "text-field");
        assert_eq!(rendered.label.as_deref(), Some("Title"));
        assert_eq!(rendered.placeholder.as_deref(), Some("Name it"));
        assert_eq!(rendered.value, json!("Quarterly report"));
        assert!(rendered.required);
        assert!(rendered.error.is_none());
    }

    #[test]
    fn closures_are_strategies() {
        let store = MemoryStore::new();
        let path = FieldPath::single("title");
        let descriptor = FieldDescriptor::text_input("Title");
        let ctx = RenderContext {
            path: &path,
            descriptor: &descriptor,
            store: &store,
        };

        let strategy = |ctx: &RenderContext<'_>| Ok(RenderedField::from_context(ctx, "rich-text"));
        let rendered = strategy.render(&ctx).unwrap();
        assert_eq!(rendered.widget, "rich-text");
        assert_eq!(rendered.value, Value::Null);
        assert_eq!(RenderStrategy::name(&strategy), "custom");
    }
}
