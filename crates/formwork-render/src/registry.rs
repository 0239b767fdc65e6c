//! Renderer registry
//!
//! Provides [`RendererRegistry`], the mapping from field kind to rendering
//! strategy.

use crate::strategy::{RenderStrategy, WidgetStrategy};
use formwork_schema::{FieldKind, KindCatalog};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Widget used by the default registry for a kind
///
/// `hidden` has no widget: hidden fields are never rendered.
#[must_use]
pub fn default_widget(kind: &FieldKind) -> Option<&'static str> {
    match kind {
        FieldKind::Hidden | FieldKind::Custom(_) => None,
        FieldKind::TextInput => Some("text-field"),
        FieldKind::Password => Some("password-field"),
        FieldKind::Textarea => Some("text-area"),
        FieldKind::Select => Some("select"),
        FieldKind::Checkbox => Some("checkbox"),
        FieldKind::Date => Some("date-picker"),
        FieldKind::DateRange => Some("date-range-picker"),
        FieldKind::RemoteOptionSelector => Some("option-selector"),
        FieldKind::Markdown => Some("markdown-editor"),
    }
}

/// Registry of rendering strategies keyed by field kind
#[derive(Default, Clone)]
pub struct RendererRegistry {
    strategies: HashMap<FieldKind, Arc<dyn RenderStrategy>>,
}

impl RendererRegistry {
    /// Create new empty registry
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            strategies: HashMap::new(),
        }
    }

    /// Create registry with a strategy for every renderable built-in kind
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        for kind in FieldKind::BUILTIN {
            if let Some(widget) = default_widget(&kind) {
                registry.register(kind, WidgetStrategy::new(widget));
            }
        }
        registry
    }

    /// Register (or replace) the strategy for a kind
    pub fn register(&mut self, kind: FieldKind, strategy: impl RenderStrategy + 'static) {
        self.strategies.insert(kind, Arc::new(strategy));
    }

    /// Register an already shared strategy
    pub fn register_shared(&mut self, kind: FieldKind, strategy: Arc<dyn RenderStrategy>) {
        self.strategies.insert(kind, strategy);
    }

    /// Strategy for a kind
    #[inline]
    #[must_use]
    pub fn get(&self, kind: &FieldKind) -> Option<&Arc<dyn RenderStrategy>> {
        self.strategies.get(kind)
    }

    /// Check if a strategy is registered for a kind
    #[inline]
    #[must_use]
    pub fn contains(&self, kind: &FieldKind) -> bool {
        self.strategies.contains_key(kind)
    }

    /// Remove the strategy for a kind
    #[inline]
    pub fn remove(&mut self, kind: &FieldKind) -> bool {
        self.strategies.remove(kind).is_some()
    }

    /// Registered kinds, sorted
    #[must_use]
    pub fn kinds(&self) -> Vec<&FieldKind> {
        let mut kinds: Vec<_> = self.strategies.keys().collect();
        kinds.sort();
        kinds
    }

    /// Number of registered strategies
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.strategies.len()
    }

    /// Check if registry is empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}

impl fmt::Debug for RendererRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map()
            .entries(
                self.kinds()
                    .into_iter()
                    .map(|kind| (kind.tag(), self.strategies[kind].name())),
            )
            .finish()
    }
}

impl KindCatalog for RendererRegistry {
    fn knows(&self, kind: &FieldKind) -> bool {
        *kind == FieldKind::Hidden || self.contains(kind)
    }
}
