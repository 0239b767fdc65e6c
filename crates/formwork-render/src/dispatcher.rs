//! Field dispatch
//!
//! The [`Dispatcher`] decides whether a field is rendered at all and, if so,
//! which strategy renders it. Lookup order is per-form overrides first, then
//! the shared default registry.

use crate::registry::RendererRegistry;
use crate::strategy::{RenderContext, RenderError, RenderStrategy, RenderedField};
use formwork_schema::{
    ConfigError, FieldDescriptor, FieldKind, FieldPath, KindCatalog, VisibilityScope,
};
use formwork_store::ValueStore;
use std::sync::Arc;

/// Kind → strategy dispatch for one form
#[derive(Debug, Clone)]
pub struct Dispatcher {
    defaults: Arc<RendererRegistry>,
    overrides: RendererRegistry,
}

impl Dispatcher {
    /// Create dispatcher over a shared default registry
    #[must_use]
    pub fn new(defaults: Arc<RendererRegistry>) -> Self {
        Self {
            defaults,
            overrides: RendererRegistry::new(),
        }
    }

    /// Create dispatcher over the built-in widgets
    #[must_use]
    pub fn with_defaults() -> Self {
        Self::new(Arc::new(RendererRegistry::with_defaults()))
    }

    /// Override (or add) the strategy for a kind in this form only
    #[must_use]
    pub fn with_override(mut self, kind: FieldKind, strategy: impl RenderStrategy + 'static) -> Self {
        self.overrides.register(kind, strategy);
        self
    }

    /// Per-form overrides
    #[inline]
    #[must_use]
    pub fn overrides(&self) -> &RendererRegistry {
        &self.overrides
    }

    /// Shared default registry
    #[inline]
    #[must_use]
    pub fn defaults(&self) -> &Arc<RendererRegistry> {
        &self.defaults
    }

    /// Strategy for a kind, overrides first
    #[must_use]
    pub fn strategy_for(&self, kind: &FieldKind) -> Option<&Arc<dyn RenderStrategy>> {
        self.overrides.get(kind).or_else(|| self.defaults.get(kind))
    }

    /// Evaluate a field's visibility against its scope
    ///
    /// Hidden fields are never visible. A failing predicate hides the field
    /// and is logged.
    #[must_use]
    pub fn is_visible(
        &self,
        path: &FieldPath,
        descriptor: &FieldDescriptor,
        scope: &VisibilityScope<'_>,
    ) -> bool {
        if descriptor.kind == FieldKind::Hidden {
            return false;
        }
        let Some(condition) = &descriptor.visible_when else {
            return true;
        };
        match condition.evaluate(scope) {
            Ok(visible) => visible,
            Err(e) => {
                tracing::warn!(path = %path, error = %e, "visibility predicate failed, hiding field");
                false
            }
        }
    }

    /// Render one field
    ///
    /// `scope` is what visibility is evaluated against. Returns
    /// `None` for hidden and invisible fields.
    ///
    /// # Errors
    /// - [`ConfigError::UnknownKind`] if no strategy handles the kind
    /// - Whatever the strategy itself reports
    pub fn render(
        &self,
        path: &FieldPath,
        descriptor: &FieldDescriptor,
        scope: &VisibilityScope<'_>,
        store: &dyn ValueStore,
    ) -> Result<Option<RenderedField>, RenderError> {
        if !self.is_visible(path, descriptor, scope) {
            return Ok(None);
        }

        let strategy = self
            .strategy_for(&descriptor.kind)
            .ok_or_else(|| ConfigError::UnknownKind {
                path: path.clone(),
                kind: descriptor.kind.to_string(),
            })?;

        let ctx = RenderContext {
            path,
            descriptor,
            store,
        };
        strategy.render(&ctx).map(Some)
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl KindCatalog for Dispatcher {
    fn knows(&self, kind: &FieldKind) -> bool {
        self.overrides.contains(kind) || self.defaults.knows(kind)
    }
}
