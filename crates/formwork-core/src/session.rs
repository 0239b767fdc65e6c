//! Form session
//!
//! A [`FormSession`] is one mounted form: a resolved schema, the value store
//! it edits, a dispatcher and one [`FieldArrayManager`] per array reachable
//! in the current values. Array managers are keyed by concrete path, so an
//! array nested inside `requests.1` is a different manager from the one
//! inside `requests.0`.

use crate::config::{FormConfig, ValidateOn};
use crate::error::FormError;
use crate::output::{RenderedArray, RenderedForm, RenderedItem, RenderedNode, Submission};
use formwork_array::{FieldArrayManager, ItemId, Removal};
use formwork_render::{validate_field, Dispatcher, RenderedField, Settlement, ValidationTracker};
use formwork_schema::{
    resolve_with, ArrayNames, ConfigError, FieldArrayDescriptor, FieldDescriptor, FieldGroup,
    FieldNameNode, FieldPath, SchemaNode, VisibilityScope,
};
use formwork_store::ValueStore;
use futures::future::BoxFuture;
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::sync::Arc;
use uuid::Uuid;

/// One concrete leaf and the innermost item enclosing it
struct Leaf<'a> {
    path: FieldPath,
    descriptor: &'a FieldDescriptor,
    item: Option<FieldPath>,
}

impl Leaf<'_> {
    fn scope<'v>(&self, values: &'v Value) -> VisibilityScope<'v> {
        item_scope(values, self.item.as_ref())
    }
}

/// Scope over `values`, inside the item at `item` if there is one
fn item_scope<'v>(values: &'v Value, item: Option<&FieldPath>) -> VisibilityScope<'v> {
    let scope = VisibilityScope::new(values);
    match item.and_then(|path| path.lookup(values)) {
        Some(item) => scope.with_item(item),
        None => scope,
    }
}

/// A mounted form
pub struct FormSession {
    id: Uuid,
    schema: Arc<FieldGroup>,
    names: FieldNameNode,
    store: Arc<dyn ValueStore>,
    dispatcher: Dispatcher,
    config: FormConfig,
    arrays: BTreeMap<FieldPath, FieldArrayManager>,
    validation: Arc<ValidationTracker>,
}

impl FormSession {
    /// Mount a form over a store
    ///
    /// Resolves the schema (checking kinds against the dispatcher), seeds
    /// absent leaf defaults and initializes every reachable array.
    ///
    /// # Errors
    /// [`FormError::Config`] if the schema does not resolve
    pub fn mount(
        schema: FieldGroup,
        store: Arc<dyn ValueStore>,
        dispatcher: Dispatcher,
        config: FormConfig,
    ) -> Result<Self, FormError> {
        let id = Uuid::new_v4();
        let names = resolve_with(&schema, &dispatcher).map_err(|e| {
            tracing::error!(form = %id, error = %e, "schema failed to resolve");
            e
        })?;

        let mut session = Self {
            id,
            schema: Arc::new(schema),
            names,
            store,
            dispatcher,
            config,
            arrays: BTreeMap::new(),
            validation: Arc::new(ValidationTracker::new()),
        };

        let schema = Arc::clone(&session.schema);
        session.seed_defaults(&schema, &FieldPath::root());
        session.sync_arrays();

        tracing::info!(
            form = %session.id,
            fields = session.names.leaves().len(),
            arrays = session.arrays.len(),
            "form mounted"
        );
        Ok(session)
    }

    /// Session id
    #[inline]
    #[must_use]
    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Schema being edited
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &FieldGroup {
        &self.schema
    }

    /// Resolved field names
    #[inline]
    #[must_use]
    pub fn names(&self) -> &FieldNameNode {
        &self.names
    }

    /// Backing value store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<dyn ValueStore> {
        &self.store
    }

    /// Form configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &FormConfig {
        &self.config
    }

    /// Validation state
    #[inline]
    #[must_use]
    pub fn validation(&self) -> &Arc<ValidationTracker> {
        &self.validation
    }

    /// Manager of the array at a concrete path
    #[must_use]
    pub fn array(&self, path: &FieldPath) -> Option<&FieldArrayManager> {
        self.arrays.get(path)
    }

    /// Paths of every mounted array
    pub fn array_paths(&self) -> impl Iterator<Item = &FieldPath> {
        self.arrays.keys()
    }

    /// Append an item to an array
    ///
    /// `Ok(None)` when the array is already at `max_items`.
    ///
    /// # Errors
    /// [`FormError::UnknownArray`] if no array is mounted at `path`
    pub fn add_item(&mut self, path: &FieldPath) -> Result<Option<ItemId>, FormError> {
        let added = self.manager_mut(path)?.add();
        if added.is_some() {
            self.sync_arrays();
        }
        Ok(added)
    }

    /// Remove an item, or reset it when the array is at `min_items`
    ///
    /// # Errors
    /// [`FormError::UnknownArray`] if no array is mounted at `path`
    pub fn remove_item(&mut self, path: &FieldPath, id: ItemId) -> Result<Removal, FormError> {
        let manager = self.manager_mut(path)?;
        manager.reconcile();
        let before = manager.len();
        let removal = manager.remove(id);
        match removal {
            Removal::Removed { index } => self.invalidate_items(path, index, before),
            Removal::Reset { index } => self.invalidate_items(path, index, index + 1),
            Removal::NotFound => return Ok(removal),
        }
        self.sync_arrays();
        Ok(removal)
    }

    /// Reorder an item within an array
    ///
    /// # Errors
    /// [`FormError::UnknownArray`] if no array is mounted at `path`
    pub fn move_item(&mut self, path: &FieldPath, from: usize, to: usize) -> Result<bool, FormError> {
        let moved = self.manager_mut(path)?.move_item(from, to);
        if moved && from != to {
            self.invalidate_items(path, from.min(to), from.max(to) + 1);
            self.sync_arrays();
        }
        Ok(moved)
    }

    /// Flip an accordion item's expansion
    ///
    /// # Errors
    /// [`FormError::UnknownArray`] if no array is mounted at `path`
    pub fn toggle_item(&mut self, path: &FieldPath, id: ItemId) -> Result<bool, FormError> {
        Ok(self.manager_mut(path)?.toggle(id))
    }

    /// Write a value at a path the schema knows
    ///
    /// Re-checks the field's rules when validating on change. A write that
    /// replaces an array, or anything containing one, is adopted by the
    /// affected array managers right away: new items get ids, vanished
    /// items lose theirs, and validation state beneath the write is reset.
    ///
    /// # Errors
    /// [`FormError::UnknownField`] if no schema node addresses `path`
    pub fn set_value(&mut self, path: &FieldPath, value: Value) -> Result<(), FormError> {
        let node = self
            .schema
            .node_at(path)
            .ok_or_else(|| FormError::UnknownField(path.clone()))?;

        let replaces_array = self.arrays.keys().any(|array| path.is_prefix_of(array));
        if replaces_array {
            self.validation.clear_prefix(path);
        }
        if let (ValidateOn::Change, SchemaNode::Field(descriptor)) = (self.config.validate_on, node) {
            self.validation
                .set_sync(path, validate_field(descriptor, &value));
        }
        let restructures = replaces_array || self.writes_past_end(path);
        self.store.set(path, value);

        if restructures {
            tracing::debug!(form = %self.id, path = %path, "array replaced, re-adopting items");
            self.sync_arrays();
        }
        Ok(())
    }

    /// Current value at a path
    #[must_use]
    pub fn value(&self, path: &FieldPath) -> Option<Value> {
        self.store.get(path)
    }

    /// Displayed message for a field
    #[must_use]
    pub fn error(&self, path: &FieldPath) -> Option<String> {
        self.validation.error(path)
    }

    /// Check a field's rules now and record the result
    ///
    /// Returns the message now displayed for the field.
    ///
    /// # Errors
    /// [`FormError::UnknownField`] if `path` is not a leaf of the schema
    pub fn validate_field(&self, path: &FieldPath) -> Result<Option<String>, FormError> {
        let descriptor = self.descriptor(path)?;
        let value = self.store.get(path).unwrap_or(Value::Null);
        self.validation
            .set_sync(path, validate_field(descriptor, &value));
        Ok(self.validation.error(path))
    }

    /// Start the field's async validator on its current value
    ///
    /// The invocation is registered before this returns; a later call for
    /// the same path supersedes it. `Ok(None)` if the field has no async
    /// validator.
    ///
    /// # Errors
    /// [`FormError::UnknownField`] if `path` is not a leaf of the schema
    pub fn validate_field_async(
        &self,
        path: &FieldPath,
    ) -> Result<Option<BoxFuture<'static, Settlement>>, FormError> {
        let descriptor = self.descriptor(path)?;
        let Some(validator) = &descriptor.async_validate else {
            return Ok(None);
        };
        let value = self.store.get(path).unwrap_or(Value::Null);
        Ok(Some(self.validation.start(path.clone(), value, validator.get())))
    }

    /// Validate every field and snapshot the values for submission
    ///
    /// Fields that are not rendered are skipped, and their messages
    /// dropped, unless `validate_hidden` is set. Their values are still
    /// submitted.
    #[must_use]
    pub fn submission(&self) -> Submission {
        let snapshot = self.store.get_all();
        for leaf in self.leaves() {
            let validated = self.config.validate_hidden
                || self
                    .dispatcher
                    .is_visible(&leaf.path, leaf.descriptor, &leaf.scope(&snapshot));
            if validated {
                let value = self.store.get(&leaf.path).unwrap_or(Value::Null);
                self.validation
                    .set_sync(&leaf.path, validate_field(leaf.descriptor, &value));
            } else {
                self.validation.clear(&leaf.path);
            }
        }

        let pending = self.validation.any_pending();
        let errors = self.validation.errors();
        let valid = errors.is_empty() && !(pending && self.config.block_submit_while_pending);
        tracing::debug!(form = %self.id, valid, pending, errors = errors.len(), "submission built");

        Submission {
            values: self.store.get_all(),
            valid,
            pending,
            errors,
        }
    }

    /// Render the form
    ///
    /// Consumes pending focus requests: after an item is added to an
    /// accordion, the first rendered field inside it is reported as
    /// `focus` once.
    ///
    /// # Errors
    /// Configuration and strategy errors from rendering
    pub fn render(&mut self) -> Result<RenderedForm, FormError> {
        self.sync_arrays();

        let focus_items: Vec<FieldPath> = self
            .arrays
            .values_mut()
            .filter_map(|manager| {
                let id = manager.take_focus_request()?;
                manager.path_of(id)
            })
            .collect();

        let snapshot = self.store.get_all();
        let scope = VisibilityScope::new(&snapshot);
        let nodes = self.render_group(&self.schema, &self.names, &FieldPath::root(), scope)?;
        let mut form = RenderedForm {
            form_id: self.id,
            nodes,
            focus: None,
        };
        form.focus = form
            .fields()
            .into_iter()
            .find(|field| focus_items.iter().any(|item| item.is_prefix_of(&field.path)))
            .map(|field| field.path.clone());
        Ok(form)
    }

    /// Tear down the session
    pub fn unmount(self) {
        tracing::info!(form = %self.id, arrays = self.arrays.len(), "form unmounted");
    }

    fn descriptor(&self, path: &FieldPath) -> Result<&FieldDescriptor, FormError> {
        self.schema
            .descriptor_at(path)
            .ok_or_else(|| FormError::UnknownField(path.clone()))
    }

    fn manager_mut(&mut self, path: &FieldPath) -> Result<&mut FieldArrayManager, FormError> {
        self.arrays
            .get_mut(path)
            .ok_or_else(|| FormError::UnknownArray(path.clone()))
    }

    /// Check if `path` addresses an item beyond the end of a mounted array
    fn writes_past_end(&self, path: &FieldPath) -> bool {
        self.arrays.iter().any(|(array, manager)| {
            array.is_ancestor_of(path)
                && path.segments()[array.len()]
                    .as_index()
                    .is_some_and(|index| index >= manager.len())
        })
    }

    fn seed_defaults(&self, group: &FieldGroup, prefix: &FieldPath) {
        for (name, node) in group.iter() {
            let path = prefix.child(name);
            match node {
                SchemaNode::Field(field) => {
                    if let Some(default) = &field.default {
                        if self.store.get(&path).is_none() {
                            self.store.set(&path, default.clone());
                        }
                    }
                }
                SchemaNode::Group(child) => self.seed_defaults(child, &path),
                // Items are seeded from the array's default item
                SchemaNode::Array(_) => {}
            }
        }
    }

    /// Drop state tied to item positions `start..end` of an array
    ///
    /// Nested managers and validation slots under those items no longer
    /// match the values at their paths.
    fn invalidate_items(&mut self, array: &FieldPath, start: usize, end: usize) {
        for index in start..end {
            let item = array.index(index);
            self.arrays.retain(|path, _| !item.is_ancestor_of(path));
            self.validation.clear_prefix(&item);
        }
    }

    /// Create and initialize a manager for every reachable array, and drop
    /// managers whose array is no longer reachable
    fn sync_arrays(&mut self) {
        let schema = Arc::clone(&self.schema);
        let mut live = BTreeSet::new();
        self.sync_group(&schema, &FieldPath::root(), &mut live);
        self.arrays.retain(|path, _| live.contains(path));
    }

    fn sync_group(&mut self, group: &FieldGroup, prefix: &FieldPath, live: &mut BTreeSet<FieldPath>) {
        for (name, node) in group.iter() {
            let path = prefix.child(name);
            match node {
                SchemaNode::Field(_) => {}
                SchemaNode::Group(child) => self.sync_group(child, &path, live),
                SchemaNode::Array(array) => self.sync_array(array, path, live),
            }
        }
    }

    fn sync_array(
        &mut self,
        array: &FieldArrayDescriptor,
        path: FieldPath,
        live: &mut BTreeSet<FieldPath>,
    ) {
        let store = &self.store;
        let manager = self.arrays.entry(path.clone()).or_insert_with(|| {
            tracing::debug!(path = %path, "mounting array");
            FieldArrayManager::new(path.clone(), array, Arc::clone(store))
        });
        manager.initialize();
        let len = manager.len();

        if let Some(SchemaNode::Group(template)) = array.item_template() {
            for index in 0..len {
                self.sync_group(template, &path.index(index), live);
            }
        }
        live.insert(path);
    }

    /// Every concrete leaf of the mounted arrays and groups
    fn leaves(&self) -> Vec<Leaf<'_>> {
        let mut out = Vec::new();
        self.collect_leaves(&self.schema, &self.names, &FieldPath::root(), None, &mut out);
        out
    }

    fn collect_leaves<'a>(
        &self,
        group: &'a FieldGroup,
        names: &FieldNameNode,
        prefix: &FieldPath,
        item: Option<&FieldPath>,
        out: &mut Vec<Leaf<'a>>,
    ) {
        for (name, node) in group.iter() {
            let Some(child) = names.get(name) else {
                continue;
            };
            match (node, child) {
                (SchemaNode::Field(descriptor), FieldNameNode::Leaf(relative)) => out.push(Leaf {
                    path: prefix.join(relative),
                    descriptor,
                    item: item.cloned(),
                }),
                (SchemaNode::Group(inner), _) => {
                    self.collect_leaves(inner, child, prefix, item, out);
                }
                (SchemaNode::Array(array), FieldNameNode::Array(array_names)) => {
                    self.collect_array_leaves(array, array_names, prefix, out);
                }
                _ => {}
            }
        }
    }

    fn collect_array_leaves<'a>(
        &self,
        array: &'a FieldArrayDescriptor,
        names: &ArrayNames,
        prefix: &FieldPath,
        out: &mut Vec<Leaf<'a>>,
    ) {
        let path = prefix.join(&names.field_name);
        let Some(manager) = self.arrays.get(&path) else {
            return;
        };
        for index in 0..manager.len() {
            let item = prefix.join(&names.item_path(index));
            match (array.item_template(), names.fields.as_ref()) {
                (Some(SchemaNode::Field(descriptor)), FieldNameNode::Leaf(relative)) => {
                    out.push(Leaf {
                        path: item.join(relative),
                        descriptor,
                        item: Some(item.clone()),
                    });
                }
                (Some(SchemaNode::Group(template)), fields) => {
                    self.collect_leaves(template, fields, &item, Some(&item), out);
                }
                _ => {}
            }
        }
    }

    fn render_group(
        &self,
        group: &FieldGroup,
        names: &FieldNameNode,
        prefix: &FieldPath,
        scope: VisibilityScope<'_>,
    ) -> Result<Vec<RenderedNode>, FormError> {
        let mut nodes = Vec::with_capacity(group.len());
        for (name, node) in group.iter() {
            let Some(child) = names.get(name) else {
                continue;
            };
            let rendered = match (node, child) {
                (SchemaNode::Field(descriptor), FieldNameNode::Leaf(relative)) => self
                    .render_leaf(&prefix.join(relative), descriptor, &scope)?
                    .map(RenderedNode::Field),
                (SchemaNode::Group(inner), _) => Some(RenderedNode::Group {
                    name: name.to_string(),
                    children: self.render_group(inner, child, prefix, scope)?,
                }),
                (SchemaNode::Array(array), FieldNameNode::Array(array_names)) => Some(
                    RenderedNode::Array(self.render_array(array, array_names, prefix, scope.values())?),
                ),
                _ => None,
            };
            nodes.extend(rendered);
        }
        Ok(nodes)
    }

    fn render_array(
        &self,
        array: &FieldArrayDescriptor,
        names: &ArrayNames,
        prefix: &FieldPath,
        values: &Value,
    ) -> Result<RenderedArray, FormError> {
        let path = prefix.join(&names.field_name);
        let manager = self
            .arrays
            .get(&path)
            .ok_or_else(|| FormError::UnknownArray(path.clone()))?;
        let template = array
            .item_template()
            .ok_or_else(|| ConfigError::MissingItemTemplate { path: path.clone() })?;

        let mut items = Vec::with_capacity(manager.len());
        for (index, id) in manager.items().iter().enumerate() {
            let item_path = prefix.join(&names.item_path(index));
            let scope = item_scope(values, Some(&item_path));
            let children = match (template, names.fields.as_ref()) {
                (SchemaNode::Field(descriptor), FieldNameNode::Leaf(relative)) => self
                    .render_leaf(&item_path.join(relative), descriptor, &scope)?
                    .map(RenderedNode::Field)
                    .into_iter()
                    .collect(),
                (SchemaNode::Group(group), fields) => {
                    self.render_group(group, fields, &item_path, scope)?
                }
                _ => Vec::new(),
            };
            items.push(RenderedItem {
                id: *id,
                index,
                path: item_path,
                expanded: manager.is_expanded(*id),
                children,
            });
        }

        Ok(RenderedArray {
            path,
            label: array.label.clone(),
            layout: array.layout,
            items,
            can_add: manager.can_add(),
            can_remove: manager.can_remove(),
        })
    }

    fn render_leaf(
        &self,
        path: &FieldPath,
        descriptor: &FieldDescriptor,
        scope: &VisibilityScope<'_>,
    ) -> Result<Option<RenderedField>, FormError> {
        let rendered = self
            .dispatcher
            .render(path, descriptor, scope, self.store.as_ref())?;
        Ok(rendered.map(|mut field| {
            field.error = self.validation.error(path);
            field
        }))
    }
}

impl fmt::Debug for FormSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormSession")
            .field("id", &self.id)
            .field("config", &self.config)
            .field("arrays", &self.arrays.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
