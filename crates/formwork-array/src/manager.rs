//! Field array manager
//!
//! Keeps an ordered list of [`ItemId`]s in lockstep with the array stored at
//! one path. Ids drive expansion and focus; positions drive value paths.

use crate::accordion::AccordionState;
use crate::id::{IdAllocator, ItemId};
use formwork_schema::{ArrayLayout, FieldArrayDescriptor, FieldPath};
use formwork_store::ValueStore;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Presentation variant and its state
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Presentation {
    /// All items always visible
    List,
    /// Individually collapsible items
    Accordion(AccordionState),
}

impl Presentation {
    fn for_layout(layout: ArrayLayout) -> Self {
        match layout {
            ArrayLayout::List => Self::List,
            ArrayLayout::Accordion => Self::Accordion(AccordionState::default()),
        }
    }
}

/// Outcome of [`FieldArrayManager::remove`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Removal {
    /// Item deleted; later items shifted down
    Removed {
        /// Former position
        index: usize,
    },
    /// Array at its minimum, item value reset to the default instead
    Reset {
        /// Position of the reset item
        index: usize,
    },
    /// No item with that id
    NotFound,
}

impl Removal {
    /// Position affected, if any
    #[inline]
    #[must_use]
    pub fn index(self) -> Option<usize> {
        match self {
            Self::Removed { index } | Self::Reset { index } => Some(index),
            Self::NotFound => None,
        }
    }
}

/// Stateful controller for one repeating group
pub struct FieldArrayManager {
    field_name: FieldPath,
    min_items: usize,
    max_items: Option<usize>,
    default_item: Value,
    store: Arc<dyn ValueStore>,
    items: Vec<ItemId>,
    ids: IdAllocator,
    presentation: Presentation,
    initialized: bool,
}

impl FieldArrayManager {
    /// Create manager for the array at `field_name`
    ///
    /// Nothing is written until [`initialize`](Self::initialize).
    #[must_use]
    pub fn new(
        field_name: FieldPath,
        descriptor: &FieldArrayDescriptor,
        store: Arc<dyn ValueStore>,
    ) -> Self {
        Self {
            field_name,
            min_items: descriptor.min_items,
            max_items: descriptor.max_items,
            default_item: descriptor.default_item_value(),
            store,
            items: Vec::new(),
            ids: IdAllocator::default(),
            presentation: Presentation::for_layout(descriptor.layout),
            initialized: false,
        }
    }

    /// Adopt items already in the store, then pad up to `min_items`
    ///
    /// Safe to call again at any time: later calls reconcile with values
    /// written to the store behind the manager's back (see
    /// [`reconcile`](Self::reconcile)). Only the first call expands the
    /// only item of an accordion.
    pub fn initialize(&mut self) {
        let first = !self.initialized;
        self.initialized = true;
        self.reconcile();

        if first {
            if let (Presentation::Accordion(state), [only]) =
                (&mut self.presentation, self.items.as_slice())
            {
                state.expand(*only);
            }
            tracing::debug!(path = %self.field_name, items = self.items.len(), "array initialized");
        }
    }

    /// Bring tracked items in step with the stored array and return its items
    ///
    /// Stored items beyond the tracked ones are adopted with fresh ids;
    /// tracked items whose position no longer exists are dropped. Stored
    /// values are never truncated. A short array is padded to `min_items`.
    /// Adopted data above `max_items` is kept: `add` stays refused until
    /// removals bring the count back under the limit.
    pub fn reconcile(&mut self) -> Vec<Value> {
        let mut values = self.store.get_array(&self.field_name);
        let stored = values.len();
        let tracked = self.items.len();

        if stored > tracked {
            for _ in tracked..stored {
                let id = self.ids.issue();
                self.items.push(id);
            }
        } else if stored < tracked {
            for id in self.items.drain(stored..) {
                if let Presentation::Accordion(state) = &mut self.presentation {
                    state.forget(id);
                }
            }
        }
        if stored != tracked {
            tracing::debug!(path = %self.field_name, stored, tracked, "adopted stored items");
            if let Some(max) = self.max_items.filter(|max| stored > *max) {
                tracing::warn!(
                    path = %self.field_name,
                    stored,
                    max,
                    "stored array exceeds max_items; adding is disabled until items are removed"
                );
            }
        }

        if values.len() < self.min_items {
            let missing = self.min_items - values.len();
            values.extend(std::iter::repeat(self.default_item.clone()).take(missing));
            for _ in 0..missing {
                let id = self.ids.issue();
                self.items.push(id);
            }
            self.store.set(&self.field_name, Value::Array(values.clone()));
        }
        values
    }

    /// Append a default item
    ///
    /// Returns `None`, changing nothing, when the array is at `max_items`.
    pub fn add(&mut self) -> Option<ItemId> {
        let mut values = self.reconcile();
        if !self.can_add() {
            tracing::debug!(path = %self.field_name, "add ignored at max_items");
            return None;
        }

        values.push(self.default_item.clone());
        self.store.set(&self.field_name, Value::Array(values));

        let id = self.ids.issue();
        self.items.push(id);
        if let Presentation::Accordion(state) = &mut self.presentation {
            state.focus_new(id);
        }

        tracing::debug!(path = %self.field_name, id = %id, items = self.items.len(), "item added");
        Some(id)
    }

    /// Remove an item, or reset it when the array is at `min_items`
    pub fn remove(&mut self, id: ItemId) -> Removal {
        let mut values = self.reconcile();
        let Some(index) = self.index_of(id) else {
            return Removal::NotFound;
        };

        if let Presentation::Accordion(state) = &mut self.presentation {
            state.forget(id);
        }

        if self.items.len() > self.min_items {
            values.remove(index);
            self.store.set(&self.field_name, Value::Array(values));
            self.items.remove(index);
            tracing::debug!(path = %self.field_name, id = %id, index, "item removed");
            Removal::Removed { index }
        } else {
            self.store
                .set(&self.item_path(index), self.default_item.clone());
            tracing::debug!(path = %self.field_name, id = %id, index, "item reset at min_items");
            Removal::Reset { index }
        }
    }

    /// Move the item at `from` to position `to`, values included
    ///
    /// Returns `false` if either position is out of range.
    pub fn move_item(&mut self, from: usize, to: usize) -> bool {
        let mut values = self.reconcile();
        let len = self.items.len();
        if from >= len || to >= len {
            return false;
        }
        if from == to {
            return true;
        }

        let value = values.remove(from);
        values.insert(to, value);
        self.store.set(&self.field_name, Value::Array(values));

        let id = self.items.remove(from);
        self.items.insert(to, id);
        tracing::debug!(path = %self.field_name, id = %id, from, to, "item moved");
        true
    }

    /// Expand an item (accordion only)
    pub fn expand(&mut self, id: ItemId) -> bool {
        let known = self.index_of(id).is_some();
        match &mut self.presentation {
            Presentation::Accordion(state) if known => {
                state.expand(id);
                true
            }
            _ => false,
        }
    }

    /// Collapse an item (accordion only)
    pub fn collapse(&mut self, id: ItemId) -> bool {
        let known = self.index_of(id).is_some();
        match &mut self.presentation {
            Presentation::Accordion(state) if known => {
                state.collapse(id);
                true
            }
            _ => false,
        }
    }

    /// Flip an item's expansion (accordion only)
    pub fn toggle(&mut self, id: ItemId) -> bool {
        if self.is_expanded(id) {
            self.collapse(id)
        } else {
            self.expand(id)
        }
    }

    /// Check if an item is shown expanded
    ///
    /// Every item of a plain list counts as expanded.
    #[must_use]
    pub fn is_expanded(&self, id: ItemId) -> bool {
        match &self.presentation {
            Presentation::List => self.index_of(id).is_some(),
            Presentation::Accordion(state) => state.is_expanded(id),
        }
    }

    /// Take the item that should receive focus after this render
    ///
    /// Yields each newly added accordion item once.
    pub fn take_focus_request(&mut self) -> Option<ItemId> {
        match &mut self.presentation {
            Presentation::List => None,
            Presentation::Accordion(state) => state.take_focus(),
        }
    }

    /// Item ids in positional order
    #[inline]
    #[must_use]
    pub fn items(&self) -> &[ItemId] {
        &self.items
    }

    /// Number of items
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// Check if there are no items
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Current position of an item
    #[must_use]
    pub fn index_of(&self, id: ItemId) -> Option<usize> {
        self.items.iter().position(|item| *item == id)
    }

    /// Path of the item at `index`, e.g. `requests.1`
    #[inline]
    #[must_use]
    pub fn item_path(&self, index: usize) -> FieldPath {
        self.field_name.index(index)
    }

    /// Path of an item by id, using its current position
    #[must_use]
    pub fn path_of(&self, id: ItemId) -> Option<FieldPath> {
        self.index_of(id).map(|index| self.item_path(index))
    }

    /// Check if [`add`](Self::add) would append
    #[inline]
    #[must_use]
    pub fn can_add(&self) -> bool {
        self.max_items.map_or(true, |max| self.items.len() < max)
    }

    /// Check if [`remove`](Self::remove) would delete rather than reset
    #[inline]
    #[must_use]
    pub fn can_remove(&self) -> bool {
        self.items.len() > self.min_items
    }

    /// Path of the array value
    #[inline]
    #[must_use]
    pub fn field_name(&self) -> &FieldPath {
        &self.field_name
    }

    /// Lower bound on item count
    #[inline]
    #[must_use]
    pub fn min_items(&self) -> usize {
        self.min_items
    }

    /// Upper bound on item count
    #[inline]
    #[must_use]
    pub fn max_items(&self) -> Option<usize> {
        self.max_items
    }

    /// Value used for new and reset items
    #[inline]
    #[must_use]
    pub fn default_item(&self) -> &Value {
        &self.default_item
    }

    /// Presentation state
    #[inline]
    #[must_use]
    pub fn presentation(&self) -> &Presentation {
        &self.presentation
    }

    /// Check if [`initialize`](Self::initialize) has run
    #[inline]
    #[must_use]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }
}

impl fmt::Debug for FieldArrayManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldArrayManager")
            .field("field_name", &self.field_name)
            .field("min_items", &self.min_items)
            .field("max_items", &self.max_items)
            .field("items", &self.items)
            .field("presentation", &self.presentation)
            .field("initialized", &self.initialized)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_schema::{FieldDescriptor, FieldGroup};
    use formwork_store::MemoryStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn tags(min: usize, max: Option<usize>) -> FieldArrayDescriptor {
        let mut array = FieldArrayDescriptor::of(FieldDescriptor::text_input("Tag"))
            .min_items(min)
            .default_item(json!(""));
        array.max_items = max;
        array
    }

    fn manager(descriptor: &FieldArrayDescriptor, values: Value) -> (FieldArrayManager, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::with_values(values));
        let manager = FieldArrayManager::new(FieldPath::single("tags"), descriptor, store.clone());
        (manager, store)
    }

    #[test]
    fn initialize_pads_to_min_once() {
        let (mut tags, store) = manager(&tags(2, None), json!({}));
        tags.initialize();
        tags.initialize();
        assert_eq!(tags.len(), 2);
        assert_eq!(store.get_all(), json!({"tags": ["", ""]}));
    }

    #[test]
    fn initialize_adopts_existing_items() {
        let (mut tags, store) = manager(&tags(1, None), json!({"tags": ["a", "b", "c"]}));
        tags.initialize();
        assert_eq!(tags.len(), 3);
        assert_eq!(store.get_array(&FieldPath::single("tags")).len(), 3);
    }

    #[test]
    fn externally_grown_array_is_adopted_not_truncated() {
        let (mut tags, store) = manager(&tags(1, None), json!({}));
        tags.initialize();
        let first = tags.items()[0];

        store.set(&FieldPath::single("tags"), json!(["a", "b", "c"]));
        assert!(tags.add().is_some());
        assert_eq!(store.get_all(), json!({"tags": ["a", "b", "c", ""]}));
        assert_eq!(tags.len(), 4);
        assert_eq!(tags.items()[0], first);
    }

    #[test]
    fn externally_shrunk_array_drops_vanished_ids() {
        let (mut tags, store) = manager(&tags(1, None), json!({"tags": ["a", "b", "c"]}));
        tags.initialize();
        let c = tags.items()[2];

        store.set(&FieldPath::single("tags"), json!(["a"]));
        tags.reconcile();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags.remove(c), Removal::NotFound);
        assert_eq!(store.get_all(), json!({"tags": ["a"]}));

        store.set(&FieldPath::single("tags"), json!([]));
        assert_eq!(tags.reconcile(), vec![json!("")]);
        assert_eq!(tags.len(), 1);
    }

    #[test]
    fn adopted_overflow_blocks_add_until_removals_catch_up() {
        let (mut tags, store) = manager(&tags(0, Some(2)), json!({"tags": ["a", "b", "c", "d"]}));
        tags.initialize();
        assert_eq!(tags.len(), 4);
        assert!(!tags.can_add());
        assert_eq!(tags.add(), None);
        assert_eq!(store.get_array(&FieldPath::single("tags")).len(), 4);

        assert!(tags.can_remove());
        assert_eq!(tags.remove(tags.items()[3]), Removal::Removed { index: 3 });
        assert_eq!(tags.remove(tags.items()[2]), Removal::Removed { index: 2 });
        assert_eq!(tags.len(), 2);
        assert!(!tags.can_add());
        assert_eq!(tags.add(), None);

        assert_eq!(tags.remove(tags.items()[0]), Removal::Removed { index: 0 });
        assert!(tags.can_add());
        assert!(tags.add().is_some());
        assert_eq!(store.get_all(), json!({"tags": ["b", ""]}));
    }

    #[test]
    fn nothing_written_with_zero_min() {
        let (mut tags, store) = manager(&tags(0, None), json!({}));
        tags.initialize();
        assert!(tags.is_empty());
        assert_eq!(store.get_all(), json!({}));
    }

    #[test]
    fn add_respects_max() {
        let (mut tags, store) = manager(&tags(0, Some(1)), json!({}));
        tags.initialize();
        assert!(tags.add().is_some());
        assert!(!tags.can_add());
        assert_eq!(tags.add(), None);
        assert_eq!(store.get_all(), json!({"tags": [""]}));
    }

    #[test]
    fn remove_above_min_deletes_and_shifts() {
        let (mut tags, store) = manager(&tags(1, None), json!({"tags": ["a", "b", "c"]}));
        tags.initialize();
        let b = tags.items()[1];
        let c = tags.items()[2];

        assert_eq!(tags.remove(b), Removal::Removed { index: 1 });
        assert_eq!(store.get_all(), json!({"tags": ["a", "c"]}));
        assert_eq!(tags.path_of(c).unwrap().to_string(), "tags.1");
        assert_eq!(tags.remove(b), Removal::NotFound);
    }

    #[test]
    fn remove_at_min_resets_in_place() {
        let (mut tags, store) = manager(&tags(1, None), json!({"tags": ["keep me"]}));
        tags.initialize();
        let only = tags.items()[0];

        assert_eq!(tags.remove(only), Removal::Reset { index: 0 });
        assert_eq!(tags.items(), &[only]);
        assert_eq!(store.get_all(), json!({"tags": [""]}));
    }

    #[test]
    fn move_item_keeps_values_with_ids() {
        let (mut tags, store) = manager(&tags(0, None), json!({"tags": ["a", "b", "c"]}));
        tags.initialize();
        let a = tags.items()[0];

        assert!(tags.move_item(0, 2));
        assert_eq!(store.get_all(), json!({"tags": ["b", "c", "a"]}));
        assert_eq!(tags.index_of(a), Some(2));
        assert!(!tags.move_item(0, 3));
    }

    #[test]
    fn list_items_are_always_expanded() {
        let (mut tags, _) = manager(&tags(1, None), json!({}));
        tags.initialize();
        let id = tags.items()[0];
        assert!(tags.is_expanded(id));
        assert!(!tags.collapse(id));
        assert_eq!(tags.take_focus_request(), None);
    }

    #[test]
    fn accordion_single_item_starts_expanded() {
        let descriptor = tags(1, None).accordion();
        let (mut tags, _) = manager(&descriptor, json!({}));
        tags.initialize();
        assert!(tags.is_expanded(tags.items()[0]));
        // Initialization is not an add: nothing to focus
        assert_eq!(tags.take_focus_request(), None);
    }

    #[test]
    fn accordion_add_expands_only_new_item() {
        let descriptor = tags(0, None).accordion();
        let (mut tags, _) = manager(&descriptor, json!({"tags": ["a", "b"]}));
        tags.initialize();
        let a = tags.items()[0];
        assert!(tags.expand(a));

        let new = tags.add().unwrap();
        assert!(tags.is_expanded(new));
        assert!(!tags.is_expanded(a));
        assert_eq!(tags.take_focus_request(), Some(new));
        assert_eq!(tags.take_focus_request(), None);

        assert!(tags.toggle(a));
        assert!(tags.is_expanded(a));
    }

    #[test]
    fn accordion_remove_collapses_even_on_reset() {
        let descriptor = tags(1, None).accordion();
        let (mut tags, _) = manager(&descriptor, json!({}));
        tags.initialize();
        let only = tags.items()[0];
        assert!(tags.is_expanded(only));

        assert_eq!(tags.remove(only), Removal::Reset { index: 0 });
        assert!(!tags.is_expanded(only));
    }

    #[test]
    fn group_template_default_item() {
        let descriptor = FieldArrayDescriptor::of(
            FieldGroup::new()
                .field("endpoint", FieldDescriptor::text_input("Endpoint"))
                .field("paginated", FieldDescriptor::checkbox("Paginated")),
        )
        .min_items(1);
        let store = Arc::new(MemoryStore::new());
        let mut requests =
            FieldArrayManager::new(FieldPath::single("requests"), &descriptor, store.clone());
        requests.initialize();
        assert_eq!(
            store.get_all(),
            json!({"requests": [{"endpoint": null, "paginated": false}]})
        );
    }
}
