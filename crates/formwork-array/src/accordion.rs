//! Expansion and focus bookkeeping for the accordion presentation

use crate::id::ItemId;
use std::collections::BTreeSet;

/// Expanded items plus a one-shot focus hand-off
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccordionState {
    expanded: BTreeSet<ItemId>,
    pending_focus: Option<ItemId>,
}

impl AccordionState {
    /// Check if an item is expanded
    #[inline]
    #[must_use]
    pub fn is_expanded(&self, id: ItemId) -> bool {
        self.expanded.contains(&id)
    }

    /// Expanded ids, in id order
    pub fn expanded(&self) -> impl Iterator<Item = ItemId> + '_ {
        self.expanded.iter().copied()
    }

    /// Number of expanded items
    #[inline]
    #[must_use]
    pub fn expanded_len(&self) -> usize {
        self.expanded.len()
    }

    /// Item waiting to receive focus after the next render
    #[inline]
    #[must_use]
    pub fn pending_focus(&self) -> Option<ItemId> {
        self.pending_focus
    }

    pub(crate) fn expand(&mut self, id: ItemId) {
        self.expanded.insert(id);
    }

    pub(crate) fn collapse(&mut self, id: ItemId) {
        self.expanded.remove(&id);
    }

    /// Collapse everything, expand only `id` and queue focus for it
    pub(crate) fn focus_new(&mut self, id: ItemId) {
        self.expanded.clear();
        self.expanded.insert(id);
        self.pending_focus = Some(id);
    }

    pub(crate) fn forget(&mut self, id: ItemId) {
        self.expanded.remove(&id);
        if self.pending_focus == Some(id) {
            self.pending_focus = None;
        }
    }

    pub(crate) fn take_focus(&mut self) -> Option<ItemId> {
        self.pending_focus.take()
    }
}
