//! Stable item identities

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of one array item, independent of its position
///
/// Issued from a per-array counter and never reused, so an id that has been
/// removed can never alias a later item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(u64);

impl ItemId {
    /// Raw counter value
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "item-{}", self.0)
    }
}

/// Monotonic id source
#[derive(Debug, Default)]
pub(crate) struct IdAllocator {
    next: u64,
}

impl IdAllocator {
    pub(crate) fn issue(&mut self) -> ItemId {
        let id = ItemId(self.next);
        self.next += 1;
        id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_never_reused() {
        let mut ids = IdAllocator::default();
        let first = ids.issue();
        let second = ids.issue();
        assert_ne!(first, second);
        assert!(second > first);
        assert_eq!(first.to_string(), "item-0");
    }
}
