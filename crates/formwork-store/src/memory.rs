//! In-memory value store
//!
//! The tree lives behind a `parking_lot::RwLock`; subscribers live in a
//! `DashMap` keyed by id. Callbacks run after the write lock is released, so
//! a callback may read or write the store again.

use crate::{ChangeCallback, SubscriptionId, ValueStore};
use dashmap::DashMap;
use formwork_schema::{FieldPath, PathSegment};
use parking_lot::RwLock;
use serde_json::{Map, Value};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

struct Subscriber {
    path: FieldPath,
    callback: ChangeCallback,
}

/// Value store backed by a `serde_json::Value` tree
pub struct MemoryStore {
    tree: RwLock<Value>,
    subscribers: DashMap<SubscriptionId, Subscriber>,
    next_id: AtomicU64,
}

impl MemoryStore {
    /// Create store with an empty object as root
    #[must_use]
    pub fn new() -> Self {
        Self::with_values(Value::Object(Map::new()))
    }

    /// Create store seeded with existing values
    #[must_use]
    pub fn with_values(values: Value) -> Self {
        Self {
            tree: RwLock::new(values),
            subscribers: DashMap::new(),
            next_id: AtomicU64::new(1),
        }
    }

    /// Number of live subscriptions
    #[inline]
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }

    fn notify(&self, written: &FieldPath) {
        // Collect first: callbacks may subscribe or unsubscribe
        let targets: Vec<(FieldPath, ChangeCallback)> = self
            .subscribers
            .iter()
            .filter(|entry| entry.value().path.overlaps(written))
            .map(|entry| (entry.value().path.clone(), entry.value().callback.clone()))
            .collect();

        for (path, callback) in targets {
            let current = self.get(&path).unwrap_or(Value::Null);
            callback(&path, &current);
        }
    }
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("tree", &*self.tree.read())
            .field("subscribers", &self.subscribers.len())
            .finish()
    }
}

impl ValueStore for MemoryStore {
    fn get(&self, path: &FieldPath) -> Option<Value> {
        path.lookup(&self.tree.read()).cloned()
    }

    fn set(&self, path: &FieldPath, value: Value) {
        tracing::trace!(path = %path, "store write");
        {
            let mut tree = self.tree.write();
            write_at(&mut tree, path.segments(), value);
        }
        self.notify(path);
    }

    fn subscribe(&self, path: &FieldPath, callback: ChangeCallback) -> SubscriptionId {
        let id = SubscriptionId::new(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.subscribers.insert(
            id,
            Subscriber {
                path: path.clone(),
                callback,
            },
        );
        id
    }

    fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.subscribers.remove(&id).is_some()
    }

    fn get_all(&self) -> Value {
        self.tree.read().clone()
    }
}

fn write_at(node: &mut Value, segments: &[PathSegment], value: Value) {
    let Some((first, rest)) = segments.split_first() else {
        *node = value;
        return;
    };

    match first {
        PathSegment::Key(key) => {
            if !node.is_object() {
                if !node.is_null() {
                    tracing::debug!(key = %key, "replacing non-object value on write path");
                }
                *node = Value::Object(Map::new());
            }
            if let Value::Object(map) = node {
                let child = map.entry(key.clone()).or_insert(Value::Null);
                write_at(child, rest, value);
            }
        }
        PathSegment::Index(index) => {
            if !node.is_array() {
                if !node.is_null() {
                    tracing::debug!(index, "replacing non-array value on write path");
                }
                *node = Value::Array(Vec::new());
            }
            if let Value::Array(items) = node {
                if items.len() <= *index {
                    items.resize(*index + 1, Value::Null);
                }
                write_at(&mut items[*index], rest, value);
            }
        }
    }
}
