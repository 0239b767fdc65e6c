//! Per-field validation
//!
//! Synchronous [`ValidationRule`]s are checked directly. Asynchronous
//! validators go through a [`ValidationTracker`], which hands out one ticket
//! per invocation and only applies the result of the latest ticket for a
//! path. Older results are dropped as [`Settlement::Superseded`], whatever
//! order they complete in.

use formwork_schema::{AsyncValidator, FieldDescriptor, FieldPath, ValidationRule};
use futures::future::{BoxFuture, FutureExt};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Check a value against rules, returning the first failure
#[must_use]
pub fn check_rules(rules: &[ValidationRule], value: &Value) -> Option<String> {
    rules.iter().find_map(|rule| check_rule(rule, value))
}

/// Check a value against a descriptor's rules
#[inline]
#[must_use]
pub fn validate_field(descriptor: &FieldDescriptor, value: &Value) -> Option<String> {
    check_rules(&descriptor.rules, value)
}

fn check_rule(rule: &ValidationRule, value: &Value) -> Option<String> {
    match rule {
        ValidationRule::Required => is_blank(value).then(|| "This field is required".to_string()),
        ValidationRule::MinLength(min) => match measure(value) {
            Some(len) if len < *min => Some(format!("Must be at least {min} characters")),
            _ => None,
        },
        ValidationRule::MaxLength(max) => match measure(value) {
            Some(len) if len > *max => Some(format!("Must be at most {max} characters")),
            _ => None,
        },
        ValidationRule::Pattern(pattern) => {
            let Value::String(text) = value else {
                return None;
            };
            if text.is_empty() {
                return None;
            }
            match pattern.regex() {
                Ok(re) if re.is_match(text) => None,
                Ok(_) => Some(format!("Must match pattern {pattern}")),
                Err(e) => {
                    tracing::debug!(pattern = %pattern, error = %e, "skipping invalid pattern rule");
                    None
                }
            }
        }
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        Value::Array(items) => items.is_empty(),
        Value::Object(map) => map.is_empty(),
        Value::Bool(_) | Value::Number(_) => false,
    }
}

/// Length in characters (strings) or items (arrays); other values are not measured
fn measure(value: &Value) -> Option<usize> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.chars().count()),
        Value::Array(items) => Some(items.len()),
        _ => None,
    }
}

/// Handle for one asynchronous validation invocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationTicket {
    path: FieldPath,
    generation: u64,
}

impl ValidationTicket {
    /// Field being validated
    #[inline]
    #[must_use]
    pub fn path(&self) -> &FieldPath {
        &self.path
    }

    /// Invocation order; later tickets have larger generations
    #[inline]
    #[must_use]
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

/// Outcome of settling a ticket
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Settlement {
    /// Result became the field's async error state
    Applied,
    /// A newer invocation (or a reset) made this result stale
    Superseded,
}

#[derive(Debug, Default)]
struct Slot {
    sync_error: Option<String>,
    async_error: Option<String>,
    latest: Option<u64>,
    pending: bool,
}

impl Slot {
    fn message(&self) -> Option<&String> {
        self.sync_error.as_ref().or(self.async_error.as_ref())
    }
}

/// Validation state for every field of one form
#[derive(Debug, Default)]
pub struct ValidationTracker {
    slots: Mutex<HashMap<FieldPath, Slot>>,
    next_generation: AtomicU64,
}

impl ValidationTracker {
    /// Create empty tracker
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the latest synchronous result for a path
    pub fn set_sync(&self, path: &FieldPath, error: Option<String>) {
        let mut slots = self.slots.lock();
        match error {
            Some(message) => slots.entry(path.clone()).or_default().sync_error = Some(message),
            None => {
                if let Some(slot) = slots.get_mut(path) {
                    slot.sync_error = None;
                }
            }
        }
    }

    /// Issue a ticket for a new async invocation on `path`
    ///
    /// Any earlier ticket for the same path is superseded from this point.
    pub fn begin(&self, path: &FieldPath) -> ValidationTicket {
        let generation = self.next_generation.fetch_add(1, Ordering::Relaxed);
        let mut slots = self.slots.lock();
        let slot = slots.entry(path.clone()).or_default();
        slot.latest = Some(generation);
        slot.pending = true;
        ValidationTicket {
            path: path.clone(),
            generation,
        }
    }

    /// Apply an async result if its ticket is still the latest for the path
    pub fn settle(&self, ticket: ValidationTicket, error: Option<String>) -> Settlement {
        let mut slots = self.slots.lock();
        match slots.get_mut(&ticket.path) {
            Some(slot) if slot.latest == Some(ticket.generation) => {
                slot.async_error = error;
                slot.pending = false;
                Settlement::Applied
            }
            _ => {
                tracing::debug!(
                    path = %ticket.path,
                    generation = ticket.generation,
                    "discarding superseded async validation result"
                );
                Settlement::Superseded
            }
        }
    }

    /// Run a validator to completion through [`begin`](Self::begin) and
    /// [`settle`](Self::settle)
    pub async fn run(
        &self,
        path: &FieldPath,
        value: &Value,
        validator: &dyn AsyncValidator,
    ) -> Settlement {
        let ticket = self.begin(path);
        let result = validator.validate(value).await;
        self.settle(ticket, result)
    }

    /// Start a validation now and return a detached future that settles it
    ///
    /// The ticket is issued before this returns, so invocation order is call
    /// order even if the futures are polled later or out of order.
    pub fn start(
        self: &Arc<Self>,
        path: FieldPath,
        value: Value,
        validator: Arc<dyn AsyncValidator>,
    ) -> BoxFuture<'static, Settlement> {
        let ticket = self.begin(&path);
        let tracker = Arc::clone(self);
        async move {
            let result = validator.validate(&value).await;
            tracker.settle(ticket, result)
        }
        .boxed()
    }

    /// Message to display for a path: sync error first, else async error
    #[must_use]
    pub fn error(&self, path: &FieldPath) -> Option<String> {
        self.slots.lock().get(path).and_then(Slot::message).cloned()
    }

    /// Every displayed message, keyed by path
    #[must_use]
    pub fn errors(&self) -> BTreeMap<String, String> {
        self.slots
            .lock()
            .iter()
            .filter_map(|(path, slot)| slot.message().map(|m| (path.to_string(), m.clone())))
            .collect()
    }

    /// Check if any field has a message
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.slots.lock().values().any(|slot| slot.message().is_some())
    }

    /// Check if the latest async invocation for a path is still running
    #[must_use]
    pub fn is_pending(&self, path: &FieldPath) -> bool {
        self.slots.lock().get(path).is_some_and(|slot| slot.pending)
    }

    /// Check if any async invocation is still running
    #[must_use]
    pub fn any_pending(&self) -> bool {
        self.slots.lock().values().any(|slot| slot.pending)
    }

    /// Forget a path; in-flight results for it become superseded
    pub fn clear(&self, path: &FieldPath) {
        self.slots.lock().remove(path);
    }

    /// Forget a path and everything beneath it
    pub fn clear_prefix(&self, prefix: &FieldPath) {
        self.slots.lock().retain(|path, _| !prefix.is_prefix_of(path));
    }
}
