//! Conditional field visibility
//!
//! [`VisibleWhen`] is evaluated against a [`VisibilityScope`]: the whole
//! value tree, plus the enclosing item for fields inside a repeating group.
//! Declarative conditions can be written in schema files; [`Predicate`]
//! closures are available to schemas built in code.

use crate::path::FieldPath;
use serde::Deserialize;
use serde_json::Value;
use std::any::Any;
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

static NULL: Value = Value::Null;

/// Values a visibility condition can see
///
/// `values` is always the whole value tree. Inside a repeating group,
/// `item` is the value of the innermost enclosing item.
#[derive(Debug, Clone, Copy)]
pub struct VisibilityScope<'a> {
    values: &'a Value,
    item: Option<&'a Value>,
}

impl<'a> VisibilityScope<'a> {
    /// Scope over the whole value tree
    #[inline]
    #[must_use]
    pub fn new(values: &'a Value) -> Self {
        Self { values, item: None }
    }

    /// Same tree, inside the given item
    #[inline]
    #[must_use]
    pub fn with_item(self, item: &'a Value) -> Self {
        Self {
            item: Some(item),
            ..self
        }
    }

    /// Whole value tree
    #[inline]
    #[must_use]
    pub fn values(&self) -> &'a Value {
        self.values
    }

    /// Enclosing item, if any
    #[inline]
    #[must_use]
    pub fn item(&self) -> Option<&'a Value> {
        self.item
    }

    /// Value at `path`: the enclosing item first, then the whole tree
    ///
    /// Missing paths read as `null`.
    #[must_use]
    pub fn read(&self, path: &FieldPath) -> &'a Value {
        self.item
            .and_then(|item| path.lookup(item))
            .or_else(|| path.lookup(self.values))
            .unwrap_or(&NULL)
    }
}

type PredicateFn = dyn Fn(&VisibilityScope<'_>) -> Result<bool, VisibilityError> + Send + Sync;

/// In-process visibility predicate
///
/// A panic inside the closure is caught and reported as
/// [`VisibilityError::PredicatePanicked`]. Builds compiled with
/// `panic = "abort"` still abort.
#[derive(Clone)]
pub struct Predicate(Arc<PredicateFn>);

impl Predicate {
    /// Wrap a fallible predicate over the full scope
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&VisibilityScope<'_>) -> Result<bool, VisibilityError> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Evaluate against a scope
    ///
    /// # Errors
    /// The predicate's own failure, or a caught panic
    pub fn call(&self, scope: &VisibilityScope<'_>) -> Result<bool, VisibilityError> {
        panic::catch_unwind(AssertUnwindSafe(|| (self.0)(scope)))
            .unwrap_or_else(|payload| Err(VisibilityError::PredicatePanicked(panic_message(&*payload))))
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

impl fmt::Debug for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Predicate(..)")
    }
}

/// Visibility condition
///
/// Paths resolve inside the enclosing item when it has them, otherwise
/// from the root of the value tree (see [`VisibilityScope::read`]).
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibleWhen {
    /// Value at `path` equals `value`
    Equals {
        /// Watched path
        path: FieldPath,
        /// Expected value
        value: Value,
    },

    /// Value at `path` differs from `value`
    NotEquals {
        /// Watched path
        path: FieldPath,
        /// Rejected value
        value: Value,
    },

    /// Value at `path` is one of `values`
    OneOf {
        /// Watched path
        path: FieldPath,
        /// Accepted values
        values: Vec<Value>,
    },

    /// Value at `path` is truthy (not null, false, 0, "" or empty)
    Truthy(FieldPath),

    /// Every condition holds
    All(Vec<VisibleWhen>),

    /// At least one condition holds
    Any(Vec<VisibleWhen>),

    /// Closure supplied in code
    #[serde(skip)]
    Predicate(Predicate),
}

impl VisibleWhen {
    /// `path == value`
    #[must_use]
    pub fn equals(path: FieldPath, value: impl Into<Value>) -> Self {
        Self::Equals {
            path,
            value: value.into(),
        }
    }

    /// Condition from an infallible closure over the whole value tree
    pub fn when<F>(f: F) -> Self
    where
        F: Fn(&Value) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Predicate::new(move |scope| Ok(f(scope.values()))))
    }

    /// Condition from a fallible closure over the whole value tree
    pub fn try_when<F>(f: F) -> Self
    where
        F: Fn(&Value) -> Result<bool, VisibilityError> + Send + Sync + 'static,
    {
        Self::Predicate(Predicate::new(move |scope| f(scope.values())))
    }

    /// Condition from a closure that also sees the enclosing item
    pub fn when_scoped<F>(f: F) -> Self
    where
        F: Fn(&VisibilityScope<'_>) -> bool + Send + Sync + 'static,
    {
        Self::Predicate(Predicate::new(move |scope| Ok(f(scope))))
    }

    /// Evaluate against a scope
    ///
    /// # Errors
    /// Only closure predicates can fail
    pub fn evaluate(&self, scope: &VisibilityScope<'_>) -> Result<bool, VisibilityError> {
        match self {
            Self::Equals { path, value } => Ok(scope.read(path) == value),
            Self::NotEquals { path, value } => Ok(scope.read(path) != value),
            Self::OneOf { path, values } => {
                let current = scope.read(path);
                Ok(values.iter().any(|candidate| candidate == current))
            }
            Self::Truthy(path) => Ok(is_truthy(scope.read(path))),
            Self::All(conditions) => {
                for condition in conditions {
                    if !condition.evaluate(scope)? {
                        return Ok(false);
                    }
                }
                Ok(true)
            }
            Self::Any(conditions) => {
                for condition in conditions {
                    if condition.evaluate(scope)? {
                        return Ok(true);
                    }
                }
                Ok(false)
            }
            Self::Predicate(predicate) => predicate.call(scope),
        }
    }
}

/// Loose truthiness used by [`VisibleWhen::Truthy`]
#[must_use]
pub fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(_) => true,
    }
}

/// Failure while evaluating a visibility condition
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VisibilityError {
    /// A closure predicate reported an error
    #[error("visibility predicate failed: {0}")]
    PredicateFailed(String),

    /// A closure predicate panicked
    #[error("visibility predicate panicked: {0}")]
    PredicatePanicked(String),
}
