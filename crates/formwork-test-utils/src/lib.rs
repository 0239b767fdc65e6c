//! Testing utilities for the formwork workspace
//!
//! Shared fixtures for mounting forms and faking slow validators.

#![allow(missing_docs)]

use formwork_core::{FormConfig, FormSession};
use formwork_render::Dispatcher;
use formwork_schema::{
    validator_fn, AsyncValidator, FieldArrayDescriptor, FieldDescriptor, FieldGroup, FieldPath,
    SelectOption,
};
use formwork_store::MemoryStore;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;

pub fn path(s: &str) -> FieldPath {
    s.parse().unwrap()
}

/// `requests: array<{endpoint, requestType, paginated}>` with the given limits
pub fn request_schema(min_items: usize, max_items: Option<usize>) -> FieldGroup {
    let mut requests = FieldArrayDescriptor::of(
        FieldGroup::new()
            .field("endpoint", FieldDescriptor::text_input("Endpoint"))
            .field(
                "requestType",
                FieldDescriptor::select(
                    "Request type",
                    vec![SelectOption::new("GET", "GET"), SelectOption::new("POST", "POST")],
                ),
            )
            .field("paginated", FieldDescriptor::checkbox("Paginated")),
    )
    .min_items(min_items);
    requests.max_items = max_items;
    FieldGroup::new().field("requests", requests)
}

pub fn mount(schema: FieldGroup) -> (FormSession, Arc<MemoryStore>) {
    mount_with(schema, Value::Object(serde_json::Map::new()), FormConfig::default())
}

pub fn mount_with(schema: FieldGroup, values: Value, config: FormConfig) -> (FormSession, Arc<MemoryStore>) {
    let store = Arc::new(MemoryStore::with_values(values));
    let session = FormSession::mount(schema, store.clone(), Dispatcher::with_defaults(), config).unwrap();
    (session, store)
}

/// Validator that waits `delay_ms` for the value, then rejects `taken`
///
/// Unlisted values resolve immediately as valid.
pub fn delayed_validator(delays: Vec<(Value, u64)>, taken: Value) -> impl AsyncValidator {
    validator_fn(move |value: Value| {
        let delay = delays
            .iter()
            .find(|(candidate, _)| *candidate == value)
            .map_or(0, |(_, ms)| *ms);
        let rejected = value == taken;
        async move {
            tokio::time::sleep(Duration::from_millis(delay)).await;
            rejected.then(|| format!("{value} is already taken"))
        }
    })
}
