//! State machine properties for field arrays.
//!
//! Random operation sequences run against both presentations; after every
//! step the item count stays within bounds, the store agrees with the
//! tracked items, and expansion only refers to live items.

use formwork_array::{FieldArrayManager, ItemId, Presentation, Removal};
use formwork_schema::{FieldArrayDescriptor, FieldDescriptor, FieldGroup, FieldPath};
use formwork_store::{MemoryStore, ValueStore};
use pretty_assertions::assert_eq;
use proptest::prelude::*;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;

#[derive(Debug, Clone)]
enum Op {
    Add,
    Remove(usize),
    Move(usize, usize),
    Toggle(usize),
    Edit(usize),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        3 => Just(Op::Add),
        3 => any::<usize>().prop_map(Op::Remove),
        1 => (any::<usize>(), any::<usize>()).prop_map(|(a, b)| Op::Move(a, b)),
        1 => any::<usize>().prop_map(Op::Toggle),
        2 => any::<usize>().prop_map(Op::Edit),
    ]
}

fn request_template() -> FieldGroup {
    FieldGroup::new()
        .field("endpoint", FieldDescriptor::text_input("Endpoint"))
        .field("requestType", FieldDescriptor::text_input("Method"))
        .field("paginated", FieldDescriptor::checkbox("Paginated"))
}

fn pick(manager: &FieldArrayManager, n: usize) -> Option<ItemId> {
    let items = manager.items();
    (!items.is_empty()).then(|| items[n % items.len()])
}

proptest! {
    #[test]
    fn invariants_hold_for_any_sequence(
        min in 0usize..3,
        extra in 0usize..4,
        accordion in any::<bool>(),
        ops in prop::collection::vec(op(), 0..40),
    ) {
        let max = min + extra;
        let mut descriptor = FieldArrayDescriptor::of(request_template())
            .min_items(min)
            .max_items(max.max(1));
        if accordion {
            descriptor = descriptor.accordion();
        }
        let max = max.max(1);

        let store = Arc::new(MemoryStore::new());
        let path = FieldPath::single("requests");
        let mut manager = FieldArrayManager::new(path.clone(), &descriptor, store.clone());
        manager.initialize();

        // Value content each id is expected to carry
        let mut content: HashMap<ItemId, Value> = manager
            .items()
            .iter()
            .map(|id| (*id, descriptor.default_item_value()))
            .collect();
        let mut edits = 0u32;

        for op in ops {
            let before = manager.len();
            match op {
                Op::Add => match manager.add() {
                    Some(id) => {
                        prop_assert_eq!(manager.len(), before + 1);
                        content.insert(id, descriptor.default_item_value());
                        if accordion {
                            let expanded: Vec<_> = manager
                                .items()
                                .iter()
                                .filter(|item| manager.is_expanded(**item))
                                .collect();
                            prop_assert_eq!(expanded, vec![&id]);
                        }
                    }
                    None => {
                        prop_assert_eq!(before, max);
                        prop_assert_eq!(manager.len(), max);
                    }
                },
                Op::Remove(n) => {
                    let Some(id) = pick(&manager, n) else { continue };
                    match manager.remove(id) {
                        Removal::Removed { .. } => {
                            prop_assert!(before > min);
                            content.remove(&id);
                        }
                        Removal::Reset { .. } => {
                            prop_assert_eq!(before, min);
                            content.insert(id, descriptor.default_item_value());
                        }
                        Removal::NotFound => prop_assert!(false, "live id reported missing"),
                    }
                    prop_assert!(!(accordion && manager.is_expanded(id)));
                }
                Op::Move(from, to) => {
                    if before > 0 {
                        prop_assert!(manager.move_item(from % before, to % before));
                    }
                }
                Op::Toggle(n) => {
                    if let Some(id) = pick(&manager, n) {
                        prop_assert_eq!(manager.toggle(id), accordion);
                    }
                }
                Op::Edit(n) => {
                    if let Some(id) = pick(&manager, n) {
                        edits += 1;
                        let endpoint = json!(format!("/edit/{edits}"));
                        let item_path = manager.path_of(id).unwrap();
                        store.set(&item_path.child("endpoint"), endpoint.clone());
                        if let Some(Value::Object(map)) = content.get_mut(&id) {
                            map.insert("endpoint".into(), endpoint);
                        }
                    }
                }
            }

            prop_assert!(manager.len() >= min);
            prop_assert!(manager.len() <= max);

            let stored = store.get_array(&path);
            prop_assert_eq!(stored.len(), manager.len());
            for (index, id) in manager.items().iter().enumerate() {
                prop_assert_eq!(&stored[index], &content[id]);
            }

            if let Presentation::Accordion(state) = manager.presentation() {
                for id in state.expanded() {
                    prop_assert!(manager.index_of(id).is_some());
                }
            }
        }
    }
}

#[test]
fn request_scenario() {
    let store = Arc::new(MemoryStore::new());
    let descriptor = FieldArrayDescriptor::of(request_template())
        .min_items(1)
        .max_items(3);
    let mut requests =
        FieldArrayManager::new(FieldPath::single("requests"), &descriptor, store.clone());

    // (a) mount with an empty tree
    requests.initialize();
    assert_eq!(requests.len(), 1);
    let default_item = json!({"endpoint": null, "requestType": null, "paginated": false});
    assert_eq!(store.get_all(), json!({"requests": [default_item.clone()]}));

    // (b) removing the sole item resets it
    let only = requests.items()[0];
    store.set(&"requests.0.endpoint".parse().unwrap(), json!("/users"));
    assert_eq!(requests.remove(only), Removal::Reset { index: 0 });
    assert_eq!(requests.len(), 1);
    assert_eq!(store.get_all(), json!({"requests": [default_item]}));

    // (c) fill up to max_items; the next add is a no-op
    assert!(requests.add().is_some());
    assert!(requests.add().is_some());
    assert_eq!(requests.len(), 3);
    let snapshot = store.get_all();
    assert_eq!(requests.add(), None);
    assert_eq!(requests.len(), 3);
    assert_eq!(store.get_all(), snapshot);

    // (d) second item's endpoint
    let second = requests.items()[1];
    let endpoint = requests.path_of(second).unwrap().child("endpoint");
    assert_eq!(endpoint.to_string(), "requests.1.endpoint");
}

#[test]
fn reorder_recomputes_paths_but_keeps_content() {
    let store = Arc::new(MemoryStore::with_values(json!({
        "requests": [{"endpoint": "/a"}, {"endpoint": "/b"}, {"endpoint": "/c"}]
    })));
    let descriptor = FieldArrayDescriptor::of(request_template());
    let mut requests =
        FieldArrayManager::new(FieldPath::single("requests"), &descriptor, store.clone());
    requests.initialize();
    let a = requests.items()[0];

    assert!(requests.move_item(0, 2));
    let path = requests.path_of(a).unwrap();
    assert_eq!(path.to_string(), "requests.2");
    assert_eq!(store.get(&path.child("endpoint")), Some(json!("/a")));
}
