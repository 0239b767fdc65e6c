//! Property tests for field name resolution.
//!
//! Random schema trees (groups, leaves and arrays, nested a few levels deep)
//! must always resolve to one distinct path per leaf descriptor, and every
//! concrete path built from the resolved names must lead back to a leaf
//! descriptor in the same schema. With arbitrary property names, a schema
//! either resolves to distinct path strings or is rejected.

use formwork_schema::{
    resolve, ConfigError, FieldArrayDescriptor, FieldDescriptor, FieldGroup, FieldNameNode, FieldPath,
    SchemaNode,
};
use proptest::prelude::*;
use std::collections::HashSet;

fn leaf() -> impl Strategy<Value = SchemaNode> {
    prop_oneof![
        Just(SchemaNode::from(FieldDescriptor::text_input("Text"))),
        Just(SchemaNode::from(FieldDescriptor::hidden())),
        Just(SchemaNode::from(FieldDescriptor::checkbox("Flag"))),
        Just(SchemaNode::from(FieldDescriptor::markdown("Notes"))),
    ]
}

fn group_from(children: Vec<SchemaNode>) -> FieldGroup {
    let mut group = FieldGroup::new();
    for (i, child) in children.into_iter().enumerate() {
        group.insert(format!("f{i}"), child);
    }
    group
}

fn node() -> impl Strategy<Value = SchemaNode> {
    leaf().prop_recursive(4, 48, 5, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 1..5)
                .prop_map(|children| SchemaNode::Group(group_from(children))),
            prop::collection::vec(inner, 1..4).prop_map(|children| {
                SchemaNode::Array(FieldArrayDescriptor::of(group_from(children)))
            }),
        ]
    })
}

fn schema() -> impl Strategy<Value = FieldGroup> {
    prop::collection::vec(node(), 1..6).prop_map(group_from)
}

fn count_leaves(group: &FieldGroup) -> usize {
    group.iter().map(|(_, node)| count_node(node)).sum()
}

fn count_node(node: &SchemaNode) -> usize {
    match node {
        SchemaNode::Field(_) => 1,
        SchemaNode::Group(group) => count_leaves(group),
        SchemaNode::Array(array) => array.item_template().map_or(0, count_node),
    }
}

/// Build concrete paths for every leaf, indexing each array at `index`
fn concrete_paths(node: &FieldNameNode, prefix: &FieldPath, index: usize, out: &mut Vec<FieldPath>) {
    match node {
        FieldNameNode::Leaf(path) => out.push(prefix.join(path)),
        FieldNameNode::Group(children) => {
            for child in children.values() {
                concrete_paths(child, prefix, index, out);
            }
        }
        FieldNameNode::Array(names) => {
            let item = prefix.join(&names.item_path(index));
            concrete_paths(&names.fields, &item, index, out);
        }
    }
}

fn name() -> impl Strategy<Value = String> {
    prop_oneof![
        4 => "[a-z]{1,2}",
        1 => "[0-9]{1,2}",
        1 => "[a-z]\\.[a-z]",
        1 => "[a-z]\\[[0-9]\\]",
        1 => Just(String::new()),
    ]
}

/// Copy of `group` with every property renamed from `names`, cycling
fn renamed(group: &FieldGroup, names: &[String], next: &mut usize) -> FieldGroup {
    let mut out = FieldGroup::new();
    for (_, node) in group.iter() {
        let name = names[*next % names.len()].clone();
        *next += 1;
        let node = match node {
            SchemaNode::Field(field) => SchemaNode::Field(field.clone()),
            SchemaNode::Group(inner) => SchemaNode::Group(renamed(inner, names, next)),
            SchemaNode::Array(array) => match array.item_template() {
                Some(SchemaNode::Group(template)) => SchemaNode::Array(FieldArrayDescriptor::of(
                    renamed(template, names, next),
                )),
                _ => SchemaNode::Array(array.clone()),
            },
        };
        out.insert(name, node);
    }
    out
}

proptest! {
    #[test]
    fn one_distinct_path_per_leaf(schema in schema()) {
        let names = resolve(&schema).unwrap();
        let leaves = names.leaves();
        prop_assert_eq!(leaves.len(), count_leaves(&schema));

        let unique: HashSet<_> = leaves.iter().collect();
        prop_assert_eq!(unique.len(), leaves.len());
    }

    #[test]
    fn concrete_paths_address_leaf_descriptors(schema in schema(), index in 0usize..5) {
        let names = resolve(&schema).unwrap();
        let mut paths = Vec::new();
        concrete_paths(&names, &FieldPath::root(), index, &mut paths);

        prop_assert_eq!(paths.len(), count_leaves(&schema));
        for path in &paths {
            prop_assert!(schema.descriptor_at(path).is_some(), "no descriptor at {}", path);
            let reparsed: FieldPath = path.to_string().parse().unwrap();
            prop_assert_eq!(&reparsed, path);
        }
    }

    #[test]
    fn arbitrary_names_never_collide_as_strings(
        schema in schema(),
        names in prop::collection::vec(name(), 1..24),
        index in 0usize..3,
    ) {
        let schema = renamed(&schema, &names, &mut 0);
        match resolve(&schema) {
            Ok(resolved) => {
                let leaves: Vec<String> = resolved.leaves().iter().map(ToString::to_string).collect();
                let unique: HashSet<_> = leaves.iter().collect();
                prop_assert_eq!(unique.len(), leaves.len());

                let mut paths = Vec::new();
                concrete_paths(&resolved, &FieldPath::root(), index, &mut paths);
                for path in &paths {
                    let reparsed: FieldPath = path.to_string().parse().unwrap();
                    prop_assert_eq!(&reparsed, path);
                    prop_assert!(schema.descriptor_at(&reparsed).is_some(), "no descriptor at {}", path);
                }
            }
            Err(err) => prop_assert!(
                matches!(
                    err,
                    ConfigError::InvalidPropertyName { .. } | ConfigError::DuplicateProperty { .. }
                ),
                "unexpected error {}",
                err
            ),
        }
    }
}
