//! Rendered form tree and submission payload

use formwork_array::ItemId;
use formwork_render::RenderedField;
use formwork_schema::{ArrayLayout, FieldPath};
use serde::Serialize;
use serde_json::Value;
use std::collections::BTreeMap;
use uuid::Uuid;

/// One node of a rendered form
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "node", rename_all = "snake_case")]
pub enum RenderedNode {
    /// Visible leaf control
    Field(RenderedField),

    /// Nested record
    Group {
        /// Property name
        name: String,
        /// Rendered children; may be empty when every child is hidden
        children: Vec<RenderedNode>,
    },

    /// Repeating group
    Array(RenderedArray),
}

/// Rendered repeating group
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedArray {
    /// Path of the array value
    pub path: FieldPath,
    /// Group label
    pub label: Option<String>,
    /// Presentation variant
    pub layout: ArrayLayout,
    /// Items in positional order
    pub items: Vec<RenderedItem>,
    /// Whether another item may be added
    pub can_add: bool,
    /// Whether removing deletes (rather than resets) an item
    pub can_remove: bool,
}

/// One rendered array item
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedItem {
    /// Stable identity
    pub id: ItemId,
    /// Current position
    pub index: usize,
    /// Path of the item value
    pub path: FieldPath,
    /// Expanded (always true in a plain list)
    pub expanded: bool,
    /// Rendered item fields
    pub children: Vec<RenderedNode>,
}

/// Result of [`FormSession::render`](crate::FormSession::render)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedForm {
    /// Session that produced this tree
    pub form_id: Uuid,
    /// Top-level nodes in schema order
    pub nodes: Vec<RenderedNode>,
    /// Control to focus after this render
    pub focus: Option<FieldPath>,
}

impl RenderedForm {
    /// Every rendered field, depth first in schema order
    #[must_use]
    pub fn fields(&self) -> Vec<&RenderedField> {
        let mut out = Vec::new();
        collect_fields(&self.nodes, &mut out);
        out
    }

    /// Rendered field at a path
    #[must_use]
    pub fn field(&self, path: &FieldPath) -> Option<&RenderedField> {
        self.fields().into_iter().find(|field| &field.path == path)
    }

    /// Rendered array at a path
    #[must_use]
    pub fn array(&self, path: &FieldPath) -> Option<&RenderedArray> {
        find_array(&self.nodes, path)
    }
}

fn collect_fields<'a>(nodes: &'a [RenderedNode], out: &mut Vec<&'a RenderedField>) {
    for node in nodes {
        match node {
            RenderedNode::Field(field) => out.push(field),
            RenderedNode::Group { children, .. } => collect_fields(children, out),
            RenderedNode::Array(array) => {
                for item in &array.items {
                    collect_fields(&item.children, out);
                }
            }
        }
    }
}

fn find_array<'a>(nodes: &'a [RenderedNode], path: &FieldPath) -> Option<&'a RenderedArray> {
    nodes.iter().find_map(|node| match node {
        RenderedNode::Field(_) => None,
        RenderedNode::Group { children, .. } => find_array(children, path),
        RenderedNode::Array(array) if &array.path == path => Some(array),
        RenderedNode::Array(array) => array
            .items
            .iter()
            .find_map(|item| find_array(&item.children, path)),
    })
}

/// Values handed to the host on submit
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Submission {
    /// Snapshot of the whole value tree, hidden fields included
    pub values: Value,
    /// No field errors, and nothing pending if pending blocks submit
    pub valid: bool,
    /// Async validations still running
    pub pending: bool,
    /// Displayed message per field path
    pub errors: BTreeMap<String, String>,
}
