//! Field name resolution
//!
//! Walks a schema and produces a parallel tree of [`FieldPath`]s. Leaves
//! become absolute paths; arrays become an [`ArrayNames`] whose `fields` are
//! relative to one item and get indexed at render time.
//!
//! Resolution is where configuration mistakes surface: every check that can
//! be made without user data is made here.

use crate::descriptor::{FieldDescriptor, FieldGroup, FieldKind, SchemaNode, ValidationRule};
use crate::error::ConfigError;
use crate::path::FieldPath;
use indexmap::IndexMap;

/// Source of truth for which field kinds can be rendered
pub trait KindCatalog {
    /// Check if a kind has a renderer
    fn knows(&self, kind: &FieldKind) -> bool;
}

/// Catalog of the built-in kinds only
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinKinds;

impl KindCatalog for BuiltinKinds {
    fn knows(&self, kind: &FieldKind) -> bool {
        kind.is_builtin()
    }
}

/// Resolved names for one array field
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArrayNames {
    /// Path of the array value itself
    pub field_name: FieldPath,

    /// Names inside one item, relative to the item
    pub fields: Box<FieldNameNode>,
}

impl ArrayNames {
    /// Path of the item at `index`
    #[inline]
    #[must_use]
    pub fn item_path(&self, index: usize) -> FieldPath {
        self.field_name.index(index)
    }

    /// Concrete path of a relative item field at `index`
    ///
    /// `requests` + `1` + `endpoint` → `requests.1.endpoint`
    #[inline]
    #[must_use]
    pub fn field_path(&self, index: usize, relative: &FieldPath) -> FieldPath {
        self.item_path(index).join(relative)
    }
}

/// Resolved name tree, parallel to a schema
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldNameNode {
    /// Path of a leaf field
    Leaf(FieldPath),

    /// Names of a nested record, in declaration order
    Group(IndexMap<String, FieldNameNode>),

    /// Names of a repeating group
    Array(ArrayNames),
}

impl FieldNameNode {
    /// Child of a group node
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&FieldNameNode> {
        match self {
            Self::Group(children) => children.get(key),
            _ => None,
        }
    }

    /// Path, if this is a leaf
    #[must_use]
    pub fn as_leaf(&self) -> Option<&FieldPath> {
        match self {
            Self::Leaf(path) => Some(path),
            _ => None,
        }
    }

    /// Array names, if this is an array
    #[must_use]
    pub fn as_array(&self) -> Option<&ArrayNames> {
        match self {
            Self::Array(names) => Some(names),
            _ => None,
        }
    }

    /// Every leaf path in declaration order
    ///
    /// Leaves inside repeating groups are reported under their array's
    /// field name without an index, e.g. `requests.endpoint`.
    #[must_use]
    pub fn leaves(&self) -> Vec<FieldPath> {
        let mut out = Vec::new();
        self.collect_leaves(&FieldPath::root(), &mut out);
        out
    }

    fn collect_leaves(&self, prefix: &FieldPath, out: &mut Vec<FieldPath>) {
        match self {
            Self::Leaf(path) => out.push(prefix.join(path)),
            Self::Group(children) => {
                for child in children.values() {
                    child.collect_leaves(prefix, out);
                }
            }
            Self::Array(names) => {
                let base = prefix.join(&names.field_name);
                names.fields.collect_leaves(&base, out);
            }
        }
    }
}

/// Resolve names for a schema using the built-in kind catalog
///
/// # Errors
/// Returns the first [`ConfigError`] found, in declaration order
pub fn resolve(schema: &FieldGroup) -> Result<FieldNameNode, ConfigError> {
    resolve_with(schema, &BuiltinKinds)
}

/// Resolve names for a schema, checking kinds against `catalog`
///
/// # Errors
/// Returns the first [`ConfigError`] found, in declaration order
pub fn resolve_with(
    schema: &FieldGroup,
    catalog: &dyn KindCatalog,
) -> Result<FieldNameNode, ConfigError> {
    Resolver { catalog }.group(schema, &FieldPath::root(), &FieldPath::root())
}

/// `path` is the name being produced (relative inside arrays); `trace` is
/// the absolute schema location used in errors, with `*` for array items.
struct Resolver<'a> {
    catalog: &'a dyn KindCatalog,
}

impl Resolver<'_> {
    fn group(
        &self,
        group: &FieldGroup,
        path: &FieldPath,
        trace: &FieldPath,
    ) -> Result<FieldNameNode, ConfigError> {
        let mut children = IndexMap::with_capacity(group.len());
        for (name, node) in group.iter() {
            if !is_addressable(name) {
                return Err(ConfigError::InvalidPropertyName {
                    path: trace.clone(),
                    name: name.to_string(),
                });
            }
            if children.contains_key(name) {
                return Err(ConfigError::DuplicateProperty {
                    path: trace.clone(),
                    name: name.to_string(),
                });
            }
            let resolved = self.node(node, &path.child(name), &trace.child(name))?;
            children.insert(name.to_string(), resolved);
        }
        Ok(FieldNameNode::Group(children))
    }

    fn node(
        &self,
        node: &SchemaNode,
        path: &FieldPath,
        trace: &FieldPath,
    ) -> Result<FieldNameNode, ConfigError> {
        match node {
            SchemaNode::Field(field) => {
                self.field(field, trace)?;
                Ok(FieldNameNode::Leaf(path.clone()))
            }
            SchemaNode::Group(group) => self.group(group, path, trace),
            SchemaNode::Array(array) => {
                let template = array
                    .item_template()
                    .ok_or_else(|| ConfigError::MissingItemTemplate {
                        path: trace.clone(),
                    })?;

                if let Some(max) = array.max_items {
                    if array.min_items > max {
                        return Err(ConfigError::InvalidLimits {
                            path: trace.clone(),
                            min: array.min_items,
                            max,
                        });
                    }
                }

                let item_trace = trace.child("*");
                let fields = match template {
                    SchemaNode::Array(_) => {
                        return Err(ConfigError::InvalidItemTemplate {
                            path: trace.clone(),
                            reason: "arrays cannot directly contain arrays; wrap the inner array in a group"
                                .to_string(),
                        })
                    }
                    SchemaNode::Field(field) => {
                        self.field(field, &item_trace)?;
                        FieldNameNode::Leaf(FieldPath::root())
                    }
                    SchemaNode::Group(group) => {
                        if let Some(default) = &array.default_item {
                            if !default.is_object() {
                                return Err(ConfigError::InvalidDefaultItem {
                                    path: trace.clone(),
                                    reason: format!("expected an object, found {default}"),
                                });
                            }
                        }
                        self.group(group, &FieldPath::root(), &item_trace)?
                    }
                };

                Ok(FieldNameNode::Array(ArrayNames {
                    field_name: path.clone(),
                    fields: Box::new(fields),
                }))
            }
        }
    }

    fn field(&self, field: &FieldDescriptor, trace: &FieldPath) -> Result<(), ConfigError> {
        if !self.catalog.knows(&field.kind) {
            return Err(ConfigError::UnknownKind {
                path: trace.clone(),
                kind: field.kind.to_string(),
            });
        }

        if field.kind == FieldKind::Hidden && field.visible_when.is_some() {
            return Err(ConfigError::HiddenWithVisibility {
                path: trace.clone(),
            });
        }

        for rule in &field.rules {
            if let ValidationRule::Pattern(pattern) = rule {
                pattern.regex().map_err(|e| ConfigError::InvalidPattern {
                    path: trace.clone(),
                    pattern: pattern.source().to_string(),
                    message: e.to_string(),
                })?;
            }
        }
        Ok(())
    }
}

/// A name must parse back as exactly one key segment: no separators or
/// brackets, not empty, and not all digits (those read as an index).
fn is_addressable(name: &str) -> bool {
    !name.is_empty()
        && !name.contains(['.', '[', ']'])
        && !name.bytes().all(|b| b.is_ascii_digit())
}
