//! Field descriptors and the recursive schema tree
//!
//! A form schema mirrors the shape of the data it edits: leaves are
//! [`FieldDescriptor`]s, nested records are [`FieldGroup`]s and arrays of
//! records are [`FieldArrayDescriptor`]s.

use crate::path::{FieldPath, PathSegment};
use crate::visibility::VisibleWhen;
use async_trait::async_trait;
use indexmap::IndexMap;
use once_cell::sync::OnceCell;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt::{self, Display, Formatter};
use std::future::Future;
use std::str::FromStr;
use std::sync::Arc;

/// Tag reserved for the array discriminant
pub const ARRAY_TAG: &str = "array";

/// Discriminant selecting how a field is rendered
///
/// Built-in kinds cover the controls every subtask form uses. Hosts may
/// register additional kinds with the renderer; those parse as
/// [`FieldKind::Custom`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum FieldKind {
    /// Never rendered, still submitted
    Hidden,
    /// Single-line text
    TextInput,
    /// Masked single-line text
    Password,
    /// Multi-line text
    Textarea,
    /// Choice from a static option list
    Select,
    /// Boolean toggle
    Checkbox,
    /// Calendar date
    Date,
    /// Start/end date pair
    DateRange,
    /// Choice from a pre-fetched remote option list
    RemoteOptionSelector,
    /// Markdown editor
    Markdown,
    /// Host-registered kind
    Custom(String),
}

impl FieldKind {
    /// Every built-in kind
    pub const BUILTIN: [FieldKind; 10] = [
        Self::Hidden,
        Self::TextInput,
        Self::Password,
        Self::Textarea,
        Self::Select,
        Self::Checkbox,
        Self::Date,
        Self::DateRange,
        Self::RemoteOptionSelector,
        Self::Markdown,
    ];

    /// Wire tag for this kind
    #[must_use]
    pub fn tag(&self) -> &str {
        match self {
            Self::Hidden => "hidden",
            Self::TextInput => "text-input",
            Self::Password => "password",
            Self::Textarea => "textarea",
            Self::Select => "select",
            Self::Checkbox => "checkbox",
            Self::Date => "date",
            Self::DateRange => "date-range",
            Self::RemoteOptionSelector => "remote-option-selector",
            Self::Markdown => "markdown",
            Self::Custom(tag) => tag,
        }
    }

    /// Check if this is one of the built-in kinds
    #[inline]
    #[must_use]
    pub fn is_builtin(&self) -> bool {
        !matches!(self, Self::Custom(_))
    }

    /// Kinds whose control picks from `options`
    #[inline]
    #[must_use]
    pub fn uses_options(&self) -> bool {
        matches!(self, Self::Select | Self::RemoteOptionSelector)
    }
}

impl Display for FieldKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

impl FromStr for FieldKind {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self::BUILTIN
            .iter()
            .find(|kind| kind.tag() == s)
            .cloned()
            .unwrap_or_else(|| Self::Custom(s.to_string())))
    }
}

impl Serialize for FieldKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.tag())
    }
}

impl<'de> Deserialize<'de> for FieldKind {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let tag = String::deserialize(deserializer)?;
        match tag.parse() {
            Ok(kind) => Ok(kind),
            Err(never) => match never {},
        }
    }
}

/// One choice of a select-like control
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Text shown to the user
    pub label: String,
    /// Value written to the store
    pub value: Value,
}

impl SelectOption {
    /// Create new option
    #[inline]
    #[must_use]
    pub fn new(label: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            label: label.into(),
            value: value.into(),
        }
    }
}

/// Synchronous validation rule attached to a field
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ValidationRule {
    /// Value must be present and non-empty
    Required,
    /// Minimum length in characters (strings) or items (arrays)
    MinLength(usize),
    /// Maximum length in characters (strings) or items (arrays)
    MaxLength(usize),
    /// String must match the regular expression
    Pattern(PatternRule),
}

/// Regular expression source, compiled once on first use
///
/// Clones share the compiled expression.
#[derive(Clone, Deserialize)]
#[serde(from = "String")]
pub struct PatternRule {
    source: String,
    compiled: Arc<OnceCell<Result<Regex, regex::Error>>>,
}

impl PatternRule {
    /// Wrap a pattern source
    #[must_use]
    pub fn new(source: impl Into<String>) -> Self {
        Self {
            source: source.into(),
            compiled: Arc::new(OnceCell::new()),
        }
    }

    /// Pattern source as written in the schema
    #[inline]
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Compiled expression, built on the first call
    ///
    /// # Errors
    /// The compiler error if the source is not a valid expression
    pub fn regex(&self) -> Result<&Regex, &regex::Error> {
        self.compiled
            .get_or_init(|| Regex::new(&self.source))
            .as_ref()
    }
}

impl From<String> for PatternRule {
    fn from(source: String) -> Self {
        Self::new(source)
    }
}

impl From<&str> for PatternRule {
    fn from(source: &str) -> Self {
        Self::new(source)
    }
}

impl PartialEq for PatternRule {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

impl Eq for PatternRule {}

impl Display for PatternRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl fmt::Debug for PatternRule {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_tuple("PatternRule").field(&self.source).finish()
    }
}

/// Asynchronous per-field validation, e.g. a uniqueness check
///
/// Returns the error message, or `None` when the value is acceptable.
#[async_trait]
pub trait AsyncValidator: Send + Sync {
    /// Validate a field value
    async fn validate(&self, value: &Value) -> Option<String>;
}

/// Adapter turning an async closure into an [`AsyncValidator`]
pub struct FnValidator<F>(F);

/// Wrap an async closure as a validator
pub fn validator_fn<F, Fut>(f: F) -> FnValidator<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    FnValidator(f)
}

#[async_trait]
impl<F, Fut> AsyncValidator for FnValidator<F>
where
    F: Fn(Value) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Option<String>> + Send + 'static,
{
    async fn validate(&self, value: &Value) -> Option<String> {
        (self.0)(value.clone()).await
    }
}

/// Shared handle to an [`AsyncValidator`]
#[derive(Clone)]
pub struct SharedValidator(Arc<dyn AsyncValidator>);

impl SharedValidator {
    /// Wrap a validator
    #[must_use]
    pub fn new(validator: impl AsyncValidator + 'static) -> Self {
        Self(Arc::new(validator))
    }

    /// Get the underlying validator
    #[inline]
    #[must_use]
    pub fn get(&self) -> Arc<dyn AsyncValidator> {
        Arc::clone(&self.0)
    }
}

impl fmt::Debug for SharedValidator {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str("SharedValidator(..)")
    }
}

/// Leaf field configuration
#[derive(Debug, Clone, Deserialize)]
pub struct FieldDescriptor {
    /// Control selector
    pub kind: FieldKind,

    /// Field label
    #[serde(default)]
    pub label: Option<String>,

    /// Help text
    #[serde(default)]
    pub description: Option<String>,

    /// Placeholder shown while empty
    #[serde(default)]
    pub placeholder: Option<String>,

    /// Conditional visibility against the whole value tree
    #[serde(default)]
    pub visible_when: Option<VisibleWhen>,

    /// Asynchronous validation, configured in code only
    #[serde(skip)]
    pub async_validate: Option<SharedValidator>,

    /// Option list for select-like kinds
    #[serde(default)]
    pub options: Vec<SelectOption>,

    /// Initial value seeded into the store when absent
    #[serde(default)]
    pub default: Option<Value>,

    /// Synchronous validation rules
    #[serde(default)]
    pub rules: Vec<ValidationRule>,

    /// Kind-specific attributes, passed through to the renderer
    #[serde(flatten)]
    pub attributes: IndexMap<String, Value>,
}

impl FieldDescriptor {
    /// Create descriptor of a given kind
    #[must_use]
    pub fn new(kind: FieldKind) -> Self {
        Self {
            kind,
            label: None,
            description: None,
            placeholder: None,
            visible_when: None,
            async_validate: None,
            options: Vec::new(),
            default: None,
            rules: Vec::new(),
            attributes: IndexMap::new(),
        }
    }

    /// Hidden field
    #[must_use]
    pub fn hidden() -> Self {
        Self::new(FieldKind::Hidden)
    }

    /// Single-line text field
    #[must_use]
    pub fn text_input(label: impl Into<String>) -> Self {
        Self::new(FieldKind::TextInput).with_label(label)
    }

    /// Password field
    #[must_use]
    pub fn password(label: impl Into<String>) -> Self {
        Self::new(FieldKind::Password).with_label(label)
    }

    /// Multi-line text field
    #[must_use]
    pub fn textarea(label: impl Into<String>) -> Self {
        Self::new(FieldKind::Textarea).with_label(label)
    }

    /// Select field with a static option list
    #[must_use]
    pub fn select(label: impl Into<String>, options: Vec<SelectOption>) -> Self {
        let mut descriptor = Self::new(FieldKind::Select).with_label(label);
        descriptor.options = options;
        descriptor
    }

    /// Checkbox field, unchecked by default
    #[must_use]
    pub fn checkbox(label: impl Into<String>) -> Self {
        Self::new(FieldKind::Checkbox)
            .with_label(label)
            .with_default(Value::Bool(false))
    }

    /// Date field
    #[must_use]
    pub fn date(label: impl Into<String>) -> Self {
        Self::new(FieldKind::Date).with_label(label)
    }

    /// Date range field
    #[must_use]
    pub fn date_range(label: impl Into<String>) -> Self {
        Self::new(FieldKind::DateRange).with_label(label)
    }

    /// Selector over a pre-fetched remote option list
    #[must_use]
    pub fn remote_option_selector(label: impl Into<String>, source: Vec<SelectOption>) -> Self {
        let mut descriptor = Self::new(FieldKind::RemoteOptionSelector).with_label(label);
        descriptor.options = source;
        descriptor
    }

    /// Markdown field
    #[must_use]
    pub fn markdown(label: impl Into<String>) -> Self {
        Self::new(FieldKind::Markdown).with_label(label)
    }

    /// Set label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Set description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Set placeholder
    #[inline]
    #[must_use]
    pub fn with_placeholder(mut self, placeholder: impl Into<String>) -> Self {
        self.placeholder = Some(placeholder.into());
        self
    }

    /// Set default value
    #[inline]
    #[must_use]
    pub fn with_default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    /// Set visibility condition
    #[inline]
    #[must_use]
    pub fn visible_when(mut self, condition: VisibleWhen) -> Self {
        self.visible_when = Some(condition);
        self
    }

    /// Add a validation rule
    #[inline]
    #[must_use]
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.rules.push(rule);
        self
    }

    /// Shorthand for the `Required` rule
    #[inline]
    #[must_use]
    pub fn required(self) -> Self {
        self.with_rule(ValidationRule::Required)
    }

    /// Attach an asynchronous validator
    #[inline]
    #[must_use]
    pub fn with_async_validator(mut self, validator: impl AsyncValidator + 'static) -> Self {
        self.async_validate = Some(SharedValidator::new(validator));
        self
    }

    /// Add a kind-specific attribute
    #[inline]
    #[must_use]
    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Check if rules mark this field as required
    #[inline]
    #[must_use]
    pub fn is_required(&self) -> bool {
        self.rules.contains(&ValidationRule::Required)
    }
}

/// Presentation of a repeating group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArrayLayout {
    /// All items always visible
    #[default]
    List,
    /// Items individually collapsible, with focus management
    Accordion,
}

/// Array of records, edited as a repeating group
#[derive(Debug, Clone, Default)]
pub struct FieldArrayDescriptor {
    /// Shape of one element
    pub item_template: Option<Box<SchemaNode>>,

    /// Lower bound on item count
    pub min_items: usize,

    /// Upper bound on item count
    pub max_items: Option<usize>,

    /// Value used for new and reset items; derived from the template if unset
    pub default_item: Option<Value>,

    /// Presentation variant
    pub layout: ArrayLayout,

    /// Group label
    pub label: Option<String>,
}

impl FieldArrayDescriptor {
    /// Create array over an item template
    #[must_use]
    pub fn of(template: impl Into<SchemaNode>) -> Self {
        Self {
            item_template: Some(Box::new(template.into())),
            ..Self::default()
        }
    }

    /// Set minimum item count
    #[inline]
    #[must_use]
    pub fn min_items(mut self, min: usize) -> Self {
        self.min_items = min;
        self
    }

    /// Set maximum item count
    #[inline]
    #[must_use]
    pub fn max_items(mut self, max: usize) -> Self {
        self.max_items = Some(max);
        self
    }

    /// Set default item value
    #[inline]
    #[must_use]
    pub fn default_item(mut self, value: Value) -> Self {
        self.default_item = Some(value);
        self
    }

    /// Use accordion presentation
    #[inline]
    #[must_use]
    pub fn accordion(mut self) -> Self {
        self.layout = ArrayLayout::Accordion;
        self
    }

    /// Set group label
    #[inline]
    #[must_use]
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }

    /// Get item template
    #[inline]
    #[must_use]
    pub fn item_template(&self) -> Option<&SchemaNode> {
        self.item_template.as_deref()
    }

    /// Value for a fresh or reset item
    #[must_use]
    pub fn default_item_value(&self) -> Value {
        match (&self.default_item, self.item_template()) {
            (Some(value), _) => value.clone(),
            (None, Some(template)) => template.default_value(),
            (None, None) => Value::Null,
        }
    }
}

/// One node of a form schema
#[derive(Debug, Clone)]
pub enum SchemaNode {
    /// Leaf field
    Field(FieldDescriptor),
    /// Nested record
    Group(FieldGroup),
    /// Repeating group
    Array(FieldArrayDescriptor),
}

impl SchemaNode {
    /// Default value for this subtree
    ///
    /// Leaves use their `default` (or `null`), groups build an object and
    /// arrays start with `min_items` default items.
    #[must_use]
    pub fn default_value(&self) -> Value {
        match self {
            Self::Field(field) => field.default.clone().unwrap_or(Value::Null),
            Self::Group(group) => Value::Object(
                group
                    .iter()
                    .map(|(name, node)| (name.to_string(), node.default_value()))
                    .collect(),
            ),
            Self::Array(array) => {
                Value::Array(vec![array.default_item_value(); array.min_items])
            }
        }
    }

    fn node_at(&self, segments: &[PathSegment]) -> Option<&SchemaNode> {
        let Some((first, rest)) = segments.split_first() else {
            return Some(self);
        };
        match (self, first) {
            (Self::Group(group), PathSegment::Key(key)) => group.get(key)?.node_at(rest),
            (Self::Array(array), PathSegment::Index(_)) => array.item_template()?.node_at(rest),
            _ => None,
        }
    }
}

impl From<FieldDescriptor> for SchemaNode {
    fn from(field: FieldDescriptor) -> Self {
        Self::Field(field)
    }
}

impl From<FieldGroup> for SchemaNode {
    fn from(group: FieldGroup) -> Self {
        Self::Group(group)
    }
}

impl From<FieldArrayDescriptor> for SchemaNode {
    fn from(array: FieldArrayDescriptor) -> Self {
        Self::Array(array)
    }
}

/// Nested record: property name to child node, in declaration order
///
/// Duplicate names are representable so that resolution can report them.
#[derive(Debug, Clone, Default)]
pub struct FieldGroup {
    entries: Vec<(String, SchemaNode)>,
}

impl FieldGroup {
    /// Create empty group
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Add a property, builder style
    #[must_use]
    pub fn field(mut self, name: impl Into<String>, node: impl Into<SchemaNode>) -> Self {
        self.insert(name, node);
        self
    }

    /// Add a property
    pub fn insert(&mut self, name: impl Into<String>, node: impl Into<SchemaNode>) {
        self.entries.push((name.into(), node.into()));
    }

    /// Get first property with this name
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&SchemaNode> {
        self.entries
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, node)| node)
    }

    /// Iterate properties in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &SchemaNode)> {
        self.entries.iter().map(|(name, node)| (name.as_str(), node))
    }

    /// Number of properties
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if group has no properties
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Find the schema node addressed by a concrete value path
    ///
    /// Index segments step into an array's item template, so
    /// `requests.3.endpoint` finds the `endpoint` descriptor.
    #[must_use]
    pub fn node_at(&self, path: &FieldPath) -> Option<&SchemaNode> {
        let (first, rest) = path.segments().split_first()?;
        self.get(first.as_key()?)?.node_at(rest)
    }

    /// Find the leaf descriptor at a concrete value path
    #[must_use]
    pub fn descriptor_at(&self, path: &FieldPath) -> Option<&FieldDescriptor> {
        match self.node_at(path)? {
            SchemaNode::Field(field) => Some(field),
            _ => None,
        }
    }

    /// Find the array descriptor at a concrete value path
    #[must_use]
    pub fn array_at(&self, path: &FieldPath) -> Option<&FieldArrayDescriptor> {
        match self.node_at(path)? {
            SchemaNode::Array(array) => Some(array),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn request_group() -> FieldGroup {
        FieldGroup::new()
            .field("title", FieldDescriptor::text_input("Title"))
            .field(
                "requests",
                FieldArrayDescriptor::of(
                    FieldGroup::new()
                        .field("endpoint", FieldDescriptor::text_input("Endpoint"))
                        .field("paginated", FieldDescriptor::checkbox("Paginated")),
                )
                .min_items(1),
            )
    }

    #[test]
    fn kind_tags_round_trip() {
        for kind in FieldKind::BUILTIN {
            let parsed: FieldKind = kind.tag().parse().unwrap();
            assert_eq!(parsed, kind);
            assert!(parsed.is_builtin());
        }
    }

    #[test]
    fn unknown_tag_parses_as_custom() {
        let kind: FieldKind = "color-picker".parse().unwrap();
        assert_eq!(kind, FieldKind::Custom("color-picker".into()));
        assert!(!kind.is_builtin());
        assert_eq!(kind.to_string(), "color-picker");
    }

    #[test]
    fn checkbox_defaults_to_false() {
        let field = FieldDescriptor::checkbox("Paginated");
        assert_eq!(field.default, Some(Value::Bool(false)));
    }

    #[test]
    fn required_shorthand() {
        let field = FieldDescriptor::text_input("Name").required();
        assert!(field.is_required());
    }

    #[test]
    fn group_preserves_declaration_order() {
        let group = FieldGroup::new()
            .field("b", FieldDescriptor::hidden())
            .field("a", FieldDescriptor::hidden());
        let names: Vec<_> = group.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["b", "a"]);
    }

    #[test]
    fn default_item_derived_from_template() {
        let group = request_group();
        let array = group.array_at(&FieldPath::single("requests")).unwrap();
        assert_eq!(
            array.default_item_value(),
            json!({"endpoint": null, "paginated": false})
        );
    }

    #[test]
    fn explicit_default_item_wins() {
        let array = FieldArrayDescriptor::of(FieldDescriptor::text_input("Tag"))
            .default_item(json!("untitled"));
        assert_eq!(array.default_item_value(), json!("untitled"));
    }

    #[test]
    fn group_default_value_includes_min_items() {
        let group = request_group();
        let value = SchemaNode::Group(group).default_value();
        assert_eq!(
            value,
            json!({
                "title": null,
                "requests": [{"endpoint": null, "paginated": false}],
            })
        );
    }

    #[test]
    fn descriptor_at_walks_indices() {
        let group = request_group();
        let path: FieldPath = "requests.3.endpoint".parse().unwrap();
        let field = group.descriptor_at(&path).unwrap();
        assert_eq!(field.label.as_deref(), Some("Endpoint"));

        assert!(group.descriptor_at(&"requests.endpoint".parse().unwrap()).is_none());
        assert!(group.descriptor_at(&"missing".parse().unwrap()).is_none());
        assert!(group.array_at(&"requests".parse().unwrap()).is_some());
    }

    #[tokio::test]
    async fn fn_validator_runs_closure() {
        let validator = validator_fn(|value: Value| async move {
            if value == json!("taken") {
                Some("already in use".to_string())
            } else {
                None
            }
        });
        assert_eq!(
            validator.validate(&json!("taken")).await.as_deref(),
            Some("already in use")
        );
        assert_eq!(validator.validate(&json!("free")).await, None);
    }
}
