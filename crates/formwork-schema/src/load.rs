//! Loading schemas from JSON and YAML documents
//!
//! Node classification:
//! - a map whose `kind` is `array` is a [`FieldArrayDescriptor`]
//! - a map whose `kind` is any other string is a [`FieldDescriptor`]
//! - any other map is a [`FieldGroup`]
//!
//! Group properties are kept in document order, duplicates included, so the
//! resolver can reject them.

use crate::descriptor::{ArrayLayout, FieldArrayDescriptor, FieldGroup, SchemaNode, ARRAY_TAG};
use crate::error::ConfigError;
use serde::de::{self, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::Value;
use std::fmt;

/// Document tree that keeps map entries in order, duplicates included
enum Raw {
    Map(Vec<(String, Raw)>),
    Value(Value),
}

impl Raw {
    fn into_value(self) -> Value {
        match self {
            Self::Value(value) => value,
            Self::Map(entries) => Value::Object(
                entries
                    .into_iter()
                    .map(|(key, raw)| (key, raw.into_value()))
                    .collect(),
            ),
        }
    }
}

impl<'de> Deserialize<'de> for Raw {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(RawVisitor)
    }
}

struct RawVisitor;

impl<'de> Visitor<'de> for RawVisitor {
    type Value = Raw;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a schema document")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Raw, E> {
        Ok(Raw::Value(Value::Bool(v)))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Raw, E> {
        Ok(Raw::Value(Value::from(v)))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Raw, E> {
        Ok(Raw::Value(Value::from(v)))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Raw, E> {
        Ok(Raw::Value(Value::from(v)))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Raw, E> {
        Ok(Raw::Value(Value::String(v.to_string())))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Raw, E> {
        Ok(Raw::Value(Value::String(v)))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Raw, E> {
        Ok(Raw::Value(Value::Null))
    }

    fn visit_none<E: de::Error>(self) -> Result<Raw, E> {
        Ok(Raw::Value(Value::Null))
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Raw, D::Error> {
        Raw::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Raw, A::Error> {
        let mut items = Vec::new();
        while let Some(item) = seq.next_element::<Raw>()? {
            items.push(item.into_value());
        }
        Ok(Raw::Value(Value::Array(items)))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Raw, A::Error> {
        let mut entries = Vec::new();
        while let Some((key, value)) = map.next_entry::<String, Raw>()? {
            entries.push((key, value));
        }
        Ok(Raw::Map(entries))
    }
}

/// Array attributes besides the template
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ArraySettings {
    kind: String,
    #[serde(default)]
    min_items: usize,
    #[serde(default)]
    max_items: Option<usize>,
    #[serde(default)]
    default_item: Option<Value>,
    #[serde(default)]
    layout: ArrayLayout,
    #[serde(default)]
    label: Option<String>,
}

fn kind_of(entries: &[(String, Raw)]) -> Option<&str> {
    entries.iter().find_map(|(key, raw)| match (key.as_str(), raw) {
        ("kind", Raw::Value(Value::String(kind))) => Some(kind.as_str()),
        _ => None,
    })
}

fn node_from_raw(raw: Raw) -> Result<SchemaNode, String> {
    let entries = match raw {
        Raw::Map(entries) => entries,
        Raw::Value(value) => {
            return Err(format!(
                "expected a field, group or array node, found {value}"
            ))
        }
    };

    match kind_of(&entries) {
        Some(ARRAY_TAG) => array_from_entries(entries).map(SchemaNode::Array),
        Some(_) => serde_json::from_value(Raw::Map(entries).into_value())
            .map(SchemaNode::Field)
            .map_err(|e| e.to_string()),
        None => group_from_entries(entries).map(SchemaNode::Group),
    }
}

fn array_from_entries(entries: Vec<(String, Raw)>) -> Result<FieldArrayDescriptor, String> {
    let mut template = None;
    let mut settings = Vec::with_capacity(entries.len());
    for (key, raw) in entries {
        if key == "item_template" {
            template = Some(Box::new(node_from_raw(raw)?));
        } else {
            settings.push((key, raw));
        }
    }

    let settings: ArraySettings =
        serde_json::from_value(Raw::Map(settings).into_value()).map_err(|e| e.to_string())?;
    debug_assert_eq!(settings.kind, ARRAY_TAG);

    Ok(FieldArrayDescriptor {
        item_template: template,
        min_items: settings.min_items,
        max_items: settings.max_items,
        default_item: settings.default_item,
        layout: settings.layout,
        label: settings.label,
    })
}

fn group_from_entries(entries: Vec<(String, Raw)>) -> Result<FieldGroup, String> {
    let mut group = FieldGroup::new();
    for (name, raw) in entries {
        let node = node_from_raw(raw).map_err(|e| format!("{name}: {e}"))?;
        group.insert(name, node);
    }
    Ok(group)
}

impl<'de> Deserialize<'de> for SchemaNode {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        node_from_raw(Raw::deserialize(deserializer)?).map_err(de::Error::custom)
    }
}

impl<'de> Deserialize<'de> for FieldGroup {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        match Raw::deserialize(deserializer)? {
            Raw::Map(entries) => group_from_entries(entries).map_err(de::Error::custom),
            Raw::Value(value) => Err(de::Error::custom(format!(
                "expected a group of fields, found {value}"
            ))),
        }
    }
}

impl FieldGroup {
    /// Load a schema from a JSON document
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed documents
    pub fn from_json_str(source: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// Load a schema from a YAML document
    ///
    /// # Errors
    /// Returns [`ConfigError::Parse`] for malformed documents
    pub fn from_yaml_str(source: &str) -> Result<Self, ConfigError> {
        serde_yaml::from_str(source).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}
