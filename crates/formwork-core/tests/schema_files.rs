//! Forms driven entirely by configuration files.

use formwork_core::{FormConfig, FormError, FormSession, ValidateOn};
use formwork_render::Dispatcher;
use formwork_schema::{ConfigError, FieldGroup};
use formwork_store::{MemoryStore, ValueStore};
use formwork_test_utils::path;
use pretty_assertions::assert_eq;
use serde_json::json;
use std::sync::Arc;

const INQUIRY_YAML: &str = r#"
title:
  kind: text-input
  label: Title
  rules: [required]
steps:
  kind: array
  label: Steps
  min_items: 1
  max_items: 2
  layout: accordion
  item_template:
    question:
      kind: textarea
      label: Question
    responseType:
      kind: select
      label: Response type
      default: text
      options:
        - {label: Text, value: text}
        - {label: Select, value: select}
    choices:
      kind: textarea
      label: Choices
      visible_when:
        equals: {path: responseType, value: select}
"#;

const FORM_TOML: &str = r#"
validate_on = "change"
block_submit_while_pending = false
"#;

#[test]
fn yaml_schema_with_toml_config() -> anyhow::Result<()> {
    let schema = FieldGroup::from_yaml_str(INQUIRY_YAML)?;
    let config = FormConfig::from_toml_str(FORM_TOML)?;
    assert_eq!(config.validate_on, ValidateOn::Change);

    let store = Arc::new(MemoryStore::new());
    let mut form = FormSession::mount(schema, store.clone(), Dispatcher::with_defaults(), config)?;

    assert_eq!(
        store.get_all(),
        json!({"steps": [{"question": null, "responseType": "text", "choices": null}]})
    );

    let rendered = form.render()?;
    assert!(rendered.field(&path("steps.0.choices")).is_none());

    form.set_value(&path("steps.0.responseType"), json!("select"))?;
    let rendered = form.render()?;
    assert_eq!(rendered.field(&path("steps.0.choices")).unwrap().widget, "text-area");

    form.set_value(&path("title"), json!(""))?;
    assert_eq!(form.error(&path("title")).as_deref(), Some("This field is required"));
    Ok(())
}

#[test]
fn rendered_form_serializes_for_hosts() -> anyhow::Result<()> {
    let schema = FieldGroup::from_yaml_str(INQUIRY_YAML)?;
    let mut form = FormSession::mount(
        schema,
        Arc::new(MemoryStore::new()),
        Dispatcher::with_defaults(),
        FormConfig::default(),
    )?;

    let rendered = serde_json::to_value(form.render()?)?;
    assert_eq!(rendered["nodes"][0]["node"], json!("field"));
    assert_eq!(rendered["nodes"][0]["path"], json!("title"));
    assert_eq!(rendered["nodes"][1]["node"], json!("array"));
    assert_eq!(rendered["nodes"][1]["layout"], json!("accordion"));
    assert_eq!(rendered["nodes"][1]["items"][0]["expanded"], json!(true));
    Ok(())
}

#[test]
fn duplicate_properties_fail_at_mount() {
    let schema = FieldGroup::from_json_str(
        r#"{"name": {"kind": "text-input"}, "name": {"kind": "textarea"}}"#,
    )
    .unwrap();
    let err = FormSession::mount(
        schema,
        Arc::new(MemoryStore::new()),
        Dispatcher::with_defaults(),
        FormConfig::default(),
    )
    .unwrap_err();
    assert!(matches!(
        err,
        FormError::Config(ConfigError::DuplicateProperty { ref name, .. }) if name == "name"
    ));
}
