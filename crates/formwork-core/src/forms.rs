//! Built-in subtask forms
//!
//! Every subtask editor in the product is the same engine over a different
//! schema. [`SubtaskType::schema`] returns that schema.

use crate::error::FormError;
use formwork_schema::{
    FieldArrayDescriptor, FieldDescriptor, FieldGroup, FieldPath, SelectOption, ValidationRule,
    VisibleWhen,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::str::FromStr;

/// Kind of subtask, selecting its editor form
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SubtaskType {
    /// Free-form task with title, notes and schedule
    Generic,
    /// API requests to make
    Request,
    /// Questions for a form to be built
    FormBuilder,
    /// Steps of an inquiry process
    InquiryProcess,
    /// Presentations to give
    PresentationList,
}

impl SubtaskType {
    /// Every subtask type
    pub const ALL: [SubtaskType; 5] = [
        Self::Generic,
        Self::Request,
        Self::FormBuilder,
        Self::InquiryProcess,
        Self::PresentationList,
    ];

    /// Wire tag
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Generic => "generic",
            Self::Request => "request",
            Self::FormBuilder => "form-builder",
            Self::InquiryProcess => "inquiry-process",
            Self::PresentationList => "presentation-list",
        }
    }

    /// Human-readable name
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Generic => "Generic",
            Self::Request => "Request",
            Self::FormBuilder => "Form builder",
            Self::InquiryProcess => "Inquiry process",
            Self::PresentationList => "Presentation list",
        }
    }

    /// Form schema for this subtask type
    #[must_use]
    pub fn schema(self) -> FieldGroup {
        match self {
            Self::Generic => generic(),
            Self::Request => request(),
            Self::FormBuilder => form_builder(),
            Self::InquiryProcess => inquiry_process(),
            Self::PresentationList => presentation_list(),
        }
    }
}

impl fmt::Display for SubtaskType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SubtaskType {
    type Err = FormError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| FormError::UnknownSubtaskType(s.to_string()))
    }
}

fn options(values: &[&str]) -> Vec<SelectOption> {
    values.iter().map(|v| SelectOption::new(*v, *v)).collect()
}

fn generic() -> FieldGroup {
    FieldGroup::new()
        .field("id", FieldDescriptor::hidden())
        .field("title", FieldDescriptor::text_input("Title").required())
        .field("notes", FieldDescriptor::markdown("Notes"))
        .field("schedule", FieldDescriptor::date_range("Schedule"))
}

fn request() -> FieldGroup {
    FieldGroup::new().field(
        "requests",
        FieldArrayDescriptor::of(
            FieldGroup::new()
                .field(
                    "endpoint",
                    FieldDescriptor::text_input("Endpoint")
                        .with_placeholder("/users")
                        .required(),
                )
                .field(
                    "requestType",
                    FieldDescriptor::select(
                        "Request type",
                        options(&["GET", "POST", "PUT", "PATCH", "DELETE"]),
                    )
                    .with_default("GET"),
                )
                .field("paginated", FieldDescriptor::checkbox("Paginated")),
        )
        .min_items(1)
        .with_label("Requests"),
    )
}

fn form_builder() -> FieldGroup {
    FieldGroup::new()
        .field("formTitle", FieldDescriptor::text_input("Form title").required())
        .field(
            "fields",
            FieldArrayDescriptor::of(
                FieldGroup::new()
                    .field("label", FieldDescriptor::text_input("Label").required())
                    .field(
                        "fieldType",
                        FieldDescriptor::select(
                            "Field type",
                            options(&["text-input", "textarea", "select", "checkbox", "date"]),
                        )
                        .with_default("text-input"),
                    )
                    .field("required", FieldDescriptor::checkbox("Required"))
                    .field(
                        "options",
                        FieldDescriptor::textarea("Options")
                            .with_description("One option per line")
                            .visible_when(VisibleWhen::equals(
                                FieldPath::single("fieldType"),
                                "select",
                            )),
                    ),
            )
            .min_items(1)
            .accordion()
            .with_label("Fields"),
        )
}

fn inquiry_process() -> FieldGroup {
    FieldGroup::new()
        .field(
            "steps",
            FieldArrayDescriptor::of(
                FieldGroup::new()
                    .field("question", FieldDescriptor::textarea("Question").required())
                    .field(
                        "responseType",
                        FieldDescriptor::select(
                            "Response type",
                            options(&["text", "select", "checkbox"]),
                        )
                        .with_default("text"),
                    )
                    .field(
                        "choices",
                        FieldDescriptor::textarea("Choices").visible_when(VisibleWhen::OneOf {
                            path: FieldPath::single("responseType"),
                            values: vec![json!("select"), json!("checkbox")],
                        }),
                    )
                    .field(
                        "assignee",
                        FieldDescriptor::remote_option_selector("Assignee", Vec::new()),
                    ),
            )
            .min_items(1)
            .accordion()
            .with_label("Steps"),
        )
        .field(
            "escalation",
            FieldGroup::new()
                .field("enabled", FieldDescriptor::checkbox("Escalate unanswered steps"))
                .field(
                    "contact",
                    FieldDescriptor::text_input("Escalation contact")
                        .visible_when(VisibleWhen::Truthy(FieldPath::single("escalation").child("enabled")))
                        .with_rule(ValidationRule::Pattern(r"^[^@\s]+@[^@\s]+$".into())),
                ),
        )
}

fn presentation_list() -> FieldGroup {
    FieldGroup::new().field(
        "presentations",
        FieldArrayDescriptor::of(
            FieldGroup::new()
                .field("title", FieldDescriptor::text_input("Title").required())
                .field("presenter", FieldDescriptor::text_input("Presenter"))
                .field("date", FieldDescriptor::date("Date"))
                .field(
                    "slidesUrl",
                    FieldDescriptor::text_input("Slides URL")
                        .with_rule(ValidationRule::Pattern("^https?://".into())),
                )
                .field("speakerNotes", FieldDescriptor::markdown("Speaker notes"))
                .field(
                    "links",
                    FieldArrayDescriptor::of(
                        FieldGroup::new()
                            .field("label", FieldDescriptor::text_input("Label"))
                            .field("url", FieldDescriptor::text_input("URL")),
                    )
                    .max_items(5)
                    .with_label("Links"),
                ),
        )
        .with_label("Presentations"),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use formwork_schema::resolve;

    #[test]
    fn every_schema_resolves() {
        for kind in SubtaskType::ALL {
            assert!(resolve(&kind.schema()).is_ok(), "{kind} failed to resolve");
        }
    }

    #[test]
    fn tags_round_trip() {
        for kind in SubtaskType::ALL {
            assert_eq!(kind.as_str().parse::<SubtaskType>().unwrap(), kind);
        }
        assert!(matches!(
            "kanban".parse::<SubtaskType>(),
            Err(FormError::UnknownSubtaskType(_))
        ));
    }

    #[test]
    fn serde_uses_kebab_case() {
        let json = serde_json::to_string(&SubtaskType::InquiryProcess).unwrap();
        assert_eq!(json, "\"inquiry-process\"");
    }

    #[test]
    fn request_form_matches_requests_shape() {
        let schema = SubtaskType::Request.schema();
        let requests = schema.array_at(&FieldPath::single("requests")).unwrap();
        assert_eq!(requests.min_items, 1);
        assert_eq!(
            requests.default_item_value(),
            json!({"endpoint": null, "requestType": "GET", "paginated": false})
        );
    }
}
