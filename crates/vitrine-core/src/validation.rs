// ── Form validation ──
//
// Checks a draft against the view's form fields and collects every
// failure at once (not fail-fast). Hidden fields are skipped entirely.

use std::fmt;
use std::sync::LazyLock;

use indexmap::IndexMap;
use regex::Regex;
use serde::Serialize;
use tracing::warn;

use crate::config::{FieldKind, FormField};
use crate::model::{Draft, Value};

static EMAIL: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok());

const INVALID_FORMAT: &str = "Invalid format.";

/// Field key → message, in form-field order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ValidationErrors(IndexMap<String, String>);

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, message: impl Into<String>) {
        self.0.insert(key.into(), message.into());
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<&str> = self.0.values().map(String::as_str).collect();
        f.write_str(&parts.join("; "))
    }
}

/// Validate `draft` against `fields`. An empty result means submittable.
pub fn validate(fields: &[FormField], draft: &Draft) -> ValidationErrors {
    let mut errors = ValidationErrors::new();
    for field in fields {
        if !field.is_visible(draft) {
            continue;
        }
        if let Some(message) = check_field(field, draft.get(&field.key)) {
            errors.insert(field.key.clone(), message);
        }
    }
    errors
}

/// First failing rule for one field, if any.
fn check_field(field: &FormField, value: Option<&Value>) -> Option<String> {
    let label = &field.label;

    let Some(value) = value.filter(|v| !is_blank(field.kind, v)) else {
        return field.required.then(|| format!("{label} is required"));
    };

    let kind_error = match field.kind {
        FieldKind::Email => check_email(label, value),
        FieldKind::Number => check_number(field, value),
        FieldKind::Select => check_option(field, value),
        kind if kind.is_text_like() => check_length(field, value),
        _ => None,
    };
    kind_error.or_else(|| check_pattern(field, value))
}

/// Unchecked checkboxes and toggles count as "not filled in".
fn is_blank(kind: FieldKind, value: &Value) -> bool {
    match kind {
        FieldKind::Checkbox | FieldKind::Toggle => !value.is_truthy(),
        _ => value.is_empty(),
    }
}

fn check_email(label: &str, value: &Value) -> Option<String> {
    let text = value.to_string();
    let ok = EMAIL.as_ref().is_some_and(|re| re.is_match(text.trim()));
    (!ok).then(|| format!("{label} must be a valid email address"))
}

fn check_number(field: &FormField, value: &Value) -> Option<String> {
    let label = &field.label;
    let number = match value {
        Value::Number(n) => Some(*n),
        Value::Text(s) => s.trim().parse::<f64>().ok().filter(|n| n.is_finite()),
        _ => None,
    };
    let Some(number) = number else {
        return Some(format!("{label} must be a number"));
    };
    if let Some(min) = field.validation.min {
        if number < min {
            return Some(format!("{label} must be at least {}", Value::from(min)));
        }
    }
    if let Some(max) = field.validation.max {
        if number > max {
            return Some(format!("{label} must be at most {}", Value::from(max)));
        }
    }
    None
}

#[allow(clippy::cast_precision_loss, clippy::as_conversions)]
fn check_length(field: &FormField, value: &Value) -> Option<String> {
    let label = &field.label;
    let len = value.to_string().chars().count() as f64;
    if let Some(min) = field.validation.min {
        if len < min {
            return Some(format!(
                "{label} must be at least {} characters",
                Value::from(min)
            ));
        }
    }
    if let Some(max) = field.validation.max {
        if len > max {
            return Some(format!(
                "{label} must be at most {} characters",
                Value::from(max)
            ));
        }
    }
    None
}

fn check_option(field: &FormField, value: &Value) -> Option<String> {
    if field.options.is_empty() {
        return None;
    }
    let text = value.to_string();
    let known = field.options.iter().any(|o| o.value == text);
    (!known).then(|| format!("{} has an invalid option", field.label))
}

fn check_pattern(field: &FormField, value: &Value) -> Option<String> {
    let pattern = field.validation.pattern.as_deref()?;
    let re = match Regex::new(pattern) {
        Ok(re) => re,
        Err(e) => {
            warn!(field = %field.key, error = %e, "ignoring invalid validation pattern");
            return None;
        }
    };
    if re.is_match(&value.to_string()) {
        None
    } else {
        Some(
            field
                .validation
                .message
                .clone()
                .unwrap_or_else(|| INVALID_FORMAT.to_owned()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{SelectOption, Visibility};
    use pretty_assertions::assert_eq;

    fn fields() -> Vec<FormField> {
        vec![
            FormField::new("name", "Name", FieldKind::Text)
                .required()
                .min(2.0)
                .max(40.0),
            FormField::new("email", "Email", FieldKind::Email),
            FormField::new("price", "Price", FieldKind::Number).min(0.0).max(1000.0),
            FormField::new("category", "Category", FieldKind::Select).options([
                SelectOption::new("hardware", "Hardware"),
                SelectOption::new("software", "Software"),
            ]),
            FormField::new("sku", "SKU", FieldKind::Text)
                .pattern(r"^[A-Z]{3}-\d{3}$", Some("Use the ABC-123 format")),
            FormField::new("code", "Code", FieldKind::Text).pattern(r"^\d+$", None),
        ]
    }

    #[test]
    fn empty_required_text_field() {
        let errors = validate(&fields(), &Draft::new().with("name", ""));
        assert_eq!(errors.get("name"), Some("Name is required"));
        assert_eq!(errors.len(), 1);
    }

    #[test]
    fn valid_draft_has_no_errors() {
        let draft = Draft::new()
            .with("name", "Widget")
            .with("email", "ops@example.com")
            .with("price", "19.5")
            .with("category", "hardware")
            .with("sku", "ABC-123");
        assert!(validate(&fields(), &draft).is_empty());
    }

    #[test]
    fn every_failure_is_reported_in_field_order() {
        let draft = Draft::new()
            .with("name", "W")
            .with("email", "not-an-email")
            .with("price", "cheap")
            .with("category", "furniture")
            .with("sku", "abc")
            .with("code", "x1");
        let errors = validate(&fields(), &draft);
        let collected: Vec<(&str, &str)> = errors.iter().collect();
        assert_eq!(
            collected,
            vec![
                ("name", "Name must be at least 2 characters"),
                ("email", "Email must be a valid email address"),
                ("price", "Price must be a number"),
                ("category", "Category has an invalid option"),
                ("sku", "Use the ABC-123 format"),
                ("code", "Invalid format."),
            ]
        );
    }

    #[test]
    fn numeric_bounds() {
        let errors = validate(&fields(), &Draft::new().with("name", "ok").with("price", -1_i64));
        assert_eq!(errors.get("price"), Some("Price must be at least 0"));

        let errors = validate(&fields(), &Draft::new().with("name", "ok").with("price", 1500_i64));
        assert_eq!(errors.get("price"), Some("Price must be at most 1000"));
    }

    #[test]
    fn optional_empty_fields_skip_type_checks() {
        let draft = Draft::new().with("name", "ok").with("email", "").with("price", "");
        assert!(validate(&fields(), &draft).is_empty());
    }

    #[test]
    fn hidden_fields_are_skipped() {
        let fields = vec![
            FormField::new("company", "Company", FieldKind::Text)
                .required()
                .visible_when(Visibility::Equals {
                    field: "kind".into(),
                    value: Value::from("business"),
                }),
        ];
        assert!(validate(&fields, &Draft::new().with("kind", "personal")).is_empty());
        let errors = validate(&fields, &Draft::new().with("kind", "business"));
        assert_eq!(errors.get("company"), Some("Company is required"));
    }

    #[test]
    fn required_checkbox_must_be_checked() {
        let fields = vec![FormField::new("terms", "Terms", FieldKind::Checkbox).required()];
        let errors = validate(&fields, &Draft::new().with("terms", false));
        assert_eq!(errors.get("terms"), Some("Terms is required"));
        assert!(validate(&fields, &Draft::new().with("terms", true)).is_empty());
    }

    #[test]
    fn display_joins_messages() {
        let errors = validate(&fields(), &Draft::new());
        assert_eq!(errors.to_string(), "Name is required");
    }
}
