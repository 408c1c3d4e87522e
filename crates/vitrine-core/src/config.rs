// ── CRUD view configuration ──
//
// Everything a view needs to know about one entity type: how to list it,
// filter it, edit it, and which workflow states it moves through.
// Built once per view and shared read-only as `Arc<CrudConfig>`; the
// store and pipeline never mutate it.

use std::collections::HashSet;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

use crate::error::CoreError;
use crate::model::{Draft, Entity, Value};

/// Filter value meaning "no filter".
pub const FILTER_ALL: &str = "all";

/// Rendered for attributes an entity does not have.
pub const PLACEHOLDER: &str = "-";

const DEFAULT_PAGE_SIZE: usize = 10;

/// Whether a filter value restricts anything.
pub fn is_active_filter_value(value: &str) -> bool {
    let value = value.trim();
    !value.is_empty() && !value.eq_ignore_ascii_case(FILTER_ALL)
}

// ── Sorting ──────────────────────────────────────────────────────────

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum SortDirection {
    #[default]
    Asc,
    Desc,
}

impl SortDirection {
    pub fn reversed(self) -> Self {
        match self {
            Self::Asc => Self::Desc,
            Self::Desc => Self::Asc,
        }
    }
}

/// Active sort: one attribute, one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: String,
    #[serde(default)]
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn new(key: impl Into<String>, direction: SortDirection) -> Self {
        Self {
            key: key.into(),
            direction,
        }
    }
}

// ── Columns ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Align {
    #[default]
    Left,
    Center,
    Right,
}

/// Custom cell renderer.
pub type RenderFn = Arc<dyn Fn(&Entity) -> String + Send + Sync>;

/// One table column.
#[derive(Clone, Serialize, Deserialize)]
pub struct ColumnDescriptor {
    /// Attribute name this column shows.
    pub key: String,
    pub title: String,
    #[serde(default = "default_true")]
    pub sortable: bool,
    #[serde(default)]
    pub width: Option<u16>,
    #[serde(default)]
    pub align: Align,
    #[serde(skip)]
    pub render: Option<RenderFn>,
}

impl ColumnDescriptor {
    pub fn new(key: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            title: title.into(),
            sortable: true,
            width: None,
            align: Align::Left,
            render: None,
        }
    }

    pub fn unsortable(mut self) -> Self {
        self.sortable = false;
        self
    }

    pub fn align(mut self, align: Align) -> Self {
        self.align = align;
        self
    }

    pub fn width(mut self, width: u16) -> Self {
        self.width = Some(width);
        self
    }

    pub fn render(mut self, f: impl Fn(&Entity) -> String + Send + Sync + 'static) -> Self {
        self.render = Some(Arc::new(f));
        self
    }

    /// Cell text for `entity`: the custom renderer if any, otherwise the
    /// attribute's display text, or [`PLACEHOLDER`] when it is missing.
    pub fn display(&self, entity: &Entity) -> String {
        if let Some(ref render) = self.render {
            return render(entity);
        }
        match entity.get(&self.key) {
            None | Some(Value::Null) => PLACEHOLDER.to_owned(),
            Some(value) => value.to_string(),
        }
    }
}

impl fmt::Debug for ColumnDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ColumnDescriptor")
            .field("key", &self.key)
            .field("title", &self.title)
            .field("sortable", &self.sortable)
            .field("width", &self.width)
            .field("align", &self.align)
            .field("render", &self.render.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

// ── Filters ──────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FilterKind {
    #[default]
    Text,
    Select,
    Date,
    Boolean,
}

/// A fixed choice for select filters and select form fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    pub value: String,
    pub label: String,
}

impl SelectOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterDescriptor {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub kind: FilterKind,
    #[serde(default)]
    pub options: Vec<SelectOption>,
}

impl FilterDescriptor {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FilterKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            options: Vec::new(),
        }
    }

    pub fn options(mut self, options: impl IntoIterator<Item = SelectOption>) -> Self {
        self.options = options.into_iter().collect();
        self
    }
}

// ── Form fields ──────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum FieldKind {
    #[default]
    Text,
    Email,
    Password,
    Number,
    Textarea,
    Select,
    Checkbox,
    Toggle,
    Date,
    File,
}

impl FieldKind {
    /// Kinds whose `min`/`max` bounds count characters.
    pub fn is_text_like(self) -> bool {
        matches!(self, Self::Text | Self::Email | Self::Password | Self::Textarea)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ValidationRule {
    /// Numeric lower bound, or minimum length for text-like fields.
    #[serde(default)]
    pub min: Option<f64>,
    /// Numeric upper bound, or maximum length for text-like fields.
    #[serde(default)]
    pub max: Option<f64>,
    /// Regular expression the value must match.
    #[serde(default)]
    pub pattern: Option<String>,
    /// Replaces the generic "Invalid format." for pattern mismatches.
    #[serde(default)]
    pub message: Option<String>,
}

pub type VisibilityFn = Arc<dyn Fn(&Draft) -> bool + Send + Sync>;

/// When a conditional field is shown (and therefore validated).
#[derive(Clone, Serialize, Deserialize)]
#[serde(tag = "when", rename_all = "snake_case")]
pub enum Visibility {
    /// Shown while `field` holds `value`.
    Equals { field: String, value: Value },
    /// Shown while `field` holds anything but `value`.
    NotEquals { field: String, value: Value },
    /// Shown while `field` is truthy (checked, non-empty, non-zero).
    Truthy { field: String },
    #[serde(skip)]
    Custom(VisibilityFn),
}

impl Visibility {
    pub fn custom(f: impl Fn(&Draft) -> bool + Send + Sync + 'static) -> Self {
        Self::Custom(Arc::new(f))
    }

    pub fn is_visible(&self, draft: &Draft) -> bool {
        match self {
            Self::Equals { field, value } => holds(draft, field, value),
            Self::NotEquals { field, value } => !holds(draft, field, value),
            Self::Truthy { field } => draft.get(field).is_some_and(Value::is_truthy),
            Self::Custom(f) => f(draft),
        }
    }
}

/// Loose equality: typed match, or same display text (`"true"` vs `true`).
fn holds(draft: &Draft, field: &str, expected: &Value) -> bool {
    draft
        .get(field)
        .is_some_and(|v| v == expected || v.to_string() == expected.to_string())
}

impl fmt::Debug for Visibility {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Equals { field, value } => write!(f, "Equals({field} == {value})"),
            Self::NotEquals { field, value } => write!(f, "NotEquals({field} != {value})"),
            Self::Truthy { field } => write!(f, "Truthy({field})"),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FormField {
    pub key: String,
    pub label: String,
    #[serde(default)]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub validation: ValidationRule,
    #[serde(default)]
    pub options: Vec<SelectOption>,
    #[serde(default)]
    pub placeholder: Option<String>,
    #[serde(default)]
    pub visible_when: Option<Visibility>,
}

impl FormField {
    pub fn new(key: impl Into<String>, label: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            key: key.into(),
            label: label.into(),
            kind,
            required: false,
            validation: ValidationRule::default(),
            options: Vec::new(),
            placeholder: None,
            visible_when: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn min(mut self, min: f64) -> Self {
        self.validation.min = Some(min);
        self
    }

    pub fn max(mut self, max: f64) -> Self {
        self.validation.max = Some(max);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>, message: Option<&str>) -> Self {
        self.validation.pattern = Some(pattern.into());
        self.validation.message = message.map(str::to_owned);
        self
    }

    pub fn options(mut self, options: impl IntoIterator<Item = SelectOption>) -> Self {
        self.options = options.into_iter().collect();
        self
    }

    pub fn visible_when(mut self, visibility: Visibility) -> Self {
        self.visible_when = Some(visibility);
        self
    }

    /// Whether the field is currently shown for `draft`.
    pub fn is_visible(&self, draft: &Draft) -> bool {
        self.visible_when
            .as_ref()
            .is_none_or(|visibility| visibility.is_visible(draft))
    }
}

// ── Status workflow ──────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusOption {
    pub value: String,
    pub label: String,
    /// Display color name (`green`, `yellow`, `red`, `blue`, `gray`, ...).
    #[serde(default = "default_status_color")]
    pub color: String,
}

impl StatusOption {
    pub fn new(value: impl Into<String>, label: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
            color: color.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusConfig {
    /// Attribute holding the workflow state.
    pub field: String,
    pub options: Vec<StatusOption>,
}

impl StatusConfig {
    pub fn new(field: impl Into<String>, options: impl IntoIterator<Item = StatusOption>) -> Self {
        Self {
            field: field.into(),
            options: options.into_iter().collect(),
        }
    }

    pub fn option(&self, value: &str) -> Option<&StatusOption> {
        self.options.iter().find(|o| o.value == value)
    }
}

// ── Feature toggles ──────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    #[serde(default = "default_true")]
    pub bulk_actions: bool,
    #[serde(default = "default_true")]
    pub status_update: bool,
    #[serde(default = "default_true")]
    pub row_actions: bool,
}

impl Default for Features {
    fn default() -> Self {
        Self {
            bulk_actions: true,
            status_update: true,
            row_actions: true,
        }
    }
}

// ── CrudConfig ───────────────────────────────────────────────────────

/// Immutable description of one CRUD view.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrudConfig {
    /// Singular display name ("Product").
    pub name: String,
    /// Plural display name ("Products").
    pub plural: String,
    /// Base resource path on the data-access collaborator ("products").
    pub resource: String,
    #[serde(default)]
    pub columns: Vec<ColumnDescriptor>,
    #[serde(default)]
    pub filters: Vec<FilterDescriptor>,
    #[serde(default)]
    pub form_fields: Vec<FormField>,
    /// Attributes the search box looks at.
    #[serde(default)]
    pub search_fields: Vec<String>,
    #[serde(default)]
    pub default_sort: Option<SortSpec>,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    #[serde(default)]
    pub status: Option<StatusConfig>,
    #[serde(default)]
    pub features: Features,
}

impl CrudConfig {
    pub fn new(
        name: impl Into<String>,
        plural: impl Into<String>,
        resource: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            plural: plural.into(),
            resource: resource.into(),
            columns: Vec::new(),
            filters: Vec::new(),
            form_fields: Vec::new(),
            search_fields: Vec::new(),
            default_sort: None,
            page_size: DEFAULT_PAGE_SIZE,
            status: None,
            features: Features::default(),
        }
    }

    // ── Builders ─────────────────────────────────────────────────────

    pub fn with_column(mut self, column: ColumnDescriptor) -> Self {
        self.columns.push(column);
        self
    }

    pub fn with_filter(mut self, filter: FilterDescriptor) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn with_field(mut self, field: FormField) -> Self {
        self.form_fields.push(field);
        self
    }

    pub fn with_search_fields<S: Into<String>>(mut self, keys: impl IntoIterator<Item = S>) -> Self {
        self.search_fields = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_default_sort(mut self, key: impl Into<String>, direction: SortDirection) -> Self {
        self.default_sort = Some(SortSpec::new(key, direction));
        self
    }

    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size;
        self
    }

    pub fn with_status(mut self, status: StatusConfig) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_features(mut self, features: Features) -> Self {
        self.features = features;
        self
    }

    // ── Lookups ──────────────────────────────────────────────────────

    pub fn column(&self, key: &str) -> Option<&ColumnDescriptor> {
        self.columns.iter().find(|c| c.key == key)
    }

    pub fn filter(&self, key: &str) -> Option<&FilterDescriptor> {
        self.filters.iter().find(|f| f.key == key)
    }

    pub fn field(&self, key: &str) -> Option<&FormField> {
        self.form_fields.iter().find(|f| f.key == key)
    }

    /// Attribute name of the status field, when the view has a workflow.
    pub fn status_field(&self) -> Option<&str> {
        self.status.as_ref().map(|s| s.field.as_str())
    }

    pub fn status_option(&self, value: &str) -> Option<&StatusOption> {
        self.status.as_ref().and_then(|s| s.option(value))
    }

    // ── Validation ───────────────────────────────────────────────────

    /// Reject configurations no view could work with.
    pub fn validate(&self) -> Result<(), CoreError> {
        if self.resource.trim().is_empty() {
            return Err(config_error(format!("{}: resource path is empty", self.plural)));
        }
        if self.page_size == 0 {
            return Err(config_error(format!("{}: page_size must be > 0", self.plural)));
        }
        if let Some(key) = first_duplicate(self.columns.iter().map(|c| c.key.as_str())) {
            return Err(config_error(format!("{}: duplicate column '{key}'", self.plural)));
        }
        if let Some(key) = first_duplicate(self.form_fields.iter().map(|f| f.key.as_str())) {
            return Err(config_error(format!("{}: duplicate form field '{key}'", self.plural)));
        }
        if let Some(ref status) = self.status {
            if status.options.is_empty() {
                return Err(config_error(format!(
                    "{}: status field '{}' has no options",
                    self.plural, status.field
                )));
            }
        }
        for field in &self.form_fields {
            if let Some(ref pattern) = field.validation.pattern {
                regex::Regex::new(pattern).map_err(|e| {
                    config_error(format!(
                        "{}: invalid pattern for field '{}': {e}",
                        self.plural, field.key
                    ))
                })?;
            }
        }
        Ok(())
    }
}

fn config_error(message: String) -> CoreError {
    CoreError::Config { message }
}

fn first_duplicate<'a>(keys: impl Iterator<Item = &'a str>) -> Option<&'a str> {
    let mut seen = HashSet::new();
    keys.into_iter().find(|key| !seen.insert(*key))
}

fn default_true() -> bool {
    true
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

fn default_status_color() -> String {
    "gray".into()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn products() -> CrudConfig {
        CrudConfig::new("Product", "Products", "products")
            .with_column(ColumnDescriptor::new("name", "Name"))
            .with_column(ColumnDescriptor::new("price", "Price").align(Align::Right))
            .with_field(FormField::new("name", "Name", FieldKind::Text).required())
            .with_status(StatusConfig::new(
                "status",
                [
                    StatusOption::new("draft", "Draft", "gray"),
                    StatusOption::new("published", "Published", "green"),
                ],
            ))
    }

    #[test]
    fn valid_config_passes() {
        products().validate().unwrap();
    }

    #[test]
    fn zero_page_size_rejected() {
        let err = products().with_page_size(0).validate().unwrap_err();
        assert!(err.to_string().contains("page_size"));
    }

    #[test]
    fn duplicate_columns_rejected() {
        let err = products()
            .with_column(ColumnDescriptor::new("name", "Again"))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("duplicate column 'name'"));
    }

    #[test]
    fn bad_pattern_rejected() {
        let err = products()
            .with_field(FormField::new("sku", "SKU", FieldKind::Text).pattern("([", None))
            .validate()
            .unwrap_err();
        assert!(err.to_string().contains("sku"));
    }

    #[test]
    fn column_display_uses_placeholder_and_renderer() {
        let entity = Entity::new("1").with("name", "Alpha").with("price", 10_i64);
        let price = ColumnDescriptor::new("price", "Price")
            .render(|e| format!("${}", e.text("price")));
        assert_eq!(price.display(&entity), "$10");
        assert_eq!(ColumnDescriptor::new("sku", "SKU").display(&entity), PLACEHOLDER);
    }

    #[test]
    fn filter_sentinels_are_inactive() {
        assert!(!is_active_filter_value(""));
        assert!(!is_active_filter_value("  "));
        assert!(!is_active_filter_value("ALL"));
        assert!(is_active_filter_value("published"));
    }

    #[test]
    fn declarative_visibility() {
        let field = FormField::new("company", "Company", FieldKind::Text).visible_when(
            Visibility::Equals {
                field: "kind".into(),
                value: Value::from("business"),
            },
        );
        assert!(!field.is_visible(&Draft::new()));
        assert!(field.is_visible(&Draft::new().with("kind", "business")));
        assert!(!field.is_visible(&Draft::new().with("kind", "personal")));
    }

    #[test]
    fn visibility_deserializes_from_toml() {
        let field: FormField = toml::from_str(
            r#"
            key = "discount"
            label = "Discount"
            kind = "number"
            visible_when = { when = "truthy", field = "on_sale" }
            "#,
        )
        .unwrap();
        assert!(field.is_visible(&Draft::new().with("on_sale", true)));
        assert!(!field.is_visible(&Draft::new().with("on_sale", false)));
    }

    #[test]
    fn status_lookup() {
        let config = products();
        assert_eq!(config.status_field(), Some("status"));
        assert_eq!(
            config.status_option("published").map(|o| o.color.as_str()),
            Some("green")
        );
        assert!(config.status_option("deleted").is_none());
    }
}
