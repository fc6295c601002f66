//! The form schema model.
//!
//! A [`Form`] is a named, versioned list of [`FieldGroup`]s, each holding typed
//! [`Field`]s with optional [`ValidationRule`]s, plus a persistence policy and
//! a [`SubmitConfig`]. Schemas serialize as camelCase JSON.
//!
//! Forms are created from a [`FormDraft`] and mutated only through the form
//! repository's update operation, which bumps [`Form::version`].

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use formcraft_core::{ExpiryDuration, FormcraftError, PersistenceMode};

use crate::rules::ValidationRule;
use crate::validation::chrono_date_format;
use crate::value::FieldValue;

/// The declared type of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FieldType {
    /// Single-line text.
    Text,
    /// A number.
    Number,
    /// Formatted text (markup is stored as-is).
    RichText,
    /// A calendar date.
    Date,
    /// Exactly one of the declared options.
    SingleSelect,
    /// Any subset of the declared options.
    MultiSelect,
    /// One email address, or several separated by commas.
    Email,
}

impl FieldType {
    /// Every field type, in builder order.
    pub const ALL: [Self; 7] = [
        Self::Text,
        Self::Number,
        Self::RichText,
        Self::Date,
        Self::SingleSelect,
        Self::MultiSelect,
        Self::Email,
    ];

    /// Returns `true` for the select types, which require options.
    pub const fn has_options(self) -> bool {
        matches!(self, Self::SingleSelect | Self::MultiSelect)
    }

    /// Returns the schema name of the type (e.g. `richText`).
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Number => "number",
            Self::RichText => "richText",
            Self::Date => "date",
            Self::SingleSelect => "singleSelect",
            Self::MultiSelect => "multiSelect",
            Self::Email => "email",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One choice of a select field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectOption {
    /// Machine key; unique within the field.
    pub value: String,
    /// Display text.
    pub label: String,
}

impl SelectOption {
    /// Creates an option.
    pub fn new(value: impl Into<String>, label: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            label: label.into(),
        }
    }
}

/// A single typed input definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Field {
    /// Identity, unique within the form.
    pub id: String,
    /// Name used as the payload key.
    pub name: String,
    /// Help text.
    #[serde(default)]
    pub description: String,
    /// The declared type.
    #[serde(rename = "type")]
    pub field_type: FieldType,
    /// Validation rules, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub validation: Option<ValidationRule>,
    /// Options for select fields.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<SelectOption>,
    /// Placeholder text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    /// Value seeded when nothing is stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_value: Option<FieldValue>,
    /// Overrides the form's persistence mode for this field.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub persistence_type: Option<PersistenceMode>,
    /// Display/parse format for date fields (e.g. `dd/MM/yyyy`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_format: Option<String>,
}

impl Field {
    /// Creates a field with no rules or options.
    pub fn new(id: impl Into<String>, name: impl Into<String>, field_type: FieldType) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: String::new(),
            field_type,
            validation: None,
            options: Vec::new(),
            placeholder: None,
            default_value: None,
            persistence_type: None,
            date_format: None,
        }
    }

    /// Sets the validation rules.
    #[must_use]
    pub fn validation(mut self, rule: ValidationRule) -> Self {
        self.validation = Some(rule);
        self
    }

    /// Sets the required flag, keeping any other rules.
    #[must_use]
    pub fn required(mut self, required: bool) -> Self {
        self.validation.get_or_insert_with(ValidationRule::default).required = required;
        self
    }

    /// Sets the select options.
    #[must_use]
    pub fn options(mut self, options: Vec<SelectOption>) -> Self {
        self.options = options;
        self
    }

    /// Sets the default value.
    #[must_use]
    pub fn default_value(mut self, value: impl Into<FieldValue>) -> Self {
        self.default_value = Some(value.into());
        self
    }

    /// Sets the per-field persistence override.
    #[must_use]
    pub const fn persistence(mut self, mode: PersistenceMode) -> Self {
        self.persistence_type = Some(mode);
        self
    }

    /// Sets the date format.
    #[must_use]
    pub fn date_format(mut self, format: impl Into<String>) -> Self {
        self.date_format = Some(format.into());
        self
    }

    /// Sets the description.
    #[must_use]
    pub fn description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Returns `true` if the field's rules mark it required.
    pub fn is_required(&self) -> bool {
        self.validation.as_ref().is_some_and(|r| r.required)
    }

    /// Returns `true` if `value` is one of the declared option values.
    pub fn has_option(&self, value: &str) -> bool {
        self.options.iter().any(|o| o.value == value)
    }
}

/// A named group of fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldGroup {
    /// Identity.
    pub id: String,
    /// Name used as the payload key.
    pub name: String,
    /// Optional description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// The group's fields, in display order.
    #[serde(default)]
    pub fields: Vec<Field>,
}

impl FieldGroup {
    /// Creates a group.
    pub fn new(id: impl Into<String>, name: impl Into<String>, fields: Vec<Field>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
            fields,
        }
    }

    /// Groups without fields are kept in the schema but not rendered.
    pub fn is_rendered(&self) -> bool {
        !self.fields.is_empty()
    }
}

/// HTTP method used for submission.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    /// GET
    Get,
    /// POST
    #[default]
    Post,
    /// PUT
    Put,
    /// PATCH
    Patch,
    /// DELETE
    Delete,
}

impl HttpMethod {
    /// Returns the method name in uppercase.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Put => "PUT",
            Self::Patch => "PATCH",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How and where a form is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SubmitConfig {
    /// Submit button text.
    pub text: String,
    /// Target endpoint URL.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_endpoint: Option<String>,
    /// HTTP method.
    pub http_method: HttpMethod,
    /// Whether to validate every field before sending.
    pub validation: bool,
    /// Extra request headers. `Content-Type` is always `application/json`.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub headers: BTreeMap<String, String>,
}

impl Default for SubmitConfig {
    fn default() -> Self {
        Self {
            text: "Submit".to_string(),
            api_endpoint: None,
            http_method: HttpMethod::Post,
            validation: true,
            headers: BTreeMap::new(),
        }
    }
}

impl SubmitConfig {
    /// Returns the endpoint if it is set and not blank.
    pub fn endpoint(&self) -> Option<&str> {
        self.api_endpoint
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}

/// Builder input for a new form: everything except identity, version, and timestamps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FormDraft {
    /// Display name.
    pub name: String,
    /// Field groups.
    #[serde(default)]
    pub groups: Vec<FieldGroup>,
    /// Persistence mode; the configured default when absent.
    #[serde(default)]
    pub persistence_type: Option<PersistenceMode>,
    /// Expiry for permanent persistence.
    #[serde(default)]
    pub expiry_duration: Option<ExpiryDuration>,
    /// Submission settings; defaults when absent.
    #[serde(default)]
    pub submit_config: Option<SubmitConfig>,
}

/// A named, versioned form schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Form {
    /// Identity.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Field groups, in display order.
    pub groups: Vec<FieldGroup>,
    /// Starts at 1; incremented by exactly 1 on every update.
    pub version: u32,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last update time.
    pub updated_at: DateTime<Utc>,
    /// Where in-progress values are kept.
    pub persistence_type: PersistenceMode,
    /// Lifetime of permanent entries. Only meaningful for `permanent`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_duration: Option<ExpiryDuration>,
    /// Submission settings.
    #[serde(default)]
    pub submit_config: SubmitConfig,
}

impl Form {
    /// Builds a version-1 form from a draft with a fresh identity.
    ///
    /// `default_persistence` is used when the draft does not choose a mode.
    /// An expiry on a non-permanent draft is dropped.
    pub fn from_draft(draft: FormDraft, default_persistence: PersistenceMode) -> Self {
        let now = Utc::now();
        let persistence_type = draft.persistence_type.unwrap_or(default_persistence);
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: draft.name,
            groups: draft.groups,
            version: 1,
            created_at: now,
            updated_at: now,
            persistence_type,
            expiry_duration: draft
                .expiry_duration
                .filter(|_| persistence_type == PersistenceMode::Permanent),
            submit_config: draft.submit_config.unwrap_or_default(),
        }
    }

    /// Iterates over every field of every group, in display order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.groups.iter().flat_map(|g| g.fields.iter())
    }

    /// Looks up a field by id.
    pub fn field(&self, field_id: &str) -> Option<&Field> {
        self.fields().find(|f| f.id == field_id)
    }

    /// Groups that have at least one field.
    pub fn rendered_groups(&self) -> impl Iterator<Item = &FieldGroup> {
        self.groups.iter().filter(|g| g.is_rendered())
    }

    /// The persistence mode that applies to one field.
    pub fn field_persistence(&self, field: &Field) -> PersistenceMode {
        field.persistence_type.unwrap_or(self.persistence_type)
    }

    /// The expiry of permanent entries, falling back to `default`.
    pub fn expiry_or(&self, default: ExpiryDuration) -> ExpiryDuration {
        self.expiry_duration.unwrap_or(default)
    }

    /// Checks the structural rules of the schema.
    ///
    /// # Errors
    ///
    /// Returns [`FormcraftError::InvalidSchema`] describing the first problem found.
    pub fn check(&self) -> Result<(), FormcraftError> {
        check_schema(&self.name, &self.groups, &self.submit_config)
    }
}

/// Checks the structural rules shared by drafts and forms.
///
/// - the name is not blank and there is at least one group;
/// - field ids are unique across the form;
/// - select fields have at least one option, with unique values;
/// - length and range bounds are ordered, patterns compile;
/// - date formats use supported tokens;
/// - the endpoint, when set, is an absolute URL.
pub fn check_schema(
    name: &str,
    groups: &[FieldGroup],
    submit_config: &SubmitConfig,
) -> Result<(), FormcraftError> {
    let invalid = |msg: String| Err(FormcraftError::InvalidSchema(msg));

    if name.trim().is_empty() {
        return invalid("Form name is required".to_string());
    }
    if groups.is_empty() {
        return invalid("At least one group is required".to_string());
    }

    let mut field_ids = HashSet::new();
    for field in groups.iter().flat_map(|g| g.fields.iter()) {
        if !field_ids.insert(field.id.as_str()) {
            return invalid(format!("Duplicate field id \"{}\"", field.id));
        }

        if field.field_type.has_options() {
            if field.options.is_empty() {
                return invalid(format!(
                    "Field \"{}\" requires at least one option",
                    field.name
                ));
            }
            let mut values = HashSet::new();
            if let Some(dup) = field.options.iter().find(|o| !values.insert(o.value.as_str())) {
                return invalid(format!(
                    "Field \"{}\" has duplicate option value \"{}\"",
                    field.name, dup.value
                ));
            }
        }

        if let Some(rule) = &field.validation {
            rule.check().map_err(|msg| {
                FormcraftError::InvalidSchema(format!("Field \"{}\": {msg}", field.name))
            })?;
        }

        if field.field_type == FieldType::Date {
            if let Some(format) = &field.date_format {
                if chrono_date_format(format).is_none() {
                    return invalid(format!(
                        "Field \"{}\" has unsupported date format \"{format}\"",
                        field.name
                    ));
                }
            }
        }
    }

    if let Some(endpoint) = submit_config.endpoint() {
        url::Url::parse(endpoint).map_err(|e| {
            FormcraftError::InvalidSchema(format!("Invalid endpoint URL \"{endpoint}\": {e}"))
        })?;
    }

    Ok(())
}

impl FormDraft {
    /// Checks the structural rules of the draft. See [`check_schema`].
    pub fn check(&self) -> Result<(), FormcraftError> {
        check_schema(
            &self.name,
            &self.groups,
            self.submit_config.as_ref().unwrap_or(&SubmitConfig::default()),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rules::ValidationRule;

    fn contact_group() -> FieldGroup {
        FieldGroup::new(
            "g1",
            "Contact",
            vec![
                Field::new("f1", "Name", FieldType::Text).required(true),
                Field::new("f2", "Topic", FieldType::SingleSelect)
                    .options(vec![SelectOption::new("sales", "Sales")]),
            ],
        )
    }

    fn draft() -> FormDraft {
        FormDraft {
            name: "Contact us".to_string(),
            groups: vec![contact_group()],
            ..FormDraft::default()
        }
    }

    #[test]
    fn test_from_draft_starts_at_version_one() {
        let form = Form::from_draft(draft(), PersistenceMode::Session);
        assert_eq!(form.version, 1);
        assert_eq!(form.created_at, form.updated_at);
        assert_eq!(form.persistence_type, PersistenceMode::Session);
        assert_eq!(form.submit_config.text, "Submit");
        assert!(form.submit_config.validation);
        assert!(!form.id.is_empty());
    }

    #[test]
    fn test_from_draft_drops_expiry_unless_permanent() {
        let mut d = draft();
        d.expiry_duration = Some(ExpiryDuration::OneDay);
        let form = Form::from_draft(d.clone(), PersistenceMode::Session);
        assert!(form.expiry_duration.is_none());

        d.persistence_type = Some(PersistenceMode::Permanent);
        let form = Form::from_draft(d, PersistenceMode::Session);
        assert_eq!(form.expiry_duration, Some(ExpiryDuration::OneDay));
    }

    #[test]
    fn test_check_accepts_valid_draft() {
        assert!(draft().check().is_ok());
    }

    #[test]
    fn test_check_requires_name_and_groups() {
        let mut d = draft();
        d.name = "  ".to_string();
        assert!(d.check().unwrap_err().to_string().contains("Form name is required"));

        let mut d = draft();
        d.groups.clear();
        assert!(d.check().unwrap_err().to_string().contains("At least one group"));
    }

    #[test]
    fn test_check_select_needs_options() {
        let mut d = draft();
        d.groups[0].fields[1].options.clear();
        let err = d.check().unwrap_err();
        assert!(err.to_string().contains("\"Topic\" requires at least one option"));
    }

    #[test]
    fn test_check_duplicate_option_values() {
        let mut d = draft();
        d.groups[0].fields[1]
            .options
            .push(SelectOption::new("sales", "Sales again"));
        assert!(d.check().unwrap_err().to_string().contains("duplicate option value"));
    }

    #[test]
    fn test_check_duplicate_field_ids() {
        let mut d = draft();
        d.groups.push(FieldGroup::new(
            "g2",
            "Other",
            vec![Field::new("f1", "Again", FieldType::Text)],
        ));
        assert!(d.check().unwrap_err().to_string().contains("Duplicate field id"));
    }

    #[test]
    fn test_check_bad_pattern_and_bounds() {
        let mut d = draft();
        d.groups[0].fields[0].validation = Some(ValidationRule {
            pattern: Some("([a-z".to_string()),
            ..ValidationRule::default()
        });
        assert!(d.check().is_err());

        let mut d = draft();
        d.groups[0].fields[0].validation = Some(ValidationRule {
            min_length: Some(5),
            max_length: Some(2),
            ..ValidationRule::default()
        });
        assert!(d.check().is_err());
    }

    #[test]
    fn test_check_date_format() {
        let mut d = draft();
        d.groups[0]
            .fields
            .push(Field::new("f3", "When", FieldType::Date).date_format("dd/MM/yyyy"));
        assert!(d.check().is_ok());

        d.groups[0].fields[2].date_format = Some("dd/MM/yyyy HH:mm".to_string());
        assert!(d.check().is_err());
    }

    #[test]
    fn test_check_endpoint_url() {
        let mut d = draft();
        d.submit_config = Some(SubmitConfig {
            api_endpoint: Some("not a url".to_string()),
            ..SubmitConfig::default()
        });
        assert!(d.check().unwrap_err().to_string().contains("Invalid endpoint URL"));

        d.submit_config = Some(SubmitConfig {
            api_endpoint: Some("https://api.example.com/forms".to_string()),
            ..SubmitConfig::default()
        });
        assert!(d.check().is_ok());
    }

    #[test]
    fn test_field_persistence_override() {
        let mut form = Form::from_draft(draft(), PersistenceMode::Permanent);
        form.groups[0].fields[0].persistence_type = Some(PersistenceMode::None);
        let name = form.field("f1").unwrap();
        let topic = form.field("f2").unwrap();
        assert_eq!(form.field_persistence(name), PersistenceMode::None);
        assert_eq!(form.field_persistence(topic), PersistenceMode::Permanent);
    }

    #[test]
    fn test_rendered_groups_skip_empty() {
        let mut form = Form::from_draft(draft(), PersistenceMode::Session);
        form.groups.push(FieldGroup::new("g2", "Empty", vec![]));
        assert_eq!(form.rendered_groups().count(), 1);
        assert_eq!(form.groups.len(), 2);
    }

    #[test]
    fn test_schema_json_is_camel_case() {
        let form = Form::from_draft(draft(), PersistenceMode::Session);
        let json = serde_json::to_value(&form).unwrap();
        assert_eq!(json["persistenceType"], "session");
        assert_eq!(json["submitConfig"]["httpMethod"], "POST");
        assert_eq!(json["groups"][0]["fields"][1]["type"], "singleSelect");

        let back: Form = serde_json::from_value(json).unwrap();
        assert_eq!(back, form);
    }

    #[test]
    fn test_endpoint_blank_is_none() {
        let config = SubmitConfig {
            api_endpoint: Some("   ".to_string()),
            ..SubmitConfig::default()
        };
        assert!(config.endpoint().is_none());
    }
}
