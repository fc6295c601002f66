//! Submission payload assembly.
//!
//! The payload groups values by group *name* and field *name*:
//!
//! ```json
//! {
//!   "formId": "…", "formName": "Contact", "version": 3,
//!   "submittedAt": "2024-06-01T10:00:00Z",
//!   "data": {"contact": {"email": "a@example.com", "topics": ["rust"]}}
//! }
//! ```
//!
//! Groups without fields are left out. Fields without a value are sent as `null`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use formcraft_forms::{Field, FieldType, FieldValue, Form, FormData};

/// The JSON body sent to the submit endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmissionPayload {
    /// Id of the submitted form.
    pub form_id: String,
    /// Display name of the form.
    pub form_name: String,
    /// Schema version the values were entered against.
    pub version: u32,
    /// When the payload was built.
    pub submitted_at: DateTime<Utc>,
    /// `{group name: {field name: value}}`.
    pub data: Map<String, Value>,
}

impl SubmissionPayload {
    /// Builds the payload for `form` from `values`, stamped with the current time.
    pub fn build(form: &Form, values: &FormData) -> Self {
        let mut data = Map::new();
        for group in form.rendered_groups() {
            let entry = data
                .entry(group.name.clone())
                .or_insert_with(|| Value::Object(Map::new()));
            if let Value::Object(fields) = entry {
                for field in &group.fields {
                    let value = values
                        .get(&field.id)
                        .map_or(Value::Null, |v| to_json(field, v));
                    fields.insert(field.name.clone(), value);
                }
            }
        }

        Self {
            form_id: form.id.clone(),
            form_name: form.name.clone(),
            version: form.version,
            submitted_at: Utc::now(),
            data,
        }
    }
}

fn to_json(field: &Field, value: &FieldValue) -> Value {
    if field.field_type == FieldType::Number {
        if let Some(n) = value.as_number() {
            return number(n);
        }
        if value.is_empty() {
            return Value::Null;
        }
    }
    match value {
        FieldValue::Empty => Value::Null,
        FieldValue::Number(n) => number(*n),
        FieldValue::Text(s) => Value::String(s.clone()),
        FieldValue::List(items) => Value::Array(items.iter().cloned().map(Value::String).collect()),
    }
}

fn number(n: f64) -> Value {
    serde_json::Number::from_f64(n).map_or(Value::Null, Value::Number)
}
