//! Field values and the per-form value map.
//!
//! A [`FieldValue`] is the raw value a user entered for one field. Its shape
//! is interpreted according to the field's declared [`FieldType`]:
//!
//! | field type | expected shape |
//! |---|---|
//! | text, richText, date, email, singleSelect | [`FieldValue::Text`] |
//! | multiSelect | [`FieldValue::List`] |
//! | number | [`FieldValue::Number`], or [`FieldValue::Text`] holding raw input |
//!
//! Every variant may also be [`FieldValue::Empty`]. Values serialize untagged,
//! so a stored value map is plain JSON (`{"f1": "abc", "f2": ["a"], "f3": null}`).

use std::borrow::Cow;
use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::schema::{FieldType, Form};

/// The current value of a single field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// No value.
    #[default]
    Empty,
    /// A numeric value.
    Number(f64),
    /// A string value (also raw, unparsed number input).
    Text(String),
    /// An ordered selection of option values.
    List(Vec<String>),
}

impl FieldValue {
    /// Returns the empty value appropriate for a field type.
    ///
    /// Text-like types get an empty string, multi-selects an empty list,
    /// and numbers [`FieldValue::Empty`].
    pub const fn empty_for(field_type: FieldType) -> Self {
        match field_type {
            FieldType::Text
            | FieldType::RichText
            | FieldType::Date
            | FieldType::Email
            | FieldType::SingleSelect => Self::Text(String::new()),
            FieldType::MultiSelect => Self::List(Vec::new()),
            FieldType::Number => Self::Empty,
        }
    }

    /// Returns `true` for null, whitespace-only strings, and empty lists.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Empty => true,
            Self::Text(s) => s.trim().is_empty(),
            Self::List(items) => items.is_empty(),
            Self::Number(_) => false,
        }
    }

    /// Returns the value as a string, if it has a scalar shape.
    ///
    /// Numbers are formatted; lists and [`FieldValue::Empty`] yield `None`.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Text(s) => Some(Cow::Borrowed(s.as_str())),
            Self::Number(n) => Some(Cow::Owned(n.to_string())),
            Self::List(_) | Self::Empty => None,
        }
    }

    /// Returns the list items, if the value is a list.
    pub fn as_list(&self) -> Option<&[String]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Converts the value to a finite number, if possible.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse::<f64>().ok(),
            Self::List(_) | Self::Empty => None,
        }
        .filter(|n| n.is_finite())
    }
}

impl From<&str> for FieldValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for FieldValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i64> for FieldValue {
    #[allow(clippy::cast_precision_loss)]
    fn from(n: i64) -> Self {
        Self::Number(n as f64)
    }
}

impl From<Vec<String>> for FieldValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

impl From<Vec<&str>> for FieldValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

/// The value map of one form instance, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FormData(BTreeMap<String, FieldValue>);

impl FormData {
    /// Creates an empty value map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of a field, if set.
    pub fn get(&self, field_id: &str) -> Option<&FieldValue> {
        self.0.get(field_id)
    }

    /// Sets the value of a field, returning the previous value.
    pub fn insert(&mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) -> Option<FieldValue> {
        self.0.insert(field_id.into(), value.into())
    }

    /// Removes a field's value.
    pub fn remove(&mut self, field_id: &str) -> Option<FieldValue> {
        self.0.remove(field_id)
    }

    /// Returns `true` if the field has a value entry (possibly empty).
    pub fn contains(&self, field_id: &str) -> bool {
        self.0.contains_key(field_id)
    }

    /// Merges `other` into `self`. Entries in `other` win; entries only in
    /// `self` are kept.
    pub fn merge(&mut self, other: Self) {
        self.0.extend(other.0);
    }

    /// Keeps only the entries whose field id satisfies `keep`.
    pub fn retain(&mut self, mut keep: impl FnMut(&str) -> bool) {
        self.0.retain(|id, _| keep(id));
    }

    /// Seeds every field of `form` that has no entry with its default value,
    /// or the type-appropriate empty value.
    ///
    /// Existing entries, including explicitly empty ones, are left alone.
    pub fn fill_defaults(&mut self, form: &Form) {
        for field in form.fields() {
            self.0.entry(field.id.clone()).or_insert_with(|| {
                field
                    .default_value
                    .clone()
                    .unwrap_or_else(|| FieldValue::empty_for(field.field_type))
            });
        }
    }

    /// Iterates over `(field_id, value)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldValue)> {
        self.0.iter()
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if there are no entries.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<K: Into<String>, V: Into<FieldValue>> FromIterator<(K, V)> for FormData {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}
