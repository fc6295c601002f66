//! Validation rule shapes and the named-predicate registry.
//!
//! A [`ValidationRule`] holds the built-in checks for a field plus an optional
//! [`CustomValidation`], which is either a parsed [`Expression`] or the name of
//! a predicate registered in a [`PredicateRegistry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use chrono::{Datelike, Local, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use crate::expression::Expression;
use crate::schema::Field;
use crate::validation::parse_date;
use crate::value::FieldValue;

/// Rules for email fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EmailValidation {
    /// Accept a comma-separated list of addresses.
    pub allow_multiple: bool,
    /// If non-empty, the only accepted domains.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub domain_whitelist: Vec<String>,
}

/// A declarative custom check, evaluated after every built-in check passes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum CustomValidation {
    /// The value is valid when the expression is truthy.
    Expression {
        /// The condition over `value`.
        expr: Expression,
        /// Error message when the condition is false.
        message: String,
    },
    /// The value is checked by a host-registered predicate.
    Named {
        /// Registry key.
        name: String,
        /// Replaces the predicate's own message when set.
        #[serde(default, skip_serializing_if = "Option::is_none")]
        message: Option<String>,
    },
}

impl CustomValidation {
    /// Builds an expression rule.
    ///
    /// # Errors
    ///
    /// Returns an invalid-schema error if `expr` does not parse.
    pub fn expression(
        expr: &str,
        message: impl Into<String>,
    ) -> Result<Self, formcraft_core::FormcraftError> {
        Ok(Self::Expression {
            expr: Expression::parse(expr)?,
            message: message.into(),
        })
    }

    /// Builds a named-predicate rule.
    pub fn named(name: impl Into<String>) -> Self {
        Self::Named {
            name: name.into(),
            message: None,
        }
    }
}

/// The validation rules attached to a field.
///
/// Length and pattern rules apply to text and rich text; `min`/`max` to
/// numbers; `email_validation` to email fields. Rules that do not apply to
/// the field's type are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ValidationRule {
    /// The field must have a non-empty value.
    pub required: bool,
    /// Maximum length in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
    /// Minimum length in characters.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    /// A regular expression the whole value must match.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    /// Lower numeric bound (inclusive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Upper numeric bound (inclusive).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Email-specific rules.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email_validation: Option<EmailValidation>,
    /// Custom check, run last.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom: Option<CustomValidation>,
}

impl ValidationRule {
    /// Creates an empty rule set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the required flag.
    #[must_use]
    pub const fn required(mut self, required: bool) -> Self {
        self.required = required;
        self
    }

    /// Sets the length bounds.
    #[must_use]
    pub const fn length(mut self, min: Option<usize>, max: Option<usize>) -> Self {
        self.min_length = min;
        self.max_length = max;
        self
    }

    /// Sets the pattern.
    #[must_use]
    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    /// Sets the numeric range.
    #[must_use]
    pub const fn range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Sets the email rules.
    #[must_use]
    pub fn email(mut self, allow_multiple: bool, domain_whitelist: Vec<String>) -> Self {
        self.email_validation = Some(EmailValidation {
            allow_multiple,
            domain_whitelist,
        });
        self
    }

    /// Sets the custom check.
    #[must_use]
    pub fn custom(mut self, custom: CustomValidation) -> Self {
        self.custom = Some(custom);
        self
    }

    /// Checks that the rules are self-consistent.
    ///
    /// # Errors
    ///
    /// Returns a description of the first inconsistency.
    pub fn check(&self) -> Result<(), String> {
        if let (Some(min), Some(max)) = (self.min_length, self.max_length) {
            if min > max {
                return Err(format!("minLength {min} exceeds maxLength {max}"));
            }
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(format!("min {min} exceeds max {max}"));
            }
        }
        if let Some(pattern) = &self.pattern {
            regex::Regex::new(&anchored(pattern))
                .map_err(|e| format!("invalid pattern \"{pattern}\": {e}"))?;
        }
        Ok(())
    }
}

/// Wraps a pattern so it must match the whole string.
pub(crate) fn anchored(pattern: &str) -> String {
    format!("^(?:{pattern})$")
}

// ── Named predicates ────────────────────────────────────────────────────

/// A named predicate: returns an error message when the value is rejected.
pub type Predicate = Arc<dyn Fn(&Field, &FieldValue) -> Option<String> + Send + Sync>;

/// Host-controlled registry of named validation predicates.
///
/// [`PredicateRegistry::default`] contains the builtins: `no_whitespace`,
/// `uppercase`, `lowercase`, `alphanumeric`, `weekday`, `future_date`, and
/// `past_date`.
///
/// # Examples
///
/// ```
/// use formcraft_forms::rules::PredicateRegistry;
///
/// let mut registry = PredicateRegistry::default();
/// registry.register("even", |_field, value| {
///     match value.as_number() {
///         Some(n) if n % 2.0 == 0.0 => None,
///         _ => Some("Must be even".to_string()),
///     }
/// });
/// assert!(registry.contains("even"));
/// ```
#[derive(Clone)]
pub struct PredicateRegistry {
    predicates: HashMap<String, Predicate>,
}

impl PredicateRegistry {
    /// Creates a registry with no predicates.
    pub fn empty() -> Self {
        Self {
            predicates: HashMap::new(),
        }
    }

    /// Registers (or replaces) a predicate.
    pub fn register<F>(&mut self, name: impl Into<String>, predicate: F)
    where
        F: Fn(&Field, &FieldValue) -> Option<String> + Send + Sync + 'static,
    {
        self.predicates.insert(name.into(), Arc::new(predicate));
    }

    /// Looks up a predicate.
    pub fn get(&self, name: &str) -> Option<&Predicate> {
        self.predicates.get(name)
    }

    /// Returns `true` if a predicate is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.predicates.contains_key(name)
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.predicates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl Default for PredicateRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("no_whitespace", |_, value| {
            text_predicate(value, |s| !s.chars().any(char::is_whitespace), "Must not contain spaces")
        });
        registry.register("uppercase", |_, value| {
            text_predicate(value, |s| !s.chars().any(char::is_lowercase), "Must be uppercase")
        });
        registry.register("lowercase", |_, value| {
            text_predicate(value, |s| !s.chars().any(char::is_uppercase), "Must be lowercase")
        });
        registry.register("alphanumeric", |_, value| {
            text_predicate(
                value,
                |s| s.chars().all(char::is_alphanumeric),
                "Only letters and digits are allowed",
            )
        });
        registry.register("weekday", |field, value| {
            date_predicate(field, value, |d| {
                !matches!(d.weekday(), Weekday::Sat | Weekday::Sun)
            }, "Must be a weekday")
        });
        registry.register("future_date", |field, value| {
            date_predicate(field, value, |d| d > Local::now().date_naive(), "Must be a future date")
        });
        registry.register("past_date", |field, value| {
            date_predicate(field, value, |d| d < Local::now().date_naive(), "Must be a past date")
        });
        registry
    }
}

impl fmt::Debug for PredicateRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PredicateRegistry")
            .field("predicates", &self.names())
            .finish()
    }
}

fn text_predicate(value: &FieldValue, ok: impl Fn(&str) -> bool, message: &str) -> Option<String> {
    let passes = match value {
        FieldValue::List(items) => items.iter().all(|s| ok(s.as_str())),
        other => other.as_text().is_some_and(|s| ok(&*s)),
    };
    (!passes).then(|| message.to_string())
}

fn date_predicate(
    field: &Field,
    value: &FieldValue,
    ok: impl Fn(NaiveDate) -> bool,
    message: &str,
) -> Option<String> {
    let date = value
        .as_text()
        .and_then(|s| parse_date(&s, field.date_format.as_deref()));
    match date {
        Some(d) if ok(d) => None,
        Some(_) => Some(message.to_string()),
        None => Some("Please enter a valid date".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FieldType;

    fn text_field() -> Field {
        Field::new("f", "F", FieldType::Text)
    }

    #[test]
    fn test_check_bounds() {
        assert!(ValidationRule::new().length(Some(3), Some(5)).check().is_ok());
        assert!(ValidationRule::new().length(Some(6), Some(5)).check().is_err());
        assert!(ValidationRule::new().range(Some(0.0), Some(10.0)).check().is_ok());
        assert!(ValidationRule::new().range(Some(11.0), Some(10.0)).check().is_err());
    }

    #[test]
    fn test_check_pattern() {
        assert!(ValidationRule::new().pattern("[a-z]+").check().is_ok());
        assert!(ValidationRule::new().pattern("[a-z").check().is_err());
    }

    #[test]
    fn test_rule_json_shape() {
        let rule = ValidationRule::new()
            .required(true)
            .length(None, Some(10))
            .email(true, vec!["example.com".to_string()])
            .custom(CustomValidation::expression("len(value) > 1", "Too short").unwrap());
        let json = serde_json::to_value(&rule).unwrap();
        assert_eq!(json["required"], true);
        assert_eq!(json["maxLength"], 10);
        assert_eq!(json["emailValidation"]["allowMultiple"], true);
        assert_eq!(json["custom"]["kind"], "expression");
        assert_eq!(json["custom"]["expr"], "len(value) > 1");

        let back: ValidationRule = serde_json::from_value(json).unwrap();
        assert_eq!(back, rule);
    }

    #[test]
    fn test_bad_expression_rejected_on_read() {
        let json = serde_json::json!({
            "custom": {"kind": "expression", "expr": "value ==", "message": "x"}
        });
        assert!(serde_json::from_value::<ValidationRule>(json).is_err());
    }

    #[test]
    fn test_named_rule_json() {
        let json = serde_json::json!({"custom": {"kind": "named", "name": "weekday"}});
        let rule: ValidationRule = serde_json::from_value(json).unwrap();
        assert_eq!(rule.custom, Some(CustomValidation::named("weekday")));
    }

    #[test]
    fn test_builtin_text_predicates() {
        let registry = PredicateRegistry::default();
        let field = text_field();
        let check = |name: &str, v: &str| (registry.get(name).unwrap())(&field, &FieldValue::from(v));

        assert!(check("no_whitespace", "abc").is_none());
        assert!(check("no_whitespace", "a b").is_some());
        assert!(check("uppercase", "ABC1").is_none());
        assert!(check("uppercase", "AbC").is_some());
        assert!(check("lowercase", "abc").is_none());
        assert!(check("alphanumeric", "abc123").is_none());
        assert!(check("alphanumeric", "abc-123").is_some());
    }

    #[test]
    fn test_builtin_date_predicates() {
        let registry = PredicateRegistry::default();
        let field = Field::new("d", "D", FieldType::Date);
        let check = |name: &str, v: &str| (registry.get(name).unwrap())(&field, &FieldValue::from(v));

        // 2024-06-03 is a Monday, 2024-06-08 a Saturday.
        assert!(check("weekday", "2024-06-03").is_none());
        assert_eq!(check("weekday", "2024-06-08").as_deref(), Some("Must be a weekday"));
        assert!(check("past_date", "2000-01-01").is_none());
        assert!(check("future_date", "2000-01-01").is_some());
        assert!(check("future_date", "2999-01-01").is_none());
        assert_eq!(check("weekday", "nope").as_deref(), Some("Please enter a valid date"));
    }

    #[test]
    fn test_register_custom_predicate() {
        let mut registry = PredicateRegistry::empty();
        assert!(registry.names().is_empty());
        registry.register("starts_with_a", |_, v| {
            v.as_text()
                .filter(|s| s.starts_with('a'))
                .map_or_else(|| Some("Must start with a".to_string()), |_| None)
        });
        assert_eq!(registry.names(), vec!["starts_with_a"]);
    }
}
