//! The validation engine.
//!
//! [`validate_field`] is a pure function from a field definition and a
//! candidate value to an optional [`FieldError`]. Checks run in a fixed order
//! and stop at the first failure:
//!
//! 1. required (empty = null, blank string, or empty list);
//! 2. an empty, non-required value passes without further checks;
//! 3. the type-specific checks;
//! 4. the custom rule, if any.
//!
//! [`validate_form`] runs the engine over every field of a form and collects
//! the errors by field id.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use once_cell::sync::Lazy;
use regex::Regex;

use formcraft_core::{FieldError, FieldErrorKind, FieldErrors};

use crate::rules::{anchored, CustomValidation, EmailValidation, PredicateRegistry, ValidationRule};
use crate::schema::{Field, FieldType, Form};
use crate::value::{FieldValue, FormData};

static EMAIL_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9._%+\-]+@[a-zA-Z0-9.\-]+\.[a-zA-Z]{2,}$").expect("valid email regex")
});

static BUILTIN_PREDICATES: Lazy<PredicateRegistry> = Lazy::new(PredicateRegistry::default);

const MSG_REQUIRED: &str = "This field is required";
const MSG_INVALID_FORMAT: &str = "Invalid format";
const MSG_INVALID_EMAIL: &str = "Please enter a valid email address";
const MSG_DOMAIN: &str = "Email domain not allowed";
const MSG_INVALID_NUMBER: &str = "Please enter a valid number";
const MSG_INVALID_DATE: &str = "Please enter a valid date";
const MSG_INVALID_OPTION: &str = "Please select a valid option";
const MSG_INVALID_OPTIONS: &str = "Please select valid options";
const MSG_UNKNOWN_RULE: &str = "Unknown validation rule";

/// Validates one value against a field, using the builtin named predicates.
///
/// # Examples
///
/// ```
/// use formcraft_forms::schema::{Field, FieldType};
/// use formcraft_forms::rules::ValidationRule;
/// use formcraft_forms::validation::validate_field;
/// use formcraft_forms::value::FieldValue;
/// use formcraft_core::FieldErrorKind;
///
/// let field = Field::new("age", "Age", FieldType::Number)
///     .validation(ValidationRule::new().range(Some(0.0), Some(10.0)));
///
/// assert!(validate_field(&field, &FieldValue::Number(5.0)).is_none());
/// let err = validate_field(&field, &FieldValue::from("abc")).unwrap();
/// assert_eq!(err.kind, FieldErrorKind::InvalidNumber);
/// ```
pub fn validate_field(field: &Field, value: &FieldValue) -> Option<FieldError> {
    validate_field_with(field, value, &BUILTIN_PREDICATES)
}

/// Validates one value against a field, resolving named rules in `predicates`.
pub fn validate_field_with(
    field: &Field,
    value: &FieldValue,
    predicates: &PredicateRegistry,
) -> Option<FieldError> {
    let default_rule = ValidationRule::default();
    let rule = field.validation.as_ref().unwrap_or(&default_rule);

    if value.is_empty() {
        return rule
            .required
            .then(|| FieldError::new(FieldErrorKind::RequiredMissing, MSG_REQUIRED));
    }

    let builtin = match field.field_type {
        FieldType::Text | FieldType::RichText => check_text(rule, value),
        FieldType::Email => check_email(rule.email_validation.as_ref(), value),
        FieldType::Number => check_number(rule, value),
        FieldType::Date => check_date(field, value),
        FieldType::SingleSelect => check_single_select(field, value),
        FieldType::MultiSelect => check_multi_select(field, value),
    };
    if builtin.is_some() {
        return builtin;
    }

    rule.custom
        .as_ref()
        .and_then(|custom| check_custom(field, value, custom, predicates))
}

/// Validates every field of `form` against `data`, using the builtin predicates.
///
/// Missing entries are validated as empty values.
pub fn validate_form(form: &Form, data: &FormData) -> FieldErrors {
    validate_form_with(form, data, &BUILTIN_PREDICATES)
}

/// Validates every field of `form` against `data`, resolving named rules in `predicates`.
pub fn validate_form_with(form: &Form, data: &FormData, predicates: &PredicateRegistry) -> FieldErrors {
    let mut errors = FieldErrors::new();
    for field in form.fields() {
        let value = data.get(&field.id).unwrap_or(&FieldValue::Empty);
        if let Some(error) = validate_field_with(field, value, predicates) {
            errors.insert(field.id.clone(), error);
        }
    }
    errors
}

// ── Type-specific checks ────────────────────────────────────────────────

fn fail(kind: FieldErrorKind, message: impl Into<String>) -> Option<FieldError> {
    Some(FieldError::new(kind, message))
}

fn check_text(rule: &ValidationRule, value: &FieldValue) -> Option<FieldError> {
    let Some(text) = value.as_text() else {
        return fail(FieldErrorKind::PatternMismatch, MSG_INVALID_FORMAT);
    };
    let len = text.chars().count();

    if let Some(max) = rule.max_length {
        if len > max {
            return fail(
                FieldErrorKind::LengthViolation,
                format!("Maximum {max} characters allowed"),
            );
        }
    }
    if let Some(min) = rule.min_length {
        if len < min {
            return fail(
                FieldErrorKind::LengthViolation,
                format!("Minimum {min} characters required"),
            );
        }
    }
    if let Some(pattern) = &rule.pattern {
        match Regex::new(&anchored(pattern)) {
            Ok(re) if re.is_match(&text) => {}
            Ok(_) => return fail(FieldErrorKind::PatternMismatch, MSG_INVALID_FORMAT),
            Err(e) => {
                tracing::warn!(pattern = %pattern, error = %e, "Invalid validation pattern");
                return fail(FieldErrorKind::PatternMismatch, MSG_INVALID_FORMAT);
            }
        }
    }
    None
}

fn check_email(rule: Option<&EmailValidation>, value: &FieldValue) -> Option<FieldError> {
    let Some(text) = value.as_text() else {
        return fail(FieldErrorKind::InvalidEmail, MSG_INVALID_EMAIL);
    };
    let allow_multiple = rule.is_some_and(|r| r.allow_multiple);
    let whitelist = rule.map_or(&[][..], |r| r.domain_whitelist.as_slice());

    let addresses: Vec<&str> = if allow_multiple {
        text.split(',').map(str::trim).collect()
    } else {
        vec![text.trim()]
    };

    for address in addresses {
        if !EMAIL_RE.is_match(address) {
            return fail(FieldErrorKind::InvalidEmail, MSG_INVALID_EMAIL);
        }
        if !whitelist.is_empty() {
            let domain = address.rsplit_once('@').map_or("", |(_, d)| d);
            if !whitelist.iter().any(|allowed| allowed.trim().eq_ignore_ascii_case(domain)) {
                return fail(FieldErrorKind::DomainNotAllowed, MSG_DOMAIN);
            }
        }
    }
    None
}

fn check_number(rule: &ValidationRule, value: &FieldValue) -> Option<FieldError> {
    let Some(n) = value.as_number() else {
        return fail(FieldErrorKind::InvalidNumber, MSG_INVALID_NUMBER);
    };
    if let Some(min) = rule.min {
        if n < min {
            return fail(FieldErrorKind::RangeViolation, format!("Minimum value is {min}"));
        }
    }
    if let Some(max) = rule.max {
        if n > max {
            return fail(FieldErrorKind::RangeViolation, format!("Maximum value is {max}"));
        }
    }
    None
}

fn check_date(field: &Field, value: &FieldValue) -> Option<FieldError> {
    let parsed = match value {
        FieldValue::Text(s) => parse_date(s, field.date_format.as_deref()),
        _ => None,
    };
    match parsed {
        Some(_) => None,
        None => fail(FieldErrorKind::InvalidDate, MSG_INVALID_DATE),
    }
}

fn check_single_select(field: &Field, value: &FieldValue) -> Option<FieldError> {
    match value {
        FieldValue::Text(s) if field.has_option(s) => None,
        _ => fail(FieldErrorKind::InvalidOption, MSG_INVALID_OPTION),
    }
}

fn check_multi_select(field: &Field, value: &FieldValue) -> Option<FieldError> {
    match value {
        FieldValue::List(items) if items.iter().all(|item| field.has_option(item)) => None,
        _ => fail(FieldErrorKind::InvalidOption, MSG_INVALID_OPTIONS),
    }
}

fn check_custom(
    field: &Field,
    value: &FieldValue,
    custom: &CustomValidation,
    predicates: &PredicateRegistry,
) -> Option<FieldError> {
    match custom {
        CustomValidation::Expression { expr, message } => match expr.evaluate(value) {
            Ok(true) => None,
            Ok(false) => fail(FieldErrorKind::CustomValidationFailure, message.clone()),
            Err(e) => {
                tracing::debug!(field = %field.id, expr = %expr, error = %e, "Rule expression failed");
                fail(FieldErrorKind::CustomValidationFailure, message.clone())
            }
        },
        CustomValidation::Named { name, message } => match predicates.get(name) {
            Some(predicate) => predicate(field, value).map(|own| {
                FieldError::new(
                    FieldErrorKind::CustomValidationFailure,
                    message.clone().unwrap_or(own),
                )
            }),
            None => {
                tracing::warn!(field = %field.id, rule = %name, "Unknown validation rule");
                fail(FieldErrorKind::CustomValidationFailure, MSG_UNKNOWN_RULE)
            }
        },
    }
}

// ── Dates ───────────────────────────────────────────────────────────────

/// Translates a date format such as `dd/MM/yyyy` to a chrono format string.
///
/// Supported tokens are `d`, `dd`, `M`, `MM`, `yy`, and `yyyy`, each used
/// exactly once, separated by non-alphanumeric literals. Returns `None` for
/// anything else.
pub fn chrono_date_format(format: &str) -> Option<String> {
    let chars: Vec<char> = format.chars().collect();
    let mut out = String::new();
    let (mut day, mut month, mut year) = (false, false, false);
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        let run = chars[i..].iter().take_while(|&&x| x == c).count();
        match (c, run) {
            ('d', 1 | 2) if !day => {
                day = true;
                out.push_str("%d");
            }
            ('M', 1 | 2) if !month => {
                month = true;
                out.push_str("%m");
            }
            ('y', 2 | 4) if !year => {
                year = true;
                out.push_str(if run == 4 { "%Y" } else { "%y" });
            }
            (c, _) if c.is_alphanumeric() => return None,
            ('%', _) => out.push_str(&"%%".repeat(run)),
            (c, _) => out.extend(std::iter::repeat(c).take(run)),
        }
        i += run;
    }

    (day && month && year).then_some(out)
}

/// Parses a calendar date.
///
/// The field's own format is tried first, then ISO dates (`yyyy-MM-dd`),
/// RFC 3339 timestamps, and ISO local date-times.
pub fn parse_date(input: &str, format: Option<&str>) -> Option<NaiveDate> {
    let input = input.trim();

    if let Some(fmt) = format.and_then(chrono_date_format) {
        if let Ok(date) = NaiveDate::parse_from_str(input, &fmt) {
            return Some(date);
        }
    }

    NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(input).ok().map(|dt| dt.date_naive()))
        .or_else(|| {
            ["%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M"]
                .iter()
                .find_map(|f| NaiveDateTime::parse_from_str(input, f).ok())
                .map(|dt| dt.date())
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::SelectOption;

    fn text_field(rule: ValidationRule) -> Field {
        Field::new("t", "Text", FieldType::Text).validation(rule)
    }

    fn kind(field: &Field, value: impl Into<FieldValue>) -> Option<FieldErrorKind> {
        validate_field(field, &value.into()).map(|e| e.kind)
    }

    #[test]
    fn test_required_missing_for_every_type() {
        for field_type in FieldType::ALL {
            let field = Field::new("f", "F", field_type)
                .options(vec![SelectOption::new("a", "A")])
                .required(true);
            for empty in [
                FieldValue::Empty,
                FieldValue::from(""),
                FieldValue::from("   "),
                FieldValue::List(vec![]),
            ] {
                let err = validate_field(&field, &empty).unwrap();
                assert_eq!(err.kind, FieldErrorKind::RequiredMissing, "{field_type}");
                assert_eq!(err.message, "This field is required");
            }
        }
    }

    #[test]
    fn test_empty_optional_passes_even_with_custom_rule() {
        let rule = ValidationRule::new()
            .length(Some(3), None)
            .custom(CustomValidation::expression("false", "never").unwrap());
        assert_eq!(kind(&text_field(rule), ""), None);
    }

    #[test]
    fn test_text_length_bounds() {
        let field = text_field(ValidationRule::new().length(Some(3), Some(5)));
        assert_eq!(kind(&field, "ab"), Some(FieldErrorKind::LengthViolation));
        assert_eq!(kind(&field, "abc"), None);
        assert_eq!(kind(&field, "abcde"), None);
        assert_eq!(kind(&field, "abcdef"), Some(FieldErrorKind::LengthViolation));

        let err = validate_field(&field, &"abcdef".into()).unwrap();
        assert_eq!(err.message, "Maximum 5 characters allowed");
        let err = validate_field(&field, &"ab".into()).unwrap();
        assert_eq!(err.message, "Minimum 3 characters required");
    }

    #[test]
    fn test_length_counts_characters() {
        let field = text_field(ValidationRule::new().length(None, Some(3)));
        assert_eq!(kind(&field, "héé"), None);
    }

    #[test]
    fn test_pattern_matches_whole_string() {
        let field = text_field(ValidationRule::new().pattern("[0-9]{3}"));
        assert_eq!(kind(&field, "123"), None);
        assert_eq!(kind(&field, "a123"), Some(FieldErrorKind::PatternMismatch));
        assert_eq!(kind(&field, "1234"), Some(FieldErrorKind::PatternMismatch));
    }

    #[test]
    fn test_invalid_pattern_is_mismatch() {
        let field = text_field(ValidationRule::new().pattern("(["));
        assert_eq!(kind(&field, "x"), Some(FieldErrorKind::PatternMismatch));
    }

    #[test]
    fn test_length_checked_before_pattern() {
        let field = text_field(ValidationRule::new().length(None, Some(2)).pattern("[a-z]+"));
        assert_eq!(kind(&field, "ABC"), Some(FieldErrorKind::LengthViolation));
    }

    #[test]
    fn test_email_single_with_whitelist() {
        let field = Field::new("e", "Email", FieldType::Email)
            .validation(ValidationRule::new().email(false, vec!["example.com".to_string()]));
        assert_eq!(kind(&field, "a@example.com"), None);
        assert_eq!(kind(&field, "a@EXAMPLE.com"), None);
        assert_eq!(kind(&field, "a@other.com"), Some(FieldErrorKind::DomainNotAllowed));
        assert_eq!(kind(&field, "not-an-email"), Some(FieldErrorKind::InvalidEmail));
        assert_eq!(kind(&field, "a@example.com, b@example.com"), Some(FieldErrorKind::InvalidEmail));
    }

    #[test]
    fn test_email_multiple_fails_fast() {
        let field = Field::new("e", "Email", FieldType::Email)
            .validation(ValidationRule::new().email(true, vec!["example.com".to_string()]));
        assert_eq!(kind(&field, "a@example.com, b@example.com"), None);
        // The first failing address decides the error.
        assert_eq!(
            kind(&field, "a@other.com, not-an-email"),
            Some(FieldErrorKind::DomainNotAllowed)
        );
        assert_eq!(
            kind(&field, "not-an-email, a@other.com"),
            Some(FieldErrorKind::InvalidEmail)
        );
        assert_eq!(kind(&field, "a@example.com,"), Some(FieldErrorKind::InvalidEmail));
    }

    #[test]
    fn test_email_without_rules() {
        let field = Field::new("e", "Email", FieldType::Email);
        assert_eq!(kind(&field, "x@y.org"), None);
        assert_eq!(kind(&field, "x@y"), Some(FieldErrorKind::InvalidEmail));
    }

    #[test]
    fn test_number_range() {
        let field = Field::new("n", "N", FieldType::Number)
            .validation(ValidationRule::new().range(Some(0.0), Some(10.0)));
        assert_eq!(kind(&field, 5.0), None);
        assert_eq!(kind(&field, "7"), None);
        assert_eq!(kind(&field, -1.0), Some(FieldErrorKind::RangeViolation));
        assert_eq!(kind(&field, 11.0), Some(FieldErrorKind::RangeViolation));
        assert_eq!(kind(&field, "abc"), Some(FieldErrorKind::InvalidNumber));

        let err = validate_field(&field, &FieldValue::Number(-1.0)).unwrap();
        assert_eq!(err.message, "Minimum value is 0");
    }

    #[test]
    fn test_date_formats() {
        let iso = Field::new("d", "D", FieldType::Date);
        assert_eq!(kind(&iso, "2024-02-29"), None);
        assert_eq!(kind(&iso, "2023-02-29"), Some(FieldErrorKind::InvalidDate));
        assert_eq!(kind(&iso, "2024-06-01T10:00:00Z"), None);
        assert_eq!(kind(&iso, "yesterday"), Some(FieldErrorKind::InvalidDate));

        let uk = Field::new("d", "D", FieldType::Date).date_format("dd/MM/yyyy");
        assert_eq!(kind(&uk, "31/12/2024"), None);
        assert_eq!(kind(&uk, "12/31/2024"), Some(FieldErrorKind::InvalidDate));
        assert_eq!(kind(&uk, "2024-12-31"), None);
    }

    #[test]
    fn test_chrono_date_format() {
        assert_eq!(chrono_date_format("dd/MM/yyyy").as_deref(), Some("%d/%m/%Y"));
        assert_eq!(chrono_date_format("MM-dd-yyyy").as_deref(), Some("%m-%d-%Y"));
        assert_eq!(chrono_date_format("yyyy-MM-dd").as_deref(), Some("%Y-%m-%d"));
        assert_eq!(chrono_date_format("d.M.yy").as_deref(), Some("%d.%m.%y"));
        assert!(chrono_date_format("dd/MM").is_none());
        assert!(chrono_date_format("dd/MM/yyy").is_none());
        assert!(chrono_date_format("dd/MM/yyyy HH").is_none());
        assert!(chrono_date_format("dd/dd/yyyy").is_none());
    }

    #[test]
    fn test_select_options() {
        let options = vec![SelectOption::new("a", "A"), SelectOption::new("b", "B")];
        let single = Field::new("s", "S", FieldType::SingleSelect).options(options.clone());
        assert_eq!(kind(&single, "a"), None);
        assert_eq!(kind(&single, "z"), Some(FieldErrorKind::InvalidOption));
        assert_eq!(kind(&single, vec!["a"]), Some(FieldErrorKind::InvalidOption));

        let multi = Field::new("m", "M", FieldType::MultiSelect).options(options);
        assert_eq!(kind(&multi, vec!["a", "b"]), None);
        assert_eq!(kind(&multi, vec!["a", "z"]), Some(FieldErrorKind::InvalidOption));
        assert_eq!(kind(&multi, "a"), Some(FieldErrorKind::InvalidOption));
    }

    #[test]
    fn test_custom_expression_runs_last() {
        let rule = ValidationRule::new()
            .length(None, Some(5))
            .custom(CustomValidation::expression("value != 'admin'", "Reserved name").unwrap());
        let field = text_field(rule);
        assert_eq!(kind(&field, "bob"), None);
        let err = validate_field(&field, &"admin".into()).unwrap();
        assert_eq!(err.kind, FieldErrorKind::CustomValidationFailure);
        assert_eq!(err.message, "Reserved name");
        // A built-in failure is never replaced by the custom rule.
        assert_eq!(kind(&field, "administrator"), Some(FieldErrorKind::LengthViolation));
    }

    #[test]
    fn test_custom_expression_eval_error_uses_message() {
        let rule = ValidationRule::new()
            .custom(CustomValidation::expression("number(value) > 2", "Needs a number over 2").unwrap());
        let err = validate_field(&text_field(rule), &"abc".into()).unwrap();
        assert_eq!(err.message, "Needs a number over 2");
    }

    #[test]
    fn test_named_rules() {
        let mut registry = PredicateRegistry::empty();
        registry.register("even", |_, v| match v.as_number() {
            Some(n) if n % 2.0 == 0.0 => None,
            _ => Some("Must be even".to_string()),
        });

        let field = Field::new("n", "N", FieldType::Number)
            .validation(ValidationRule::new().custom(CustomValidation::named("even")));
        assert!(validate_field_with(&field, &FieldValue::Number(4.0), &registry).is_none());
        let err = validate_field_with(&field, &FieldValue::Number(3.0), &registry).unwrap();
        assert_eq!(err.message, "Must be even");

        let overridden = Field::new("n", "N", FieldType::Number).validation(ValidationRule::new().custom(
            CustomValidation::Named {
                name: "even".to_string(),
                message: Some("Pick an even number".to_string()),
            },
        ));
        let err = validate_field_with(&overridden, &FieldValue::Number(3.0), &registry).unwrap();
        assert_eq!(err.message, "Pick an even number");

        let err = validate_field(&field, &FieldValue::Number(3.0)).unwrap();
        assert_eq!(err.kind, FieldErrorKind::CustomValidationFailure);
        assert_eq!(err.message, "Unknown validation rule");
    }

    #[test]
    fn test_builtin_named_rule() {
        let field = text_field(ValidationRule::new().custom(CustomValidation::named("no_whitespace")));
        assert_eq!(kind(&field, "abc"), None);
        assert_eq!(kind(&field, "a c"), Some(FieldErrorKind::CustomValidationFailure));
    }

    #[test]
    fn test_validate_form_collects_by_field_id() {
        use crate::schema::{FieldGroup, FormDraft};
        use formcraft_core::PersistenceMode;

        let form = Form::from_draft(
            FormDraft {
                name: "F".to_string(),
                groups: vec![FieldGroup::new(
                    "g",
                    "G",
                    vec![
                        Field::new("name", "Name", FieldType::Text).required(true),
                        Field::new("age", "Age", FieldType::Number),
                        Field::new("note", "Note", FieldType::Text),
                    ],
                )],
                ..FormDraft::default()
            },
            PersistenceMode::None,
        );
        let data: FormData = [("age", "old")].into_iter().collect();

        let errors = validate_form(&form, &data);
        assert_eq!(errors.len(), 2);
        assert_eq!(errors.get("name").unwrap().kind, FieldErrorKind::RequiredMissing);
        assert_eq!(errors.get("age").unwrap().kind, FieldErrorKind::InvalidNumber);
        assert!(errors.get("note").is_none());
    }
}
