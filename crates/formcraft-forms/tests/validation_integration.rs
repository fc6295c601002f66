//! Integration tests for schema parsing and validation.
//!
//! Schemas are read from camelCase JSON the way a stored form collection is,
//! then validated end to end.

use formcraft_core::{FieldErrorKind, PersistenceMode};
use formcraft_forms::{
    validate_form, Field, FieldType, FieldValue, Form, FormData, FormDraft, SelectOption,
    ValidationRule,
};

// ============================================================================
// Shared helpers
// ============================================================================

fn registration_form() -> Form {
    let draft: FormDraft = serde_json::from_value(serde_json::json!({
        "name": "Registration",
        "persistenceType": "permanent",
        "expiryDuration": "1_day",
        "groups": [
            {
                "id": "g-account",
                "name": "account",
                "fields": [
                    {
                        "id": "username",
                        "name": "username",
                        "type": "text",
                        "validation": {
                            "required": true,
                            "minLength": 3,
                            "maxLength": 5,
                            "custom": {
                                "kind": "expression",
                                "expr": "lower(value) not in ['admin', 'root']",
                                "message": "That name is reserved"
                            }
                        }
                    },
                    {
                        "id": "email",
                        "name": "email",
                        "type": "email",
                        "validation": {
                            "required": true,
                            "emailValidation": {"domainWhitelist": ["example.com"]}
                        }
                    }
                ]
            },
            {
                "id": "g-profile",
                "name": "profile",
                "fields": [
                    {
                        "id": "age",
                        "name": "age",
                        "type": "number",
                        "validation": {"min": 0, "max": 10}
                    },
                    {
                        "id": "born",
                        "name": "born",
                        "type": "date",
                        "dateFormat": "dd/MM/yyyy"
                    },
                    {
                        "id": "topics",
                        "name": "topics",
                        "type": "multiSelect",
                        "options": [
                            {"value": "rust", "label": "Rust"},
                            {"value": "go", "label": "Go"}
                        ]
                    }
                ]
            },
            {"id": "g-empty", "name": "empty", "fields": []}
        ]
    }))
    .unwrap();
    draft.check().unwrap();
    Form::from_draft(draft, PersistenceMode::Session)
}

fn valid_data() -> FormData {
    [
        ("username", FieldValue::from("bob")),
        ("email", FieldValue::from("bob@example.com")),
        ("age", FieldValue::Number(5.0)),
        ("born", FieldValue::from("01/02/2003")),
        ("topics", FieldValue::from(vec!["rust"])),
    ]
    .into_iter()
    .collect()
}

// ============================================================================
// Schema
// ============================================================================

#[test]
fn test_draft_from_json_keeps_permanent_expiry() {
    let form = registration_form();
    assert_eq!(form.persistence_type, PersistenceMode::Permanent);
    assert_eq!(form.expiry_duration.map(|e| e.as_str()), Some("1_day"));
    assert_eq!(form.version, 1);
    assert_eq!(form.fields().count(), 5);
    assert_eq!(form.rendered_groups().count(), 2);
}

#[test]
fn test_form_json_round_trip() {
    let form = registration_form();
    let json = serde_json::to_string(&form).unwrap();
    let back: Form = serde_json::from_str(&json).unwrap();
    assert_eq!(back, form);
}

#[test]
fn test_schema_with_bad_expression_is_rejected_on_read() {
    let result = serde_json::from_value::<Field>(serde_json::json!({
        "id": "x",
        "name": "x",
        "type": "text",
        "validation": {"custom": {"kind": "expression", "expr": "len(value >", "message": "m"}}
    }));
    assert!(result.is_err());
}

// ============================================================================
// Validation properties
// ============================================================================

#[test]
fn test_valid_data_has_no_errors() {
    let form = registration_form();
    assert!(validate_form(&form, &valid_data()).is_empty());
}

#[test]
fn test_required_fields_reported_when_empty() {
    let form = registration_form();
    let errors = validate_form(&form, &FormData::new());
    assert_eq!(errors.len(), 2);
    assert_eq!(errors.get("username").unwrap().kind, FieldErrorKind::RequiredMissing);
    assert_eq!(errors.get("email").unwrap().kind, FieldErrorKind::RequiredMissing);
}

#[test]
fn test_optional_empty_values_never_error() {
    for field_type in FieldType::ALL {
        let field = Field::new("f", "f", field_type)
            .options(vec![SelectOption::new("a", "A")])
            .validation(ValidationRule::new().length(Some(3), Some(5)).range(Some(1.0), Some(2.0)));
        for empty in [FieldValue::Empty, FieldValue::from(""), FieldValue::List(vec![])] {
            assert!(
                formcraft_forms::validate_field(&field, &empty).is_none(),
                "{field_type} with {empty:?}"
            );
        }
    }
}

#[test]
fn test_each_field_reports_its_own_kind() {
    let form = registration_form();
    let mut data = valid_data();
    data.insert("username", "abcdef");
    data.insert("email", "bob@other.com");
    data.insert("age", -1.0);
    data.insert("born", "2003-31-31");
    data.insert("topics", vec!["rust", "cobol"]);

    let errors = validate_form(&form, &data);
    let kinds: Vec<(&str, FieldErrorKind)> =
        errors.iter().map(|(id, e)| (id.as_str(), e.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            ("age", FieldErrorKind::RangeViolation),
            ("born", FieldErrorKind::InvalidDate),
            ("email", FieldErrorKind::DomainNotAllowed),
            ("topics", FieldErrorKind::InvalidOption),
            ("username", FieldErrorKind::LengthViolation),
        ]
    );
}

#[test]
fn test_custom_expression_after_builtins() {
    let form = registration_form();
    let mut data = valid_data();
    data.insert("username", "Admin");
    let errors = validate_form(&form, &data);
    let err = errors.get("username").unwrap();
    assert_eq!(err.kind, FieldErrorKind::CustomValidationFailure);
    assert_eq!(err.message, "That name is reserved");
}

#[test]
fn test_number_field_accepts_raw_text_input() {
    let form = registration_form();
    let mut data = valid_data();
    data.insert("age", "7");
    assert!(validate_form(&form, &data).is_empty());
    data.insert("age", "abc");
    assert_eq!(
        validate_form(&form, &data).get("age").unwrap().kind,
        FieldErrorKind::InvalidNumber
    );
}

#[test]
fn test_fill_defaults_seeds_type_appropriate_empties() {
    let mut form = registration_form();
    form.groups[1].fields[0].default_value = Some(FieldValue::Number(3.0));

    let mut data: FormData = [("username", "bob")].into_iter().collect();
    data.fill_defaults(&form);

    assert_eq!(data.get("username"), Some(&FieldValue::from("bob")));
    assert_eq!(data.get("email"), Some(&FieldValue::from("")));
    assert_eq!(data.get("age"), Some(&FieldValue::Number(3.0)));
    assert_eq!(data.get("topics"), Some(&FieldValue::List(vec![])));
    assert_eq!(data.len(), 5);
}
