//! # formcraft-forms
//!
//! The form schema model and the validation engine.
//!
//! ## Modules
//!
//! - [`schema`] - `Form`, `FieldGroup`, `Field`, `SubmitConfig`, drafts, and schema checks
//! - [`value`] - Field values and the per-form value map
//! - [`rules`] - Validation rule shapes and the named-predicate registry
//! - [`expression`] - The declarative rule expression language
//! - [`validation`] - The validation engine

pub mod expression;
pub mod rules;
pub mod schema;
pub mod validation;
pub mod value;

pub use expression::Expression;
pub use rules::{CustomValidation, EmailValidation, PredicateRegistry, ValidationRule};
pub use schema::{Field, FieldGroup, FieldType, Form, FormDraft, HttpMethod, SelectOption, SubmitConfig};
pub use validation::{validate_field, validate_field_with, validate_form, validate_form_with};
pub use value::{FieldValue, FormData};
