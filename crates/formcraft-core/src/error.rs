//! Core error types for formcraft.
//!
//! Two layers of errors exist:
//!
//! - [`FieldError`]: a user-correctable problem with a single field value,
//!   produced by the validation engine. Field errors are data, not failures.
//! - [`FormcraftError`]: everything else (missing forms, storage, transport,
//!   configuration). Each variant has a stable taxonomy code via
//!   [`FormcraftError::kind`].

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The kind of a field-level validation failure.
///
/// Serialized as the kebab-case taxonomy code (e.g. `required-missing`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FieldErrorKind {
    /// A required field has no value.
    RequiredMissing,
    /// A text value is longer or shorter than allowed.
    LengthViolation,
    /// A text value does not match the configured pattern.
    PatternMismatch,
    /// A number field value is not a number.
    InvalidNumber,
    /// A number is outside the configured bounds.
    RangeViolation,
    /// A date field value is not a calendar date.
    InvalidDate,
    /// A select value is not one of the declared options.
    InvalidOption,
    /// An email address is syntactically invalid.
    InvalidEmail,
    /// An email address belongs to a domain outside the whitelist.
    DomainNotAllowed,
    /// A custom rule rejected the value.
    CustomValidationFailure,
}

impl FieldErrorKind {
    /// Returns the stable taxonomy code.
    pub const fn code(self) -> &'static str {
        match self {
            Self::RequiredMissing => "required-missing",
            Self::LengthViolation => "length-violation",
            Self::PatternMismatch => "pattern-mismatch",
            Self::InvalidNumber => "invalid-number",
            Self::RangeViolation => "range-violation",
            Self::InvalidDate => "invalid-date",
            Self::InvalidOption => "invalid-option",
            Self::InvalidEmail => "invalid-email",
            Self::DomainNotAllowed => "domain-not-allowed",
            Self::CustomValidationFailure => "custom-validation-failure",
        }
    }
}

impl fmt::Display for FieldErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Severity of a field error. The validation engine only emits [`Severity::Error`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Blocks submission.
    #[default]
    Error,
    /// Informational; reserved.
    Warning,
}

/// A single field-level validation error.
///
/// # Examples
///
/// ```
/// use formcraft_core::error::{FieldError, FieldErrorKind, Severity};
///
/// let err = FieldError::new(FieldErrorKind::RequiredMissing, "This field is required");
/// assert_eq!(err.severity, Severity::Error);
/// assert_eq!(err.to_string(), "This field is required");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Which check failed.
    pub kind: FieldErrorKind,
    /// Human-readable message shown next to the field.
    pub message: String,
    /// Severity tag.
    #[serde(rename = "type", default)]
    pub severity: Severity,
}

impl FieldError {
    /// Creates an error-severity field error.
    pub fn new(kind: FieldErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
            severity: Severity::Error,
        }
    }
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for FieldError {}

/// Field errors collected over a whole form, keyed by field id.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, FieldError>);

impl FieldErrors {
    /// Creates an empty error map.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the error for a field, replacing any earlier one.
    pub fn insert(&mut self, field_id: impl Into<String>, error: FieldError) {
        self.0.insert(field_id.into(), error);
    }

    /// Records or clears the error for a field.
    pub fn set(&mut self, field_id: impl Into<String>, error: Option<FieldError>) {
        let field_id = field_id.into();
        match error {
            Some(error) => {
                self.0.insert(field_id, error);
            }
            None => {
                self.0.remove(&field_id);
            }
        }
    }

    /// Returns the error for a field, if any.
    pub fn get(&self, field_id: &str) -> Option<&FieldError> {
        self.0.get(field_id)
    }

    /// Iterates over `(field_id, error)` pairs in field-id order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &FieldError)> {
        self.0.iter()
    }

    /// Removes every error.
    pub fn clear(&mut self) {
        self.0.clear();
    }

    /// Number of fields with an error.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if no field has an error.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for FieldErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut first = true;
        for (field, error) in &self.0 {
            if !first {
                write!(f, "; ")?;
            }
            write!(f, "{field}: {error}")?;
            first = false;
        }
        Ok(())
    }
}

/// The primary error type for formcraft.
///
/// Every variant resolves to either a user-correctable state (fix input,
/// configure an endpoint, retry) or a silently degraded one (storage).
/// None of them is fatal to the process.
#[derive(Error, Debug)]
pub enum FormcraftError {
    // ── Lookup ───────────────────────────────────────────────────────

    /// A form or published identifier could not be resolved.
    #[error("Not found: {0}")]
    NotFound(String),

    // ── Schema ───────────────────────────────────────────────────────

    /// A form definition violates a structural rule.
    #[error("Invalid schema: {0}")]
    InvalidSchema(String),

    /// Submission was blocked by field validation.
    #[error("Validation failed: {0}")]
    Validation(FieldErrors),

    // ── Submission ───────────────────────────────────────────────────

    /// Submission was attempted without a configured endpoint.
    #[error("No API endpoint configured")]
    MissingEndpoint,

    /// The transport reported an error or a non-success status.
    #[error("{0}")]
    Transport(String),

    /// A submission is already in flight for this form.
    #[error("A submission is already in progress")]
    SubmissionInProgress,

    // ── Storage ──────────────────────────────────────────────────────

    /// Reading or writing persisted values failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// A signed entry failed verification.
    #[error("Bad signature: {0}")]
    BadSignature(String),

    // ── Serialization / configuration / IO ───────────────────────────

    /// Serialization or deserialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// A configuration value is missing or invalid.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// An I/O error occurred.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl FormcraftError {
    /// Returns the stable kebab-case taxonomy code for this error.
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not-found",
            Self::InvalidSchema(_) => "invalid-schema",
            Self::Validation(_) => "validation-failure",
            Self::MissingEndpoint => "missing-endpoint",
            Self::Transport(_) => "transport-failure",
            Self::SubmissionInProgress => "submission-in-progress",
            Self::Storage(_) | Self::BadSignature(_) | Self::Io(_) => "storage-failure",
            Self::Serialization(_) => "serialization-failure",
            Self::Configuration(_) => "configuration-error",
        }
    }

    /// Returns `true` for errors that a retry of the same submission may fix.
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::SubmissionInProgress)
    }
}

impl From<serde_json::Error> for FormcraftError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

/// A convenience type alias for `Result<T, FormcraftError>`.
pub type FormcraftResult<T> = Result<T, FormcraftError>;
