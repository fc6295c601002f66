//! # formcraft
//!
//! Dynamic form schemas for Rust: build a form, validate what users type,
//! keep in-progress values alive, publish it, and submit it.
//!
//! This is the meta-crate that re-exports the sub-crates. Depend on
//! `formcraft` for everything, or on individual crates for finer-grained
//! control.
//!
//! ```rust
//! use formcraft::forms::{validate_form, Field, FieldGroup, FieldType, Form, FormData, FormDraft, ValidationRule};
//! use formcraft::core::PersistenceMode;
//!
//! let form = Form::from_draft(
//!     FormDraft {
//!         name: "Newsletter".to_string(),
//!         groups: vec![FieldGroup::new(
//!             "g",
//!             "subscriber",
//!             vec![Field::new("email", "email", FieldType::Email)
//!                 .validation(ValidationRule::new().required(true))],
//!         )],
//!         ..FormDraft::default()
//!     },
//!     PersistenceMode::Session,
//! );
//!
//! let errors = validate_form(&form, &FormData::new());
//! assert_eq!(errors.get("email").unwrap().message, "This field is required");
//! ```

/// Errors, settings, logging, signing, and persistence policy types.
pub use formcraft_core as core;

/// The schema model and the validation engine.
pub use formcraft_forms as forms;

/// Value persistence: storage backends and the persistence manager.
#[cfg(feature = "persistence")]
pub use formcraft_persistence as persistence;

/// The form repository and publication registry.
#[cfg(feature = "registry")]
pub use formcraft_registry as registry;

/// Payload assembly, transport, and the submission state machine.
#[cfg(feature = "submit")]
pub use formcraft_submit as submit;

/// The command framework and built-in commands.
#[cfg(feature = "cli")]
pub use formcraft_cli as cli;

pub use formcraft_core::{FormcraftError, FormcraftResult, Settings};

// Third-party crates that appear in the public API: schemas are serde types,
// timestamps are chrono, custom transports implement an `async_trait`, and
// logging is configured through tracing.
pub use async_trait;
pub use chrono;
pub use serde;
pub use serde_json;
pub use tracing;
pub use tracing_subscriber;
