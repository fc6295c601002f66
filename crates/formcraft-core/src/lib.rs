//! # formcraft-core
//!
//! Core types, settings, and error types for formcraft.
//! This crate has no dependency on the other formcraft crates and provides the
//! foundation for all of them.
//!
//! ## Modules
//!
//! - [`error`] - Error types, the field-level error taxonomy, and result aliases
//! - [`policy`] - Persistence modes and expiry durations shared by schema and storage
//! - [`settings`] - Application settings
//! - [`settings_loader`] - Loading settings from TOML/JSON files and the environment
//! - [`logging`] - Tracing-based logging integration
//! - [`signing`] - HMAC signing for durable entries

pub mod error;
pub mod logging;
pub mod policy;
pub mod settings;
pub mod settings_loader;
pub mod signing;

// Re-export the most commonly used types at the crate root.
pub use error::{FieldError, FieldErrorKind, FieldErrors, FormcraftError, FormcraftResult, Severity};
pub use policy::{ExpiryDuration, PersistenceMode};
pub use settings::Settings;
