//! Settings for formcraft.
//!
//! [`Settings`] holds all application configuration with sensible defaults.
//! There is no global settings object: callers load a `Settings` value
//! (see [`settings_loader`](crate::settings_loader)) and pass it by reference
//! to whatever needs it.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::policy::{ExpiryDuration, PersistenceMode};

/// The complete set of application settings.
///
/// # Examples
///
/// ```
/// use formcraft_core::settings::Settings;
///
/// let settings = Settings::default();
/// assert!(settings.debug);
/// assert_eq!(settings.confirmation_window_ms, 2000);
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    // ── Core ─────────────────────────────────────────────────────────

    /// Whether debug mode is enabled (pretty logs instead of JSON).
    pub debug: bool,
    /// Secret used to sign durable entries. Empty disables signing.
    pub secret_key: String,

    // ── Storage ──────────────────────────────────────────────────────

    /// Root directory for durable data.
    pub data_dir: PathBuf,
    /// File name of the form collection, relative to `data_dir`.
    pub forms_file: String,
    /// Directory of the durable value store, relative to `data_dir`.
    pub storage_dir: String,

    // ── Forms ────────────────────────────────────────────────────────

    /// Persistence mode given to newly created forms that do not set one.
    pub default_persistence: PersistenceMode,
    /// Expiry used for `permanent` forms that do not set one.
    pub default_expiry: ExpiryDuration,

    // ── Submission ───────────────────────────────────────────────────

    /// How long a success confirmation stays visible before the form resets.
    pub confirmation_window_ms: u64,
    /// Request timeout applied by the HTTP transport. `None` means no timeout.
    pub request_timeout_secs: Option<u64>,
    /// User agent sent by the HTTP transport.
    pub user_agent: String,

    // ── Logging ──────────────────────────────────────────────────────

    /// The log level (e.g. "info", "debug", "formcraft_persistence=trace").
    pub log_level: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: true,
            secret_key: String::new(),
            data_dir: PathBuf::from(".formcraft"),
            forms_file: "forms.json".to_string(),
            storage_dir: "storage".to_string(),
            default_persistence: PersistenceMode::Session,
            default_expiry: ExpiryDuration::OneWeek,
            confirmation_window_ms: 2000,
            request_timeout_secs: None,
            user_agent: concat!("formcraft/", env!("CARGO_PKG_VERSION")).to_string(),
            log_level: "info".to_string(),
        }
    }
}

impl Settings {
    /// Full path of the form collection file.
    pub fn forms_path(&self) -> PathBuf {
        self.data_dir.join(&self.forms_file)
    }

    /// Full path of the durable value store directory.
    pub fn storage_path(&self) -> PathBuf {
        self.data_dir.join(&self.storage_dir)
    }

    /// The success confirmation window as a `std::time::Duration`.
    pub const fn confirmation_window(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.confirmation_window_ms)
    }

    /// Returns the signing key, if signing is enabled.
    pub fn signing_key(&self) -> Option<&str> {
        if self.secret_key.is_empty() {
            None
        } else {
            Some(&self.secret_key)
        }
    }
}
