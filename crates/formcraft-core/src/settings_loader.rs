//! Settings loading from configuration files and the environment.
//!
//! ## Loading Order
//!
//! 1. Start with [`Settings::default()`].
//! 2. Deep-merge a TOML or JSON document over the defaults. Keys the
//!    document leaves out keep their default values.
//! 3. Apply `FORMCRAFT_*` environment overrides (highest priority).
//!
//! ## Environment Variable Mapping
//!
//! | Env Var | Setting |
//! |---|---|
//! | `FORMCRAFT_DEBUG` | `debug` |
//! | `FORMCRAFT_LOG_LEVEL` | `log_level` |
//! | `FORMCRAFT_SECRET_KEY` | `secret_key` |
//! | `FORMCRAFT_DATA_DIR` | `data_dir` |
//! | `FORMCRAFT_DEFAULT_PERSISTENCE` | `default_persistence` |
//! | `FORMCRAFT_DEFAULT_EXPIRY` | `default_expiry` |
//! | `FORMCRAFT_CONFIRMATION_WINDOW_MS` | `confirmation_window_ms` |
//! | `FORMCRAFT_REQUEST_TIMEOUT_SECS` | `request_timeout_secs` (`0` clears it) |
//!
//! An override that does not parse is ignored and the previous value kept.
//!
//! ## Examples
//!
//! ```rust,no_run
//! use formcraft_core::settings_loader;
//!
//! let settings = settings_loader::from_file_with_env("formcraft.toml").unwrap();
//! ```

use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::Value;

use crate::error::FormcraftError;
use crate::settings::Settings;

/// A settings document format.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// TOML, the default for files.
    Toml,
    /// JSON, chosen for files ending in `.json`.
    Json,
}

impl Format {
    /// Picks the format from a file extension.
    pub fn of(path: &Path) -> Self {
        if path.extension().is_some_and(|ext| ext.eq_ignore_ascii_case("json")) {
            Self::Json
        } else {
            Self::Toml
        }
    }

    const fn name(self) -> &'static str {
        match self {
            Self::Toml => "TOML",
            Self::Json => "JSON",
        }
    }

    fn parse(self, source: &str) -> Result<Value, FormcraftError> {
        let parsed = match self {
            Self::Toml => toml::from_str::<toml::Value>(source)
                .map_err(|e| e.to_string())
                .and_then(|doc| serde_json::to_value(doc).map_err(|e| e.to_string())),
            Self::Json => serde_json::from_str(source).map_err(|e| e.to_string()),
        };
        parsed.map_err(|e| FormcraftError::Configuration(format!("Failed to parse {}: {e}", self.name())))
    }
}

/// Loads settings from a document in `format`, over the defaults.
///
/// # Errors
///
/// Returns [`FormcraftError::Configuration`] if the document is malformed or
/// holds a value of the wrong shape.
pub fn from_str(source: &str, format: Format) -> Result<Settings, FormcraftError> {
    let mut merged = serde_json::to_value(Settings::default())?;
    merge_into(&mut merged, format.parse(source)?);
    serde_json::from_value(merged).map_err(|e| {
        FormcraftError::Configuration(format!("Invalid settings in {}: {e}", format.name()))
    })
}

/// Loads settings from a TOML string.
pub fn from_toml_str(source: &str) -> Result<Settings, FormcraftError> {
    from_str(source, Format::Toml)
}

/// Loads settings from a JSON string.
pub fn from_json_str(source: &str) -> Result<Settings, FormcraftError> {
    from_str(source, Format::Json)
}

/// Loads settings from a file, picking the format with [`Format::of`].
pub fn from_file(path: impl AsRef<Path>) -> Result<Settings, FormcraftError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|e| {
        FormcraftError::Configuration(format!("Failed to read settings file '{}': {e}", path.display()))
    })?;
    from_str(&source, Format::of(path))
}

/// Loads settings from a file, then applies environment overrides.
pub fn from_file_with_env(path: impl AsRef<Path>) -> Result<Settings, FormcraftError> {
    let mut settings = from_file(path)?;
    apply_env_overrides(&mut settings);
    Ok(settings)
}

/// Defaults plus environment overrides.
pub fn from_env() -> Settings {
    let mut settings = Settings::default();
    apply_env_overrides(&mut settings);
    settings
}

/// Applies `FORMCRAFT_*` overrides from the process environment.
pub fn apply_env_overrides(settings: &mut Settings) {
    apply_overrides_from(settings, |key| std::env::var(key).ok());
}

/// Applies overrides using an arbitrary variable lookup.
pub fn apply_overrides_from<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(val) = lookup("FORMCRAFT_DEBUG") {
        settings.debug = matches!(val.to_ascii_lowercase().as_str(), "true" | "1" | "yes");
    }
    if let Some(val) = lookup("FORMCRAFT_LOG_LEVEL") {
        settings.log_level = val;
    }
    if let Some(val) = lookup("FORMCRAFT_SECRET_KEY") {
        settings.secret_key = val;
    }
    if let Some(val) = lookup("FORMCRAFT_DATA_DIR") {
        settings.data_dir = PathBuf::from(val);
    }

    parse_into(&mut settings.default_persistence, lookup("FORMCRAFT_DEFAULT_PERSISTENCE"));
    parse_into(&mut settings.default_expiry, lookup("FORMCRAFT_DEFAULT_EXPIRY"));
    parse_into(&mut settings.confirmation_window_ms, lookup("FORMCRAFT_CONFIRMATION_WINDOW_MS"));

    let mut timeout = settings.request_timeout_secs.unwrap_or(0);
    parse_into(&mut timeout, lookup("FORMCRAFT_REQUEST_TIMEOUT_SECS"));
    settings.request_timeout_secs = (timeout > 0).then_some(timeout);
}

fn parse_into<T: FromStr>(slot: &mut T, raw: Option<String>) {
    if let Some(value) = raw.and_then(|v| v.trim().parse().ok()) {
        *slot = value;
    }
}

/// Deep-merges `overlay` into `base`; objects merge key by key, anything
/// else replaces.
fn merge_into(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base), Value::Object(overlay)) => {
            for (key, value) in overlay {
                match base.get_mut(&key) {
                    Some(existing) => merge_into(existing, value),
                    None => {
                        base.insert(key, value);
                    }
                }
            }
        }
        (slot, overlay) => *slot = overlay,
    }
}
