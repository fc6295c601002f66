//! The persistence manager: storage lifecycle of one form's values.
//!
//! Each field's effective persistence mode is its own override or the form's
//! mode:
//!
//! | mode | where the value lives |
//! |---|---|
//! | `none` | only in the manager's in-memory map |
//! | `session` | the session store, as a plain value map |
//! | `permanent` | the durable store, as `{data, expiry}` |
//!
//! Both stored entries live under the key `form_data_<form id>`. Permanent
//! entries are signed when a secret key is configured.
//!
//! Storage failures never propagate: they are logged at `warn` and the
//! affected entry is treated as absent, so [`PersistenceManager::load`]
//! always yields a fully initialized value map.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use formcraft_core::logging::form_span;
use formcraft_core::signing::Signer;
use formcraft_core::{ExpiryDuration, PersistenceMode, Settings};
use formcraft_forms::{FieldValue, Form, FormData};

use crate::backend::{StorageBackend, StorageSession};

/// The storage key of a form's values.
pub fn storage_key(form_id: &str) -> String {
    format!("form_data_{form_id}")
}

/// The stored shape of permanent-mode values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PermanentEntry {
    /// The stored values.
    pub data: FormData,
    /// When the entry stops being valid.
    pub expiry: DateTime<Utc>,
}

/// Loads, saves, and clears the values of one form instance.
///
/// # Examples
///
/// ```
/// use formcraft_core::PersistenceMode;
/// use formcraft_forms::{Field, FieldGroup, FieldType, Form, FormDraft};
/// use formcraft_persistence::{PersistenceManager, StorageSession};
///
/// let form = Form::from_draft(
///     FormDraft {
///         name: "Feedback".to_string(),
///         groups: vec![FieldGroup::new("g", "main", vec![Field::new("c", "comment", FieldType::Text)])],
///         ..FormDraft::default()
///     },
///     PersistenceMode::Session,
/// );
///
/// let stores = StorageSession::in_memory();
/// let mut manager = PersistenceManager::new(form.clone(), stores.clone());
/// manager.set_value("c", "great");
///
/// let mut reopened = PersistenceManager::new(form, stores);
/// assert_eq!(reopened.load().get("c").unwrap().as_text().unwrap(), "great");
/// ```
#[derive(Debug)]
pub struct PersistenceManager {
    form: Form,
    stores: StorageSession,
    signer: Option<Signer>,
    default_expiry: ExpiryDuration,
    values: FormData,
    loaded: bool,
}

impl PersistenceManager {
    /// Creates a manager for `form` backed by `stores`.
    pub fn new(form: Form, stores: StorageSession) -> Self {
        Self {
            form,
            stores,
            signer: None,
            default_expiry: ExpiryDuration::default(),
            values: FormData::new(),
            loaded: false,
        }
    }

    /// Creates a manager configured from settings: signing with the secret
    /// key (if any) and the default expiry.
    pub fn from_settings(form: Form, stores: StorageSession, settings: &Settings) -> Self {
        let manager = Self::new(form, stores).with_default_expiry(settings.default_expiry);
        match settings.signing_key() {
            Some(key) => manager.with_signer(Signer::new(key)),
            None => manager,
        }
    }

    /// Signs permanent entries with `signer`.
    #[must_use]
    pub fn with_signer(mut self, signer: Signer) -> Self {
        self.signer = Some(signer);
        self
    }

    /// Sets the expiry used when the form does not declare one.
    #[must_use]
    pub const fn with_default_expiry(mut self, expiry: ExpiryDuration) -> Self {
        self.default_expiry = expiry;
        self
    }

    /// The form this manager serves.
    pub const fn form(&self) -> &Form {
        &self.form
    }

    /// The current in-memory values (as of the last load or save).
    pub const fn values(&self) -> &FormData {
        &self.values
    }

    /// Returns `true` once values have been loaded or saved since the last clear.
    pub const fn is_loaded(&self) -> bool {
        self.loaded
    }

    fn key(&self) -> String {
        storage_key(&self.form.id)
    }

    fn has_fields_in(&self, mode: PersistenceMode) -> bool {
        self.form
            .fields()
            .any(|f| self.form.field_persistence(f) == mode)
    }

    /// Values of fields whose effective mode is `mode`.
    fn partition(&self, data: &FormData, mode: PersistenceMode) -> FormData {
        let mut part = data.clone();
        part.retain(|id| {
            self.form
                .field(id)
                .is_some_and(|f| self.form.field_persistence(f) == mode)
        });
        part
    }

    /// Loads the stored values, initialized for every declared field.
    ///
    /// Expired or unreadable permanent entries are purged and treated as
    /// absent. Fields with no value get their default value, or the empty
    /// value of their type.
    pub fn load(&mut self) -> FormData {
        let _guard = form_span(&self.form.id).entered();

        let mut data = self.partition(&self.values, PersistenceMode::None);
        if let Some(session) = self.read_session() {
            data.merge(self.partition(&session, PersistenceMode::Session));
        }
        if let Some(entry) = self.read_permanent() {
            data.merge(self.partition(&entry.data, PersistenceMode::Permanent));
        }
        data.fill_defaults(&self.form);

        tracing::debug!(fields = data.len(), "Loaded form values");
        self.values = data.clone();
        self.loaded = true;
        data
    }

    /// Merges `update` into the current values and writes them back.
    ///
    /// Fields not mentioned in `update` keep their values. Permanent entries
    /// get a fresh expiry. Write failures are logged; the in-memory values are
    /// updated regardless.
    pub fn save(&mut self, update: FormData) {
        if !self.loaded {
            self.load();
        }
        let _guard = form_span(&self.form.id).entered();

        self.values.merge(update);
        let key = self.key();

        if self.has_fields_in(PersistenceMode::Session) {
            let session = self.partition(&self.values, PersistenceMode::Session);
            match serde_json::to_string(&session) {
                Ok(json) => warn_on_error(self.stores.session.set(&key, &json), "write session values"),
                Err(e) => tracing::warn!(error = %e, "Failed to serialize session values"),
            }
        }

        if self.has_fields_in(PersistenceMode::Permanent) {
            let expiry = self.form.expiry_or(self.default_expiry);
            let entry = PermanentEntry {
                data: self.partition(&self.values, PersistenceMode::Permanent),
                expiry: Utc::now() + expiry.as_duration(),
            };
            match serde_json::to_string(&entry) {
                Ok(json) => {
                    let stored = match &self.signer {
                        Some(signer) => signer.sign(&json),
                        None => json,
                    };
                    warn_on_error(self.stores.durable.set(&key, &stored), "write permanent values");
                }
                Err(e) => tracing::warn!(error = %e, "Failed to serialize permanent values"),
            }
        }

        tracing::debug!(fields = self.values.len(), "Saved form values");
    }

    /// Sets a single field's value and saves.
    pub fn set_value(&mut self, field_id: impl Into<String>, value: impl Into<FieldValue>) {
        let mut update = FormData::new();
        update.insert(field_id, value);
        self.save(update);
    }

    /// Removes every stored entry and forgets the in-memory values.
    pub fn clear(&mut self) {
        let _guard = form_span(&self.form.id).entered();
        let key = self.key();
        warn_on_error(self.stores.session.remove(&key), "clear session values");
        warn_on_error(self.stores.durable.remove(&key), "clear permanent values");
        self.values = FormData::new();
        self.loaded = false;
        tracing::debug!("Cleared form values");
    }

    /// Clears and reloads, returning freshly initialized values.
    pub fn reset(&mut self) -> FormData {
        self.clear();
        self.load()
    }

    /// Returns `true` if any stored entry exists for the form.
    ///
    /// An expired permanent entry does not count and is purged.
    pub fn exists(&self) -> bool {
        let in_session = self
            .stores
            .session
            .contains(&self.key())
            .unwrap_or_else(|e| {
                tracing::warn!(error = %e, "Failed to check session values");
                false
            });
        in_session || self.read_permanent().is_some()
    }

    fn read_session(&self) -> Option<FormData> {
        let raw = read_entry(self.stores.session.as_ref(), &self.key(), "session")?;
        match serde_json::from_str(&raw) {
            Ok(data) => Some(data),
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt session values");
                warn_on_error(self.stores.session.remove(&self.key()), "purge session values");
                None
            }
        }
    }

    fn read_permanent(&self) -> Option<PermanentEntry> {
        let key = self.key();
        let raw = read_entry(self.stores.durable.as_ref(), &key, "permanent")?;

        let json = match &self.signer {
            Some(signer) => match signer.unsign(&raw) {
                Ok(json) => json,
                Err(e) => {
                    tracing::warn!(error = %e, "Discarding permanent values with a bad signature");
                    self.purge_permanent(&key);
                    return None;
                }
            },
            None => raw,
        };

        let entry: PermanentEntry = match serde_json::from_str(&json) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(error = %e, "Discarding corrupt permanent values");
                self.purge_permanent(&key);
                return None;
            }
        };

        if entry.expiry <= Utc::now() {
            tracing::debug!(expiry = %entry.expiry, "Permanent values expired");
            self.purge_permanent(&key);
            return None;
        }
        Some(entry)
    }

    fn purge_permanent(&self, key: &str) {
        warn_on_error(self.stores.durable.remove(key), "purge permanent values");
    }
}

fn read_entry(store: &dyn StorageBackend, key: &str, which: &str) -> Option<String> {
    store.get(key).unwrap_or_else(|e| {
        tracing::warn!(error = %e, store = which, "Failed to read stored values");
        None
    })
}

fn warn_on_error(result: Result<(), formcraft_core::FormcraftError>, action: &str) {
    if let Err(e) = result {
        tracing::warn!(error = %e, "Failed to {action}");
    }
}
