//! The form repository.
//!
//! A [`FormRepository`] owns the form collection and its publication
//! registry. It is created by the host and passed by reference to whatever
//! needs it; there is no process-wide store.
//!
//! The collection is stored as one JSON file:
//!
//! ```json
//! {"forms": [ ... ], "published": {"<form id>": "<published id>"}}
//! ```

use std::collections::HashMap;
use std::path::Path;

use chrono::Utc;
use serde::{Deserialize, Serialize};

use formcraft_core::{FormcraftError, FormcraftResult, PersistenceMode, Settings};
use formcraft_forms::{Form, FormDraft, SubmitConfig};

use crate::publication::PublicationRegistry;

#[derive(Debug, Default, Serialize, Deserialize)]
struct RepositoryFile {
    #[serde(default)]
    forms: Vec<Form>,
    #[serde(default)]
    published: PublicationRegistry,
}

/// The collection of form schemas and their published ids.
#[derive(Debug, Default)]
pub struct FormRepository {
    forms: Vec<Form>,
    index: HashMap<String, usize>,
    publications: PublicationRegistry,
    default_persistence: PersistenceMode,
}

impl FormRepository {
    /// Creates an empty repository.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the persistence mode given to drafts that do not choose one.
    #[must_use]
    pub const fn with_default_persistence(mut self, mode: PersistenceMode) -> Self {
        self.default_persistence = mode;
        self
    }

    /// Loads the repository from the configured forms file.
    pub fn open(settings: &Settings) -> FormcraftResult<Self> {
        Ok(Self::load(settings.forms_path())?.with_default_persistence(settings.default_persistence))
    }

    /// Loads a repository file. A missing file yields an empty repository.
    ///
    /// # Errors
    ///
    /// Returns [`FormcraftError::Serialization`] if the file is not a valid
    /// repository, or [`FormcraftError::Io`] if it cannot be read.
    pub fn load(path: impl AsRef<Path>) -> FormcraftResult<Self> {
        let path = path.as_ref();
        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "No forms file, starting empty");
                return Ok(Self::new());
            }
            Err(e) => return Err(e.into()),
        };

        let file: RepositoryFile = serde_json::from_str(&content).map_err(|e| {
            FormcraftError::Serialization(format!("Invalid forms file '{}': {e}", path.display()))
        })?;

        let mut repo = Self {
            forms: file.forms,
            publications: file.published,
            ..Self::default()
        };
        repo.reindex();
        tracing::debug!(path = %path.display(), forms = repo.forms.len(), "Loaded forms");
        Ok(repo)
    }

    /// Writes the repository to `path`, creating parent directories.
    pub fn save(&self, path: impl AsRef<Path>) -> FormcraftResult<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let file = RepositoryFile {
            forms: self.forms.clone(),
            published: self.publications.clone(),
        };
        std::fs::write(path, serde_json::to_string_pretty(&file)?)?;
        Ok(())
    }

    fn reindex(&mut self) {
        self.index = self
            .forms
            .iter()
            .enumerate()
            .map(|(i, f)| (f.id.clone(), i))
            .collect();
    }

    fn position(&self, form_id: &str) -> FormcraftResult<usize> {
        self.index
            .get(form_id)
            .copied()
            .ok_or_else(|| FormcraftError::NotFound(format!("Form '{form_id}'")))
    }

    /// Creates a version-1 form from a draft.
    ///
    /// # Errors
    ///
    /// Returns [`FormcraftError::InvalidSchema`] if the draft fails the schema check.
    pub fn create(&mut self, draft: FormDraft) -> FormcraftResult<&Form> {
        draft.check()?;
        let form = Form::from_draft(draft, self.default_persistence);
        tracing::info!(form = %form.id, name = %form.name, "Created form");
        self.index.insert(form.id.clone(), self.forms.len());
        self.forms.push(form);
        Ok(&self.forms[self.forms.len() - 1])
    }

    /// Returns a form by id.
    pub fn get(&self, form_id: &str) -> FormcraftResult<&Form> {
        Ok(&self.forms[self.position(form_id)?])
    }

    /// All forms, in creation order.
    pub fn list(&self) -> &[Form] {
        &self.forms
    }

    /// Replaces a form's definition.
    ///
    /// The stored version is incremented by exactly one and `updated_at`
    /// refreshed; identity and `created_at` are kept from the stored form
    /// regardless of what `form` carries.
    ///
    /// # Errors
    ///
    /// Returns [`FormcraftError::NotFound`] for an unknown id and
    /// [`FormcraftError::InvalidSchema`] if the new definition fails the
    /// schema check.
    pub fn update(&mut self, mut form: Form) -> FormcraftResult<&Form> {
        let pos = self.position(&form.id)?;
        form.check()?;

        let existing = &self.forms[pos];
        form.version = existing.version + 1;
        form.created_at = existing.created_at;
        form.updated_at = Utc::now();
        if form.persistence_type != PersistenceMode::Permanent {
            form.expiry_duration = None;
        }

        tracing::info!(form = %form.id, version = form.version, "Updated form");
        self.forms[pos] = form;
        Ok(&self.forms[pos])
    }

    /// Replaces a form's submit configuration. Counts as an update.
    pub fn update_submit_config(
        &mut self,
        form_id: &str,
        submit_config: SubmitConfig,
    ) -> FormcraftResult<&Form> {
        let mut form = self.get(form_id)?.clone();
        form.submit_config = submit_config;
        self.update(form)
    }

    /// Deletes a form and retires its published id.
    pub fn delete(&mut self, form_id: &str) -> FormcraftResult<Form> {
        let pos = self.position(form_id)?;
        let form = self.forms.remove(pos);
        self.reindex();
        if let Some(published) = self.publications.unpublish(form_id) {
            tracing::debug!(form = form_id, published = %published, "Unpublished deleted form");
        }
        tracing::info!(form = form_id, "Deleted form");
        Ok(form)
    }

    /// Publishes a form under a new id, retiring any earlier one.
    pub fn publish(&mut self, form_id: &str) -> FormcraftResult<String> {
        self.position(form_id)?;
        let published = self.publications.publish(form_id);
        tracing::info!(form = form_id, published = %published, "Published form");
        Ok(published)
    }

    /// Resolves a published id to its form.
    ///
    /// # Errors
    ///
    /// Returns [`FormcraftError::NotFound`] for an unknown or retired id.
    pub fn resolve_published(&self, published_id: &str) -> FormcraftResult<&Form> {
        let form_id = self
            .publications
            .resolve(published_id)
            .ok_or_else(|| FormcraftError::NotFound(format!("Published form '{published_id}'")))?;
        self.get(form_id)
    }

    /// The current published id of a form, if it is published.
    pub fn published_id(&self, form_id: &str) -> Option<&str> {
        self.publications.published_id(form_id)
    }

    /// The publication registry.
    pub const fn publications(&self) -> &PublicationRegistry {
        &self.publications
    }
}
