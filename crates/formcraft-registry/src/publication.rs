//! The publication registry.
//!
//! Maps a form id to the published id it is shared under, and back. Each
//! publish generates a fresh id `{form_id}-{8 hex digits}` and retires the
//! previous one, so a stale link stops resolving.

use std::collections::{BTreeMap, HashMap};

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Bidirectional form id / published id mapping.
///
/// # Examples
///
/// ```
/// use formcraft_registry::PublicationRegistry;
///
/// let mut registry = PublicationRegistry::new();
/// let first = registry.publish("form-1");
/// let second = registry.publish("form-1");
///
/// assert_ne!(first, second);
/// assert_eq!(registry.resolve(&first), None);
/// assert_eq!(registry.resolve(&second), Some("form-1"));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<String, String>", into = "BTreeMap<String, String>")]
pub struct PublicationRegistry {
    by_form: HashMap<String, String>,
    by_published: HashMap<String, String>,
}

impl PublicationRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Publishes `form_id` under a new id, replacing any earlier one.
    pub fn publish(&mut self, form_id: &str) -> String {
        let published_id = loop {
            let suffix: u32 = rand::thread_rng().gen();
            let candidate = format!("{form_id}-{suffix:08x}");
            if !self.by_published.contains_key(&candidate) {
                break candidate;
            }
        };

        if let Some(old) = self.by_form.insert(form_id.to_string(), published_id.clone()) {
            self.by_published.remove(&old);
            tracing::debug!(form = form_id, retired = %old, "Retired published id");
        }
        self.by_published
            .insert(published_id.clone(), form_id.to_string());
        published_id
    }

    /// Resolves a published id to its form id.
    pub fn resolve(&self, published_id: &str) -> Option<&str> {
        self.by_published.get(published_id).map(String::as_str)
    }

    /// The current published id of a form.
    pub fn published_id(&self, form_id: &str) -> Option<&str> {
        self.by_form.get(form_id).map(String::as_str)
    }

    /// Removes the mapping for `form_id`. Returns the retired published id.
    pub fn unpublish(&mut self, form_id: &str) -> Option<String> {
        let old = self.by_form.remove(form_id)?;
        self.by_published.remove(&old);
        Some(old)
    }

    /// Number of published forms.
    pub fn len(&self) -> usize {
        self.by_form.len()
    }

    /// Returns `true` if nothing is published.
    pub fn is_empty(&self) -> bool {
        self.by_form.is_empty()
    }

    /// Iterates over `(form_id, published_id)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.by_form.iter().map(|(f, p)| (f.as_str(), p.as_str()))
    }
}

impl From<BTreeMap<String, String>> for PublicationRegistry {
    fn from(by_form: BTreeMap<String, String>) -> Self {
        let by_published = by_form
            .iter()
            .map(|(form, published)| (published.clone(), form.clone()))
            .collect();
        Self {
            by_form: by_form.into_iter().collect(),
            by_published,
        }
    }
}

impl From<PublicationRegistry> for BTreeMap<String, String> {
    fn from(registry: PublicationRegistry) -> Self {
        registry.by_form.into_iter().collect()
    }
}
