//! Integration tests for the repository file and the publish/resolve flow.

use formcraft_core::{PersistenceMode, Settings};
use formcraft_forms::{Field, FieldGroup, FieldType, FormDraft};
use formcraft_registry::FormRepository;

fn draft(name: &str) -> FormDraft {
    FormDraft {
        name: name.to_string(),
        groups: vec![FieldGroup::new(
            "g",
            "contact",
            vec![Field::new("email", "email", FieldType::Email).required(true)],
        )],
        ..FormDraft::default()
    }
}

#[test]
fn test_publish_twice_then_resolve() {
    let mut repo = FormRepository::new();
    let id = repo.create(draft("Contact")).unwrap().id.clone();

    let first = repo.publish(&id).unwrap();
    let second = repo.publish(&id).unwrap();
    assert_ne!(first, second);

    let err = repo.resolve_published(&first).unwrap_err();
    assert_eq!(err.kind(), "not-found");
    assert_eq!(repo.resolve_published(&second).unwrap().id, id);
    assert_eq!(repo.published_id(&id), Some(second.as_str()));
}

#[test]
fn test_missing_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let repo = FormRepository::load(dir.path().join("forms.json")).unwrap();
    assert!(repo.list().is_empty());
}

#[test]
fn test_corrupt_file_is_serialization_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("forms.json");
    std::fs::write(&path, "{\"forms\": 12").unwrap();
    let err = FormRepository::load(&path).unwrap_err();
    assert_eq!(err.kind(), "serialization-failure");
}

#[test]
fn test_save_and_reload_keeps_forms_and_publications() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data/forms.json");

    let mut repo = FormRepository::new();
    let a = repo.create(draft("A")).unwrap().id.clone();
    let b = repo.create(draft("B")).unwrap().id.clone();
    let published = repo.publish(&b).unwrap();
    repo.save(&path).unwrap();

    let mut reloaded = FormRepository::load(&path).unwrap();
    let names: Vec<&str> = reloaded.list().iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["A", "B"]);
    assert_eq!(reloaded.resolve_published(&published).unwrap().id, b);

    // Indexes are rebuilt on load.
    reloaded.delete(&a).unwrap();
    assert_eq!(reloaded.get(&b).unwrap().name, "B");
}

#[test]
fn test_open_uses_settings() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings {
        data_dir: dir.path().to_path_buf(),
        default_persistence: PersistenceMode::Permanent,
        ..Settings::default()
    };

    let mut repo = FormRepository::open(&settings).unwrap();
    let form = repo.create(draft("A")).unwrap();
    assert_eq!(form.persistence_type, PersistenceMode::Permanent);
    repo.save(settings.forms_path()).unwrap();

    assert_eq!(FormRepository::open(&settings).unwrap().list().len(), 1);
}
