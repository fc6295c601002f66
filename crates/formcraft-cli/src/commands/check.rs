//! The `check` command.
//!
//! Runs the schema checks over every stored form and looks for
//! configuration that will fail at submit time.

use async_trait::async_trait;
use formcraft_core::{FormcraftError, FormcraftResult, PersistenceMode, Settings};
use formcraft_registry::FormRepository;

use crate::command::ManagementCommand;

/// Checks stored forms and settings.
pub struct CheckCommand;

/// The result of a single check.
#[derive(Debug, Clone)]
pub struct CheckMessage {
    /// Severity.
    pub level: CheckLevel,
    /// What is wrong.
    pub msg: String,
    /// How to fix it.
    pub hint: Option<String>,
    /// Stable identifier, e.g. `forms.E001`.
    pub id: &'static str,
}

/// Severity of a check result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum CheckLevel {
    /// Informational.
    Info,
    /// Works, but probably not as intended.
    Warning,
    /// Will fail when used.
    Error,
}

impl std::fmt::Display for CheckLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "INFO"),
            Self::Warning => write!(f, "WARNING"),
            Self::Error => write!(f, "ERROR"),
        }
    }
}

/// Checks `settings` and every form in `repo`.
pub fn run_checks(settings: &Settings, repo: &FormRepository) -> Vec<CheckMessage> {
    let mut messages = Vec::new();

    if settings.signing_key().is_none() {
        messages.push(CheckMessage {
            level: CheckLevel::Warning,
            msg: "secret_key is empty, permanent values are stored unsigned".to_string(),
            hint: Some("Set secret_key or FORMCRAFT_SECRET_KEY".to_string()),
            id: "settings.W001",
        });
    }

    for form in repo.list() {
        if let Err(e) = form.check() {
            messages.push(CheckMessage {
                level: CheckLevel::Error,
                msg: format!("{} ({}): {e}", form.name, form.id),
                hint: None,
                id: "forms.E001",
            });
        }

        if form.submit_config.endpoint().is_none() {
            let level = if repo.published_id(&form.id).is_some() {
                CheckLevel::Error
            } else {
                CheckLevel::Warning
            };
            messages.push(CheckMessage {
                level,
                msg: format!("{} ({}) has no submit endpoint", form.name, form.id),
                hint: Some("Set submitConfig.apiEndpoint".to_string()),
                id: "forms.E002",
            });
        }

        if form.persistence_type == PersistenceMode::Permanent && form.expiry_duration.is_none() {
            messages.push(CheckMessage {
                level: CheckLevel::Info,
                msg: format!(
                    "{} ({}) keeps values for the default {}",
                    form.name,
                    form.id,
                    settings.default_expiry.label()
                ),
                hint: None,
                id: "forms.I001",
            });
        }
    }

    messages
}

#[async_trait]
impl ManagementCommand for CheckCommand {
    fn name(&self) -> &'static str {
        "check"
    }

    fn help(&self) -> &'static str {
        "Check stored forms and settings"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let repo = FormRepository::open(settings)?;
        let messages = run_checks(settings, &repo);

        if messages.is_empty() {
            tracing::info!("Check identified no issues");
            return Ok(());
        }

        for msg in &messages {
            let hint = msg.hint.as_ref().map_or(String::new(), |h| format!("\n\tHINT: {h}"));
            println!("{} ({}): {}{hint}", msg.level, msg.id, msg.msg);
        }

        let errors = messages.iter().filter(|m| m.level == CheckLevel::Error).count();
        tracing::info!(issues = messages.len(), errors, "Check finished");
        if errors > 0 {
            return Err(FormcraftError::Configuration(format!("Check found {errors} error(s)")));
        }
        Ok(())
    }
}
