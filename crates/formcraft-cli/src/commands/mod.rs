//! Built-in commands.
//!
//! Every command reads the form collection from the configured forms file
//! and writes it back when it changes something.

pub mod check;
pub mod create;
pub mod delete;
pub mod fill;
pub mod list;
pub mod publish;
pub mod show;
pub mod submit;
pub mod validate;

pub use check::CheckCommand;
pub use create::CreateCommand;
pub use delete::DeleteCommand;
pub use fill::FillCommand;
pub use list::ListCommand;
pub use publish::{PublishCommand, ResolveCommand};
pub use show::ShowCommand;
pub use submit::SubmitCommand;
pub use validate::ValidateCommand;

use formcraft_core::{FormcraftError, FormcraftResult, Settings};
use formcraft_forms::{Form, FormData};
use formcraft_persistence::{PersistenceManager, StorageSession};
use formcraft_registry::FormRepository;

use crate::command::CommandRegistry;

/// Registers every built-in command.
pub fn register_builtin_commands(registry: &mut CommandRegistry) {
    registry.register(Box::new(CreateCommand));
    registry.register(Box::new(ListCommand));
    registry.register(Box::new(ShowCommand));
    registry.register(Box::new(PublishCommand));
    registry.register(Box::new(ResolveCommand));
    registry.register(Box::new(DeleteCommand));
    registry.register(Box::new(ValidateCommand));
    registry.register(Box::new(FillCommand));
    registry.register(Box::new(SubmitCommand));
    registry.register(Box::new(CheckCommand));
}

pub(crate) fn id_arg(name: &'static str, help: &'static str) -> clap::Arg {
    clap::Arg::new(name).required(true).value_name("ID").help(help)
}

pub(crate) fn required<'a>(matches: &'a clap::ArgMatches, name: &str) -> FormcraftResult<&'a str> {
    matches
        .get_one::<String>(name)
        .map(String::as_str)
        .ok_or_else(|| FormcraftError::Configuration(format!("Missing argument: {name}")))
}

pub(crate) fn save_repository(repo: &FormRepository, settings: &Settings) -> FormcraftResult<()> {
    repo.save(settings.forms_path())
}

/// Parses a value map given inline as JSON, or as `@path` to a JSON file.
pub(crate) fn parse_data(raw: &str) -> FormcraftResult<FormData> {
    let json = match raw.strip_prefix('@') {
        Some(path) => std::fs::read_to_string(path)?,
        None => raw.to_string(),
    };
    serde_json::from_str(&json)
        .map_err(|e| FormcraftError::Serialization(format!("Invalid form data: {e}")))
}

pub(crate) fn open_values(form: Form, settings: &Settings) -> PersistenceManager {
    PersistenceManager::from_settings(form, StorageSession::from_settings(settings), settings)
}
