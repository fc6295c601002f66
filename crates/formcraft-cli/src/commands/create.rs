//! The `create` command.

use std::path::PathBuf;

use async_trait::async_trait;
use formcraft_core::{FormcraftError, FormcraftResult, Settings};
use formcraft_forms::FormDraft;
use formcraft_registry::FormRepository;

use super::save_repository;
use crate::command::ManagementCommand;

/// Creates a form from a JSON draft and prints its id.
///
/// The draft carries `name`, `groups`, and optionally `persistenceType`,
/// `expiryDuration`, and `submitConfig`.
pub struct CreateCommand;

#[async_trait]
impl ManagementCommand for CreateCommand {
    fn name(&self) -> &'static str {
        "create"
    }

    fn help(&self) -> &'static str {
        "Create a form from a JSON schema file"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(
            clap::Arg::new("file")
                .long("file")
                .short('f')
                .required(true)
                .value_name("SCHEMA")
                .value_parser(clap::value_parser!(PathBuf))
                .help("Path to the form draft"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let path = matches
            .get_one::<PathBuf>("file")
            .ok_or_else(|| FormcraftError::Configuration("Missing argument: file".to_string()))?;
        let draft: FormDraft = serde_json::from_str(&std::fs::read_to_string(path)?)
            .map_err(|e| FormcraftError::InvalidSchema(format!("{}: {e}", path.display())))?;

        let mut repo = FormRepository::open(settings)?;
        let id = repo.create(draft)?.id.clone();
        save_repository(&repo, settings)?;

        println!("{id}");
        Ok(())
    }
}
