//! The `show` command.

use async_trait::async_trait;
use formcraft_core::{FormcraftResult, Settings};
use formcraft_registry::FormRepository;

use super::{id_arg, required};
use crate::command::ManagementCommand;

/// Prints a form's full definition as JSON.
pub struct ShowCommand;

#[async_trait]
impl ManagementCommand for ShowCommand {
    fn name(&self) -> &'static str {
        "show"
    }

    fn help(&self) -> &'static str {
        "Print a form definition"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(id_arg("id", "Form id"))
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let repo = FormRepository::open(settings)?;
        let form = repo.get(required(matches, "id")?)?;
        println!("{}", serde_json::to_string_pretty(form)?);
        Ok(())
    }
}
