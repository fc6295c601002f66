//! The `delete` command.

use async_trait::async_trait;
use formcraft_core::{FormcraftResult, Settings};
use formcraft_registry::FormRepository;

use super::{id_arg, open_values, required, save_repository};
use crate::command::ManagementCommand;

/// Deletes a form, its published id, and any values stored for it.
pub struct DeleteCommand;

#[async_trait]
impl ManagementCommand for DeleteCommand {
    fn name(&self) -> &'static str {
        "delete"
    }

    fn help(&self) -> &'static str {
        "Delete a form"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(id_arg("id", "Form id"))
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let mut repo = FormRepository::open(settings)?;
        let form = repo.delete(required(matches, "id")?)?;
        save_repository(&repo, settings)?;
        open_values(form, settings).clear();
        Ok(())
    }
}
