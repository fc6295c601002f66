//! The `publish` and `resolve` commands.

use async_trait::async_trait;
use formcraft_core::{FormcraftResult, Settings};
use formcraft_registry::FormRepository;

use super::{id_arg, required, save_repository};
use crate::command::ManagementCommand;

/// Publishes a form under a fresh id and prints it. Earlier ids stop resolving.
pub struct PublishCommand;

#[async_trait]
impl ManagementCommand for PublishCommand {
    fn name(&self) -> &'static str {
        "publish"
    }

    fn help(&self) -> &'static str {
        "Publish a form and print its shareable id"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(id_arg("id", "Form id"))
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let mut repo = FormRepository::open(settings)?;
        let published = repo.publish(required(matches, "id")?)?;
        save_repository(&repo, settings)?;
        println!("{published}");
        Ok(())
    }
}

/// Prints the form id a published id resolves to.
pub struct ResolveCommand;

#[async_trait]
impl ManagementCommand for ResolveCommand {
    fn name(&self) -> &'static str {
        "resolve"
    }

    fn help(&self) -> &'static str {
        "Resolve a published id to its form"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(id_arg("published_id", "Published id"))
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let repo = FormRepository::open(settings)?;
        let form = repo.resolve_published(required(matches, "published_id")?)?;
        println!("{}\t{}", form.id, form.name);
        Ok(())
    }
}
