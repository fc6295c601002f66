//! The `list` command.

use async_trait::async_trait;
use formcraft_core::{FormcraftResult, Settings};
use formcraft_registry::FormRepository;

use crate::command::ManagementCommand;

/// Prints one line per stored form: id, version, published id, and name.
pub struct ListCommand;

#[async_trait]
impl ManagementCommand for ListCommand {
    fn name(&self) -> &'static str {
        "list"
    }

    fn help(&self) -> &'static str {
        "List stored forms"
    }

    async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let repo = FormRepository::open(settings)?;
        if repo.list().is_empty() {
            tracing::info!("No forms");
            return Ok(());
        }
        for form in repo.list() {
            println!(
                "{}\tv{}\t{}\t{}",
                form.id,
                form.version,
                repo.published_id(&form.id).unwrap_or("-"),
                form.name
            );
        }
        Ok(())
    }
}
