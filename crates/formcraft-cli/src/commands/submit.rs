//! The `submit` command.

use std::sync::Arc;

use async_trait::async_trait;
use formcraft_core::{FormcraftError, FormcraftResult, Settings};
use formcraft_registry::FormRepository;
use formcraft_submit::{HttpTransport, SubmissionAssembler};

use super::validate::print_field_errors;
use super::{id_arg, open_values, parse_data, required};
use crate::command::ManagementCommand;

/// Submits the stored values of a published form to its endpoint.
///
/// `--data` values are stored first, as if typed in. Stored values are
/// cleared after a successful submission and kept otherwise.
pub struct SubmitCommand;

#[async_trait]
impl ManagementCommand for SubmitCommand {
    fn name(&self) -> &'static str {
        "submit"
    }

    fn help(&self) -> &'static str {
        "Submit a published form"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(id_arg("published_id", "Published id")).arg(
            clap::Arg::new("data")
                .long("data")
                .short('d')
                .value_name("JSON")
                .help("Values keyed by field id, inline or as @file"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let repo = FormRepository::open(settings)?;
        let form = repo.resolve_published(required(matches, "published_id")?)?.clone();

        let mut values = open_values(form, settings);
        values.load();
        if let Some(raw) = matches.get_one::<String>("data") {
            values.save(parse_data(raw)?);
        }

        let transport = Arc::new(HttpTransport::from_settings(settings)?);
        let assembler = SubmissionAssembler::from_settings(transport, settings);
        match assembler.submit(&mut values).await {
            Ok(outcome) => {
                println!(
                    "Submitted {} (version {})",
                    outcome.payload.form_name, outcome.payload.version
                );
                Ok(())
            }
            Err(FormcraftError::Validation(errors)) => {
                print_field_errors(&errors);
                Err(FormcraftError::Validation(errors))
            }
            Err(e) => Err(e),
        }
    }
}
