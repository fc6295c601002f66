//! The `validate` command.

use async_trait::async_trait;
use formcraft_core::{FieldErrors, FormcraftError, FormcraftResult, Settings};
use formcraft_forms::validate_form;
use formcraft_registry::FormRepository;

use super::{id_arg, parse_data, required};
use crate::command::ManagementCommand;

/// Validates a value map against a form without storing or sending it.
///
/// Prints one `field: message` line per invalid field and fails if there
/// are any.
pub struct ValidateCommand;

pub(crate) fn print_field_errors(errors: &FieldErrors) {
    for (field, error) in errors.iter() {
        println!("{field}: {error}");
    }
}

#[async_trait]
impl ManagementCommand for ValidateCommand {
    fn name(&self) -> &'static str {
        "validate"
    }

    fn help(&self) -> &'static str {
        "Validate values against a form"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(id_arg("id", "Form id")).arg(
            clap::Arg::new("data")
                .long("data")
                .short('d')
                .required(true)
                .value_name("JSON")
                .help("Values keyed by field id, inline or as @file"),
        )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let repo = FormRepository::open(settings)?;
        let form = repo.get(required(matches, "id")?)?;
        let data = parse_data(required(matches, "data")?)?;

        let errors = validate_form(form, &data);
        if errors.is_empty() {
            println!("OK");
            return Ok(());
        }
        print_field_errors(&errors);
        Err(FormcraftError::Validation(errors))
    }
}
