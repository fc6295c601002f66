//! The `fill` command.

use async_trait::async_trait;
use formcraft_core::{FormcraftError, FormcraftResult, Settings};
use formcraft_forms::{validate_field, Field, FieldType, FieldValue};
use formcraft_registry::FormRepository;

use super::{id_arg, open_values, required};
use crate::command::ManagementCommand;

/// Stores one field value for a form, the way typing into the rendered
/// field would. The value is kept according to the form's persistence mode
/// and reported if it does not validate.
pub struct FillCommand;

/// Converts command-line text into a value of the field's shape.
///
/// Multi-select values are comma separated. Numbers that do not parse are
/// kept as text so validation can report them.
pub fn parse_value(field: &Field, raw: &str) -> FieldValue {
    if raw.trim().is_empty() {
        return FieldValue::empty_for(field.field_type);
    }
    match field.field_type {
        FieldType::Number => raw
            .trim()
            .parse::<f64>()
            .map_or_else(|_| FieldValue::from(raw), FieldValue::Number),
        FieldType::MultiSelect => raw
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect::<Vec<_>>()
            .into(),
        _ => FieldValue::from(raw),
    }
}

#[async_trait]
impl ManagementCommand for FillCommand {
    fn name(&self) -> &'static str {
        "fill"
    }

    fn help(&self) -> &'static str {
        "Store a field value for a form"
    }

    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd.arg(id_arg("id", "Form id"))
            .arg(
                clap::Arg::new("field")
                    .long("field")
                    .required(true)
                    .value_name("FIELD_ID"),
            )
            .arg(
                clap::Arg::new("value")
                    .long("value")
                    .required(true)
                    .allow_hyphen_values(true)
                    .value_name("VALUE"),
            )
    }

    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let repo = FormRepository::open(settings)?;
        let form = repo.get(required(matches, "id")?)?.clone();
        let field_id = required(matches, "field")?;
        let field = form
            .field(field_id)
            .ok_or_else(|| FormcraftError::NotFound(format!("Field '{field_id}'")))?;

        let value = parse_value(field, required(matches, "value")?);
        if let Some(error) = validate_field(field, &value) {
            println!("{field_id}: {error}");
        }

        let mut values = open_values(form.clone(), settings);
        values.set_value(field_id, value);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_value_by_type() {
        let number = Field::new("n", "n", FieldType::Number);
        assert_eq!(parse_value(&number, " 42 "), FieldValue::Number(42.0));
        assert_eq!(parse_value(&number, "abc"), FieldValue::from("abc"));
        assert_eq!(parse_value(&number, ""), FieldValue::Empty);

        let multi = Field::new("m", "m", FieldType::MultiSelect);
        assert_eq!(parse_value(&multi, "a, b,,c"), FieldValue::from(vec!["a", "b", "c"]));
        assert_eq!(parse_value(&multi, " "), FieldValue::List(Vec::new()));

        let text = Field::new("t", "t", FieldType::Text);
        assert_eq!(parse_value(&text, "hello"), FieldValue::from("hello"));
    }
}
