use std::path::PathBuf;

use formcraft_cli::commands::register_builtin_commands;
use formcraft_cli::{load_settings, CommandRegistry};
use formcraft_core::logging::setup_logging;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let mut registry = CommandRegistry::new();
    register_builtin_commands(&mut registry);

    let matches = registry.build_cli().get_matches();
    let settings = load_settings(matches.get_one::<PathBuf>("settings").map(PathBuf::as_path))?;
    setup_logging(&settings);

    registry.execute(&matches, &settings).await?;
    Ok(())
}
