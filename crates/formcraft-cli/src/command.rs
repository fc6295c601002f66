//! Command framework for the `formcraft` tool.
//!
//! [`ManagementCommand`] defines one subcommand; [`CommandRegistry`]
//! collects them, builds the `clap` tree, and dispatches.
//!
//! ## Defining a Command
//!
//! ```rust,no_run
//! use async_trait::async_trait;
//! use formcraft_cli::command::ManagementCommand;
//! use formcraft_core::{FormcraftResult, Settings};
//!
//! struct CountCommand;
//!
//! #[async_trait]
//! impl ManagementCommand for CountCommand {
//!     fn name(&self) -> &'static str { "count" }
//!     fn help(&self) -> &'static str { "Print the number of stored forms" }
//!
//!     async fn handle(&self, _matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
//!         let repo = formcraft_registry::FormRepository::open(settings)?;
//!         println!("{}", repo.list().len());
//!         Ok(())
//!     }
//! }
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use formcraft_core::{settings_loader, FormcraftError, FormcraftResult, Settings};

/// Settings file read when `--settings` is not given, if it exists.
pub const DEFAULT_SETTINGS_FILE: &str = "formcraft.toml";

/// A subcommand of the `formcraft` tool.
#[async_trait]
pub trait ManagementCommand: Send + Sync {
    /// The subcommand name.
    fn name(&self) -> &'static str;

    /// One-line help text.
    fn help(&self) -> &'static str;

    /// Adds arguments to the subcommand. The default adds none.
    fn add_arguments(&self, cmd: clap::Command) -> clap::Command {
        cmd
    }

    /// Runs the command.
    async fn handle(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()>;
}

/// The registered subcommands.
#[derive(Default)]
pub struct CommandRegistry {
    commands: HashMap<&'static str, Box<dyn ManagementCommand>>,
}

impl CommandRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a command, replacing any command of the same name.
    pub fn register(&mut self, command: Box<dyn ManagementCommand>) {
        self.commands.insert(command.name(), command);
    }

    /// Returns the command with the given name.
    pub fn get(&self, name: &str) -> Option<&dyn ManagementCommand> {
        self.commands.get(name).map(AsRef::as_ref)
    }

    /// Sorted command names.
    pub fn list_commands(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.commands.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// Number of registered commands.
    pub fn len(&self) -> usize {
        self.commands.len()
    }

    /// Returns `true` if nothing is registered.
    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Builds the top-level `clap` command with every registered subcommand
    /// and the global `--settings` option.
    pub fn build_cli(&self) -> clap::Command {
        let mut app = clap::Command::new("formcraft")
            .about("Build, fill, and submit dynamic forms")
            .version(env!("CARGO_PKG_VERSION"))
            .subcommand_required(true)
            .arg(
                clap::Arg::new("settings")
                    .long("settings")
                    .global(true)
                    .value_name("FILE")
                    .value_parser(clap::value_parser!(PathBuf))
                    .help("Settings file (TOML, or JSON by extension)"),
            );

        let mut entries: Vec<_> = self.commands.values().collect();
        entries.sort_by_key(|cmd| cmd.name());
        for cmd in entries {
            let subcmd = clap::Command::new(cmd.name()).about(cmd.help());
            app = app.subcommand(cmd.add_arguments(subcmd));
        }
        app
    }

    /// Dispatches to the subcommand named in `matches`.
    pub async fn execute(&self, matches: &clap::ArgMatches, settings: &Settings) -> FormcraftResult<()> {
        let (name, sub_matches) = matches
            .subcommand()
            .ok_or_else(|| FormcraftError::Configuration("No subcommand specified".to_string()))?;

        let cmd = self
            .get(name)
            .ok_or_else(|| FormcraftError::Configuration(format!("Unknown command: {name}")))?;

        tracing::debug!(command = name, "Running command");
        cmd.handle(sub_matches, settings).await
    }
}

/// Loads the settings named by `--settings`, else [`DEFAULT_SETTINGS_FILE`]
/// if present, else defaults. Environment overrides apply in every case.
pub fn load_settings(explicit: Option<&Path>) -> FormcraftResult<Settings> {
    match explicit {
        Some(path) => settings_loader::from_file_with_env(path),
        None if Path::new(DEFAULT_SETTINGS_FILE).exists() => {
            settings_loader::from_file_with_env(DEFAULT_SETTINGS_FILE)
        }
        None => Ok(settings_loader::from_env()),
    }
}
