//! # formcraft-cli
//!
//! The `formcraft` command-line tool.
//!
//! - [`command`] - The `ManagementCommand` trait and `CommandRegistry` dispatcher
//! - [`commands`] - Built-in commands: `create`, `list`, `show`, `publish`,
//!   `resolve`, `delete`, `validate`, `fill`, `submit`, and `check`
//!
//! ```rust
//! use formcraft_cli::command::CommandRegistry;
//! use formcraft_cli::commands::register_builtin_commands;
//!
//! let mut registry = CommandRegistry::new();
//! register_builtin_commands(&mut registry);
//! assert!(registry.list_commands().contains(&"submit"));
//! ```

// - result_large_err: FormcraftError is the crate-wide error type
// - unused_async: command handlers keep one async signature
#![allow(clippy::result_large_err)]
#![allow(clippy::unused_async)]

pub mod command;
pub mod commands;

pub use command::{load_settings, CommandRegistry, ManagementCommand};
