//! Command-line interface.
//!
//! Running `mural` with sources and no subcommand starts the interactive
//! rotator; the subcommands inspect the store without touching the
//! terminal display.

mod commands;

use clap::Parser;
pub use commands::Cli;

use crate::error::MuralError;

/// Parses arguments and executes the selected command.
///
/// # Errors
///
/// Returns the fatal error of whichever command ran.
pub fn run() -> Result<(), MuralError> {
    let cli = Cli::parse();
    cli.execute()
}
