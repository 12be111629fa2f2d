//! Command-line interface
//!
//! Argument parsing, output levels, and the entry point that turns parsed
//! arguments into a conversion run.

mod args;
pub mod logging;

pub use args::{Cli, DEFAULT_MODEL};
pub use logging::LogLevel;

use crate::convert::Converter;
use crate::error::Result;

/// Execute a conversion based on the parsed arguments
pub fn run_command(cli: Cli) -> Result<()> {
    let level = LogLevel::from_flags(cli.verbose, cli.quiet);
    let request = cli.resolve();
    Converter::new(request).run(level)?;
    Ok(())
}
