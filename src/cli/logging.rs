//! Console output levels for the converter

/// Verbosity selected on the command line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    /// Suppress all output
    Quiet,
    /// Progress lines for each conversion stage
    #[default]
    Normal,
    /// Per-shard and per-tensor detail
    Verbose,
}

impl LogLevel {
    /// Resolve the level from the `--verbose` and `--quiet` flags.
    ///
    /// `--quiet` wins when both are given.
    #[must_use]
    pub fn from_flags(verbose: bool, quiet: bool) -> Self {
        if quiet {
            Self::Quiet
        } else if verbose {
            Self::Verbose
        } else {
            Self::Normal
        }
    }
}

/// Log a message if the current level permits it
pub fn log(level: LogLevel, required: LogLevel, msg: &str) {
    if level != LogLevel::Quiet && (level == required || required == LogLevel::Normal) {
        println!("{msg}");
    }
}
