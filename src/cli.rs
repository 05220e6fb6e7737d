// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `runlet`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "runlet",
    version,
    about = "Run an external command with lifecycle tracking, timeout escalation, and progress reporting.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Runlet.toml` in the current working directory; built-in
    /// defaults apply when the file does not exist.
    #[arg(long, value_name = "PATH", default_value = "Runlet.toml")]
    pub config: String,

    /// Timeout for this invocation, in milliseconds (overrides the config).
    /// 0 disables the timeout.
    #[arg(long, value_name = "MS")]
    pub timeout_ms: Option<u64>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `RUNLET_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Print the effective configuration and exit without running anything.
    #[arg(long)]
    pub show_config: bool,

    /// The command to run: executable followed by its arguments. Passed as an
    /// argument vector, never through a shell.
    #[arg(
        trailing_var_arg = true,
        allow_hyphen_values = true,
        value_name = "COMMAND"
    )]
    pub command: Vec<String>,
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
