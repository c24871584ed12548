// src/cli.rs

//! CLI argument parsing using `clap`.

use clap::{Parser, ValueEnum};

/// Command-line arguments for `hmr`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "hmr",
    version,
    about = "Watch source files and evict stale units from a module cache.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the config file (TOML).
    ///
    /// Default: `Hmr.toml` in the current working directory. The default file
    /// may be absent if watch paths are given on the command line.
    #[arg(long, value_name = "PATH")]
    pub config: Option<String>,

    /// Unit that must never be treated as a dependent (repeatable).
    ///
    /// Relative paths are resolved against the current directory.
    #[arg(long, value_name = "UNIT")]
    pub exclude: Vec<String>,

    /// Load evicted units again after each change.
    #[arg(long)]
    pub reload: bool,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `HMR_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Parse + validate, print what each unit's change would evict, but don't
    /// watch anything.
    #[arg(long)]
    pub dry_run: bool,

    /// Extra files, directories or globs to watch, relative to the current
    /// directory.
    #[arg(value_name = "PATH")]
    pub paths: Vec<String>,
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
