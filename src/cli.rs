// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use crate::config::default_config_path;

/// Command-line arguments for `spawner`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "spawner",
    version,
    about = "Run a tree of processes with before/after ordering and captured output.",
    long_about = None
)]
pub struct CliArgs {
    /// Path to the component tree (YAML, or TOML with a `.toml` extension).
    #[arg(long, value_name = "PATH", default_value_os_t = default_config_path())]
    pub config: PathBuf,

    /// Directory that working directories and log files are relative to.
    ///
    /// Default: the directory containing the config file.
    #[arg(long, value_name = "DIR")]
    pub prefix: Option<PathBuf>,

    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SPAWNER_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL")]
    pub log_level: Option<LogLevel>,

    /// Load + validate, print the tree, but don't start any process.
    #[arg(long)]
    pub dry_run: bool,
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
