//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's derive macros.
//! It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// Caseflow -- phased declarative test-scenario runner.
///
/// Use `caseflow <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "caseflow", version, about, long_about = None)]
pub struct Cli {
    /// Path to the caseflow.toml configuration file.
    #[arg(short, long, default_value = "caseflow.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON.
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a suite sweep (or a single case file).
    Run(RunArgs),

    /// List discovered cases without running them.
    List(ListArgs),

    /// Validate case files without running them.
    Validate(ValidateArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- run ----

/// Run a suite sweep, or a single case when given a case file path.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Suite root directory, or a path to one case.toml file
    /// (defaults to suite.root_dir from configuration).
    pub path: Option<PathBuf>,

    /// Override the number of concurrent workers.
    #[arg(long)]
    pub workers: Option<usize>,

    /// Include cases marked manual in the sweep.
    #[arg(long)]
    pub include_manual: bool,

    /// Only run cases whose name contains this substring.
    #[arg(long)]
    pub filter: Option<String>,
}

// ---- list ----

/// List discovered cases with priority and manual markers.
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Suite root directory (defaults to suite.root_dir from configuration).
    pub path: Option<PathBuf>,
}

// ---- validate ----

/// Parse and validate every case file under a directory.
#[derive(Args, Debug)]
pub struct ValidateArgs {
    /// Suite root directory, or a path to one case.toml file
    /// (defaults to suite.root_dir from configuration).
    pub path: Option<PathBuf>,
}

// ---- config ----

/// Manage caseflow configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, suite, report).
        #[arg(long)]
        section: Option<String>,
    },
}
