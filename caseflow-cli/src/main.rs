//! caseflow CLI entry point -- argument parsing, config loading, dispatch

mod cli;
mod commands;
mod error;
mod logging;
mod output;

use std::path::Path;

use clap::Parser;

use caseflow_core::config::CaseflowConfig;
use caseflow_core::error::{CaseflowError, ConfigError};

use crate::cli::{Cli, Commands};
use crate::error::CliError;
use crate::output::OutputWriter;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    if let Err(e) = run(cli).await {
        eprintln!("error: {e}");
        std::process::exit(e.exit_code());
    }
}

async fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = load_config(&cli.config).await?;
    if let Some(level) = &cli.log_level {
        config.general.log_level = level.clone();
    }
    logging::init_tracing(&config.general).map_err(|e| CliError::Config(e.to_string()))?;

    tracing::debug!(config = %cli.config.display(), "caseflow starting");

    let writer = OutputWriter::new(cli.output);
    match cli.command {
        Commands::Run(args) => commands::run::execute(args, config, &writer).await,
        Commands::List(args) => commands::list::execute(args, config, &writer).await,
        Commands::Validate(args) => commands::validate::execute(args, config, &writer).await,
        Commands::Config(args) => commands::config::execute(args, &cli.config, &writer).await,
    }
}

/// Load the configuration file, falling back to defaults when it is absent.
///
/// A missing file is not an error for day-to-day use (defaults plus
/// `CASEFLOW_*` environment overrides apply); `caseflow config validate`
/// reports it explicitly.
async fn load_config(path: &Path) -> Result<CaseflowConfig, CliError> {
    match CaseflowConfig::load(path).await {
        Ok(config) => Ok(config),
        Err(CaseflowError::Config(ConfigError::FileNotFound { .. })) => {
            let mut config = CaseflowConfig::default();
            config.apply_env_overrides();
            config
                .validate()
                .map_err(|e| CliError::Config(e.to_string()))?;
            Ok(config)
        }
        Err(e) => Err(CliError::Config(e.to_string())),
    }
}
