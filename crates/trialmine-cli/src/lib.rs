//! Trialmine CLI library
//!
//! Command-line front end over the extraction service: extract fields from
//! trial documents, resume interrupted runs, merge a case's documents into
//! one record and score extractions against a registry export.

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod oracle;
pub mod output;

pub use cli::{Cli, Command};
pub use config::Config;
pub use error::{CliError, Result};
pub use oracle::Oracle;
pub use output::Formatter;

use tracing::info;
use trialmine_extractor::{ExtractionService, PlainTextExtractor};
use trialmine_llm::MockOracle;
use trialmine_store::CheckpointManager;

/// Service the commands run against.
pub type Service = ExtractionService<Oracle, CheckpointManager, PlainTextExtractor>;

/// Build the service from a loaded configuration.
///
/// Oracle credentials and the extractor settings are checked here, so a
/// misconfigured run stops before any checkpoint is opened.
pub fn connect(config: &Config) -> Result<Service> {
    config.validate()?;
    let oracle = Oracle::from_settings(&config.oracle)?;
    info!("Using {} oracle ({})", oracle.name(), config.oracle.model);
    open(config, oracle)
}

/// Build a service for commands that only read or remove checkpoints.
///
/// No oracle is contacted, so no credentials are needed.
pub fn connect_offline(config: &Config) -> Result<Service> {
    config.validate()?;
    open(config, Oracle::Mock(MockOracle::default()))
}

fn open(config: &Config, oracle: Oracle) -> Result<Service> {
    let service = ExtractionService::with_checkpoint_dir(
        oracle,
        config.checkpoint_path(),
        config.extractor.clone(),
    )?;
    Ok(service)
}
