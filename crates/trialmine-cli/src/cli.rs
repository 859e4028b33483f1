//! CLI command definitions and argument parsing.

use crate::config::{OutputFormat, Provider};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use trialmine_domain::DocumentType;

/// Trialmine CLI - extract registry fields from clinical-trial documents.
#[derive(Debug, Parser)]
#[command(name = "trialmine")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Output format
    #[arg(short, long, value_enum, global = true)]
    pub format: Option<CliFormat>,

    /// Disable colored output
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Configuration file path
    #[arg(short, long, global = true, env = "TRIALMINE_CONFIG")]
    pub config: Option<String>,

    /// Oracle backend, overriding the configuration
    #[arg(long, value_enum, global = true)]
    pub oracle: Option<ProviderArg>,

    /// Checkpoint directory, overriding the configuration
    #[arg(long, global = true, env = "TRIALMINE_CHECKPOINT_DIR")]
    pub checkpoint_dir: Option<String>,

    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum CliFormat {
    /// Table format (default)
    Table,
    /// JSON format
    Json,
    /// Quiet format
    Quiet,
}

impl From<CliFormat> for OutputFormat {
    fn from(format: CliFormat) -> Self {
        match format {
            CliFormat::Table => OutputFormat::Table,
            CliFormat::Json => OutputFormat::Json,
            CliFormat::Quiet => OutputFormat::Quiet,
        }
    }
}

/// Oracle backend options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum ProviderArg {
    /// OpenAI-compatible API
    Openai,
    /// Local Ollama server
    Ollama,
    /// Offline mock (finds nothing)
    Mock,
}

impl From<ProviderArg> for Provider {
    fn from(provider: ProviderArg) -> Self {
        match provider {
            ProviderArg::Openai => Provider::OpenAi,
            ProviderArg::Ollama => Provider::Ollama,
            ProviderArg::Mock => Provider::Mock,
        }
    }
}

/// Document type options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum DocumentTypeArg {
    /// Study protocol
    #[value(alias = "prot")]
    Protocol,
    /// Statistical analysis plan
    Sap,
    /// Informed consent form
    #[value(alias = "consent")]
    Icf,
}

impl From<DocumentTypeArg> for DocumentType {
    fn from(document_type: DocumentTypeArg) -> Self {
        match document_type {
            DocumentTypeArg::Protocol => DocumentType::Protocol,
            DocumentTypeArg::Sap => DocumentType::Sap,
            DocumentTypeArg::Icf => DocumentType::Icf,
        }
    }
}

/// CLI commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Extract fields from a document
    Extract(ExtractArgs),

    /// Continue an interrupted extraction
    Resume(ResumeArgs),

    /// List stored checkpoints
    List,

    /// Merge a case's documents into one record
    Merge(MergeArgs),

    /// Compare a checkpoint with a registry export
    Compare(CompareArgs),

    /// Delete a checkpoint
    Delete(DeleteArgs),

    /// Show or create the configuration file
    Config(ConfigArgs),
}

/// Arguments for the extract command.
#[derive(Debug, Parser)]
pub struct ExtractArgs {
    /// Plain-text document to extract from
    pub document: PathBuf,

    /// Case identifier (taken from the file name when omitted)
    #[arg(long)]
    pub case_id: Option<String>,

    /// Document type (taken from the file name when omitted)
    #[arg(short = 't', long, value_enum)]
    pub document_type: Option<DocumentTypeArg>,

    /// Registry CSV to compare completed fields against
    #[arg(short, long)]
    pub reference: Option<PathBuf>,
}

/// Arguments for the resume command.
#[derive(Debug, Parser)]
pub struct ResumeArgs {
    /// Case identifier
    pub case_id: String,

    /// Document type
    #[arg(value_enum)]
    pub document_type: DocumentTypeArg,
}

/// Arguments for the merge command.
#[derive(Debug, Parser)]
pub struct MergeArgs {
    /// Case identifier
    pub case_id: String,

    /// Write the merged record as JSON to this file
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the compare command.
#[derive(Debug, Parser)]
pub struct CompareArgs {
    /// Case identifier
    pub case_id: String,

    /// Document type
    #[arg(value_enum)]
    pub document_type: DocumentTypeArg,

    /// Registry CSV holding the case's row
    #[arg(short, long)]
    pub reference: PathBuf,
}

/// Arguments for the delete command.
#[derive(Debug, Parser)]
pub struct DeleteArgs {
    /// Case identifier
    pub case_id: String,

    /// Document type
    #[arg(value_enum)]
    pub document_type: DocumentTypeArg,

    /// Skip confirmation prompt
    #[arg(short, long)]
    pub yes: bool,
}

/// Arguments for the config command.
#[derive(Debug, Parser)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Configuration actions.
#[derive(Debug, Subcommand)]
pub enum ConfigAction {
    /// Print the effective configuration
    Show,

    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}
