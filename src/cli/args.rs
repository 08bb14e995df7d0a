//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    completions::CompletionsArgs, config::ConfigCommands, register::RegisterArgs,
    report::ReportArgs, reset::ResetArgs, results::ResultsArgs, schema::SchemaCommands,
    share::ShareArgs,
};

#[derive(Parser)]
#[command(name = "ipo-intake")]
#[command(author, version, about = "IPO prediction intake wizard")]
#[command(long_about = "Collects company registration, IPO and risk data step by step, submits it to a prediction service and shows the results, falling back to an offline view when the service is unavailable.")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// Enable verbose output
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Outcome file (default: platform data directory)
    #[arg(long, global = true)]
    pub store: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the registration wizard and submit for prediction
    Register(RegisterArgs),

    /// Show the results of the latest submission
    Results(ResultsArgs),

    /// Export the plain-text prediction report
    Report(ReportArgs),

    /// Print the share summary of the latest results
    Share(ShareArgs),

    /// Clear the stored submission outcome
    Reset(ResetArgs),

    /// Inspect wizard steps and their fields
    #[command(subcommand)]
    Schema(SchemaCommands),

    /// View and modify configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completions
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable text on a terminal
    #[default]
    Auto,
    /// Plain human-readable text
    Text,
    /// JSON format (for programming)
    Json,
    /// YAML format
    Yaml,
}
