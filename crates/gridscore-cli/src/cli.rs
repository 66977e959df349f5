use clap::{Parser, Subcommand, ValueEnum, ValueHint};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "gridscore", author, version, about, long_about = None)]
pub struct Cli {
    /// Set the logging level
    #[arg(long, global = true, default_value = "info")]
    pub log_level: tracing::Level,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Score a solution: violations, objective and feasibility
    Evaluate {
        #[command(flatten)]
        inputs: InputArgs,
        /// Evaluation settings (TOML); defaults apply when omitted
        #[arg(long, value_hint = ValueHint::FilePath)]
        config: Option<PathBuf>,
        /// Write the full report as pretty JSON
        #[arg(short, long, value_hint = ValueHint::FilePath)]
        out: Option<PathBuf>,
        /// Format of the report printed to stdout
        #[arg(long, value_enum, default_value_t = OutputFormat::Table)]
        format: OutputFormat,
    },
    /// Check that a solution matches its problem without scoring it
    Check {
        #[command(flatten)]
        inputs: InputArgs,
    },
}

#[derive(clap::Args, Debug)]
pub struct InputArgs {
    /// Problem JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub problem: PathBuf,
    /// Solution JSON
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub solution: PathBuf,
}

#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// Objective, feasibility and every positive violation
    Table,
    /// The flat summary
    Json,
}
