use anyhow::Result;
use clap::Parser;
use gridscore_cli::{Cli, Commands};
use tracing_subscriber::FmtSubscriber;

mod commands;

fn main() -> Result<()> {
    let cli = Cli::parse();

    // stdout carries the report
    let subscriber = FmtSubscriber::builder()
        .with_max_level(cli.log_level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    match cli.command {
        Commands::Evaluate {
            inputs,
            config,
            out,
            format,
        } => commands::evaluate::handle(&inputs, config.as_deref(), out.as_deref(), format),
        Commands::Check { inputs } => commands::check::handle(&inputs),
    }
}
