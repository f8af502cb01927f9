//! mltuning - Main Entry Point

use clap::Parser;
use mltuning::cli::{cmd_evaluate, cmd_search, cmd_space, Cli, Commands};

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mltuning=info".into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Space { bench } => cmd_space(&bench)?,
        Commands::Evaluate {
            bench,
            params,
            report,
        } => cmd_evaluate(&bench, &params, report)?,
        Commands::Search {
            bench,
            trials,
            search_seed,
        } => cmd_search(&bench, trials, search_seed)?,
    }

    Ok(())
}
