mod answer;
mod cli;
mod client;
mod commands;
mod format;
mod metrics;
mod model;
mod ops;
mod store;
mod sync;
mod util;
mod view_state;

use anyhow::Result;
use clap::Parser;
use tracing::error;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Commands};

fn main() {
    init_tracing();

    if let Err(err) = run() {
        error!(error = %client::to_user_message(&err), "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Overview(args) => commands::overview::run(&cli.connection, args),
        Commands::Sync(args) => commands::sync::run(&cli.connection, args),
        Commands::Ask(args) => commands::ask::run(&cli.connection, args),
        Commands::Metrics(args) => commands::metrics::run(&cli.connection, args),
        Commands::Ops(args) => commands::ops::run(&cli.connection, args),
    }
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}
