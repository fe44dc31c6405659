// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! stash - private-data log writer and read replica

mod commands;
mod config;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand};
use commands::{follow, put, replay, scan};
use config::{Config, DEFAULT_CONFIG};
use output::OutputFormat;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "stash",
    version,
    about = "stash replicates private user data from an operation log"
)]
struct Cli {
    /// Config file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG)]
    config: PathBuf,

    /// Operation log file (overrides config)
    #[arg(long, global = true)]
    log: Option<PathBuf>,

    /// Snapshot file (overrides config)
    #[arg(long, global = true)]
    snapshot: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Submit an operation to the log
    Put(put::PutArgs),
    /// List operations of a stream
    Scan(scan::ScanArgs),
    /// Apply the whole log to the snapshot and print the projected tables
    Replay,
    /// Replicate continuously until Ctrl-C
    Follow,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)?.with_overrides(cli.log, cli.snapshot);
    setup_logging(&config);

    match cli.command {
        Commands::Put(args) => put::handle(args, &config, cli.output).await,
        Commands::Scan(args) => scan::handle(args, &config, cli.output).await,
        Commands::Replay => replay::handle(&config, cli.output).await,
        Commands::Follow => follow::handle(&config).await,
    }
}

fn setup_logging(config: &Config) {
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.log_filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}
