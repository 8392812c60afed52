// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use clap::{Parser, Subcommand};
use rootledger_cli::commands::{inspect, query, timeline, verify};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "rootledger")]
#[command(about = "Offline inspection and verification of rootledger event logs", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the log and summarize every series.
    Inspect {
        log: PathBuf,

        /// Also report on this snapshot file
        #[arg(long)]
        snapshot: Option<PathBuf>,

        /// Print the summary as JSON
        #[arg(long)]
        json: bool,
    },
    /// List committed events in order
    Timeline {
        log: PathBuf,

        /// Only events touching this distribution
        #[arg(long, short)]
        distribution: Option<u64>,
    },
    /// Resolve the latest root, or the root governing a timestamp
    Query {
        log: PathBuf,

        /// Distribution id; the default series when omitted
        #[arg(long, short)]
        distribution: Option<u64>,

        /// Unix timestamp to resolve
        #[arg(long)]
        at: Option<u64>,
    },
    /// Replay the log from genesis and cross-check a snapshot
    Verify {
        log: PathBuf,

        #[arg(long)]
        snapshot: Option<PathBuf>,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Inspect { log, snapshot, json } => inspect::run(&log, snapshot.as_deref(), json),
        Commands::Timeline { log, distribution } => timeline::run(&log, distribution),
        Commands::Query { log, distribution, at } => query::run(&log, distribution, at),
        Commands::Verify { log, snapshot } => verify::run(&log, snapshot.as_deref()),
    }
}
