//! Ladder Play - terminal tic-tac-toe ladder
//!
//! Loads configuration, connects the counter store and runs the game loop
//! on stdin/stdout.

#![warn(missing_docs)]

mod cli;

use anyhow::{Context, Result};
use clap::Parser;
use cli::{Cli, Command};
use ladder_engine::Ladder;
use ladder_play::{Driver, HttpRecordStore, LadderConfig, MemoryRecordStore, Records};
use rand::SeedableRng;
use rand::rngs::StdRng;
use std::path::PathBuf;
use tracing::{info, instrument};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Command::Play {
            config,
            level,
            seed,
            offline,
        } => run_play(config, level, seed, offline).await,
        Command::Records { config } => run_records(config).await,
    }
}

/// Builds the counter cache for `config`.
fn open_records(config: &LadderConfig) -> Result<Records> {
    match config.records_url() {
        Some(url) => {
            let store = HttpRecordStore::new(url).context("Failed to set up counter service")?;
            Ok(Records::new(store))
        }
        None => {
            info!("No counter service configured, counting in memory");
            Ok(Records::new(MemoryRecordStore::new()))
        }
    }
}

/// Run the interactive ladder
#[instrument(skip_all, fields(config_path = %config_path.display()))]
async fn run_play(
    config_path: PathBuf,
    level: Option<u8>,
    seed: Option<u64>,
    offline: bool,
) -> Result<()> {
    let mut config = LadderConfig::load(&config_path)?;
    if let Some(level) = level {
        config = config.with_start_level(level);
    }
    if let Some(seed) = seed {
        config = config.with_seed(seed);
    }
    if offline {
        config = config.offline();
    }

    let start = config.level()?;
    let rng = match config.seed() {
        Some(seed) => StdRng::seed_from_u64(*seed),
        None => StdRng::from_entropy(),
    };
    let mut records = open_records(&config)?;
    records.refresh().await;

    info!(level = %start, "Starting ladder");
    let mut driver = Driver::new(Ladder::starting_at(start), records, config.pacing(), rng);

    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    let mut stdout = tokio::io::stdout();
    ladder_play::run(&mut driver, stdin, &mut stdout).await
}

/// Print the counters and exit
#[instrument(skip_all, fields(config_path = %config_path.display()))]
async fn run_records(config_path: PathBuf) -> Result<()> {
    let config = LadderConfig::load(&config_path)?;
    let mut records = open_records(&config)?;
    let table = records.refresh().await.table();
    if !records.is_available() {
        anyhow::bail!("Counter service unreachable");
    }
    println!("{}", table);
    Ok(())
}
