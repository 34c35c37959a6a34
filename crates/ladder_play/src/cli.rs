//! Command-line interface for ladder_play.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Tic-tac-toe ladder - seven escalating variants against the computer
#[derive(Parser, Debug)]
#[command(name = "ladder_play")]
#[command(about = "Climb seven tic-tac-toe variants in the terminal", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Play the ladder in the terminal
    Play {
        /// Path to the config file (defaults apply when missing)
        #[arg(short, long, default_value = "ladder.toml")]
        config: PathBuf,

        /// Level number to start on (1-7)
        #[arg(short, long)]
        level: Option<u8>,

        /// Seed for the opponent and infection rolls
        #[arg(long)]
        seed: Option<u64>,

        /// Keep counters in memory instead of the counter service
        #[arg(long)]
        offline: bool,
    },

    /// Print the shared win/fail counters
    Records {
        /// Path to the config file (defaults apply when missing)
        #[arg(short, long, default_value = "ladder.toml")]
        config: PathBuf,
    },
}
