//! Ladder host - pacing, shared counters and a terminal front end
//!
//! Wraps the pure [`ladder_engine`] with everything that touches the
//! outside world: configuration, the counter service, real-time delays
//! and stdin/stdout.
//!
//! # Architecture
//!
//! - **Config**: TOML file plus environment override ([`LadderConfig`])
//! - **Records**: counter store trait with HTTP and in-memory backends
//! - **Driver**: thinking delays and record forwarding around a [`Ladder`](ladder_engine::Ladder)
//! - **Terminal**: line-oriented loop racing input against the opponent timer

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod driver;
mod records;
mod terminal;

// Crate-level exports - Configuration
pub use config::{ConfigError, LadderConfig, Pacing, RECORDS_URL_ENV};

// Crate-level exports - Counter persistence
pub use records::{
    HttpRecordStore, IncrementRequest, MemoryRecordStore, RecordStore, Records, RecordsError,
    Scoreboard,
};

// Crate-level exports - Real-time driver
pub use driver::Driver;

// Crate-level exports - Terminal front end
pub use terminal::{Command, InputError, describe, explain, parse_command, render, run};
