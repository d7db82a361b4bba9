//! CLI argument definitions

use clap::{Parser, ValueEnum};
use hubble_common::Timestamp;
use std::path::PathBuf;

use crate::container::MAX_CAPACITY;

/// Upper bound accepted for `--buffer-size`
const MAX_BUFFER_SIZE: u64 = MAX_CAPACITY as u64;

#[derive(Parser, Debug)]
#[allow(clippy::struct_excessive_bools)]
#[command(
    name = "hubble",
    about = "Query network flows replayed from a recorded flow file",
    after_help = "\
EXAMPLES:
    hubble --file flows.json                       Last 20 flows
    hubble --file flows.json --since 1700000000    Flows after a Unix timestamp
    hubble --file flows.json --all -o compact      Every flow, one line each
    hubble --file flows.json -f --replay-delay-ms 50
                                                   Follow a paced replay (Ctrl+C to stop)"
)]
pub struct Args {
    /// Recorded flows to replay (JSON lines)
    #[arg(short = 'i', long, value_name = "FILE")]
    pub file: PathBuf,

    /// Flow ring capacity (rounded up to a power of two, at most 16777216)
    #[arg(
        long,
        default_value_t = 4096,
        value_parser = clap::value_parser!(u64).range(1..=MAX_BUFFER_SIZE)
    )]
    pub buffer_size: u64,

    /// Show the last N flows
    #[arg(short = 'n', long, conflicts_with = "all")]
    pub last: Option<u64>,

    /// Show every flow the ring holds
    #[arg(long)]
    pub all: bool,

    /// Only flows after this time (<seconds>[.<fraction>] since the epoch)
    #[arg(long, value_name = "TIMESTAMP")]
    pub since: Option<Timestamp>,

    /// Only flows before this time (<seconds>[.<fraction>] since the epoch)
    #[arg(long, value_name = "TIMESTAMP")]
    pub until: Option<Timestamp>,

    /// Keep streaming flows as they are replayed
    #[arg(short, long)]
    pub follow: bool,

    /// Pause between replayed flows, in milliseconds
    #[arg(long, default_value = "0")]
    pub replay_delay_ms: u64,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Json)]
    pub output: OutputFormat,

    /// Print flow store status as JSON instead of flows
    #[arg(long, conflicts_with = "follow")]
    pub status: bool,

    /// Suppress non-essential output
    #[arg(short, long)]
    pub quiet: bool,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// One JSON object per line
    #[default]
    Json,
    /// One human-readable line per flow
    Compact,
}
