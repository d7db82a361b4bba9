//! Command-line interface: argument parsing, defaults resolution and output

pub mod args;
pub mod output;

pub use args::{Args, OutputFormat};
pub use output::FlowPrinter;

use std::path::PathBuf;
use std::time::Duration;

use hubble_common::{Flow, Timestamp};

use crate::container::MAX_CAPACITY;
use crate::observer::GetFlowsRequest;

/// Flows shown when neither a count, a time bound nor `--all` is given
pub const DEFAULT_LAST: u64 = 20;

/// Default ring capacity
pub const DEFAULT_BUFFER_SIZE: usize = 4096;

/// Fully resolved settings for one `hubble` run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObserveConfig {
    pub file: PathBuf,
    /// Ring capacity, already a power of two
    pub buffer_size: usize,
    /// Historical flow limit; `u64::MAX` means everything the ring holds
    pub number: u64,
    pub since: Option<Timestamp>,
    pub until: Option<Timestamp>,
    pub follow: bool,
    pub replay_delay: Duration,
    pub output: OutputFormat,
    pub status: bool,
    pub quiet: bool,
}

impl Default for ObserveConfig {
    fn default() -> Self {
        Self {
            file: PathBuf::new(),
            buffer_size: DEFAULT_BUFFER_SIZE,
            number: DEFAULT_LAST,
            since: None,
            until: None,
            follow: false,
            replay_delay: Duration::ZERO,
            output: OutputFormat::Json,
            status: false,
            quiet: false,
        }
    }
}

impl From<Args> for ObserveConfig {
    fn from(args: Args) -> Self {
        // An explicit count wins; a time window or --all means "no limit";
        // following alone shows only new flows.
        let number = match args.last {
            Some(n) => n,
            None if args.all || args.since.is_some() || args.until.is_some() => u64::MAX,
            None if args.follow => 0,
            None => DEFAULT_LAST,
        };

        Self {
            file: args.file,
            buffer_size: usize::try_from(args.buffer_size)
                .unwrap_or(MAX_CAPACITY)
                .clamp(1, MAX_CAPACITY)
                .next_power_of_two(),
            number,
            since: args.since,
            until: args.until,
            follow: args.follow,
            replay_delay: Duration::from_millis(args.replay_delay_ms),
            output: args.output,
            status: args.status,
            quiet: args.quiet,
        }
    }
}

impl ObserveConfig {
    /// Query matching these settings
    #[must_use]
    pub fn request(&self) -> GetFlowsRequest<Flow> {
        let mut request = GetFlowsRequest::last(self.number).follow(self.follow);
        request.since = self.since;
        request.until = self.until;
        request
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config(argv: &[&str]) -> ObserveConfig {
        let mut full = vec!["hubble", "--file", "flows.json"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap().into()
    }

    #[test]
    fn test_defaults_to_last_20() {
        let cfg = config(&[]);
        assert_eq!(cfg.number, DEFAULT_LAST);
        assert_eq!(cfg.buffer_size, DEFAULT_BUFFER_SIZE);
        assert!(!cfg.follow);
        assert_eq!(cfg.output, OutputFormat::Json);
    }

    #[test]
    fn test_time_window_lifts_limit() {
        let cfg = config(&["--since", "2", "--until", "7.5"]);
        assert_eq!(cfg.number, u64::MAX);
        assert_eq!(cfg.since, Some(Timestamp::from_secs(2)));
        assert_eq!(cfg.until, Some(Timestamp::new(7, 500_000_000)));
    }

    #[test]
    fn test_explicit_last_wins() {
        assert_eq!(config(&["--last", "5", "--since", "2"]).number, 5);
        assert_eq!(config(&["--all"]).number, u64::MAX);
        assert_eq!(config(&["-f"]).number, 0);
        assert_eq!(config(&["-f", "-n", "3"]).number, 3);
    }

    #[test]
    fn test_buffer_size_rounds_up() {
        assert_eq!(config(&["--buffer-size", "1000"]).buffer_size, 1024);
        assert_eq!(config(&["--buffer-size", "1"]).buffer_size, 1);
        assert_eq!(config(&["--buffer-size", "16777216"]).buffer_size, MAX_CAPACITY);
    }

    #[test]
    fn test_buffer_size_out_of_range() {
        for size in ["0", "16777217", "1099511627776", "18446744073709551615"] {
            let parsed = Args::try_parse_from(["hubble", "--file", "f", "--buffer-size", size]);
            assert!(parsed.is_err(), "--buffer-size {size} was accepted");
        }
    }

    #[test]
    fn test_conflicting_flags() {
        assert!(Args::try_parse_from(["hubble", "--file", "f", "--all", "--last", "3"]).is_err());
        assert!(Args::try_parse_from(["hubble", "--file", "f", "--status", "-f"]).is_err());
        assert!(Args::try_parse_from(["hubble", "--file", "f", "--since", "soon"]).is_err());
        assert!(Args::try_parse_from(["hubble"]).is_err());
    }

    #[test]
    fn test_request_from_config() {
        let cfg = config(&["-n", "4", "--until", "9", "-f"]);
        let request = cfg.request();
        assert_eq!(request.number, 4);
        assert_eq!(request.until, Some(Timestamp::from_secs(9)));
        assert!(request.follow);
        assert!(request.allow.is_empty() && request.deny.is_empty());
    }
}
