//! Structured error types for hubble
//!
//! Using thiserror for automatic Display implementation and error chaining.
//! None of these are fatal to the flow store: they describe positions that
//! are not readable, streams that ended, or input that could not be replayed.

use std::path::PathBuf;

use super::types::Seq;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RingError {
    #[error("Ring capacity must be a non-zero power of two, got {0}")]
    InvalidCapacity(usize),

    #[error("Ring capacity {0} exceeds the maximum ring size")]
    CapacityTooLarge(usize),
}

/// Why a ring position could not be read
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// Not yet safely written
    #[error("position not yet written")]
    TooNew,

    /// Already overwritten by newer writes
    #[error("position already overwritten")]
    TooOld,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReaderError {
    #[error("Read cancelled")]
    Cancelled,

    /// The writer lapped this reader; everything before `oldest` is gone.
    #[error("Reader at {cursor} fell behind the ring (oldest readable {oldest})")]
    FellBehind { cursor: Seq, oldest: Seq },
}

#[derive(Error, Debug)]
pub enum ObserverError {
    #[error("Flow stream closed by receiver")]
    StreamClosed,
}

#[derive(Error, Debug)]
pub enum ReplayError {
    #[error("Failed to open flow file {path}")]
    Open {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed flow on line {line}: {source}")]
    Parse {
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("Ingestion writer stopped before replay finished")]
    WriterGone,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ring_error_display() {
        let err = RingError::InvalidCapacity(12);
        assert_eq!(err.to_string(), "Ring capacity must be a non-zero power of two, got 12");
        assert!(RingError::CapacityTooLarge(1 << 40).to_string().contains("1099511627776"));
    }

    #[test]
    fn test_fell_behind_display() {
        let err = ReaderError::FellBehind { cursor: 3, oldest: 40 };
        assert!(err.to_string().contains("at 3"));
        assert!(err.to_string().contains("oldest readable 40"));
    }

    #[test]
    fn test_replay_parse_error_reports_line() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let err = ReplayError::Parse { line: 7, source };
        assert!(err.to_string().starts_with("Malformed flow on line 7"));
    }
}
