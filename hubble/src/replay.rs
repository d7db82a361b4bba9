//! # Flow Replay
//!
//! Populates a ring from a recorded flow file instead of a live monitor
//! socket. The format is JSON lines: one [`Flow`] object per line, blank
//! lines ignored.
//!
//! ```text
//! {"time":{"seconds":1700000000,"nanos":0},"verdict":"FORWARDED",...}
//! {"time":{"seconds":1700000001,"nanos":0},"verdict":"DROPPED",...}
//! ```

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use std::time::Duration;

use crossbeam_channel::Sender;
use hubble_common::Flow;
use log::info;

use crate::domain::ReplayError;

/// Parse flows from a JSON-lines source.
///
/// Parse errors carry the 1-based line number.
pub fn read_flows<R: BufRead>(reader: R) -> impl Iterator<Item = Result<Flow, ReplayError>> {
    reader.lines().enumerate().filter_map(|(idx, line)| {
        let line = match line {
            Ok(line) => line,
            Err(e) => return Some(Err(ReplayError::Io(e))),
        };
        if line.trim().is_empty() {
            return None;
        }
        let parsed = serde_json::from_str(&line);
        Some(parsed.map_err(|source| ReplayError::Parse { line: idx + 1, source }))
    })
}

/// Stream every flow in `path` into the writer queue, pausing `delay` between
/// flows. Returns the number of flows sent.
///
/// # Errors
/// Fails on the first unreadable or malformed line, or if the writer is gone.
pub fn replay_file(path: &Path, tx: &Sender<Flow>, delay: Duration) -> Result<u64, ReplayError> {
    let file = File::open(path)
        .map_err(|source| ReplayError::Open { path: path.to_path_buf(), source })?;

    let mut sent = 0u64;
    for flow in read_flows(BufReader::new(file)) {
        tx.send(flow?).map_err(|_| ReplayError::WriterGone)?;
        sent += 1;
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }

    info!("Replayed {sent} flows from {}", path.display());
    Ok(sent)
}
