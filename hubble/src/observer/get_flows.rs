//! # `GetFlows`
//!
//! Historical scan plus optional live follow over one shared ring.
//!
//! ## Bounds
//!
//! - `until`: flows at or after it are skipped during the scan; in follow mode
//!   the first such flow ends the stream.
//! - `since`: the backward scan stops at the first flow at or before it; in
//!   follow mode such flows are skipped.
//!
//! Arrival order is assumed to follow timestamp order. Flows are never
//! re-sorted.
//!
//! ## Slow Readers
//!
//! A follow reader that the writer laps logs a warning, counts the overwritten
//! positions as lost and resumes at the oldest position still held.

use std::sync::Arc;
use std::time::Instant;

use log::{debug, warn};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::{apply, GetFlowsRequest, ServerStatus};
use crate::container::Ring;
use crate::domain::{FlowEvent, ObserverError, ReaderError, Seq, Unavailable};

/// Outcome of the historical phase
#[derive(Debug)]
pub struct HistoricalBatch<T> {
    /// Matching flows in arrival order
    pub flows: Vec<Arc<T>>,
    /// Where a follow reader must start to continue without gaps or repeats
    pub follow_from: Seq,
}

/// Counters for one finished `GetFlows` stream
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlowsSummary {
    pub delivered: u64,
    /// Positions overwritten before a follow reader could read them
    pub lost: u64,
}

/// Query front-end over the shared flow ring
pub struct Observer<T> {
    ring: Arc<Ring<T>>,
    started: Instant,
}

impl<T> Clone for Observer<T> {
    fn clone(&self) -> Self {
        Self { ring: Arc::clone(&self.ring), started: self.started }
    }
}

impl<T: FlowEvent> Observer<T> {
    #[must_use]
    pub fn new(ring: Arc<Ring<T>>) -> Self {
        Self { ring, started: Instant::now() }
    }

    #[must_use]
    pub fn ring(&self) -> &Arc<Ring<T>> {
        &self.ring
    }

    #[must_use]
    pub fn server_status(&self) -> ServerStatus {
        ServerStatus {
            num_flows: self.ring.len() as u64,
            max_flows: self.ring.capacity() as u64,
            seen_flows: self.ring.write_cursor(),
            uptime_ns: u64::try_from(self.started.elapsed().as_nanos()).unwrap_or(u64::MAX),
        }
    }

    /// Historical phase of `request`, safe to run while the writer is active.
    #[must_use]
    pub fn historical(&self, request: &GetFlowsRequest<T>) -> HistoricalBatch<T> {
        Self::scan(request, self.ring.last_write_parallel(), |seq| self.ring.read(seq))
    }

    /// Historical phase for a ring whose writer has stopped (e.g. a finished
    /// replay). Unlike [`Observer::historical`] it includes the most recent
    /// flow.
    #[must_use]
    pub fn historical_settled(&self, request: &GetFlowsRequest<T>) -> HistoricalBatch<T> {
        Self::scan(request, self.ring.last_write(), |seq| self.ring.read_following(seq))
    }

    fn scan(
        request: &GetFlowsRequest<T>,
        start: Seq,
        read: impl Fn(Seq) -> Result<Option<Arc<T>>, Unavailable>,
    ) -> HistoricalBatch<T> {
        let mut flows = Vec::new();
        let mut seq = start;

        while (flows.len() as u64) < request.number {
            // Overwritten, not yet safe, or never written: history ends here
            let Ok(Some(event)) = read(seq) else {
                break;
            };
            seq = seq.wrapping_sub(1);

            let ts = event.timestamp();
            if request.since.is_some_and(|since| ts <= since) {
                break;
            }
            if request.until.is_some_and(|until| ts >= until) {
                continue;
            }
            if apply(&request.allow, &request.deny, &event) {
                flows.push(event);
            }
        }

        flows.reverse();
        debug!("historical scan from {start} collected {} flows", flows.len());
        HistoricalBatch { flows, follow_from: start.wrapping_add(1) }
    }

    /// Run `request`, delivering flows to `tx` in arrival order.
    ///
    /// Returns once the historical batch is delivered (or, when following,
    /// once `cancel` fires or a flow at or after `until` arrives).
    ///
    /// # Errors
    /// [`ObserverError::StreamClosed`] if the receiving side of `tx` is dropped.
    pub async fn get_flows(
        &self,
        request: &GetFlowsRequest<T>,
        tx: &mpsc::Sender<Arc<T>>,
        cancel: &CancellationToken,
    ) -> Result<FlowsSummary, ObserverError> {
        let mut summary = FlowsSummary::default();
        let batch = self.historical(request);

        for flow in batch.flows {
            if !deliver(tx, flow, cancel).await? {
                return Ok(summary);
            }
            summary.delivered += 1;
        }

        if !request.follow {
            return Ok(summary);
        }

        let mut reader = self.ring.reader(batch.follow_from);
        loop {
            let event = match reader.next(cancel).await {
                Ok(Some(event)) => event,
                // Warm-up slot, nothing was ever written there
                Ok(None) => continue,
                Err(ReaderError::Cancelled) => return Ok(summary),
                Err(ReaderError::FellBehind { cursor, oldest }) => {
                    let resume = oldest.wrapping_add(1);
                    let lost = resume.wrapping_sub(cursor);
                    warn!("Follow reader fell behind at {cursor}, skipping {lost} flows");
                    summary.lost += lost;
                    reader.seek(resume);
                    continue;
                }
            };

            let ts = event.timestamp();
            if request.until.is_some_and(|until| ts >= until) {
                return Ok(summary);
            }
            if request.since.is_some_and(|since| ts <= since) {
                continue;
            }
            if !apply(&request.allow, &request.deny, &event) {
                continue;
            }
            if !deliver(tx, event, cancel).await? {
                return Ok(summary);
            }
            summary.delivered += 1;
        }
    }
}

/// Send one flow, giving up if `cancel` fires first. `Ok(false)` means
/// cancelled.
async fn deliver<T>(
    tx: &mpsc::Sender<Arc<T>>,
    flow: Arc<T>,
    cancel: &CancellationToken,
) -> Result<bool, ObserverError> {
    tokio::select! {
        biased;
        () = cancel.cancelled() => Ok(false),
        sent = tx.send(flow) => sent.map(|()| true).map_err(|_| ObserverError::StreamClosed),
    }
}
