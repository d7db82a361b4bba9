//! # Ingestion Writer
//!
//! The ring tolerates exactly one writer. This module owns that writer: a
//! dedicated thread that drains a bounded channel of decoded flows into
//! [`Ring::write`]. Producers never touch the ring directly.
//!
//! ```text
//! decoder / replay ──try_send/send──► bounded channel ──► hubble-writer ──► Ring
//! ```
//!
//! [`Ingest::offer`] never blocks: when the writer cannot keep up the flow is
//! dropped and counted, so the monitor pipeline is never back-pressured.
//! [`Ingest::sender`] hands out a blocking sender for sources that must not
//! lose flows (file replay).

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{bounded, Sender, TrySendError};
use log::{info, warn};

use crate::container::Ring;

/// Handle to the single writer of a ring
pub struct Ingest<T> {
    tx: Sender<T>,
    dropped: AtomicU64,
    writer: JoinHandle<u64>,
}

impl<T: Send + Sync + 'static> Ingest<T> {
    /// Start the writer thread for `ring` with a queue of `queue_size` flows.
    ///
    /// # Errors
    /// Returns an error if the OS refuses to spawn the thread.
    pub fn spawn(ring: Arc<Ring<T>>, queue_size: usize) -> std::io::Result<Self> {
        let (tx, rx) = bounded::<T>(queue_size);

        let writer = std::thread::Builder::new().name("hubble-writer".to_string()).spawn(move || {
            info!("Flow writer started (capacity {})", ring.capacity());
            let mut written = 0u64;
            for flow in &rx {
                ring.write(flow);
                written += 1;
            }
            info!("Flow writer stopped after {written} flows");
            written
        })?;

        Ok(Self { tx, dropped: AtomicU64::new(0), writer })
    }

    /// Queue a flow without blocking. Returns `false` if it was dropped.
    pub fn offer(&self, flow: T) -> bool {
        match self.tx.try_send(flow) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped.is_power_of_two() {
                    warn!("Flow writer queue full, {dropped} flows dropped so far");
                }
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    /// Blocking sender for lossless sources
    #[must_use]
    pub fn sender(&self) -> Sender<T> {
        self.tx.clone()
    }

    /// Flows dropped by [`Ingest::offer`] so far
    #[must_use]
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Close the queue and wait for the writer to drain it.
    ///
    /// Blocks until every clone returned by [`Ingest::sender`] is dropped too.
    /// Returns the number of flows written, or `None` if the writer panicked.
    #[must_use]
    pub fn finish(self) -> Option<u64> {
        drop(self.tx);
        self.writer.join().ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Timestamp;

    #[test]
    fn test_writer_drains_queue_into_ring() {
        let ring = Arc::new(Ring::new(16).unwrap());
        let ingest = Ingest::spawn(Arc::clone(&ring), 4).unwrap();

        let tx = ingest.sender();
        for i in 0..10 {
            tx.send(Timestamp::from_secs(i)).unwrap();
        }
        drop(tx);

        assert_eq!(ingest.finish(), Some(10));
        assert_eq!(ring.write_cursor(), 10);
        assert_eq!(ring.read(8).unwrap().map(|ts| ts.seconds), Some(8));
    }

    #[test]
    fn test_offer_counts_drops_when_full() {
        let ring = Arc::new(Ring::<Timestamp>::new(16).unwrap());
        // A zero-capacity channel only accepts a send while the writer is
        // parked in recv, so a burst of offers must drop some.
        let ingest = Ingest::spawn(Arc::clone(&ring), 0).unwrap();

        let accepted = (0..1000).filter(|i| ingest.offer(Timestamp::from_secs(*i))).count() as u64;
        let dropped = ingest.dropped();
        assert_eq!(accepted + dropped, 1000);

        let written = ingest.finish().unwrap();
        assert_eq!(written, accepted);
        assert_eq!(ring.write_cursor(), accepted);
    }
}
