//! # Ring Reader
//!
//! A cursor over a shared [`Ring`]. Each query or stream owns one; many may
//! exist per ring and none of them mutates it.
//!
//! ## Iteration
//!
//! - [`RingReader::previous`] walks backward and never blocks: the position is
//!   either still there or already overwritten.
//! - [`RingReader::next`] walks forward. When the cursor has caught up with the
//!   writer it waits for the next write, racing the wait against the caller's
//!   [`CancellationToken`].
//!
//! Successive successful `next` calls return strictly consecutive sequence
//! numbers: no gaps, no duplicates.

use std::sync::Arc;

use tokio_util::sync::CancellationToken;

use super::Ring;
use crate::domain::{ReaderError, Seq, Unavailable};

/// Independent read cursor over a shared ring
#[derive(Debug)]
pub struct RingReader<T> {
    ring: Arc<Ring<T>>,
    cursor: Seq,
}

impl<T> RingReader<T> {
    #[must_use]
    pub fn new(ring: Arc<Ring<T>>, start: Seq) -> Self {
        Self { ring, cursor: start }
    }

    /// Next sequence this reader will read
    #[must_use]
    pub fn cursor(&self) -> Seq {
        self.cursor
    }

    pub fn seek(&mut self, seq: Seq) {
        self.cursor = seq;
    }

    /// Read at the cursor and step back one position, whatever the outcome.
    ///
    /// # Errors
    /// Same as [`Ring::read`].
    pub fn previous(&mut self) -> Result<Option<Arc<T>>, Unavailable> {
        let event = self.ring.read(self.cursor);
        self.cursor = self.cursor.wrapping_sub(1);
        event
    }

    /// Read at the cursor, waiting for the writer if the position has not been
    /// written yet. Advances only when a position was actually read.
    ///
    /// `Ok(None)` is a readable position that was never written (the ring is
    /// still warming up); the cursor moves past it.
    ///
    /// # Errors
    /// - [`ReaderError::Cancelled`] if `cancel` fires before or while waiting.
    /// - [`ReaderError::FellBehind`] without waiting if the writer already
    ///   overwrote the position. The cursor is left in place; [`seek`] to
    ///   [`Ring::oldest`] to resume.
    ///
    /// [`seek`]: RingReader::seek
    pub async fn next(
        &mut self,
        cancel: &CancellationToken,
    ) -> Result<Option<Arc<T>>, ReaderError> {
        loop {
            if cancel.is_cancelled() {
                return Err(ReaderError::Cancelled);
            }

            // Register for the wake-up before looking at the cursor, so a write
            // that lands between the check and the await still wakes us.
            let notified = self.ring.notified();
            tokio::pin!(notified);
            notified.as_mut().enable();

            match self.ring.read_following(self.cursor) {
                Ok(event) => {
                    self.cursor = self.cursor.wrapping_add(1);
                    return Ok(event);
                }
                Err(Unavailable::TooOld) => {
                    return Err(ReaderError::FellBehind {
                        cursor: self.cursor,
                        oldest: self.ring.oldest(),
                    });
                }
                Err(Unavailable::TooNew) => {}
            }

            tokio::select! {
                biased;
                () = cancel.cancelled() => return Err(ReaderError::Cancelled),
                () = &mut notified => {}
            }
        }
    }
}
