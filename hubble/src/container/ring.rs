//! # Fixed-Capacity Flow Ring
//!
//! Overwrite-on-full circular buffer filled by exactly one writer and read by
//! any number of concurrent readers.
//!
//! ## Position Model
//!
//! Every write is assigned the current write cursor `WC` as its sequence
//! number, then `WC` advances by one (wrapping at `u64::MAX`). Sequence `s`
//! lives in slot `s & mask`. For a read at `s` the ring computes
//!
//! ```text
//! delta = WC - s        (u64 wrapping subtraction)
//!
//!   delta:   0      1      2 ...................... C     C+1 ...
//!          [next] [last] [ safe for parallel readers ] [ overwritten ]
//!           TooNew TooNew                               TooOld
//! ```
//!
//! `read` accepts `2 <= delta <= C`. The most recent write (`delta == 1`) is
//! withheld from readers scanning concurrently with the writer because the slot
//! store and the cursor advance are two separate steps;
//! [`Ring::last_write_parallel`] is therefore `WC - 2`. Blocked forward readers
//! (see [`RingReader`](super::RingReader)) re-acquire the cursor after the
//! writer's release and may read `delta == 1`.
//!
//! ## Synchronization
//!
//! - `WC` is an `AtomicU64`: release on advance, acquire on every read.
//! - Each slot has its own `RwLock` and records the sequence it holds, so a
//!   reader racing the writer on the same slot (`delta == C`) detects the
//!   overwrite instead of returning a newer event.
//! - The writer can only wait on a slot lock held by a reader at
//!   `delta == C`, and only for the length of an `Arc` clone. Every other
//!   slot it touches is uncontended.
//! - There is no array-wide lock; readers never contend with each other.
//! - Blocked readers are woken through a `Notify` broadcast after each write.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use parking_lot::RwLock;
use tokio::sync::futures::Notified;
use tokio::sync::Notify;

use super::RingReader;
use crate::domain::{RingError, Seq, Unavailable};

/// Largest ring the store will allocate
pub const MAX_CAPACITY: usize = 1 << 24;

/// Positions withheld from readers that run concurrently with the writer
const PARALLEL_MARGIN: u64 = 2;

/// Positions withheld from woken forward readers
const FOLLOW_MARGIN: u64 = 1;

type Slot<T> = RwLock<Option<(Seq, Arc<T>)>>;

/// Fixed-capacity ring of flow events
pub struct Ring<T> {
    mask: u64,
    data: Box<[Slot<T>]>,
    /// Next sequence number to assign
    write: AtomicU64,
    notify: Notify,
}

impl<T> Ring<T> {
    /// Create an empty ring.
    ///
    /// # Errors
    /// - [`RingError::InvalidCapacity`] unless `capacity` is a non-zero power
    ///   of two.
    /// - [`RingError::CapacityTooLarge`] above [`MAX_CAPACITY`].
    pub fn new(capacity: usize) -> Result<Self, RingError> {
        Self::starting_at(capacity, 0)
    }

    /// Create an empty ring, rounding `capacity` up to the next power of two.
    ///
    /// # Errors
    /// [`RingError::CapacityTooLarge`] if the rounded capacity exceeds
    /// [`MAX_CAPACITY`].
    pub fn with_capacity(capacity: usize) -> Result<Self, RingError> {
        let rounded = capacity
            .max(1)
            .checked_next_power_of_two()
            .ok_or(RingError::CapacityTooLarge(capacity))?;
        Self::new(rounded).map_err(|_| RingError::CapacityTooLarge(capacity))
    }

    /// Create an empty ring whose first write gets sequence `start`.
    ///
    /// Restarting the sequence near `u64::MAX` exercises wraparound without
    /// performing 2^64 writes.
    ///
    /// # Errors
    /// Same as [`Ring::new`].
    pub fn starting_at(capacity: usize, start: Seq) -> Result<Self, RingError> {
        if capacity == 0 || !capacity.is_power_of_two() {
            return Err(RingError::InvalidCapacity(capacity));
        }
        if capacity > MAX_CAPACITY {
            return Err(RingError::CapacityTooLarge(capacity));
        }
        Ok(Self::build(capacity, start))
    }

    fn build(capacity: usize, start: Seq) -> Self {
        let data: Vec<Slot<T>> = (0..capacity).map(|_| RwLock::new(None)).collect();
        Self {
            mask: capacity as u64 - 1,
            data: data.into_boxed_slice(),
            write: AtomicU64::new(start),
            notify: Notify::new(),
        }
    }

    /// Store `event` at the next sequence number and wake blocked readers.
    ///
    /// Must only be called from a single writer at a time; the ring does not
    /// serialize concurrent writers.
    pub fn write(&self, event: impl Into<Arc<T>>) {
        let seq = self.write.load(Ordering::Relaxed);
        *self.slot(seq).write() = Some((seq, event.into()));
        self.write.store(seq.wrapping_add(1), Ordering::Release);
        self.notify.notify_waiters();
    }

    /// Read the event at `seq` if it is safely readable by a reader running
    /// concurrently with the writer.
    ///
    /// `Ok(None)` means the position is inside the readable window but was
    /// never written (the ring is still warming up).
    ///
    /// # Errors
    /// [`Unavailable::TooNew`] for the two most recent positions and anything
    /// not yet written, [`Unavailable::TooOld`] once the slot was overwritten.
    pub fn read(&self, seq: Seq) -> Result<Option<Arc<T>>, Unavailable> {
        self.read_with_margin(seq, PARALLEL_MARGIN)
    }

    /// Forward-reader variant of [`Ring::read`] that also admits the most
    /// recent write.
    pub(crate) fn read_following(&self, seq: Seq) -> Result<Option<Arc<T>>, Unavailable> {
        self.read_with_margin(seq, FOLLOW_MARGIN)
    }

    fn read_with_margin(&self, seq: Seq, margin: u64) -> Result<Option<Arc<T>>, Unavailable> {
        let delta = self.write.load(Ordering::Acquire).wrapping_sub(seq);
        if delta < margin {
            return Err(Unavailable::TooNew);
        }
        if delta > self.capacity_u64() {
            return Err(Unavailable::TooOld);
        }

        match &*self.slot(seq).read() {
            None => Ok(None),
            Some((stored, event)) if *stored == seq => Ok(Some(Arc::clone(event))),
            // The writer lapped us between the cursor load and the slot read
            Some(_) => Err(Unavailable::TooOld),
        }
    }

    /// Sequence of the most recent write. Only meaningful while no writer is
    /// running.
    #[must_use]
    pub fn last_write(&self) -> Seq {
        self.write.load(Ordering::Acquire).wrapping_sub(1)
    }

    /// Most recent sequence that is safe to read while the writer keeps
    /// writing.
    #[must_use]
    pub fn last_write_parallel(&self) -> Seq {
        self.write.load(Ordering::Acquire).wrapping_sub(PARALLEL_MARGIN)
    }

    /// Oldest sequence still held by the ring
    #[must_use]
    pub fn oldest(&self) -> Seq {
        self.write.load(Ordering::Acquire).wrapping_sub(self.capacity_u64())
    }

    /// The write cursor: total writes so far, modulo 2^64
    #[must_use]
    pub fn write_cursor(&self) -> Seq {
        self.write.load(Ordering::Acquire)
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Number of events currently held: `min(total writes, capacity)`
    #[must_use]
    pub fn len(&self) -> usize {
        let written = self.write_cursor();
        usize::try_from(written).map_or(self.capacity(), |w| w.min(self.capacity()))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Attach a new reader at `start`.
    #[must_use]
    pub fn reader(self: &Arc<Self>, start: Seq) -> RingReader<T> {
        RingReader::new(Arc::clone(self), start)
    }

    /// Future resolved by the next write. Callers enable it before re-checking
    /// the cursor so that a write in between is not missed.
    pub(crate) fn notified(&self) -> Notified<'_> {
        self.notify.notified()
    }

    // mask < capacity, which is a usize
    #[allow(clippy::cast_possible_truncation)]
    fn slot(&self, seq: Seq) -> &Slot<T> {
        &self.data[(seq & self.mask) as usize]
    }

    fn capacity_u64(&self) -> u64 {
        self.mask + 1
    }
}

impl<T> std::fmt::Debug for Ring<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Ring")
            .field("capacity", &self.capacity())
            .field("write", &self.write_cursor())
            .finish_non_exhaustive()
    }
}
