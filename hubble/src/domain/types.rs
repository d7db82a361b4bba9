//! Domain types shared by the ring, its readers and the query engine

use std::sync::Arc;

use hubble_common::Flow;

pub use hubble_common::Timestamp;

/// Sequence number assigned to each write
///
/// Wraps silently at `u64::MAX`. Distances between sequence numbers are
/// always computed with `wrapping_sub`, never by signed comparison.
pub type Seq = u64;

/// The only thing the flow store needs to know about an event
pub trait FlowEvent: Send + Sync + 'static {
    /// Wall-clock time the event was observed at
    fn timestamp(&self) -> Timestamp;
}

impl FlowEvent for Flow {
    fn timestamp(&self) -> Timestamp {
        self.time
    }
}

impl FlowEvent for Timestamp {
    fn timestamp(&self) -> Timestamp {
        *self
    }
}

/// Externally built flow predicate
///
/// Allow and deny lists in a query are plain vectors of these; building them
/// from user filter expressions happens before a query reaches the engine.
pub type FilterFunc<T> = Arc<dyn Fn(&T) -> bool + Send + Sync>;
