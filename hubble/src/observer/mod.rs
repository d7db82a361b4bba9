//! # Flow Observer
//!
//! Serves flow queries from the shared [`Ring`](crate::container::Ring).
//!
//! ## Query Phases
//!
//! ```text
//!  oldest                                   last_write_parallel   WC
//!    │◄───────────── historical scan (backward) ─────────┤          │
//!    │         stop at Since / Number / overwritten        │          │
//!                                                          └─► follow (forward, blocking)
//! ```
//!
//! 1. **Historical**: walk backward from [`Ring::last_write_parallel`] collecting
//!    up to `number` matching flows, then reverse them into arrival order.
//! 2. **Follow** (optional): attach a [`RingReader`] right after the newest
//!    position the scan looked at and stream new flows until cancelled.
//!
//! Because the follow reader starts exactly one position after the scan start,
//! nothing is delivered twice and nothing in between is skipped, as long as the
//! writer does not lap the reader between the two phases.
//!
//! [`Ring::last_write_parallel`]: crate::container::Ring::last_write_parallel
//! [`RingReader`]: crate::container::RingReader

pub mod filters;
pub mod get_flows;
pub mod request;
pub mod status;

pub use filters::apply;
pub use get_flows::{FlowsSummary, HistoricalBatch, Observer};
pub use request::GetFlowsRequest;
pub use status::ServerStatus;
