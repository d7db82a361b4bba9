//! Domain model for hubble
//!
//! This module contains core domain types and errors that provide:
//! - The narrow contract the flow store needs from an event ([`FlowEvent`])
//! - Filter predicate types shared by every query path
//! - Structured error handling

pub mod errors;
pub mod types;

// Re-export common types for convenience
pub use types::{FilterFunc, FlowEvent, Seq, Timestamp};

pub use errors::{ObserverError, ReaderError, ReplayError, RingError, Unavailable};
