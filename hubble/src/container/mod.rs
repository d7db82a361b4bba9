//! Flow storage: the ring buffer and its per-consumer readers
//!
//! - [`Ring`]: fixed-capacity, overwrite-on-full storage with one writer
//! - [`RingReader`]: independent cursor over a shared ring; blocking
//!   forward iteration and non-blocking backward iteration

pub mod ring;
pub mod ring_reader;

pub use ring::{Ring, MAX_CAPACITY};
pub use ring_reader::RingReader;

pub use crate::domain::Unavailable;
