//! # Hubble - In-Memory Flow Store and Query Engine
//!
//! Hubble keeps the most recent network flows observed on a Cilium node in a
//! fixed-size ring and serves two kinds of queries from it concurrently:
//! bounded historical queries ("the last N flows", "flows between A and B")
//! and live-tail follow streams. One writer fills the ring continuously; any
//! number of readers query it without a lock that serializes reads against
//! the writer.
//!
//! ## Architecture Overview
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │          Monitor decoder  /  recorded flow file (replay)         │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ decoded flows
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  ingest: bounded channel ──► single writer thread                │
//! └───────────────────────┬─────────────────────────────────────────┘
//!                         │ Ring::write
//!                         ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  container::Ring  (capacity 2^k, wrapping u64 write cursor)     │
//! └───────┬───────────────────────────┬─────────────────────────────┘
//!         │ Ring::read (backward)     │ RingReader::next (forward, blocking)
//!         ▼                           ▼
//! ┌──────────────┐            ┌──────────────┐      ┌──────────────┐
//! │  historical  │──────────▶ │    follow    │ ───▶ │  mpsc sink   │
//! │     scan     │  seq + 1   │    stream    │      │ (CLI / gRPC) │
//! └──────────────┘            └──────────────┘      └──────────────┘
//! ```
//!
//! ## Module Structure
//!
//! - [`container`]: the ring buffer and its per-consumer readers
//!   - `ring`: storage, write cursor and the read-validity window
//!   - `ring_reader`: resumable cursor with blocking `next` and non-blocking
//!     `previous`
//! - [`observer`]: the `GetFlows` query engine, predicate evaluation and
//!   server status
//! - [`ingest`]: the single writer thread and its non-blocking intake
//! - [`replay`]: JSON-lines flow files as a flow source
//! - [`cli`]: argument parsing, defaults resolution and flow output
//! - [`domain`]: the `FlowEvent` contract, sequence numbers and errors
//!
//! ## Typical Usage
//!
//! ```bash
//! # Last 20 flows of a recording
//! hubble --file flows.json
//!
//! # Everything between two Unix timestamps, human-readable
//! hubble --file flows.json --since 1700000000 --until 1700000060 -o compact
//!
//! # Follow a paced replay until Ctrl+C
//! hubble --file flows.json --follow --replay-delay-ms 100
//! ```
//!
//! ## Key Concepts
//!
//! - **Sequence number**: position of a write in the total write order; a
//!   `u64` that wraps silently.
//! - **Safety margin**: the newest positions withheld from readers racing the
//!   writer (`Ring::last_write_parallel` is `WC - 2`).
//! - **Follow mode**: live delivery of new flows after the historical batch.

pub mod cli;
pub mod container;
pub mod domain;
pub mod ingest;
pub mod observer;
pub mod replay;

pub use hubble_common::Flow;
