//! Server status derived from the ring

use serde::Serialize;

/// Snapshot of the flow store's occupancy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ServerStatus {
    /// Flows currently held: `min(seen_flows, max_flows)`
    pub num_flows: u64,
    /// Ring capacity
    pub max_flows: u64,
    /// Total flows written since start (wraps at 2^64)
    pub seen_flows: u64,
    pub uptime_ns: u64,
}
