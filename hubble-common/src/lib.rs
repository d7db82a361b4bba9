//! # Shared Flow Data Model
//!
//! Defines the flow record produced by the monitor decoding pipeline and
//! consumed by the flow store, the replay source and the CLI. The store itself
//! only ever looks at [`Flow::time`]; every other field is payload carried
//! through unchanged.
//!
//! ## Key Types
//!
//! - [`Flow`] - One observed network event (connection, drop, DNS answer, ...)
//! - [`Timestamp`] - Wall-clock time in protobuf `Timestamp` layout
//! - [`Verdict`] - Forwarding decision taken by the datapath
//! - [`Endpoint`] - One side of a flow (address and optional port)
//! - [`Protocol`] - L4 protocol
//!
//! With the default `serde` feature every type is (de)serializable, which is
//! what the JSON-lines replay format relies on.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

// ============================================================================
// Timestamp
// ============================================================================

const NANOS_PER_SECOND: i32 = 1_000_000_000;

/// Wall-clock timestamp: seconds since the Unix epoch plus a nanosecond part.
///
/// Ordering is lexicographic on `(seconds, nanos)`, so `nanos` must stay in
/// `0..1_000_000_000` for comparisons to be meaningful. [`Timestamp::new`]
/// normalizes out-of-range values, and so does deserialization.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(from = "RawTimestamp"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Timestamp {
    pub seconds: i64,
    pub nanos: i32,
}

/// Wire form of [`Timestamp`], accepted with any `nanos`
#[cfg(feature = "serde")]
#[derive(Deserialize)]
struct RawTimestamp {
    seconds: i64,
    #[serde(default)]
    nanos: i32,
}

#[cfg(feature = "serde")]
impl From<RawTimestamp> for Timestamp {
    fn from(raw: RawTimestamp) -> Self {
        Self::new(raw.seconds, raw.nanos)
    }
}

impl Timestamp {
    /// Create a timestamp, carrying excess nanoseconds into `seconds`.
    #[must_use]
    pub fn new(seconds: i64, nanos: i32) -> Self {
        let carry = i64::from(nanos.div_euclid(NANOS_PER_SECOND));
        Self {
            seconds: seconds.saturating_add(carry),
            nanos: nanos.rem_euclid(NANOS_PER_SECOND),
        }
    }

    /// Timestamp at a whole second.
    #[must_use]
    pub const fn from_secs(seconds: i64) -> Self {
        Self { seconds, nanos: 0 }
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{:09}", self.seconds, self.nanos)
    }
}

/// Error returned when a timestamp string is malformed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseTimestampError(String);

impl fmt::Display for ParseTimestampError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid timestamp \"{}\": expected <seconds>[.<fraction>]", self.0)
    }
}

impl std::error::Error for ParseTimestampError {}

impl FromStr for Timestamp {
    type Err = ParseTimestampError;

    /// Parse `"<seconds>"` or `"<seconds>.<fraction>"` (up to 9 fraction digits).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let err = || ParseTimestampError(s.to_string());
        let (secs, frac) = s.trim().split_once('.').unwrap_or((s.trim(), ""));

        let seconds: i64 = secs.parse().map_err(|_| err())?;
        // "-1.5" would silently mean -0.5 in (seconds, nanos) form
        if secs.starts_with('-') && !frac.is_empty() {
            return Err(err());
        }
        if frac.len() > 9 || !frac.chars().all(|c| c.is_ascii_digit()) {
            return Err(err());
        }

        // Right-pad the fraction to nanosecond precision: "5" -> 500_000_000
        let nanos = if frac.is_empty() {
            0
        } else {
            format!("{frac:0<9}").parse::<i32>().map_err(|_| err())?
        };

        Ok(Self { seconds, nanos })
    }
}

// ============================================================================
// Flow
// ============================================================================

/// Forwarding decision taken by the datapath
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum Verdict {
    #[default]
    Unknown,
    Forwarded,
    Dropped,
    Error,
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Verdict::Unknown => "UNKNOWN",
            Verdict::Forwarded => "FORWARDED",
            Verdict::Dropped => "DROPPED",
            Verdict::Error => "ERROR",
        };
        f.write_str(s)
    }
}

/// L4 protocol of a flow
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "SCREAMING_SNAKE_CASE"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Protocol {
    Tcp,
    Udp,
    Icmpv4,
    Icmpv6,
    Sctp,
}

/// One side of a flow
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Endpoint {
    pub ip: String,
    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub port: Option<u16>,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.port {
            Some(port) if self.ip.contains(':') => write!(f, "[{}]:{port}", self.ip),
            Some(port) => write!(f, "{}:{port}", self.ip),
            None => f.write_str(&self.ip),
        }
    }
}

/// A decoded network flow
///
/// Only `time` is meaningful to the flow store; the rest is payload for
/// filters and output.
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Flow {
    pub time: Timestamp,

    #[cfg_attr(feature = "serde", serde(default))]
    pub verdict: Verdict,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub source: Option<Endpoint>,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub destination: Option<Endpoint>,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub l4: Option<Protocol>,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "Option::is_none"))]
    pub node_name: Option<String>,

    #[cfg_attr(feature = "serde", serde(default, skip_serializing_if = "String::is_empty"))]
    pub summary: String,
}

impl Flow {
    /// Flow carrying only a timestamp
    #[must_use]
    pub fn at(time: Timestamp) -> Self {
        Self { time, ..Self::default() }
    }
}
