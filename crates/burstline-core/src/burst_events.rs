//! Burst Events
//!
//! The typed event stream produced by the external burst detection stage.
//! Events travel alongside the sample stream: each processing chunk carries
//! the list of events whose positions fall inside that chunk, and all
//! positions are absolute stream positions so reassembly does not depend on
//! how the stream happens to be chunked.
//!
//! A burst is bracketed by a `Started` event at its first sample and an
//! `Ended` event at its last sample (inclusive). The detection stage keeps
//! burst identifiers unique among open bursts; identifiers may be reused
//! once a burst has ended.
//!
//! ## Example
//!
//! ```rust
//! use burstline_core::burst_events::BurstEvent;
//!
//! let event = BurstEvent::Started {
//!     burst_id: 3,
//!     position: 4096,
//!     relative_frequency: -0.12,
//!     magnitude: 14.2,
//! };
//! assert_eq!(event.burst_id(), 3);
//! assert_eq!(event.position(), 4096);
//! assert!(event.is_started());
//! ```

use std::fmt;

use crate::types::StreamPosition;

/// An event produced by the external burst detection stage.
#[derive(Debug, Clone, PartialEq)]
pub enum BurstEvent {
    /// A new burst was detected.
    Started {
        /// Identifier assigned by the detection stage, unique among
        /// currently open bursts.
        burst_id: u64,
        /// Absolute position of the first burst sample.
        position: StreamPosition,
        /// Burst center frequency as a fraction of the sample rate,
        /// relative to the stream center.
        relative_frequency: f64,
        /// Detection magnitude in dB over the noise floor.
        magnitude: f64,
    },
    /// A previously started burst faded out.
    Ended {
        /// Identifier from the matching `Started` event.
        burst_id: u64,
        /// Absolute position of the last burst sample, inclusive.
        position: StreamPosition,
    },
}

impl BurstEvent {
    /// The identifier this event refers to.
    pub fn burst_id(&self) -> u64 {
        match self {
            BurstEvent::Started { burst_id, .. } | BurstEvent::Ended { burst_id, .. } => *burst_id,
        }
    }

    /// The absolute stream position this event marks.
    pub fn position(&self) -> StreamPosition {
        match self {
            BurstEvent::Started { position, .. } | BurstEvent::Ended { position, .. } => *position,
        }
    }

    /// Whether this is a `Started` event.
    pub fn is_started(&self) -> bool {
        matches!(self, BurstEvent::Started { .. })
    }

    /// Whether this is an `Ended` event.
    pub fn is_ended(&self) -> bool {
        matches!(self, BurstEvent::Ended { .. })
    }
}

impl fmt::Display for BurstEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BurstEvent::Started {
                burst_id,
                position,
                relative_frequency,
                magnitude,
            } => write!(
                f,
                "burst {} started @{} (f={:+.4}, {:.1} dB)",
                burst_id, position, relative_frequency, magnitude
            ),
            BurstEvent::Ended { burst_id, position } => {
                write!(f, "burst {} ended @{}", burst_id, position)
            }
        }
    }
}
