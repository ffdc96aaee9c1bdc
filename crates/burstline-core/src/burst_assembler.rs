//! Burst Reassembly Engine
//!
//! Collects, for every active burst, exactly the window of samples between
//! its start and end markers from a stream that arrives in arbitrarily
//! sized chunks. The markers come from the external detection stage as
//! [`BurstEvent`]s whose positions fall inside the current chunk; completed
//! windows come back out as [`BurstRecord`]s.
//!
//! Several engines can run over the same stream, each bound to a disjoint
//! slice of the passband. A start event whose frequency falls outside an
//! engine's passband is ignored, and an end event for a burst the engine
//! never claimed is dropped without effect, so the instances partition the
//! work cleanly between themselves.
//!
//! Open bursts grow until their end marker arrives. Nothing in the engine
//! caps that growth: a detection stage that never closes its bursts will
//! grow memory without bound, and the fix belongs in that stage, not here.
//!
//! ## Example
//!
//! ```rust
//! use burstline_core::burst_assembler::BurstAssembler;
//! use burstline_core::burst_events::BurstEvent;
//! use num_complex::Complex64;
//!
//! let mut assembler = BurstAssembler::new(0.0, 1.0);
//! let chunk: Vec<Complex64> = (0..16).map(|i| Complex64::new(i as f64, 0.0)).collect();
//!
//! let started = BurstEvent::Started {
//!     burst_id: 7,
//!     position: 4,
//!     relative_frequency: 0.1,
//!     magnitude: 12.0,
//! };
//! assert!(assembler.process_chunk(&chunk, &[started]).is_empty());
//!
//! // The end marker lands in the next chunk, six samples in.
//! let ended = BurstEvent::Ended { burst_id: 7, position: 21 };
//! let records = assembler.process_chunk(&chunk, &[ended]);
//! assert_eq!(records.len(), 1);
//! assert_eq!(records[0].start_position, 4);
//! assert_eq!(records[0].samples.len(), 18); // positions 4..=21
//! ```

use std::collections::HashMap;

use num_complex::Complex64;
use tracing::debug;

use crate::burst_events::BurstEvent;
use crate::types::StreamPosition;

/// A completed burst: the extracted sample window plus the metadata
/// captured at detection time. Immutable once emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct BurstRecord {
    /// Absolute stream position of the first sample in the window.
    pub start_position: StreamPosition,
    /// Detection magnitude in dB over the noise floor.
    pub magnitude: f64,
    /// Burst center frequency as a fraction of the sample rate, relative
    /// to the passband center of the engine that assembled it.
    pub relative_frequency: f64,
    /// The extracted sample window.
    pub samples: Vec<Complex64>,
}

/// A burst currently being accumulated.
#[derive(Debug, Clone)]
struct OpenBurst {
    start_position: StreamPosition,
    magnitude: f64,
    relative_frequency: f64,
    samples: Vec<Complex64>,
}

impl OpenBurst {
    fn into_record(self) -> BurstRecord {
        BurstRecord {
            start_position: self.start_position,
            magnitude: self.magnitude,
            relative_frequency: self.relative_frequency,
            samples: self.samples,
        }
    }
}

/// Reassembles tagged bursts from a chunked sample stream.
///
/// The engine claims bursts whose reported frequency lies inside its
/// passband `(center - bandwidth/2, center + bandwidth/2]`, both in
/// fractions of the sample rate. The lower bound is exclusive and the
/// upper inclusive, so a burst exactly on the boundary between two
/// adjacent engines is claimed by exactly one of them.
#[derive(Debug, Clone)]
pub struct BurstAssembler {
    relative_center: f64,
    lower_border: f64,
    upper_border: f64,
    /// Open bursts keyed by the detector-assigned identifier.
    bursts: HashMap<u64, OpenBurst>,
    /// Absolute position of the next sample to arrive.
    samples_consumed: StreamPosition,
}

impl BurstAssembler {
    /// Create an engine for the passband centered at `relative_center`
    /// with width `relative_bandwidth`, both in fractions of the sample
    /// rate. `new(0.0, 1.0)` covers the whole stream.
    pub fn new(relative_center: f64, relative_bandwidth: f64) -> Self {
        Self {
            relative_center,
            lower_border: relative_center - relative_bandwidth / 2.0,
            upper_border: relative_center + relative_bandwidth / 2.0,
            bursts: HashMap::new(),
            samples_consumed: 0,
        }
    }

    /// Whether a reported frequency falls inside this engine's passband.
    /// Exclusive below, inclusive above.
    pub fn claims(&self, relative_frequency: f64) -> bool {
        self.lower_border < relative_frequency && relative_frequency <= self.upper_border
    }

    /// Passband center in fractions of the sample rate.
    pub fn relative_center(&self) -> f64 {
        self.relative_center
    }

    /// Passband borders `(lower, upper]` in fractions of the sample rate.
    pub fn passband(&self) -> (f64, f64) {
        (self.lower_border, self.upper_border)
    }

    /// Number of bursts currently open.
    pub fn open_burst_count(&self) -> usize {
        self.bursts.len()
    }

    /// Total samples consumed so far, which is also the absolute position
    /// of the next sample to arrive.
    pub fn samples_consumed(&self) -> StreamPosition {
        self.samples_consumed
    }

    /// Process one chunk of the stream together with the events whose
    /// positions fall inside it. Returns the bursts this chunk completed.
    ///
    /// The pass order carries the semantics: end markers are honored
    /// first, then the chunk is appended to the bursts still open, and
    /// start markers are honored last so a newly opened burst is seeded
    /// with only its own suffix of the chunk. A start and end pair landing
    /// in the same chunk completes immediately.
    pub fn process_chunk(
        &mut self,
        samples: &[Complex64],
        events: &[BurstEvent],
    ) -> Vec<BurstRecord> {
        let chunk_start = self.samples_consumed;
        let chunk_len = samples.len() as u64;
        let mut completed = Vec::new();
        // Ends whose start has not been seen yet. Usually that means the
        // burst belongs to another engine; it can also mean the matching
        // start is later in this same chunk's event list.
        let mut pending_ends: HashMap<u64, StreamPosition> = HashMap::new();

        for event in events {
            if let BurstEvent::Ended { burst_id, position } = event {
                match self.bursts.remove(burst_id) {
                    Some(mut burst) => {
                        let take = clamp_to_chunk(position.saturating_add(1), chunk_start, chunk_len);
                        burst.samples.extend_from_slice(&samples[..take]);
                        completed.push(burst.into_record());
                    }
                    None => {
                        pending_ends.insert(*burst_id, *position);
                    }
                }
            }
        }

        for burst in self.bursts.values_mut() {
            burst.samples.extend_from_slice(samples);
        }

        for event in events {
            if let BurstEvent::Started {
                burst_id,
                position,
                relative_frequency,
                magnitude,
            } = event
            {
                if !self.claims(*relative_frequency) {
                    continue;
                }
                let from = clamp_to_chunk(*position, chunk_start, chunk_len);
                let mut burst = OpenBurst {
                    start_position: *position,
                    magnitude: *magnitude,
                    relative_frequency: relative_frequency - self.relative_center,
                    samples: Vec::new(),
                };
                match pending_ends.get(burst_id).copied() {
                    Some(end) if end >= *position => {
                        pending_ends.remove(burst_id);
                        let to = clamp_to_chunk(end.saturating_add(1), chunk_start, chunk_len);
                        burst.samples.extend_from_slice(&samples[from..to]);
                        completed.push(burst.into_record());
                    }
                    _ => {
                        burst.samples.extend_from_slice(&samples[from..]);
                        if let Some(old) = self.bursts.insert(*burst_id, burst) {
                            debug!(
                                "duplicate start for open burst {}, replacing window started at {}",
                                burst_id, old.start_position
                            );
                        }
                    }
                }
            }
        }

        if !pending_ends.is_empty() {
            debug!(
                "ignoring {} end event(s) with no matching burst",
                pending_ends.len()
            );
        }

        self.samples_consumed += chunk_len;
        completed
    }

    /// Emit every still-open burst as a record truncated at the current
    /// stream position and clear the table. Called when the stream ends
    /// before some bursts did; the truncated window still holds everything
    /// that was received for them.
    pub fn flush(&mut self) -> Vec<BurstRecord> {
        let mut records: Vec<BurstRecord> = self
            .bursts
            .drain()
            .map(|(_, burst)| burst.into_record())
            .collect();
        records.sort_by_key(|r| r.start_position);
        records
    }

    /// Drop all open bursts and rewind the position counter.
    pub fn reset(&mut self) {
        self.bursts.clear();
        self.samples_consumed = 0;
    }
}

/// Clamp an absolute stream position to a sample index within the current
/// chunk. Positions before the chunk clamp to 0, positions past it to the
/// chunk length.
fn clamp_to_chunk(position: StreamPosition, chunk_start: StreamPosition, chunk_len: u64) -> usize {
    position.saturating_sub(chunk_start).min(chunk_len) as usize
}
