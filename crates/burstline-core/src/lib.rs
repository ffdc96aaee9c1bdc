//! # Burstline Core
//!
//! Burst extraction front end for a wideband radio detection pipeline.
//!
//! ## Overview
//!
//! A wideband receiver watches a slice of spectrum for short transmission
//! bursts. An external detection stage finds them and marks the sample
//! stream with start and end events; this crate takes the chunked sample
//! stream plus those events and reassembles each burst into a contiguous
//! window of complex baseband samples, scaled and positioned in the
//! wideband stream's frame of reference, ready for a downstream
//! demodulator. The pieces:
//!
//! - **DetectorConfig**: the externally supplied pipeline knobs
//! - **plan / ChannelPlan**: derive window sizing, exclusion zone and
//!   channelizer geometry, rejecting infeasible combinations
//! - **BurstEvent**: typed start/end markers from the detection stage
//! - **BurstAssembler**: reassemble per-burst sample windows from
//!   arbitrarily chunked input
//! - **ChannelTranslator**: fold per-channel completion events back into
//!   wideband units
//! - **Detector**: orchestrate source, tagger, channel bank and collector
//!
//! Spectral detection, polyphase filtering and burst persistence are
//! deliberately outside this crate; they connect through the traits in
//! [`detector`].
//!
//! ## Signal Flow
//!
//! ```text
//!                       ┌─► BurstAssembler ──────────────────┐
//! source ──► tagger ────┤                                    ├──► collector
//!  (chunks)  (events)   └─► ChannelBank ──► ChannelTranslator┘
//! ```
//!
//! ## Example
//!
//! ```rust
//! use burstline_core::{plan, BurstAssembler, BurstEvent};
//! use num_complex::Complex64;
//!
//! // Derive the processing geometry for a 1 MS/s stream.
//! let plan = plan(1_000_000, 0, 40_000.0).unwrap();
//! assert_eq!(plan.fft_size, 1024);
//!
//! // Reassemble one tagged burst from a chunked stream.
//! let mut assembler = BurstAssembler::new(0.0, 1.0);
//! let chunk = vec![Complex64::new(0.0, 1.0); 2048];
//! assembler.process_chunk(
//!     &chunk,
//!     &[BurstEvent::Started {
//!         burst_id: 1,
//!         position: 512,
//!         relative_frequency: 0.02,
//!         magnitude: 13.0,
//!     }],
//! );
//! let records = assembler.process_chunk(
//!     &chunk,
//!     &[BurstEvent::Ended { burst_id: 1, position: 2303 }],
//! );
//! assert_eq!(records[0].samples.len(), 1792);
//! ```

pub mod burst_assembler;
pub mod burst_events;
pub mod channel_plan;
pub mod channel_translator;
pub mod config;
pub mod detector;
pub mod types;

pub use burst_assembler::{BurstAssembler, BurstRecord};
pub use burst_events::BurstEvent;
pub use channel_plan::{plan, ChannelPlan, ChannelizerPlan};
pub use channel_translator::{ChannelBurst, ChannelTranslator, ExtractedBurst};
pub use config::DetectorConfig;
pub use detector::{
    BurstCollector, BurstTagging, ChannelBank, Detector, DetectorState, RunStats, SampleSource,
};
pub use types::{Complex, DetectorError, DetectorResult, IQSample, StreamPosition};
