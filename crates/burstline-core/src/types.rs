//! Core Types for the Burst Extraction Pipeline
//!
//! Complex I/Q sample aliases shared by every block in the crate, plus the
//! error taxonomy of the channel planner and the pipeline orchestrator.
//!
//! All sample data is complex baseband: the real part is the in-phase (I)
//! component and the imaginary part the quadrature (Q) component. Stream
//! positions count samples since the start of the stream and never reset.
//!
//! ## Example
//!
//! ```rust
//! use burstline_core::types::{DetectorError, IQSample};
//!
//! let sample = IQSample::new(0.6, -0.8);
//! assert!((sample.norm() - 1.0).abs() < 1e-12);
//!
//! let err = DetectorError::InvalidDecimation(3);
//! assert!(err.to_string().contains("even"));
//! ```

use num_complex::Complex64;
use thiserror::Error;

/// Type alias for complex numbers using f64 precision
pub type Complex = Complex64;

/// A single complex baseband sample (I + jQ)
pub type IQSample = Complex64;

/// Absolute position in a sample stream: samples consumed since stream start
pub type StreamPosition = u64;

/// Result type for planner and pipeline operations
pub type DetectorResult<T> = Result<T, DetectorError>;

/// Errors raised while planning or running the extraction pipeline.
///
/// Planner errors are raised before any stream input is consumed, so a
/// misconfigured pipeline fails at construction rather than mid-stream.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum DetectorError {
    /// Sample rate too low to fit a millisecond analysis window
    #[error("invalid sample rate {0} Hz: need at least 1000 Hz for a millisecond analysis window")]
    InvalidSampleRate(u32),

    /// Decimation above 1 must be even so the channel count comes out odd
    #[error("invalid decimation {0}: decimation above 1 must be even")]
    InvalidDecimation(u32),

    /// Channelizer output rate disagrees with the requested decimation
    #[error(
        "channelizer output rate {output_rate} Hz does not match {input_rate} Hz decimated by {decimation}"
    )]
    RateMismatch {
        input_rate: u32,
        decimation: u32,
        output_rate: u32,
    },

    /// Oversampling ratio not enough to create a working anti-alias filter
    #[error(
        "oversampling ratio not enough to create a working anti-alias filter \
         (transition width {transition_hz:.1} Hz)"
    )]
    InfeasibleFilter { transition_hz: f64 },

    /// The plan calls for a channelized topology but no channel bank was given
    #[error("plan requires a channelizer but none was provided")]
    MissingChannelizer,

    /// The stream already ended; the pipeline accepts no further input
    #[error("detector already finished, no further input accepted")]
    AlreadyFinished,

    /// The sample source failed
    #[error("sample source error: {0}")]
    Source(String),
}
