//! Channel Event Translator
//!
//! On the channelized path, each detected burst reaches the pipeline as a
//! self-contained completion event from one channelizer output: the samples
//! are already extracted and the reported frequency is relative to that
//! channel's own center. This block folds the channel's fixed frequency
//! offset back in and converts stream positions to seconds, producing
//! records in the wideband stream's frame of reference.
//!
//! Channel `i` of an odd N-way channelizer sits at offset `i/N` of the
//! wideband rate for the lower indices and `(i - N)/N` for the upper half,
//! so the bank covers `(-1/2, 1/2]` with channel 0 on DC. The offset table
//! is computed once at construction; translation itself is stateless.
//!
//! ## Example
//!
//! ```rust
//! use burstline_core::channel_translator::{ChannelBurst, ChannelTranslator};
//!
//! let translator = ChannelTranslator::new(5, 500_000.0);
//! assert_eq!(translator.channel_offset(1), Some(0.2));
//! assert_eq!(translator.channel_offset(4), Some(-0.2));
//!
//! let burst = ChannelBurst {
//!     channel_index: 1,
//!     relative_frequency: 0.05,
//!     magnitude: 11.0,
//!     start_position: 250_000,
//!     samples: Vec::new(),
//! };
//! let record = translator.translate(burst).unwrap();
//! assert_eq!(record.time_offset, 0.5);
//! assert_eq!(record.frequency_hz, 125_000.0);
//! assert_eq!(record.center_hz, 100_000.0);
//! ```

use num_complex::Complex64;
use tracing::warn;

use crate::types::StreamPosition;

/// A completion event from one channelizer output: a fully extracted burst
/// plus the metadata the per-channel extraction stage attached to it.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelBurst {
    /// Index of the originating channelizer output.
    pub channel_index: usize,
    /// Burst center frequency as a fraction of the channel sample rate,
    /// relative to the channel's own center.
    pub relative_frequency: f64,
    /// Detection magnitude in dB over the noise floor.
    pub magnitude: f64,
    /// Start position in samples of that channel's output stream.
    pub start_position: StreamPosition,
    /// The extracted sample window.
    pub samples: Vec<Complex64>,
}

/// A completed burst in collector-facing units: seconds and Hertz.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedBurst {
    /// Burst start as a time offset from stream start, in seconds.
    pub time_offset: f64,
    /// Detection magnitude in dB over the noise floor.
    pub magnitude: f64,
    /// Burst center frequency offset in Hz within the wideband stream.
    pub frequency_hz: f64,
    /// Center frequency offset in Hz of the passband that produced the
    /// burst (0 for a full-band engine).
    pub center_hz: f64,
    /// The extracted sample window.
    pub samples: Vec<Complex64>,
}

/// Translates per-channel completion events into wideband burst records.
#[derive(Debug, Clone)]
pub struct ChannelTranslator {
    /// Fixed frequency offset of each channel as a fraction of the
    /// wideband rate, indexed by channel.
    channel_offsets: Vec<f64>,
    output_sample_rate: f64,
}

impl ChannelTranslator {
    /// Build the offset table for a `channel_count`-way bank whose outputs
    /// run at `output_sample_rate` Hz.
    pub fn new(channel_count: usize, output_sample_rate: f64) -> Self {
        let half = channel_count / 2;
        let channel_offsets = (0..channel_count)
            .map(|i| {
                let centered = if i <= half {
                    i as f64
                } else {
                    i as f64 - channel_count as f64
                };
                centered / channel_count as f64
            })
            .collect();
        Self {
            channel_offsets,
            output_sample_rate,
        }
    }

    /// Number of channels in the bank.
    pub fn channel_count(&self) -> usize {
        self.channel_offsets.len()
    }

    /// Fixed frequency offset of a channel as a fraction of the wideband
    /// rate, or `None` for an index outside the bank.
    pub fn channel_offset(&self, channel_index: usize) -> Option<f64> {
        self.channel_offsets.get(channel_index).copied()
    }

    /// Translate one completion event into a collector-facing record.
    ///
    /// An event carrying a channel index outside the bank belongs to a
    /// differently shaped pipeline; it is dropped with a warning rather
    /// than misfiled under some other channel.
    pub fn translate(&self, burst: ChannelBurst) -> Option<ExtractedBurst> {
        let offset = match self.channel_offset(burst.channel_index) {
            Some(offset) => offset,
            None => {
                warn!(
                    "dropping completion event from unknown channel {} (bank has {})",
                    burst.channel_index,
                    self.channel_offsets.len()
                );
                return None;
            }
        };
        Some(ExtractedBurst {
            time_offset: burst.start_position as f64 / self.output_sample_rate,
            magnitude: burst.magnitude,
            frequency_hz: (burst.relative_frequency + offset) * self.output_sample_rate,
            center_hz: offset * self.output_sample_rate,
            samples: burst.samples,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_offset_table_covers_band_symmetrically() {
        let translator = ChannelTranslator::new(5, 500_000.0);
        let offsets: Vec<f64> = (0..5)
            .map(|i| translator.channel_offset(i).unwrap())
            .collect();
        assert_eq!(offsets, vec![0.0, 0.2, 0.4, -0.4, -0.2]);
        assert_eq!(translator.channel_count(), 5);
    }

    #[test]
    fn test_single_channel_bank_is_centered_on_dc() {
        let translator = ChannelTranslator::new(1, 1_000_000.0);
        assert_eq!(translator.channel_offset(0), Some(0.0));
        assert_eq!(translator.channel_offset(1), None);
    }

    #[test]
    fn test_translate_scales_into_wideband_units() {
        let translator = ChannelTranslator::new(5, 500_000.0);
        let record = translator
            .translate(ChannelBurst {
                channel_index: 3,
                relative_frequency: -0.01,
                magnitude: 9.0,
                start_position: 125_000,
                samples: vec![Complex64::new(1.0, -1.0); 8],
            })
            .unwrap();
        assert_relative_eq!(record.time_offset, 0.25);
        // Channel 3 sits at -0.4 of the rate; the burst is 0.01 below that.
        assert_relative_eq!(record.frequency_hz, -205_000.0);
        assert_relative_eq!(record.center_hz, -200_000.0);
        assert_eq!(record.magnitude, 9.0);
        assert_eq!(record.samples.len(), 8);
    }

    #[test]
    fn test_unknown_channel_is_dropped() {
        let translator = ChannelTranslator::new(5, 500_000.0);
        let burst = ChannelBurst {
            channel_index: 7,
            relative_frequency: 0.0,
            magnitude: 9.0,
            start_position: 0,
            samples: Vec::new(),
        };
        assert!(translator.translate(burst).is_none());
    }
}
