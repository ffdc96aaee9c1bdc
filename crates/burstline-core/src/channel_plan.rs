//! Channel Parameter Planner
//!
//! Derives every processing parameter of the extraction pipeline from the
//! input sample rate, the decimation factor and the expected signal width:
//! analysis window sizing for the external burst tagger, burst pre/post
//! context lengths, the exclusion zone around detected peaks, and (on the
//! channelized path) the channelizer geometry together with the anti-alias
//! filter widths its prototype filter must meet.
//!
//! Planning is a pure derivation with no state or I/O. Every infeasible
//! combination is rejected here, before any stream input is consumed.
//!
//! ## Example
//!
//! ```rust
//! use burstline_core::channel_plan::plan;
//!
//! // 1 MS/s without decimation: one engine over the full passband.
//! let single = plan(1_000_000, 0, 40_000.0).unwrap();
//! assert_eq!(single.fft_size, 1024);
//! assert_eq!(single.burst_post_len, 8192);
//! assert!(!single.is_multichannel());
//!
//! // 2 MS/s decimated by 4: five oversampled channels around DC.
//! let multi = plan(2_000_000, 4, 40_000.0).unwrap();
//! assert_eq!(multi.output_sample_rate, 500_000);
//! assert_eq!(multi.channel_count(), 5);
//! ```

use std::fmt;

use crate::types::{DetectorError, DetectorResult};

/// Channelizer geometry for the multichannel path.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelizerPlan {
    /// Number of channelizer outputs. Always odd (decimation + 1), so the
    /// channels sit symmetrically around DC with one channel centered.
    pub channel_count: usize,
    /// Polyphase oversampling ratio, `channel_count / (channel_count - 1)`.
    /// Adjacent channels overlap by this margin so a burst near a channel
    /// edge is still seen whole by one of them.
    pub oversample_ratio: f64,
    /// Passband edge of the anti-alias prototype filter, in Hz.
    pub fir_passband_hz: f64,
    /// Transition width of the anti-alias prototype filter, in Hz.
    pub fir_transition_hz: f64,
}

/// Derived processing parameters for one pipeline instance.
///
/// Produced by [`plan`] and immutable afterwards; every downstream block
/// reads its geometry from here.
#[derive(Debug, Clone, PartialEq)]
pub struct ChannelPlan {
    /// Input sample rate in Hz.
    pub input_sample_rate: u32,
    /// Analysis FFT length for the external tagger. Smallest power of two
    /// strictly greater than one millisecond of samples, so a window spans
    /// a little over a millisecond.
    pub fft_size: usize,
    /// Samples kept ahead of a detected burst start (one analysis window;
    /// detection lags burst onset by about that much).
    pub burst_pre_len: usize,
    /// Samples kept after a detected burst end (eight windows; bursts fade
    /// out more gradually than they start).
    pub burst_post_len: usize,
    /// Guard band around a detected peak, in analysis FFT bins, inside
    /// which no second burst is started.
    pub exclusion_width_bins: usize,
    /// Sample rate of each output stream in Hz. Equals the input rate on
    /// the single-channel path.
    pub output_sample_rate: u32,
    /// Channelizer geometry; present only on the multichannel path.
    pub channelizer: Option<ChannelizerPlan>,
}

impl ChannelPlan {
    /// Whether this plan uses the channelized topology.
    pub fn is_multichannel(&self) -> bool {
        self.channelizer.is_some()
    }

    /// Number of output streams (1 on the single-channel path).
    pub fn channel_count(&self) -> usize {
        self.channelizer.as_ref().map_or(1, |c| c.channel_count)
    }

    /// Width of one analysis FFT bin in Hz.
    pub fn bin_width_hz(&self) -> f64 {
        self.input_sample_rate as f64 / self.fft_size as f64
    }

    /// The exclusion guard band converted back to Hz.
    pub fn exclusion_width_hz(&self) -> f64 {
        self.exclusion_width_bins as f64 * self.bin_width_hz()
    }

    /// Duration of one analysis window in seconds.
    pub fn window_duration(&self) -> f64 {
        self.fft_size as f64 / self.input_sample_rate as f64
    }
}

impl fmt::Display for ChannelPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "fft {} (pre {} / post {}), exclusion {} bins ({:.1} Hz), output {} Hz",
            self.fft_size,
            self.burst_pre_len,
            self.burst_post_len,
            self.exclusion_width_bins,
            self.exclusion_width_hz(),
            self.output_sample_rate,
        )?;
        if let Some(ch) = &self.channelizer {
            write!(
                f,
                ", {} channels (oversample {:.3}, fir passband {:.1} Hz, transition {:.1} Hz)",
                ch.channel_count, ch.oversample_ratio, ch.fir_passband_hz, ch.fir_transition_hz,
            )?;
        }
        Ok(())
    }
}

/// Derive a [`ChannelPlan`] from the input sample rate, the decimation
/// factor and the expected signal width.
///
/// Decimation 0 or 1 yields the single-channel plan. Larger decimations
/// yield a `decimation + 1` channel plan whose channels are oversampled by
/// `channel_count / (channel_count - 1)` so that each output stream runs at
/// exactly `input_sample_rate / decimation`.
///
/// Fails when the rate cannot fit a millisecond analysis window, when an
/// odd decimation above 1 is requested, when the oversampled channel rate
/// does not come out at the requested decimation, or when the oversampling
/// margin leaves no room for the anti-alias filter transition band.
pub fn plan(
    input_sample_rate: u32,
    decimation: u32,
    signal_width_hz: f64,
) -> DetectorResult<ChannelPlan> {
    let window = input_sample_rate / 1000;
    if window == 0 {
        return Err(DetectorError::InvalidSampleRate(input_sample_rate));
    }
    let fft_size = 1usize << (window.ilog2() + 1);
    let burst_pre_len = fft_size;
    let burst_post_len = 8 * fft_size;
    let bin_width = input_sample_rate as f64 / fft_size as f64;
    let exclusion_width_bins = (signal_width_hz / bin_width).round() as usize;

    if decimation <= 1 {
        return Ok(ChannelPlan {
            input_sample_rate,
            fft_size,
            burst_pre_len,
            burst_post_len,
            exclusion_width_bins,
            output_sample_rate: input_sample_rate,
            channelizer: None,
        });
    }

    if decimation % 2 != 0 {
        return Err(DetectorError::InvalidDecimation(decimation));
    }
    let channel_count = decimation as usize + 1;
    let oversample_ratio = channel_count as f64 / (channel_count - 1) as f64;
    let output_sample_rate =
        (input_sample_rate as f64 / channel_count as f64 * oversample_ratio).round() as u32;
    if output_sample_rate != input_sample_rate / decimation {
        return Err(DetectorError::RateMismatch {
            input_rate: input_sample_rate,
            decimation,
            output_rate: output_sample_rate,
        });
    }

    // Each channel keeps rate/channels of spectrum plus half a signal width
    // of margin on either side; whatever is left below the output Nyquist
    // edge is the room available for the filter to roll off.
    let fir_passband_hz =
        (input_sample_rate as f64 / channel_count as f64 + signal_width_hz) / 2.0;
    let fir_transition_hz = (output_sample_rate as f64 / 2.0 - fir_passband_hz) * 2.0;
    if fir_transition_hz < 0.0 {
        return Err(DetectorError::InfeasibleFilter {
            transition_hz: fir_transition_hz,
        });
    }

    Ok(ChannelPlan {
        input_sample_rate,
        fft_size,
        burst_pre_len,
        burst_post_len,
        exclusion_width_bins,
        output_sample_rate,
        channelizer: Some(ChannelizerPlan {
            channel_count,
            oversample_ratio,
            fir_passband_hz,
            fir_transition_hz,
        }),
    })
}
