//! Detector Configuration
//!
//! The externally supplied knobs of the extraction pipeline: input sample
//! rate, decimation, detection threshold, expected signal width and
//! verbosity. Everything else (window sizing, channel geometry, filter
//! widths) is derived from these by the channel planner.
//!
//! Configurations deserialize with serde, so they can come from a config
//! file or be built in code; only the sample rate is required.
//!
//! ## Example
//!
//! ```rust
//! use burstline_core::config::DetectorConfig;
//!
//! let config = DetectorConfig::new(2_000_000)
//!     .with_decimation(4)
//!     .with_threshold_db(10.0);
//! assert!(config.validate().is_ok());
//! assert_eq!(config.signal_width_hz, 40_000.0);
//! ```

use serde::{Deserialize, Serialize};

use crate::types::{DetectorError, DetectorResult};

/// Configuration for the burst extraction pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectorConfig {
    /// Input sample rate in Hz. Required; must be at least 1000.
    pub sample_rate: u32,

    /// Decimation factor. 0 or 1 selects the single-channel path; larger
    /// values must be even and select the channelized path.
    #[serde(default)]
    pub decimation: u32,

    /// Detection threshold in dB over the noise floor, forwarded to the
    /// external burst tagging stage.
    #[serde(default = "default_threshold_db")]
    pub detection_threshold_db: f64,

    /// Expected signal width in Hz. Sets the exclusion zone around a
    /// detected peak and widens the channelizer anti-alias passband.
    #[serde(default = "default_signal_width_hz")]
    pub signal_width_hz: f64,

    /// Log the derived plan at info level instead of debug.
    #[serde(default)]
    pub verbose: bool,
}

fn default_threshold_db() -> f64 {
    8.5
}

fn default_signal_width_hz() -> f64 {
    40_000.0
}

impl DetectorConfig {
    /// Create a configuration for the given sample rate with defaults for
    /// everything else (no decimation, 8.5 dB threshold, 40 kHz signals).
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            decimation: 0,
            detection_threshold_db: default_threshold_db(),
            signal_width_hz: default_signal_width_hz(),
            verbose: false,
        }
    }

    /// Set the decimation factor.
    pub fn with_decimation(mut self, decimation: u32) -> Self {
        self.decimation = decimation;
        self
    }

    /// Set the detection threshold in dB over the noise floor.
    pub fn with_threshold_db(mut self, threshold_db: f64) -> Self {
        self.detection_threshold_db = threshold_db;
        self
    }

    /// Set the expected signal width in Hz.
    pub fn with_signal_width_hz(mut self, width_hz: f64) -> Self {
        self.signal_width_hz = width_hz;
        self
    }

    /// Enable verbose plan logging.
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Whether this configuration selects the channelized path.
    pub fn is_multichannel(&self) -> bool {
        self.decimation > 1
    }

    /// Check for values the planner will reject.
    ///
    /// This catches the structural problems (rate too low, odd decimation);
    /// feasibility of the derived anti-alias filter is only known after
    /// planning.
    pub fn validate(&self) -> DetectorResult<()> {
        if self.sample_rate < 1000 {
            return Err(DetectorError::InvalidSampleRate(self.sample_rate));
        }
        if self.decimation > 1 && self.decimation % 2 != 0 {
            return Err(DetectorError::InvalidDecimation(self.decimation));
        }
        Ok(())
    }
}
