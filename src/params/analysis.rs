//! Spectrum analysis configuration for live and file sources.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// FFT analysis configuration for turning samples into byte magnitude snapshots
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// FFT window size (must be power of 2)
    /// Snapshots carry `fft_size / 2` bins
    pub fft_size: usize,

    /// Magnitude mapped to byte 0 (dBFS)
    pub min_db: f32,

    /// Magnitude mapped to byte 255 (dBFS)
    pub max_db: f32,

    /// Averaging between consecutive analyses, 0 = none (0..1)
    pub averaging: f32,

    /// Capture buffer length in windows (live capture keeps this many FFT windows)
    pub capture_windows: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            fft_size: 2048,
            min_db: -100.0,
            max_db: -30.0,
            averaging: 0.5,
            capture_windows: 4,
        }
    }
}

impl AnalysisConfig {
    /// Number of magnitude bins per snapshot
    pub fn bin_count(&self) -> usize {
        self.fft_size / 2
    }

    /// Center frequency of bin `index` at the given sample rate (Hz)
    pub fn bin_to_hz(&self, index: usize, sample_rate_hz: f32) -> f32 {
        index as f32 * sample_rate_hz / self.fft_size as f32
    }

    /// Validate configuration (FFT size must be power of 2, dB range ordered)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.fft_size.is_power_of_two() || self.fft_size < 32 {
            return Err(ConfigError::InvalidFftSize(self.fft_size));
        }
        if !(self.min_db < self.max_db) {
            return Err(ConfigError::InvalidDbRange {
                min_db: self.min_db,
                max_db: self.max_db,
            });
        }
        if !(0.0..=1.0).contains(&self.averaging) {
            return Err(ConfigError::SmoothingAlphaOutOfRange(self.averaging));
        }
        Ok(())
    }
}
