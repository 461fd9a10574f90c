//! Spectrum pipeline configuration: band table, smoothing, peaks, segments.

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::mapper::Band;

/// Segment index thresholds for the color zones of one bar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorZones {
    /// First segment index drawn in the Mid zone
    pub mid_from: usize,

    /// First segment index drawn in the High zone
    pub high_from: usize,
}

impl Default for ColorZones {
    fn default() -> Self {
        Self {
            mid_from: 8,
            high_from: 10,
        }
    }
}

impl ColorZones {
    /// Thresholds at 2/3 and 5/6 of the bar height (8 and 10 for 12 segments)
    pub fn scaled_to(segment_count: usize) -> Self {
        Self {
            mid_from: segment_count * 2 / 3,
            high_from: segment_count * 5 / 6,
        }
    }
}

/// Deterministic synthetic spectrum used while no live source is active
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DemoSynthesis {
    /// Perlin noise seed for the jitter term
    pub noise_seed: u32,

    /// Resting level every band oscillates around (0..1)
    pub base_level: f32,

    /// Amplitude of each sine component (0..1)
    pub component_amplitudes: [f32; 3],

    /// Period of each sine component for band 0 (seconds)
    pub component_periods_s: [f32; 3],

    /// Relative period stretch added per band index (dimensionless)
    pub band_period_spread: f32,

    /// Phase offset added per band index (radians)
    pub band_phase_spread: f32,

    /// Peak jitter contribution (0..1)
    pub jitter_amplitude: f32,

    /// Rate at which the jitter field is traversed (Hz)
    pub jitter_rate_hz: f32,

    /// Level reduction applied linearly from the lowest to the highest band (0..1)
    pub spectral_tilt: f32,
}

impl Default for DemoSynthesis {
    fn default() -> Self {
        Self {
            noise_seed: 42,
            base_level: 0.35,
            component_amplitudes: [0.22, 0.14, 0.08],
            component_periods_s: [1.7, 0.9, 0.37],
            band_period_spread: 0.11,
            band_phase_spread: 0.73,
            jitter_amplitude: 0.06,
            jitter_rate_hz: 8.0,
            spectral_tilt: 0.2,
        }
    }
}

/// Complete pipeline configuration, validated when the pipeline is built
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Number of bars
    pub band_count: usize,

    /// Segments per bar
    pub segment_count: usize,

    /// Minimum interval between accepted scheduler ticks (milliseconds)
    /// 60 ms ≈ 16 pipeline passes per second
    pub update_interval_ms: u64,

    /// Exponential smoothing factor, higher = slower response (0..1)
    pub smoothing_alpha: f32,

    /// Level removed from a peak per tick once the hold expires (0..1)
    pub peak_decay_step: f32,

    /// How long a peak stays put after its last rise (milliseconds)
    pub peak_hold_duration_ms: u64,

    /// Band boundaries in Hz, `band_count + 1` strictly ascending edges
    pub band_edges_hz: Vec<f32>,

    /// Per-band gain compensation, `band_count` entries
    pub band_gains: Vec<f32>,

    /// Color zone thresholds per segment index
    pub color_zones: ColorZones,

    /// Synthetic spectrum parameters for the demo fallback
    pub demo: DemoSynthesis,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            band_count: 16,
            segment_count: 12,
            update_interval_ms: 60,
            smoothing_alpha: 0.6,
            peak_decay_step: 0.02,
            peak_hold_duration_ms: 600,
            // Roughly third-octave spacing over the audible range
            band_edges_hz: vec![
                20.0, 40.0, 63.0, 100.0, 160.0, 250.0, 400.0, 630.0, 1000.0, 1600.0, 2500.0,
                4000.0, 6300.0, 8000.0, 10000.0, 12500.0, 16000.0,
            ],
            // Highs carry far less energy than lows; lift them toward parity
            band_gains: vec![
                0.9, 0.9, 1.0, 1.0, 1.0, 1.05, 1.1, 1.15, 1.2, 1.3, 1.4, 1.55, 1.7, 1.85, 2.0,
                2.2,
            ],
            color_zones: ColorZones::default(),
            demo: DemoSynthesis::default(),
        }
    }
}

impl PipelineConfig {
    /// Build a config with the given band table and default tuning.
    ///
    /// `edges_hz` holds one more entry than `gains`.
    pub fn with_band_table(edges_hz: Vec<f32>, gains: Vec<f32>) -> Self {
        Self {
            band_count: gains.len(),
            band_edges_hz: edges_hz,
            band_gains: gains,
            ..Self::default()
        }
    }

    /// Replace the band table with `band_count` log-spaced bands over the same range.
    ///
    /// Gains are interpolated linearly between the current lowest and highest
    /// band gain.
    pub fn resample_bands(&mut self, band_count: usize) {
        let low_hz = self.band_edges_hz.first().copied().unwrap_or(20.0).max(1.0);
        let high_hz = self.band_edges_hz.last().copied().unwrap_or(16_000.0);
        let low_gain = self.band_gains.first().copied().unwrap_or(1.0);
        let high_gain = self.band_gains.last().copied().unwrap_or(1.0);

        let ratio = high_hz / low_hz;
        self.band_edges_hz = (0..=band_count)
            .map(|i| low_hz * ratio.powf(i as f32 / band_count.max(1) as f32))
            .collect();
        self.band_gains = (0..band_count)
            .map(|i| {
                let position = i as f32 / band_count.saturating_sub(1).max(1) as f32;
                low_gain + (high_gain - low_gain) * position
            })
            .collect();
        self.band_count = band_count;
    }

    /// Validate configuration (counts, ranges, table shape and ordering)
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.band_count == 0 {
            return Err(ConfigError::ZeroBandCount);
        }
        if self.segment_count == 0 {
            return Err(ConfigError::ZeroSegmentCount);
        }
        if !(0.0..=1.0).contains(&self.smoothing_alpha) {
            return Err(ConfigError::SmoothingAlphaOutOfRange(self.smoothing_alpha));
        }
        if !self.peak_decay_step.is_finite() || self.peak_decay_step < 0.0 {
            return Err(ConfigError::InvalidPeakDecayStep(self.peak_decay_step));
        }
        if self.band_edges_hz.len() != self.band_count + 1 {
            return Err(ConfigError::BandEdgeCount {
                expected: self.band_count + 1,
                actual: self.band_edges_hz.len(),
            });
        }
        if self.band_gains.len() != self.band_count {
            return Err(ConfigError::BandGainCount {
                expected: self.band_count,
                actual: self.band_gains.len(),
            });
        }

        let mut previous: Option<f32> = None;
        for (index, &edge) in self.band_edges_hz.iter().enumerate() {
            let ascending = previous.map_or(true, |prev| edge > prev);
            if !edge.is_finite() || edge < 0.0 || !ascending {
                return Err(ConfigError::NonMonotonicBandEdges { index });
            }
            previous = Some(edge);
        }

        for (index, &gain) in self.band_gains.iter().enumerate() {
            if !gain.is_finite() || gain < 0.0 {
                return Err(ConfigError::InvalidBandGain { index, gain });
            }
        }

        if self.color_zones.mid_from > self.color_zones.high_from {
            return Err(ConfigError::ColorZonesOutOfOrder {
                mid_from: self.color_zones.mid_from,
                high_from: self.color_zones.high_from,
            });
        }

        Ok(())
    }

    /// Band table derived from the boundary and gain tables
    pub fn bands(&self) -> Vec<Band> {
        self.band_edges_hz
            .windows(2)
            .zip(&self.band_gains)
            .enumerate()
            .map(|(index, (edges, &gain))| Band {
                index,
                low_hz: edges[0],
                high_hz: edges[1],
                gain,
            })
            .collect()
    }
}
