//! Frequency-band mapping and demo spectrum synthesis.
//!
//! Converts a raw byte-magnitude snapshot into one normalized level per band
//! using an explicit Hz boundary table with per-band gain compensation. When
//! no snapshot is available the mapper synthesizes a deterministic spectrum
//! instead.

use std::f32::consts::TAU;
use std::ops::RangeInclusive;
use std::time::Duration;

use noise::{NoiseFn, Perlin};
use tracing::debug;

use crate::params::DemoSynthesis;
use crate::source::FrameSnapshot;

/// Shortest period a demo sine component may have (seconds)
const MIN_COMPONENT_PERIOD_S: f32 = 1.0e-3;

/// Offset between band rows in the jitter noise field; irrational so rows never align
const JITTER_ROW_SPACING: f64 = 1.618_034;

/// Contiguous frequency range mapped to one bar
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Band {
    pub index: usize,
    pub low_hz: f32,
    pub high_hz: f32,
    pub gain: f32,
}

impl Band {
    /// Snapshot bins covered by this band, `None` when the range is empty.
    ///
    /// `bin_count` must be non-zero.
    pub fn bin_range(&self, nyquist_hz: f32, bin_count: usize) -> Option<RangeInclusive<usize>> {
        let bins = bin_count as f32;
        let low_bin = (self.low_hz / nyquist_hz * bins).floor() as usize;
        let high_bin = ((self.high_hz / nyquist_hz * bins).ceil() as usize).min(bin_count - 1);

        (low_bin <= high_bin).then_some(low_bin..=high_bin)
    }

    /// Gain-compensated level in `[0, 1]` for this band
    pub fn level(&self, snapshot: &FrameSnapshot) -> f32 {
        let Some(range) = self.bin_range(snapshot.nyquist(), snapshot.bin_count) else {
            return 0.0;
        };

        let bins = &snapshot.magnitudes[range];
        let sum: u32 = bins.iter().map(|&m| m as u32).sum();
        let average = sum as f32 / bins.len() as f32;

        (average / 255.0 * self.gain).clamp(0.0, 1.0)
    }
}

/// Maps snapshots (or their absence) to per-band levels
pub struct SpectrumMapper {
    bands: Vec<Band>,
    demo: DemoSynthesis,
    jitter: Perlin,
}

impl SpectrumMapper {
    pub fn new(bands: Vec<Band>, demo: DemoSynthesis) -> Self {
        let jitter = Perlin::new(demo.noise_seed);
        Self {
            bands,
            demo,
            jitter,
        }
    }

    pub fn bands(&self) -> &[Band] {
        &self.bands
    }

    /// Write the current frame's band levels into `levels`.
    ///
    /// `None` selects demo synthesis. A malformed snapshot produces an
    /// all-zero frame.
    pub fn map_into(&self, snapshot: Option<&FrameSnapshot>, t: Duration, levels: &mut [f32]) {
        match snapshot {
            Some(snapshot) if snapshot.is_well_formed() => {
                for (level, band) in levels.iter_mut().zip(&self.bands) {
                    *level = band.level(snapshot);
                }
            }
            Some(snapshot) => {
                debug!(
                    "[mapper] malformed snapshot (bins={}, len={}, rate={}), using silence",
                    snapshot.bin_count,
                    snapshot.magnitudes.len(),
                    snapshot.sample_rate
                );
                levels.fill(0.0);
            }
            None => {
                for (index, level) in levels.iter_mut().enumerate() {
                    *level = self.demo_level(t, index);
                }
            }
        }
    }

    /// Synthetic level for `band_index` at time `t`.
    ///
    /// Pure in `(t, band_index)`: three sines at band-specific periods and
    /// phases, plus bounded Perlin jitter, clamped to `[0, 1]`.
    pub fn demo_level(&self, t: Duration, band_index: usize) -> f32 {
        let demo = &self.demo;
        let secs = t.as_secs_f32();
        let band = band_index as f32;

        let mut level = demo.base_level;
        for (k, (&amplitude, &base_period)) in demo
            .component_amplitudes
            .iter()
            .zip(&demo.component_periods_s)
            .enumerate()
        {
            let period =
                (base_period * (1.0 + demo.band_period_spread * band)).max(MIN_COMPONENT_PERIOD_S);
            let phase = demo.band_phase_spread * band * (k as f32 + 1.0);
            level += amplitude * (TAU * secs / period + phase).sin();
        }

        let jitter = self.jitter.get([
            t.as_secs_f64() * demo.jitter_rate_hz as f64,
            band_index as f64 * JITTER_ROW_SPACING + 0.5,
        ]) as f32;
        level += jitter.clamp(-1.0, 1.0) * demo.jitter_amplitude;

        let last_band = self.bands.len().saturating_sub(1).max(1) as f32;
        level *= 1.0 - demo.spectral_tilt * (band / last_band).min(1.0);

        level.clamp(0.0, 1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::params::PipelineConfig;
    use approx::assert_abs_diff_eq;

    fn two_band_mapper() -> SpectrumMapper {
        let config = PipelineConfig::with_band_table(vec![0.0, 1000.0, 2000.0], vec![1.0, 2.0]);
        SpectrumMapper::new(config.bands(), config.demo)
    }

    #[test]
    fn test_bin_range() {
        let band = Band {
            index: 0,
            low_hz: 1000.0,
            high_hz: 2000.0,
            gain: 1.0,
        };

        // 4000 Hz Nyquist over 16 bins = 250 Hz per bin
        assert_eq!(band.bin_range(4000.0, 16), Some(4..=8));

        // Upper edge clamps to the last bin
        assert_eq!(band.bin_range(1500.0, 16), Some(10..=15));

        // Entirely above Nyquist: empty
        assert_eq!(band.bin_range(500.0, 16), None);
    }

    #[test]
    fn test_uniform_snapshot_with_gain_clamp() {
        let mapper = two_band_mapper();
        let snapshot = FrameSnapshot::new(vec![128; 512], 8000.0);
        let mut levels = [0.0; 2];

        mapper.map_into(Some(&snapshot), Duration::ZERO, &mut levels);

        assert_abs_diff_eq!(levels[0], 128.0 / 255.0, epsilon = 1e-4);
        assert_eq!(levels[1], 1.0);
    }

    #[test]
    fn test_band_above_nyquist_is_silent() {
        let config = PipelineConfig::with_band_table(vec![5000.0, 6000.0], vec![1.0]);
        let mapper = SpectrumMapper::new(config.bands(), config.demo);
        let snapshot = FrameSnapshot::new(vec![255; 64], 8000.0);
        let mut levels = [0.5];

        mapper.map_into(Some(&snapshot), Duration::ZERO, &mut levels);

        assert_eq!(levels[0], 0.0);
    }

    #[test]
    fn test_malformed_snapshot_maps_to_zero() {
        let mapper = two_band_mapper();
        let snapshot = FrameSnapshot {
            magnitudes: vec![200; 10],
            sample_rate: 8000.0,
            bin_count: 20,
        };
        let mut levels = [0.7; 2];

        mapper.map_into(Some(&snapshot), Duration::ZERO, &mut levels);
        assert_eq!(levels, [0.0, 0.0]);

        let empty = FrameSnapshot::new(Vec::new(), 8000.0);
        levels = [0.7; 2];
        mapper.map_into(Some(&empty), Duration::ZERO, &mut levels);
        assert_eq!(levels, [0.0, 0.0]);
    }

    #[test]
    fn test_demo_levels_are_bounded_and_deterministic() {
        let config = PipelineConfig::default();
        let first = SpectrumMapper::new(config.bands(), config.demo.clone());
        let second = SpectrumMapper::new(config.bands(), config.demo.clone());

        for step in 0..200u64 {
            let t = Duration::from_millis(step * 37);
            for band in 0..config.band_count {
                let level = first.demo_level(t, band);
                assert!((0.0..=1.0).contains(&level));
                assert_eq!(level, second.demo_level(t, band));
            }
        }
    }

    #[test]
    fn test_demo_bands_never_collapse() {
        let config = PipelineConfig::default();
        let mapper = SpectrumMapper::new(config.bands(), config.demo);
        let mut levels = vec![0.0; config.band_count];

        for step in 0..50u64 {
            mapper.map_into(None, Duration::from_millis(step * 60), &mut levels);
            let first = levels[0];
            assert!(
                levels.iter().any(|&level| (level - first).abs() > 1e-4),
                "all bands identical at step {}",
                step
            );
        }
    }
}
