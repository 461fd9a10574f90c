//! FFT analysis from time-domain samples to byte magnitude snapshots.

use rustfft::{num_complex::Complex, Fft, FftPlanner};
use std::f32::consts::PI;
use std::sync::Arc;

use super::FrameSnapshot;
use crate::error::ConfigError;
use crate::params::AnalysisConfig;

/// Hann-windowed FFT with dB scaling into `0..=255`
pub struct SpectrumAnalyzer {
    config: AnalysisConfig,
    fft: Arc<dyn Fft<f32>>,
    window: Vec<f32>,
    buffer: Vec<Complex<f32>>,
    /// Linear magnitudes after averaging with previous analyses
    averaged: Vec<f32>,
}

impl SpectrumAnalyzer {
    pub fn new(config: AnalysisConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let size = config.fft_size;
        let mut planner = FftPlanner::new();
        let fft = planner.plan_fft_forward(size);
        let window = (0..size).map(|i| hann_window(i, size)).collect();

        Ok(Self {
            fft,
            window,
            buffer: vec![Complex::new(0.0, 0.0); size],
            averaged: vec![0.0; config.bin_count()],
            config,
        })
    }

    pub fn config(&self) -> &AnalysisConfig {
        &self.config
    }

    /// Analyse the most recent `fft_size` samples (zero-padded in front when short)
    pub fn analyze(&mut self, samples: &[f32], sample_rate: f32) -> FrameSnapshot {
        let size = self.config.fft_size;
        let recent = &samples[samples.len().saturating_sub(size)..];
        let pad = size - recent.len();

        for (i, slot) in self.buffer.iter_mut().enumerate() {
            let sample = if i < pad { 0.0 } else { recent[i - pad] };
            *slot = Complex::new(sample * self.window[i], 0.0);
        }

        self.fft.process(&mut self.buffer);

        let averaging = self.config.averaging;
        let db_span = self.config.max_db - self.config.min_db;
        let scale = 1.0 / size as f32;

        let magnitudes = self
            .averaged
            .iter_mut()
            .zip(&self.buffer)
            .map(|(averaged, bin)| {
                *averaged = averaging * *averaged + (1.0 - averaging) * bin.norm() * scale;
                let db = 20.0 * averaged.log10();
                let byte = (255.0 / db_span * (db - self.config.min_db)).floor();
                // -inf (silence) and NaN both land on 0
                if byte.is_nan() {
                    0
                } else {
                    byte.clamp(0.0, 255.0) as u8
                }
            })
            .collect();

        FrameSnapshot::new(magnitudes, sample_rate)
    }

    /// Forget averaging history
    pub fn reset(&mut self) {
        self.averaged.fill(0.0);
    }
}

/// Hann window function for FFT analysis
pub fn hann_window(index: usize, size: usize) -> f32 {
    0.5 * (1.0 - ((2.0 * PI * index as f32) / (size as f32 - 1.0)).cos())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sine(freq_hz: f32, sample_rate: f32, len: usize, amplitude: f32) -> Vec<f32> {
        (0..len)
            .map(|n| amplitude * (2.0 * PI * freq_hz * n as f32 / sample_rate).sin())
            .collect()
    }

    fn analyzer(fft_size: usize) -> SpectrumAnalyzer {
        SpectrumAnalyzer::new(AnalysisConfig {
            fft_size,
            averaging: 0.0,
            ..AnalysisConfig::default()
        })
        .unwrap()
    }

    #[test]
    fn test_hann_window() {
        let size = 1024;

        // Hann window should be 0 at edges, 1 at center
        assert!((hann_window(0, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size - 1, size) - 0.0).abs() < 0.01);
        assert!((hann_window(size / 2, size) - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_silence_is_all_zero() {
        let mut analyzer = analyzer(256);
        let snapshot = analyzer.analyze(&[0.0; 256], 8000.0);

        assert_eq!(snapshot.bin_count, 128);
        assert!(snapshot.magnitudes.iter().all(|&m| m == 0));
    }

    #[test]
    fn test_sine_peaks_at_its_bin() {
        let mut analyzer = analyzer(1024);
        let sample_rate = 8000.0;
        // 1000 Hz lands exactly on bin 128 (7.8125 Hz per bin)
        let samples = sine(1000.0, sample_rate, 1024, 0.8);
        let snapshot = analyzer.analyze(&samples, sample_rate);

        let (loudest, _) = snapshot
            .magnitudes
            .iter()
            .enumerate()
            .max_by_key(|(_, &m)| m)
            .unwrap();
        assert_eq!(loudest, 128);
        assert!(snapshot.magnitudes[128] > 200);
        assert!(snapshot.magnitudes[20] < snapshot.magnitudes[128]);
    }

    #[test]
    fn test_short_input_is_zero_padded() {
        let mut analyzer = analyzer(512);
        let snapshot = analyzer.analyze(&sine(500.0, 8000.0, 100, 0.5), 8000.0);
        assert_eq!(snapshot.magnitudes.len(), 256);
        assert!(snapshot.is_well_formed());
    }

    #[test]
    fn test_averaging_slows_decay() {
        let mut analyzer = SpectrumAnalyzer::new(AnalysisConfig {
            fft_size: 1024,
            averaging: 0.8,
            ..AnalysisConfig::default()
        })
        .unwrap();
        let loud = sine(1000.0, 8000.0, 1024, 0.8);
        analyzer.analyze(&loud, 8000.0);
        let after_silence = analyzer.analyze(&[0.0; 1024], 8000.0);

        assert!(after_silence.magnitudes[128] > 0);

        analyzer.reset();
        let fresh = analyzer.analyze(&[0.0; 1024], 8000.0);
        assert_eq!(fresh.magnitudes[128], 0);
    }
}
