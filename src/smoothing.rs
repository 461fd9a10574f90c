//! Per-band exponential temporal smoothing.

/// Exponential moving average over a fixed number of bands
#[derive(Debug, Clone)]
pub struct Smoother {
    alpha: f32,
    smoothed: Vec<f32>,
}

impl Smoother {
    /// `alpha` in `[0, 1]`; higher values respond more slowly
    pub fn new(band_count: usize, alpha: f32) -> Self {
        Self {
            alpha,
            smoothed: vec![0.0; band_count],
        }
    }

    /// Blend one frame of raw levels into the running state
    pub fn update(&mut self, raw: &[f32]) -> &[f32] {
        for (smoothed, &raw) in self.smoothed.iter_mut().zip(raw) {
            let raw = raw.clamp(0.0, 1.0);
            *smoothed = (*smoothed * self.alpha + raw * (1.0 - self.alpha)).clamp(0.0, 1.0);
        }
        &self.smoothed
    }

    pub fn levels(&self) -> &[f32] {
        &self.smoothed
    }

    pub fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Drop all history back to silence
    pub fn reset(&mut self) {
        self.smoothed.fill(0.0);
    }
}
