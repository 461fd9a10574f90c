//! Raw per-bin magnitude snapshot handed from a source to the mapper.

/// One frame of byte magnitudes (0..255), as captured
#[derive(Debug, Clone, PartialEq)]
pub struct FrameSnapshot {
    /// Per-bin magnitudes, lowest frequency first
    pub magnitudes: Vec<u8>,

    /// Sample rate of the analysed signal (Hz)
    pub sample_rate: f32,

    /// Bin count the snapshot was captured with
    pub bin_count: usize,
}

impl FrameSnapshot {
    pub fn new(magnitudes: Vec<u8>, sample_rate: f32) -> Self {
        let bin_count = magnitudes.len();
        Self {
            magnitudes,
            sample_rate,
            bin_count,
        }
    }

    /// All-zero snapshot with `bin_count` bins
    pub fn silent(bin_count: usize, sample_rate: f32) -> Self {
        Self::new(vec![0; bin_count], sample_rate)
    }

    /// Nyquist frequency (Hz)
    pub fn nyquist(&self) -> f32 {
        self.sample_rate / 2.0
    }

    /// Non-empty, consistent bin count, usable sample rate
    pub fn is_well_formed(&self) -> bool {
        self.bin_count > 0
            && self.magnitudes.len() == self.bin_count
            && self.sample_rate.is_finite()
            && self.sample_rate > 0.0
    }
}
