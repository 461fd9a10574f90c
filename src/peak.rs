//! Per-band peak tracking with hold-then-decay.

use std::time::Duration;

/// Peak level of one band and when it last rose
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PeakState {
    pub peak: f32,
    pub last_rise: Duration,
}

/// Instant attack, fixed hold, linear per-tick decay
#[derive(Debug, Clone)]
pub struct PeakTracker {
    peaks: Vec<PeakState>,
    hold: Duration,
    decay_step: f32,
}

impl PeakTracker {
    pub fn new(band_count: usize, hold: Duration, decay_step: f32) -> Self {
        Self {
            peaks: vec![PeakState::default(); band_count],
            hold,
            decay_step,
        }
    }

    /// Advance every band's peak to time `t` given its current smoothed level
    pub fn update(&mut self, levels: &[f32], t: Duration) {
        for (state, &level) in self.peaks.iter_mut().zip(levels) {
            if level >= state.peak {
                state.peak = level;
                state.last_rise = t;
            } else if t.saturating_sub(state.last_rise) > self.hold {
                // Never decays through the current level
                state.peak = level.max(state.peak - self.decay_step);
            }
        }
    }

    pub fn peaks(&self) -> &[PeakState] {
        &self.peaks
    }

    pub fn peak(&self, band: usize) -> f32 {
        self.peaks[band].peak
    }

    /// Segment index the peak marker sits on, in `[0, segment_count)`
    pub fn peak_segment(&self, band: usize, segment_count: usize) -> usize {
        peak_segment(self.peaks[band].peak, segment_count)
    }

    pub fn reset(&mut self) {
        self.peaks.fill(PeakState::default());
    }
}

/// `clamp(floor(peak * segment_count), 0, segment_count - 1)`
pub fn peak_segment(peak: f32, segment_count: usize) -> usize {
    let segment = (peak * segment_count as f32).floor().max(0.0) as usize;
    segment.min(segment_count.saturating_sub(1))
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOLD: Duration = Duration::from_millis(500);

    fn ms(value: u64) -> Duration {
        Duration::from_millis(value)
    }

    #[test]
    fn test_peak_rides_up_with_level() {
        let mut tracker = PeakTracker::new(1, HOLD, 0.1);
        tracker.update(&[0.3], ms(0));
        tracker.update(&[0.8], ms(60));

        assert_eq!(tracker.peaks()[0].peak, 0.8);
        assert_eq!(tracker.peaks()[0].last_rise, ms(60));
    }

    #[test]
    fn test_peak_held_within_hold_window() {
        let mut tracker = PeakTracker::new(1, HOLD, 0.1);
        tracker.update(&[0.9], ms(0));
        tracker.update(&[0.2], ms(300));
        tracker.update(&[0.2], ms(500));

        // Exactly at the hold boundary is still held
        assert_eq!(tracker.peak(0), 0.9);
    }

    #[test]
    fn test_linear_decay_after_hold() {
        let mut tracker = PeakTracker::new(1, HOLD, 0.1);
        tracker.update(&[0.9], ms(0));
        tracker.update(&[0.2], ms(600));
        assert!((tracker.peak(0) - 0.8).abs() < 1e-6);

        tracker.update(&[0.2], ms(660));
        assert!((tracker.peak(0) - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_decay_stops_at_level() {
        let mut tracker = PeakTracker::new(1, HOLD, 0.5);
        tracker.update(&[0.9], ms(0));
        tracker.update(&[0.6], ms(1000));
        assert_eq!(tracker.peak(0), 0.6);
    }

    #[test]
    fn test_peak_segment_bounds() {
        assert_eq!(peak_segment(0.0, 12), 0);
        assert_eq!(peak_segment(0.5, 12), 6);
        assert_eq!(peak_segment(1.0, 12), 11);
        assert_eq!(peak_segment(-0.2, 12), 0);
    }

    #[test]
    fn test_reset() {
        let mut tracker = PeakTracker::new(2, HOLD, 0.1);
        tracker.update(&[0.5, 0.7], ms(10));
        tracker.reset();
        assert_eq!(tracker.peaks(), &[PeakState::default(); 2]);
    }
}
