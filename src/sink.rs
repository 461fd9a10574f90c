//! Presentation-side consumers of segment change-sets.

use crate::params::ColorZones;
use crate::segments::{ChangeSet, SegmentState};

/// Anything that displays segments. Receives only what changed each tick.
pub trait SegmentSink {
    fn apply(&mut self, changes: &ChangeSet<'_>);
}

impl<S: SegmentSink + ?Sized> SegmentSink for &mut S {
    fn apply(&mut self, changes: &ChangeSet<'_>) {
        (**self).apply(changes)
    }
}

/// Retained mirror of the display, rebuilt purely from change-sets
#[derive(Debug, Clone)]
pub struct SegmentGrid {
    band_count: usize,
    segment_count: usize,
    states: Vec<SegmentState>,
    /// Segment updates applied so far
    applied: u64,
}

const BAR_GLYPHS: [char; 9] = [' ', '▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];

impl SegmentGrid {
    /// All segments start unlit, matching a freshly built renderer
    pub fn new(band_count: usize, segment_count: usize, zones: ColorZones) -> Self {
        let states = (0..band_count * segment_count)
            .map(|flat| SegmentState {
                color_zone: zones.zone(flat % segment_count),
                ..SegmentState::default()
            })
            .collect();

        Self {
            band_count,
            segment_count,
            states,
            applied: 0,
        }
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn state(&self, band: usize, segment: usize) -> SegmentState {
        self.states[band * self.segment_count + segment]
    }

    fn row(&self, band: usize) -> &[SegmentState] {
        &self.states[band * self.segment_count..(band + 1) * self.segment_count]
    }

    /// Number of lit segments in `band`
    pub fn lit_count(&self, band: usize) -> usize {
        self.row(band).iter().filter(|state| state.lit).count()
    }

    /// Segment carrying the peak marker, if it is showing
    pub fn peak_marker(&self, band: usize) -> Option<usize> {
        self.row(band).iter().position(|state| state.is_peak_marker)
    }

    /// Total segment updates received
    pub fn applied(&self) -> u64 {
        self.applied
    }

    /// One glyph per band, scaled from lit segments to eighth blocks
    pub fn summary(&self) -> String {
        (0..self.band_count)
            .map(|band| {
                let eighths = self.lit_count(band) * 8 / self.segment_count.max(1);
                BAR_GLYPHS[eighths.min(8)]
            })
            .collect()
    }
}

impl SegmentSink for SegmentGrid {
    fn apply(&mut self, changes: &ChangeSet<'_>) {
        for change in changes {
            self.states[change.band_index * self.segment_count + change.segment_index] =
                change.state();
            self.applied += 1;
        }
    }
}
