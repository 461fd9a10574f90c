//! Discrete segment states per bar, diffed frame to frame.
//!
//! The renderer quantizes each band's level and peak into per-segment state
//! and keeps the previous frame around, so a presentation layer only ever
//! sees the segments whose state actually changed.

use crate::params::ColorZones;
use crate::peak::peak_segment;

/// Color band a segment belongs to, fixed by its index
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum ColorZone {
    #[default]
    Low,
    Mid,
    High,
}

impl ColorZones {
    /// Zone of segment `index`; depends on nothing but the index and thresholds
    pub fn zone(&self, index: usize) -> ColorZone {
        if index >= self.high_from {
            ColorZone::High
        } else if index >= self.mid_from {
            ColorZone::Mid
        } else {
            ColorZone::Low
        }
    }
}

/// Display state of one segment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SegmentState {
    pub lit: bool,
    pub color_zone: ColorZone,
    /// Highest lit segment of the bar
    pub is_top_lit: bool,
    /// Unlit segment carrying the peak-hold marker
    pub is_peak_marker: bool,
}

/// One changed segment, as emitted to the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SegmentChange {
    pub band_index: usize,
    pub segment_index: usize,
    pub lit: bool,
    pub color_zone: ColorZone,
    pub is_top_lit: bool,
    pub is_peak_marker: bool,
}

impl SegmentChange {
    pub fn state(&self) -> SegmentState {
        SegmentState {
            lit: self.lit,
            color_zone: self.color_zone,
            is_top_lit: self.is_top_lit,
            is_peak_marker: self.is_peak_marker,
        }
    }
}

/// `floor(level * segment_count)`, capped at `segment_count`
pub fn lit_count(level: f32, segment_count: usize) -> usize {
    let count = (level * segment_count as f32).floor().max(0.0) as usize;
    count.min(segment_count)
}

/// Quantizes levels and peaks into segments and diffs against the last frame
#[derive(Debug, Clone)]
pub struct SegmentRenderer {
    band_count: usize,
    segment_count: usize,
    zones: ColorZones,
    previous: Vec<SegmentState>,
    current: Vec<SegmentState>,
}

impl SegmentRenderer {
    pub fn new(band_count: usize, segment_count: usize, zones: ColorZones) -> Self {
        let initial = Self::unlit(segment_count, zones);
        let states = initial
            .iter()
            .copied()
            .cycle()
            .take(band_count * segment_count)
            .collect::<Vec<_>>();

        Self {
            band_count,
            segment_count,
            zones,
            previous: states.clone(),
            current: states,
        }
    }

    fn unlit(segment_count: usize, zones: ColorZones) -> Vec<SegmentState> {
        (0..segment_count)
            .map(|index| SegmentState {
                color_zone: zones.zone(index),
                ..SegmentState::default()
            })
            .collect()
    }

    pub fn segment_count(&self) -> usize {
        self.segment_count
    }

    pub fn band_count(&self) -> usize {
        self.band_count
    }

    /// State shown after the last `render`
    pub fn state(&self, band: usize, segment: usize) -> SegmentState {
        self.current[band * self.segment_count + segment]
    }

    /// Render one frame and return the segments that changed since the last one.
    ///
    /// `levels` and `peaks` hold one entry per band, both in `[0, 1]`.
    pub fn render(&mut self, levels: &[f32], peaks: &[f32]) -> ChangeSet<'_> {
        self.previous.copy_from_slice(&self.current);

        let segment_count = self.segment_count;
        let zones = self.zones;
        for (band, (&level, &peak)) in levels.iter().zip(peaks).enumerate() {
            let lit_segments = lit_count(level, segment_count);
            let peak_at = peak_segment(peak, segment_count);
            let row = &mut self.current[band * segment_count..(band + 1) * segment_count];

            for (index, state) in row.iter_mut().enumerate() {
                let lit = index < lit_segments;
                *state = SegmentState {
                    lit,
                    color_zone: zones.zone(index),
                    is_top_lit: lit && index + 1 == lit_segments,
                    is_peak_marker: !lit && index == peak_at && peak_at >= lit_segments,
                };
            }
        }

        self.change_set()
    }

    /// Forget everything shown so far; the next render reports every lit segment
    pub fn reset(&mut self) {
        let initial = Self::unlit(self.segment_count, self.zones);
        for row in self.current.chunks_mut(self.segment_count) {
            row.copy_from_slice(&initial);
        }
        self.previous.copy_from_slice(&self.current);
    }

    /// Changes produced by the most recent `render`
    pub fn change_set(&self) -> ChangeSet<'_> {
        ChangeSet {
            previous: &self.previous,
            current: &self.current,
            segment_count: self.segment_count,
        }
    }
}

/// Lazily computed differences between two consecutive frames.
///
/// Iterating does not consume anything; every call to `iter` starts over.
#[derive(Debug, Clone, Copy)]
pub struct ChangeSet<'a> {
    previous: &'a [SegmentState],
    current: &'a [SegmentState],
    segment_count: usize,
}

impl<'a> ChangeSet<'a> {
    pub fn iter(&self) -> impl Iterator<Item = SegmentChange> + 'a {
        let (previous, current) = (self.previous, self.current);
        let segment_count = self.segment_count;
        previous
            .iter()
            .zip(current)
            .enumerate()
            .filter(|(_, (before, after))| before != after)
            .map(move |(flat, (_, after))| SegmentChange {
                band_index: flat / segment_count,
                segment_index: flat % segment_count,
                lit: after.lit,
                color_zone: after.color_zone,
                is_top_lit: after.is_top_lit,
                is_peak_marker: after.is_peak_marker,
            })
    }

    pub fn is_empty(&self) -> bool {
        self.previous == self.current
    }

    pub fn len(&self) -> usize {
        self.iter().count()
    }
}

impl<'a> IntoIterator for &ChangeSet<'a> {
    type Item = SegmentChange;
    type IntoIter = Box<dyn Iterator<Item = SegmentChange> + 'a>;

    fn into_iter(self) -> Self::IntoIter {
        Box::new(self.iter())
    }
}
