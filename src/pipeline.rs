//! The spectrum-to-display pipeline.
//!
//! One instance owns every piece of per-band and per-segment state. Each pass
//! runs mapper -> smoother -> peak tracker -> segment renderer and hands back
//! the segments that changed.

use std::time::Duration;

use tracing::{debug, trace};

use crate::error::ConfigError;
use crate::mapper::{Band, SpectrumMapper};
use crate::params::PipelineConfig;
use crate::peak::{PeakState, PeakTracker};
use crate::segments::{ChangeSet, SegmentRenderer, SegmentState};
use crate::smoothing::Smoother;
use crate::source::FrameSnapshot;

/// Owned pipeline instance: mapping, smoothing, peaks and segment diffing
pub struct SpectrumPipeline {
    config: PipelineConfig,
    mapper: SpectrumMapper,
    smoother: Smoother,
    peaks: PeakTracker,
    renderer: SegmentRenderer,
    /// Mapped levels of the current pass, before smoothing
    raw: Vec<f32>,
    /// Peak levels of the current pass, laid out for the renderer
    peak_levels: Vec<f32>,
}

impl SpectrumPipeline {
    /// Validate `config` and allocate all state up front
    pub fn new(config: PipelineConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let bands = config.band_count;
        let segments = config.segment_count;
        debug!(
            "[pipeline] {} bands x {} segments, alpha={}, hold={}ms, decay={}",
            bands,
            segments,
            config.smoothing_alpha,
            config.peak_hold_duration_ms,
            config.peak_decay_step
        );

        Ok(Self {
            mapper: SpectrumMapper::new(config.bands(), config.demo.clone()),
            smoother: Smoother::new(bands, config.smoothing_alpha),
            peaks: PeakTracker::new(
                bands,
                Duration::from_millis(config.peak_hold_duration_ms),
                config.peak_decay_step,
            ),
            renderer: SegmentRenderer::new(bands, segments, config.color_zones),
            raw: vec![0.0; bands],
            peak_levels: vec![0.0; bands],
            config,
        })
    }

    /// Run one full pass at time `t`.
    ///
    /// `None` means no live source is ready and the demo spectrum is used.
    pub fn process(&mut self, snapshot: Option<&FrameSnapshot>, t: Duration) -> ChangeSet<'_> {
        self.mapper.map_into(snapshot, t, &mut self.raw);

        let smoothed = self.smoother.update(&self.raw);
        self.peaks.update(smoothed, t);
        for (level, state) in self.peak_levels.iter_mut().zip(self.peaks.peaks()) {
            *level = state.peak;
        }

        let changes = self
            .renderer
            .render(self.smoother.levels(), &self.peak_levels);
        trace!("[pipeline] t={:?} changed={}", t, changes.len());
        changes
    }

    /// Clear smoothing, peaks and retained segment state
    pub fn reset(&mut self) {
        self.smoother.reset();
        self.peaks.reset();
        self.renderer.reset();
        self.raw.fill(0.0);
        self.peak_levels.fill(0.0);
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    pub fn bands(&self) -> &[Band] {
        self.mapper.bands()
    }

    /// Mapped levels of the last pass, before smoothing
    pub fn raw_levels(&self) -> &[f32] {
        &self.raw
    }

    pub fn smoothed_levels(&self) -> &[f32] {
        self.smoother.levels()
    }

    pub fn peaks(&self) -> &[PeakState] {
        self.peaks.peaks()
    }

    pub fn peak_segment(&self, band: usize) -> usize {
        self.peaks.peak_segment(band, self.config.segment_count)
    }

    pub fn segment(&self, band: usize, segment: usize) -> SegmentState {
        self.renderer.state(band, segment)
    }

    /// Changes produced by the last pass
    pub fn last_changes(&self) -> ChangeSet<'_> {
        self.renderer.change_set()
    }
}
