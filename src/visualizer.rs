//! Top-level wiring: clock, scheduler, source switcher, pipeline and sink.

use std::time::Duration;
use tracing::info;

use crate::clock::Clock;
use crate::error::{ConfigError, SourceError};
use crate::params::PipelineConfig;
use crate::pipeline::SpectrumPipeline;
use crate::scheduler::{AnimationScheduler, FrameScheduler, TickOutcome};
use crate::sink::SegmentSink;
use crate::source::{
    DefaultSourceFactory, FrameProvider, SourceFactory, SourceKind, SourceRequest, SourceSwitcher,
};

/// A running spectrum display
pub struct Visualizer<C, H, K, F = DefaultSourceFactory> {
    clock: C,
    scheduler: AnimationScheduler<H>,
    sources: SourceSwitcher<F>,
    pipeline: SpectrumPipeline,
    sink: K,
}

impl<C, H, K, F> Visualizer<C, H, K, F>
where
    C: Clock,
    H: FrameScheduler,
    K: SegmentSink,
    F: SourceFactory,
{
    /// Validate `config` and start on the demo source, stopped
    pub fn new(
        config: PipelineConfig,
        clock: C,
        host: H,
        sink: K,
        factory: F,
    ) -> Result<Self, ConfigError> {
        let pipeline = SpectrumPipeline::new(config)?;
        let interval = Duration::from_millis(pipeline.config().update_interval_ms);

        Ok(Self {
            clock,
            scheduler: AnimationScheduler::new(host, interval),
            sources: SourceSwitcher::new(factory),
            pipeline,
            sink,
        })
    }

    pub fn start(&mut self) {
        if !self.scheduler.is_running() {
            info!("[visualizer] started on {}", self.sources.active_kind());
        }
        self.scheduler.start();
    }

    /// Stop ticking. Levels, peaks and segment state are kept for a restart.
    pub fn stop(&mut self) {
        self.scheduler.stop();
    }

    pub fn is_running(&self) -> bool {
        self.scheduler.is_running()
    }

    /// Host display-refresh callback
    pub fn on_display_frame(&mut self) -> TickOutcome {
        let now = self.clock.now();
        let Self {
            scheduler,
            sources,
            pipeline,
            sink,
            ..
        } = self;

        scheduler.on_frame(now, |t| {
            let snapshot = sources.frame_snapshot(t);
            let changes = pipeline.process(snapshot.as_ref(), t);
            sink.apply(&changes);
        })
    }

    /// Switch the active source. On failure Demo is active and the error is returned.
    pub fn switch_source(&mut self, request: SourceRequest) -> Result<SourceKind, SourceError> {
        self.sources.switch_to(request)
    }

    pub fn active_source(&self) -> SourceKind {
        self.sources.active_kind()
    }

    /// Accepted scheduler ticks
    pub fn tick_count(&self) -> u64 {
        self.scheduler.ticks()
    }

    pub fn pipeline(&self) -> &SpectrumPipeline {
        &self.pipeline
    }

    /// Clear retained display state; the next tick redraws everything
    pub fn reset(&mut self) {
        self.pipeline.reset();
    }

    pub fn sink(&self) -> &K {
        &self.sink
    }

    pub fn host_mut(&mut self) -> &mut H {
        self.scheduler.host_mut()
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }
}
