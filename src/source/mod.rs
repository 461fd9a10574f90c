//! Signal sources and the single-active-source switcher.
//!
//! Exactly one source feeds the pipeline at a time. Demo is the always
//! available fallback; live capture and file playback hold exclusive
//! resources that are released before anything else is activated.

mod analyzer;
mod capture;
mod playback;
mod snapshot;

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use tracing::{info, warn};

use crate::error::SourceError;
use crate::params::AnalysisConfig;

pub use analyzer::SpectrumAnalyzer;
pub use capture::{list_input_devices, LiveCapture};
pub use playback::FilePlayback;
pub use snapshot::FrameSnapshot;

/// Supplies one magnitude snapshot per frame
pub trait FrameProvider {
    /// Snapshot for time `t`, `None` when nothing live is ready
    fn frame_snapshot(&mut self, t: Duration) -> Option<FrameSnapshot>;
}

/// A frame provider with an explicit activate/release lifecycle
pub trait SignalSource: FrameProvider {
    fn kind(&self) -> SourceKind;

    /// Open exclusive resources (device, decoder). May fail.
    fn activate(&mut self) -> Result<(), SourceError>;

    /// Close exclusive resources. Idempotent.
    fn release(&mut self);

    fn is_active(&self) -> bool;
}

/// Which variant is feeding the pipeline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    Demo,
    LiveCapture,
    FilePlayback,
}

impl fmt::Display for SourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceKind::Demo => write!(f, "demo"),
            SourceKind::LiveCapture => write!(f, "live capture"),
            SourceKind::FilePlayback => write!(f, "file playback"),
        }
    }
}

/// Request to switch the active source
#[derive(Debug, Clone, PartialEq)]
pub enum SourceRequest {
    Demo,
    /// Capture from the named input device, or the host default
    LiveCapture { device: Option<String> },
    /// Analyse a WAV file in step with the clock
    FilePlayback { path: PathBuf, looping: bool },
}

impl SourceRequest {
    pub fn kind(&self) -> SourceKind {
        match self {
            SourceRequest::Demo => SourceKind::Demo,
            SourceRequest::LiveCapture { .. } => SourceKind::LiveCapture,
            SourceRequest::FilePlayback { .. } => SourceKind::FilePlayback,
        }
    }
}

/// Fallback source: never has a snapshot, so the mapper synthesizes one
#[derive(Debug, Default, Clone, Copy)]
pub struct DemoSource;

impl FrameProvider for DemoSource {
    fn frame_snapshot(&mut self, _t: Duration) -> Option<FrameSnapshot> {
        None
    }
}

impl SignalSource for DemoSource {
    fn kind(&self) -> SourceKind {
        SourceKind::Demo
    }

    fn activate(&mut self) -> Result<(), SourceError> {
        Ok(())
    }

    fn release(&mut self) {}

    fn is_active(&self) -> bool {
        true
    }
}

/// Builds (but does not activate) sources for requests
pub trait SourceFactory {
    fn create(&mut self, request: &SourceRequest) -> Box<dyn SignalSource>;
}

/// Factory for the real cpal and hound backed sources
#[derive(Debug, Clone, Default)]
pub struct DefaultSourceFactory {
    analysis: AnalysisConfig,
}

impl DefaultSourceFactory {
    pub fn new(analysis: AnalysisConfig) -> Self {
        Self { analysis }
    }
}

impl SourceFactory for DefaultSourceFactory {
    fn create(&mut self, request: &SourceRequest) -> Box<dyn SignalSource> {
        match request {
            SourceRequest::Demo => Box::new(DemoSource),
            SourceRequest::LiveCapture { device } => {
                Box::new(LiveCapture::new(device.clone(), self.analysis.clone()))
            }
            SourceRequest::FilePlayback { path, looping } => Box::new(FilePlayback::new(
                path.clone(),
                *looping,
                self.analysis.clone(),
            )),
        }
    }
}

/// Owns the one active source and performs release-then-activate switches
pub struct SourceSwitcher<F = DefaultSourceFactory> {
    factory: F,
    active: Box<dyn SignalSource>,
}

impl<F: SourceFactory> SourceSwitcher<F> {
    /// Starts on Demo
    pub fn new(factory: F) -> Self {
        Self {
            factory,
            active: Box::new(DemoSource),
        }
    }

    pub fn active_kind(&self) -> SourceKind {
        self.active.kind()
    }

    /// Release the active source, then try to activate the requested one.
    ///
    /// On failure the half-opened candidate is released, Demo stays active
    /// and the error is returned for reporting.
    pub fn switch_to(&mut self, request: SourceRequest) -> Result<SourceKind, SourceError> {
        let previous = self.active.kind();
        self.active.release();
        self.active = Box::new(DemoSource);

        if request == SourceRequest::Demo {
            info!("[source] {} -> demo", previous);
            return Ok(SourceKind::Demo);
        }

        let mut candidate = self.factory.create(&request);
        match candidate.activate() {
            Ok(()) => {
                let kind = candidate.kind();
                info!("[source] {} -> {}", previous, kind);
                self.active = candidate;
                Ok(kind)
            }
            Err(err) => {
                candidate.release();
                warn!(
                    "[source] failed to activate {}: {}; falling back to demo",
                    request.kind(),
                    err
                );
                Err(err)
            }
        }
    }

    /// Release whatever is active and fall back to Demo
    pub fn release(&mut self) {
        self.active.release();
        self.active = Box::new(DemoSource);
    }
}

impl<F> FrameProvider for SourceSwitcher<F> {
    fn frame_snapshot(&mut self, t: Duration) -> Option<FrameSnapshot> {
        self.active.frame_snapshot(t)
    }
}

impl<F> Drop for SourceSwitcher<F> {
    fn drop(&mut self) {
        self.active.release();
    }
}


#[cfg(test)]
mod tests {
    use super::testing::MockFactory;
    use super::*;

    fn capture() -> SourceRequest {
        SourceRequest::LiveCapture { device: None }
    }

    fn file() -> SourceRequest {
        SourceRequest::FilePlayback {
            path: PathBuf::from("song.wav"),
            looping: false,
        }
    }

    #[test]
    fn test_starts_on_demo_without_snapshots() {
        let mut switcher = SourceSwitcher::new(MockFactory::default());
        assert_eq!(switcher.active_kind(), SourceKind::Demo);
        assert_eq!(switcher.frame_snapshot(Duration::ZERO), None);
    }

    #[test]
    fn test_switch_releases_previous_source() {
        let factory = MockFactory::default();
        let counter = factory.counter.clone();
        let mut switcher = SourceSwitcher::new(factory);

        assert_eq!(switcher.switch_to(capture()).unwrap(), SourceKind::LiveCapture);
        assert_eq!(counter.open(), 1);

        assert_eq!(switcher.switch_to(file()).unwrap(), SourceKind::FilePlayback);
        assert_eq!(counter.open(), 1);
        assert_eq!(counter.max_open(), 1);

        switcher.switch_to(SourceRequest::Demo).unwrap();
        assert_eq!(counter.open(), 0);
    }

    #[test]
    fn test_failed_activation_falls_back_to_demo() {
        let factory = MockFactory {
            deny_capture: true,
            ..MockFactory::default()
        };
        let counter = factory.counter.clone();
        let mut switcher = SourceSwitcher::new(factory);

        switcher.switch_to(file()).unwrap();
        let err = switcher.switch_to(capture()).unwrap_err();

        assert!(matches!(err, SourceError::PermissionDenied(_)));
        assert_eq!(switcher.active_kind(), SourceKind::Demo);
        assert_eq!(switcher.frame_snapshot(Duration::ZERO), None);
        // Both the old file source and the half-opened capture are closed
        assert_eq!(counter.open(), 0);
        assert_eq!(counter.max_open(), 1);
    }

    #[test]
    fn test_drop_releases_active_source() {
        let factory = MockFactory::default();
        let counter = factory.counter.clone();
        {
            let mut switcher = SourceSwitcher::new(factory);
            switcher.switch_to(capture()).unwrap();
            assert_eq!(counter.open(), 1);
        }
        assert_eq!(counter.open(), 0);
    }

    #[test]
    fn test_demo_source_has_no_snapshot() {
        let mut demo = DemoSource;
        assert!(demo.activate().is_ok());
        assert_eq!(demo.frame_snapshot(Duration::from_secs(3)), None);
        assert_eq!(demo.kind(), SourceKind::Demo);
    }
}
