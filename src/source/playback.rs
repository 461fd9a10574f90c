//! WAV file playback analysed in step with the display clock.
//!
//! The whole file is decoded to mono on activation. Each frame request maps
//! the elapsed time since the first request to a playhead and analyses the
//! `fft_size` samples ending there.

use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::info;

use super::{FrameProvider, FrameSnapshot, SignalSource, SourceKind, SpectrumAnalyzer};
use crate::error::SourceError;
use crate::params::AnalysisConfig;

pub struct FilePlayback {
    path: PathBuf,
    looping: bool,
    analysis: AnalysisConfig,
    session: Option<PlaybackSession>,
}

struct PlaybackSession {
    samples: Vec<f32>,
    sample_rate: f32,
    analyzer: SpectrumAnalyzer,
    window: Vec<f32>,
    /// Clock time of the first frame request
    started_at: Option<Duration>,
    reported_end: bool,
}

impl FilePlayback {
    pub fn new(path: PathBuf, looping: bool, analysis: AnalysisConfig) -> Self {
        Self {
            path,
            looping,
            analysis,
            session: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Decoded length, once active
    pub fn duration(&self) -> Option<Duration> {
        self.session.as_ref().map(|session| {
            Duration::from_secs_f64(session.samples.len() as f64 / session.sample_rate as f64)
        })
    }
}

impl FrameProvider for FilePlayback {
    fn frame_snapshot(&mut self, t: Duration) -> Option<FrameSnapshot> {
        let looping = self.looping;
        let session = self.session.as_mut()?;
        let size = session.analyzer.config().fft_size;

        let started_at = *session.started_at.get_or_insert(t);
        let elapsed = t.saturating_sub(started_at).as_secs_f64();
        let playhead = (elapsed * session.sample_rate as f64) as usize;
        let len = session.samples.len();

        if len == 0 || (!looping && playhead >= len) {
            if !session.reported_end {
                session.reported_end = true;
                info!("[playback] end of file, holding silence");
            }
            return Some(FrameSnapshot::silent(
                session.analyzer.config().bin_count(),
                session.sample_rate,
            ));
        }

        let end = if looping { playhead % len } else { playhead };
        fill_window(&session.samples, end, size, looping && playhead >= len, &mut session.window);
        Some(session.analyzer.analyze(&session.window, session.sample_rate))
    }
}

impl SignalSource for FilePlayback {
    fn kind(&self) -> SourceKind {
        SourceKind::FilePlayback
    }

    fn activate(&mut self) -> Result<(), SourceError> {
        if self.session.is_some() {
            return Ok(());
        }

        let analyzer = SpectrumAnalyzer::new(self.analysis.clone())?;
        let (samples, sample_rate) = decode_mono(&self.path)?;
        info!(
            "[playback] {} @ {}Hz, {:.1}s{}",
            self.path.display(),
            sample_rate,
            samples.len() as f32 / sample_rate,
            if self.looping { ", looping" } else { "" }
        );

        self.session = Some(PlaybackSession {
            samples,
            sample_rate,
            window: Vec::with_capacity(analyzer.config().fft_size),
            analyzer,
            started_at: None,
            reported_end: false,
        });
        Ok(())
    }

    fn release(&mut self) {
        if self.session.take().is_some() {
            info!("[playback] {} closed", self.path.display());
        }
    }

    fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

/// Decode a WAV file into normalised mono samples
fn decode_mono(path: &Path) -> Result<(Vec<f32>, f32), SourceError> {
    let mut reader = hound::WavReader::open(path)?;
    let spec = reader.spec();
    let channels = spec.channels.max(1) as usize;

    let interleaved: Vec<f32> = match spec.sample_format {
        hound::SampleFormat::Float => reader.samples::<f32>().collect::<Result<_, _>>()?,
        hound::SampleFormat::Int => {
            let scale = 1.0 / (1i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .samples::<i32>()
                .map(|sample| sample.map(|s| s as f32 * scale))
                .collect::<Result<_, _>>()?
        }
    };

    let mono = interleaved
        .chunks_exact(channels)
        .map(|frame| frame.iter().sum::<f32>() / channels as f32)
        .collect();

    Ok((mono, spec.sample_rate as f32))
}

/// Fill `window` with the `size` samples ending at `end`.
///
/// Samples before the file start are silence, or the file tail when `wrap`.
fn fill_window(samples: &[f32], end: usize, size: usize, wrap: bool, window: &mut Vec<f32>) {
    let len = samples.len() as isize;
    window.clear();
    window.extend((0..size).map(|i| {
        let index = end as isize - size as isize + i as isize;
        if index >= 0 {
            samples[index as usize]
        } else if wrap {
            samples[index.rem_euclid(len) as usize]
        } else {
            0.0
        }
    }));
}
