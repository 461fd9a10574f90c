//! Live microphone / line-in capture through cpal.

use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{FromSample, Sample, SampleFormat, SizedSample};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tracing::{debug, error, info};

use super::{FrameProvider, FrameSnapshot, SignalSource, SourceKind, SpectrumAnalyzer};
use crate::error::SourceError;
use crate::params::AnalysisConfig;

/// Mono sample ring shared with the cpal callback
type SharedSamples = Arc<Mutex<VecDeque<f32>>>;

/// Names of all input devices on the default host
pub fn list_input_devices() -> Result<Vec<String>, SourceError> {
    let host = cpal::default_host();
    let devices = host
        .input_devices()
        .map_err(|e| SourceError::DeviceUnavailable(e.to_string()))?;

    Ok(devices.filter_map(|device| device.name().ok()).collect())
}

/// Input stream analysed on demand, one FFT per requested frame
pub struct LiveCapture {
    device_name: Option<String>,
    analysis: AnalysisConfig,
    session: Option<CaptureSession>,
}

/// Everything that only exists while the device is open
struct CaptureSession {
    /// Dropping the stream closes the device
    stream: cpal::Stream,
    samples: SharedSamples,
    sample_rate: f32,
    analyzer: SpectrumAnalyzer,
    window: Vec<f32>,
}

impl LiveCapture {
    /// `device_name` selects an input by name; `None` uses the host default
    pub fn new(device_name: Option<String>, analysis: AnalysisConfig) -> Self {
        Self {
            device_name,
            analysis,
            session: None,
        }
    }

    fn open(&self) -> Result<CaptureSession, SourceError> {
        let analyzer = SpectrumAnalyzer::new(self.analysis.clone())?;

        let host = cpal::default_host();
        let device = match &self.device_name {
            Some(name) => host
                .input_devices()
                .map_err(|e| SourceError::DeviceUnavailable(e.to_string()))?
                .find(|device| device.name().map(|n| &n == name).unwrap_or(false))
                .ok_or_else(|| {
                    SourceError::DeviceUnavailable(format!("no input device named {:?}", name))
                })?,
            None => host
                .default_input_device()
                .ok_or_else(|| SourceError::DeviceUnavailable("no default input device".into()))?,
        };

        let supported = device.default_input_config()?;
        let config: cpal::StreamConfig = supported.config();
        let sample_rate = config.sample_rate.0 as f32;

        info!(
            "[capture] {} @ {}Hz, {} channel(s), {:?}",
            device.name().unwrap_or_else(|_| "Unknown".to_string()),
            config.sample_rate.0,
            config.channels,
            supported.sample_format()
        );

        let capacity = self.analysis.fft_size * self.analysis.capture_windows.max(1);
        let samples: SharedSamples = Arc::new(Mutex::new(VecDeque::with_capacity(capacity)));

        let stream = match supported.sample_format() {
            SampleFormat::F32 => build_stream::<f32>(&device, &config, samples.clone(), capacity),
            SampleFormat::I16 => build_stream::<i16>(&device, &config, samples.clone(), capacity),
            SampleFormat::U16 => build_stream::<u16>(&device, &config, samples.clone(), capacity),
            other => {
                return Err(SourceError::Stream(format!(
                    "unsupported sample format: {}",
                    other
                )))
            }
        }
        .map_err(classify_build_error)?;

        stream.play()?;

        Ok(CaptureSession {
            stream,
            samples,
            sample_rate,
            window: Vec::with_capacity(analyzer.config().fft_size),
            analyzer,
        })
    }
}

impl FrameProvider for LiveCapture {
    fn frame_snapshot(&mut self, _t: Duration) -> Option<FrameSnapshot> {
        let session = self.session.as_mut()?;
        let size = session.analyzer.config().fft_size;

        {
            let buffer = session.samples.lock().ok()?;
            if !latest_window(&buffer, size, &mut session.window) {
                return None;
            }
        }

        Some(session.analyzer.analyze(&session.window, session.sample_rate))
    }
}

impl SignalSource for LiveCapture {
    fn kind(&self) -> SourceKind {
        SourceKind::LiveCapture
    }

    fn activate(&mut self) -> Result<(), SourceError> {
        if self.session.is_none() {
            self.session = Some(self.open()?);
        }
        Ok(())
    }

    fn release(&mut self) {
        if let Some(session) = self.session.take() {
            if let Err(err) = session.stream.pause() {
                debug!("[capture] pause on release failed: {}", err);
            }
            info!("[capture] input stream closed");
        }
    }

    fn is_active(&self) -> bool {
        self.session.is_some()
    }
}

impl Drop for LiveCapture {
    fn drop(&mut self) {
        self.release();
    }
}

fn build_stream<T>(
    device: &cpal::Device,
    config: &cpal::StreamConfig,
    samples: SharedSamples,
    capacity: usize,
) -> Result<cpal::Stream, cpal::BuildStreamError>
where
    T: SizedSample,
    f32: FromSample<T>,
{
    let channels = config.channels as usize;
    device.build_input_stream(
        config,
        move |data: &[T], _: &cpal::InputCallbackInfo| {
            if let Ok(mut buffer) = samples.lock() {
                push_mono(&mut buffer, data, channels, capacity);
            }
        },
        |err| error!("[capture] stream error: {}", err),
        None,
    )
}

/// Backends report a denied microphone as a generic backend error
fn classify_build_error(err: cpal::BuildStreamError) -> SourceError {
    let message = err.to_string();
    let lowered = message.to_lowercase();
    if lowered.contains("permission") || lowered.contains("denied") {
        SourceError::PermissionDenied(message)
    } else {
        SourceError::from(err)
    }
}

/// Average interleaved frames down to mono and keep at most `capacity` samples
fn push_mono<T>(buffer: &mut VecDeque<f32>, data: &[T], channels: usize, capacity: usize)
where
    T: Sample,
    f32: FromSample<T>,
{
    let channels = channels.max(1);
    for frame in data.chunks_exact(channels) {
        let sum: f32 = frame.iter().map(|&s| s.to_sample::<f32>()).sum();
        buffer.push_back(sum / channels as f32);
    }

    let excess = buffer.len().saturating_sub(capacity);
    buffer.drain(..excess);
}

/// Copy the newest `size` samples into `window`; false until that many exist
fn latest_window(buffer: &VecDeque<f32>, size: usize, window: &mut Vec<f32>) -> bool {
    if buffer.len() < size {
        return false;
    }
    window.clear();
    window.extend(buffer.iter().skip(buffer.len() - size));
    true
}
