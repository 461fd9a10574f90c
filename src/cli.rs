//! Command-line argument parsing.

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{info, warn};

use crate::params::{ColorZones, Settings};
use crate::source::SourceRequest;

/// Command line arguments
#[derive(Parser, Debug)]
#[command(name = "spectrabar")]
#[command(about = "Segmented spectrum bars for live, file or synthetic audio", long_about = None)]
pub struct Args {
    /// Signal source: demo (default), mic, file
    #[arg(long, value_name = "SOURCE", default_value = "demo")]
    pub source: String,

    /// WAV file to analyse with the file source
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Input device name for the mic source (host default when omitted)
    #[arg(long, value_name = "NAME")]
    pub device: Option<String>,

    /// Restart the file when it ends
    #[arg(long = "loop")]
    pub looping: bool,

    /// JSON settings file with optional "pipeline" and "analysis" sections
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Number of bars (resamples the band table over the same range)
    #[arg(long, value_name = "N")]
    pub bands: Option<usize>,

    /// Segments per bar (color zones scale along)
    #[arg(long, value_name = "N")]
    pub segments: Option<usize>,

    /// Minimum milliseconds between pipeline passes
    #[arg(long, value_name = "MS")]
    pub interval_ms: Option<u64>,

    /// FFT window size for mic and file analysis
    #[arg(long, value_name = "N")]
    pub fft_size: Option<usize>,

    /// Stop after this many seconds
    #[arg(long, value_name = "SECONDS")]
    pub duration: Option<f32>,

    /// Print input device names and exit
    #[arg(long)]
    pub list_devices: bool,

    /// Print the effective settings as JSON and exit
    #[arg(long)]
    pub print_config: bool,
}

impl Args {
    /// Load the settings file (or defaults), apply flag overrides and validate
    pub fn settings(&self) -> Result<Settings> {
        let mut settings = match &self.config {
            Some(path) => {
                let text = std::fs::read_to_string(path)
                    .with_context(|| format!("failed to read settings {}", path.display()))?;
                let settings = Settings::from_json(&text)
                    .with_context(|| format!("failed to parse settings {}", path.display()))?;
                info!("[cli] settings loaded from {}", path.display());
                settings
            }
            None => Settings::default(),
        };

        if let Some(bands) = self.bands {
            settings.pipeline.resample_bands(bands);
        }
        if let Some(segments) = self.segments {
            settings.pipeline.segment_count = segments;
            settings.pipeline.color_zones = ColorZones::scaled_to(segments);
        }
        if let Some(interval_ms) = self.interval_ms {
            settings.pipeline.update_interval_ms = interval_ms;
        }
        if let Some(fft_size) = self.fft_size {
            settings.analysis.fft_size = fft_size;
        }

        settings.validate().context("invalid settings")?;
        Ok(settings)
    }

    /// Parse the requested source from command-line arguments
    pub fn source_request(&self) -> Result<SourceRequest> {
        match self.source.to_lowercase().as_str() {
            "demo" => Ok(SourceRequest::Demo),
            "mic" | "live" => Ok(SourceRequest::LiveCapture {
                device: self.device.clone(),
            }),
            "file" => match &self.file {
                Some(path) => Ok(SourceRequest::FilePlayback {
                    path: path.clone(),
                    looping: self.looping,
                }),
                None => bail!("--source file needs --file <PATH>"),
            },
            other => {
                warn!("[cli] unknown source '{}', using demo", other);
                Ok(SourceRequest::Demo)
            }
        }
    }

    /// Run time limit, if any
    pub fn run_limit(&self) -> Result<Option<Duration>> {
        self.duration
            .map(|seconds| {
                Duration::try_from_secs_f32(seconds)
                    .with_context(|| format!("invalid --duration {}", seconds))
            })
            .transpose()
    }
}
