//! Error types for configuration and signal sources.

use std::fmt;

/// Rejected pipeline configuration
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// `band_count` must be at least 1
    ZeroBandCount,

    /// `segment_count` must be at least 1
    ZeroSegmentCount,

    /// `smoothing_alpha` outside `[0, 1]` (or NaN)
    SmoothingAlphaOutOfRange(f32),

    /// `peak_decay_step` negative or not finite
    InvalidPeakDecayStep(f32),

    /// Boundary table must hold `band_count + 1` edges
    BandEdgeCount { expected: usize, actual: usize },

    /// Gain table must hold `band_count` gains
    BandGainCount { expected: usize, actual: usize },

    /// Edge at `index` is negative, not finite, or not above its predecessor
    NonMonotonicBandEdges { index: usize },

    /// Gain at `index` is negative or not finite
    InvalidBandGain { index: usize, gain: f32 },

    /// `mid_from` must not exceed `high_from`
    ColorZonesOutOfOrder { mid_from: usize, high_from: usize },

    /// FFT window size must be a power of two and at least 32
    InvalidFftSize(usize),

    /// `min_db` must be strictly below `max_db`
    InvalidDbRange { min_db: f32, max_db: f32 },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ZeroBandCount => write!(f, "band count must be > 0"),
            ConfigError::ZeroSegmentCount => write!(f, "segment count must be > 0"),
            ConfigError::SmoothingAlphaOutOfRange(alpha) => {
                write!(f, "smoothing alpha must be within [0, 1], got {}", alpha)
            }
            ConfigError::InvalidPeakDecayStep(step) => {
                write!(f, "peak decay step must be finite and >= 0, got {}", step)
            }
            ConfigError::BandEdgeCount { expected, actual } => write!(
                f,
                "band boundary table needs {} edges, got {}",
                expected, actual
            ),
            ConfigError::BandGainCount { expected, actual } => {
                write!(f, "band gain table needs {} gains, got {}", expected, actual)
            }
            ConfigError::NonMonotonicBandEdges { index } => write!(
                f,
                "band edge {} is not a finite value above the previous edge",
                index
            ),
            ConfigError::InvalidBandGain { index, gain } => {
                write!(f, "band {} gain must be finite and >= 0, got {}", index, gain)
            }
            ConfigError::ColorZonesOutOfOrder {
                mid_from,
                high_from,
            } => write!(
                f,
                "mid zone threshold {} exceeds high zone threshold {}",
                mid_from, high_from
            ),
            ConfigError::InvalidFftSize(size) => {
                write!(f, "FFT size must be a power of 2 >= 32, got {}", size)
            }
            ConfigError::InvalidDbRange { min_db, max_db } => {
                write!(f, "min dB {} must be below max dB {}", min_db, max_db)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Recoverable failure while activating or running a signal source
#[derive(Debug)]
pub enum SourceError {
    /// The platform refused access to the capture device
    PermissionDenied(String),

    /// No device matched, or the device vanished
    DeviceUnavailable(String),

    /// Stream could not be built or started (device busy, unsupported format)
    Stream(String),

    /// Media could not be decoded
    Decode(String),

    /// Filesystem failure while opening media
    Io(std::io::Error),

    /// Analysis settings rejected before the source was opened
    Config(ConfigError),
}

impl fmt::Display for SourceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceError::PermissionDenied(msg) => write!(f, "permission denied: {}", msg),
            SourceError::DeviceUnavailable(msg) => write!(f, "device unavailable: {}", msg),
            SourceError::Stream(msg) => write!(f, "audio stream failure: {}", msg),
            SourceError::Decode(msg) => write!(f, "decode failure: {}", msg),
            SourceError::Io(err) => write!(f, "io error: {}", err),
            SourceError::Config(err) => write!(f, "invalid analysis config: {}", err),
        }
    }
}

impl std::error::Error for SourceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SourceError::Io(err) => Some(err),
            SourceError::Config(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SourceError {
    fn from(err: std::io::Error) -> Self {
        SourceError::Io(err)
    }
}

impl From<ConfigError> for SourceError {
    fn from(err: ConfigError) -> Self {
        SourceError::Config(err)
    }
}

impl From<hound::Error> for SourceError {
    fn from(err: hound::Error) -> Self {
        match err {
            hound::Error::IoError(io) => SourceError::Io(io),
            other => SourceError::Decode(other.to_string()),
        }
    }
}

impl From<cpal::BuildStreamError> for SourceError {
    fn from(err: cpal::BuildStreamError) -> Self {
        match err {
            cpal::BuildStreamError::DeviceNotAvailable => {
                SourceError::DeviceUnavailable(err.to_string())
            }
            other => SourceError::Stream(other.to_string()),
        }
    }
}

impl From<cpal::PlayStreamError> for SourceError {
    fn from(err: cpal::PlayStreamError) -> Self {
        match err {
            cpal::PlayStreamError::DeviceNotAvailable => {
                SourceError::DeviceUnavailable(err.to_string())
            }
            other => SourceError::Stream(other.to_string()),
        }
    }
}

impl From<cpal::DefaultStreamConfigError> for SourceError {
    fn from(err: cpal::DefaultStreamConfigError) -> Self {
        match err {
            cpal::DefaultStreamConfigError::DeviceNotAvailable => {
                SourceError::DeviceUnavailable(err.to_string())
            }
            other => SourceError::Stream(other.to_string()),
        }
    }
}
