//! Spectrabar - segmented spectrum bars driven by live or synthetic audio

pub mod cli;
pub mod clock;
pub mod error;
pub mod mapper;
pub mod params;
pub mod peak;
pub mod pipeline;
pub mod scheduler;
pub mod segments;
pub mod sink;
pub mod smoothing;
pub mod source;
pub mod visualizer;
