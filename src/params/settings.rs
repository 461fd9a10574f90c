//! On-disk settings file: pipeline and analysis sections in one JSON document.

use serde::{Deserialize, Serialize};

use super::{AnalysisConfig, PipelineConfig};
use crate::error::ConfigError;

/// Everything a settings file can carry. Missing sections and fields use defaults.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub pipeline: PipelineConfig,
    pub analysis: AnalysisConfig,
}

impl Settings {
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.pipeline.validate()?;
        self.analysis.validate()
    }
}
