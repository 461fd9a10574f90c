//! Parameter definitions with units and documented semantics.
//!
//! Every tunable of the spectrum pipeline lives here:
//! - Units in the field names (`_ms`, `_hz`, `_db`)
//! - Defaults in `Default` impls, never in the pipeline logic
//! - `validate()` before anything is constructed from them

mod analysis;
mod pipeline;
mod settings;

pub use analysis::AnalysisConfig;
pub use pipeline::{ColorZones, DemoSynthesis, PipelineConfig};
pub use settings::Settings;
