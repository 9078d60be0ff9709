//! Named filter sets: ordered transform pipelines with output settings.

pub mod registry;

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::config::ConfigDiagnostics;
use crate::transform::{Frame, OutputFormat, Step, TransformError, encode};

pub use registry::{FilterRegistry, UnknownFilterSet, init_registry, registry};

fn default_quality() -> u8 {
    85
}

/// A named, ordered pipeline of transform steps plus output encoding
/// settings, declared as a `[[filter]]` table in configuration.
///
/// Step order is significant and preserved exactly as authored; each step's
/// output is the next step's input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterSet {
    /// Unique lookup key.
    pub name: String,

    /// Output quality 0-100 (lossy encoders only).
    #[serde(default = "default_quality")]
    pub quality: u8,

    /// Output format override; defaults to the source format. An explicit
    /// `convert` step inside `steps` wins over this.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub format: Option<OutputFormat>,

    /// Ordered transform steps, applied left-to-right.
    pub steps: Vec<Step>,
}

impl FilterSet {
    /// Run the pipeline over a source file and encode the result.
    pub fn apply_to(&self, source: &Path) -> Result<Vec<u8>, TransformError> {
        let mut frame = Frame::decode(source)?;
        if let Some(format) = self.format {
            frame.encoding.format = format;
        }
        for step in &self.steps {
            frame = step.apply(frame)?;
        }
        encode::encode(&frame, self.quality)
    }

    /// The output format this set will encode to, when knowable without the
    /// source: the last `convert` step, else the set-level override.
    pub fn output_format(&self) -> Option<OutputFormat> {
        self.steps
            .iter()
            .rev()
            .find_map(|step| match step {
                Step::Convert { format, .. } => Some(*format),
                _ => None,
            })
            .or(self.format)
    }

    /// Configuration-time validation; collects into `diag`.
    pub fn validate(&self, diag: &mut ConfigDiagnostics) {
        if self.name.trim().is_empty() {
            diag.error("filter.name", "filter set name must not be empty");
        }
        if self.name.contains(['/', '\\']) {
            diag.error(
                "filter.name",
                format!("`{}`: path separators not allowed", self.name),
            );
        }
        if self.quality > 100 {
            diag.error(
                "filter.quality",
                format!("`{}`: quality must be 0-100, got {}", self.name, self.quality),
            );
        }
        if self.steps.is_empty() {
            diag.error(
                "filter.steps",
                format!("`{}`: at least one step is required", self.name),
            );
        }
        for (i, step) in self.steps.iter().enumerate() {
            if let Err(reason) = step.validate() {
                diag.error(
                    "filter.steps",
                    format!("`{}` step [{i}] ({}): {reason}", self.name, step.name()),
                );
            }
        }
    }
}
