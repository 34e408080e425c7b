//! Error types shared across all pipeline stages
//!

use camino::Utf8PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum PipelineError {
    /// A required input artifact was absent when the stage started
    #[error("stage '{stage}': missing required input '{path}'")]
    MissingInput { stage: String, path: Utf8PathBuf },

    /// An external tool invocation failed to launch or returned a non-zero exit status
    #[error("stage '{stage}': {detail}")]
    StageExecution { stage: String, detail: String },

    /// The stage action completed but its declared output artifact is missing or empty,
    /// which is treated as a tool-contract violation
    #[error("stage '{stage}': action completed without producing output '{path}'")]
    MissingArtifact { stage: String, path: Utf8PathBuf },

    /// One or more tasks of a fan-out stage failed
    ///
    /// `failed` lists the failed task labels in launch order, and `source` is the first
    /// failure in that order.
    #[error("stage '{stage}': task(s) failed for: {}", .failed.join(", "))]
    FanOut {
        stage: String,
        failed: Vec<String>,
        #[source]
        source: Box<PipelineError>,
    },
}

impl PipelineError {
    pub fn stage_execution(stage: &str, detail: String) -> Self {
        Self::StageExecution {
            stage: stage.to_string(),
            detail,
        }
    }
}
