//! Per-script outcomes and the aggregate status report sent to subscribers.

use serde::{Deserialize, Serialize};

use crate::errors::StageFailure;

/// Terminal status of a single script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScriptStatus {
    /// The script exited with status zero.
    Succeeded,
    /// The script exited non-zero or failed to start.
    Failed,
}

/// The recorded outcome of one script execution.
///
/// Field names (`script`, `error`, `status`, `log`) are part of the
/// notification contract and must not change.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptOutput {
    /// Script identifier (the file name, without its folder).
    pub script: String,
    /// Failure detail; empty on success.
    pub error: String,
    /// Terminal status.
    pub status: ScriptStatus,
    /// Captured standard output, verbatim.
    pub log: String,
}

impl ScriptOutput {
    /// Records a successful script run.
    #[must_use]
    pub fn succeeded(script: impl Into<String>, log: impl Into<String>) -> Self {
        Self {
            script: script.into(),
            error: String::new(),
            status: ScriptStatus::Succeeded,
            log: log.into(),
        }
    }

    /// Records a failed script run.
    #[must_use]
    pub fn failed(
        script: impl Into<String>,
        log: impl Into<String>,
        error: impl Into<String>,
    ) -> Self {
        Self {
            script: script.into(),
            error: error.into(),
            status: ScriptStatus::Failed,
            log: log.into(),
        }
    }
}

/// The ordered record of one pipeline run.
///
/// Outputs are append-only and kept in execution order. The run is built
/// while the pipeline executes, reported to subscribers, then discarded;
/// nothing is persisted.
#[derive(Debug, Default)]
pub struct PipelineRun {
    /// One entry per executed script, in execution order.
    pub outputs: Vec<ScriptOutput>,
    /// The stage failure that terminated the run, if any.
    pub failure: Option<StageFailure>,
}

impl PipelineRun {
    /// Creates an empty run.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if every stage completed without failure.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.failure.is_none()
    }
}

/// The aggregate notification payload for one pipeline terminal event.
///
/// Serialized with serde rather than hand-assembled, so logs containing
/// quotes or braces stay parseable. The per-script field names match the
/// historical contract.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// True when the whole pipeline succeeded.
    pub success: bool,
    /// Correlation id for the triggering request.
    pub id: String,
    /// Top-level failure description, absent on success.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// One entry per executed script.
    pub outputs: Vec<ScriptOutput>,
}

impl StatusReport {
    /// Builds the report for a finished run.
    #[must_use]
    pub fn from_run(id: impl Into<String>, run: &PipelineRun) -> Self {
        Self {
            success: run.is_success(),
            id: id.into(),
            error: run
                .failure
                .as_ref()
                .map(|failure| format!("{failure}: {}", failure.source)),
            outputs: run.outputs.clone(),
        }
    }
}
