//! Error types for the hookpipe crate.
//!
//! Each concern carries its own taxonomy: script execution, pipeline
//! orchestration, notification dispatch and startup configuration.

use std::path::PathBuf;
use thiserror::Error;

use crate::scripts::Stage;

/// Errors produced while running a single script.
#[derive(Debug, Error)]
pub enum ScriptError {
    /// The child process could not be started at all.
    #[error("failed to start script `{script}`: {source}")]
    Spawn {
        /// The script path as invoked.
        script: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The script ran and exited with a non-zero status.
    ///
    /// `code` is `-1` when the process was terminated by a signal.
    #[error("script `{script}` exited with status {code}: {stderr}")]
    Failed {
        /// The script path as invoked.
        script: String,
        /// The process exit code.
        code: i32,
        /// Captured standard error, used as the failure detail.
        stderr: String,
    },
}

impl ScriptError {
    /// Creates a spawn error.
    #[must_use]
    pub fn spawn(script: impl Into<String>, source: std::io::Error) -> Self {
        Self::Spawn {
            script: script.into(),
            source,
        }
    }

    /// Creates a non-zero-exit error.
    #[must_use]
    pub fn failed(script: impl Into<String>, code: i32, stderr: impl Into<String>) -> Self {
        Self::Failed {
            script: script.into(),
            code,
            stderr: stderr.into(),
        }
    }

    /// Returns the script path the error refers to.
    #[must_use]
    pub fn script(&self) -> &str {
        match self {
            Self::Spawn { script, .. } | Self::Failed { script, .. } => script,
        }
    }

    /// Returns the failure detail reported to subscribers.
    ///
    /// Prefers the script's own standard error; falls back to the exec-level
    /// error for scripts that never started.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Spawn { source, .. } => source.to_string(),
            Self::Failed { stderr, .. } => stderr.clone(),
        }
    }
}

/// A stage that aborted, tagged with its stage-specific status code.
#[derive(Debug, Error)]
#[error("{stage} process failed (code {code})")]
pub struct StageFailure {
    /// The stage that failed.
    pub stage: Stage,
    /// Stage-specific status code (550 pre, 551 main, 552 post).
    pub code: u16,
    /// The script error that aborted the stage.
    #[source]
    pub source: ScriptError,
}

impl StageFailure {
    /// Creates a failure for the given stage.
    #[must_use]
    pub fn new(stage: Stage, source: ScriptError) -> Self {
        Self {
            stage,
            code: stage.failure_code(),
            source,
        }
    }
}

/// Errors surfaced by the pipeline orchestrator.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// No main script is registered; the pipeline refuses to start.
    #[error("no main script registered")]
    NoMainScript,

    /// A stage aborted on its first failing script.
    #[error(transparent)]
    Stage(#[from] StageFailure),
}

/// Errors surfaced by the notification hub and its providers.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The endpoint could not be parsed as a URL.
    #[error("invalid endpoint `{url}`: {source}")]
    Parse {
        /// The raw endpoint string.
        url: String,
        /// The underlying parse error.
        #[source]
        source: url::ParseError,
    },

    /// No provider is registered for the endpoint's scheme.
    #[error("provider `{scheme}` not supported")]
    UnsupportedScheme {
        /// The unrecognized scheme.
        scheme: String,
    },

    /// The provider rejected the endpoint at subscribe time.
    #[error("endpoint validation failed: {reason}")]
    Validation {
        /// Why the endpoint was rejected.
        reason: String,
    },

    /// The subscriber's scope pattern is not a valid regex.
    #[error("invalid scope pattern `{pattern}`: {source}")]
    Scope {
        /// The raw scope pattern.
        pattern: String,
        /// The underlying regex error.
        #[source]
        source: regex::Error,
    },

    /// An HTTP delivery failed.
    #[error("http delivery failed: {0}")]
    Http(#[from] reqwest::Error),

    /// A non-HTTP transport failed to deliver the payload.
    #[error("transport failure: {0}")]
    Transport(String),

    /// The payload could not be serialized.
    #[error("payload serialization failed: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl NotifyError {
    /// Creates a validation error.
    #[must_use]
    pub fn validation(reason: impl Into<String>) -> Self {
        Self::Validation {
            reason: reason.into(),
        }
    }

    /// Creates a transport error.
    #[must_use]
    pub fn transport(reason: impl Into<String>) -> Self {
        Self::Transport(reason.into())
    }
}

/// Errors raised while loading and applying the startup configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("failed to read config file `{path}`: {source}")]
    Read {
        /// The configuration file path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// The configuration file is not valid YAML.
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    /// A configured script folder could not be listed.
    #[error("failed to list script folder `{path}`: {source}")]
    Folder {
        /// The folder path.
        path: PathBuf,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// No main script was registered after scanning the configured folders.
    #[error("a main script must be configured")]
    NoMainScript,

    /// A configured hook failed to subscribe; fatal at startup.
    #[error("hook subscription failed: {0}")]
    Subscribe(#[from] NotifyError),
}
