//! # Hookpipe
//!
//! A staged script pipeline with scope-filtered webhook fan-out.
//!
//! Hookpipe runs operator-supplied executable scripts in three ordered
//! stages (pre, main, post), aborting on the first failure, and publishes
//! the terminal outcome to registered subscribers over pluggable transports:
//!
//! - **Staged execution**: scripts run strictly in registration order,
//!   stages strictly Pre → Main → Post, nothing after the first failure
//! - **Decoupled triggering**: a run is a detached task; the trigger gets a
//!   join handle, observers get a notification
//! - **Scope-filtered fan-out**: subscribers declare a regex scope pattern
//!   (`*` for everything) and receive only matching event categories
//! - **Pluggable transports**: HTTP(S) built in, Kafka behind the `rdkafka`
//!   feature, any scheme registrable without touching the dispatcher
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hookpipe::prelude::*;
//! use std::sync::Arc;
//!
//! let scripts = Arc::new(ScriptRegistry::new());
//! let hub = Arc::new(NotificationHub::with_default_providers());
//!
//! Config::from_file("/etc/hookpipe/config.yaml")?.apply(&scripts, &hub)?;
//!
//! let runner = PipelineRunner::new(scripts, hub);
//! let handle = runner.execute(None, vec!["values.yaml".into()])?;
//! let run = handle.await?;
//! ```

#![forbid(unsafe_code)]
#![warn(
    clippy::all,
    clippy::pedantic,
    missing_docs,
    rust_2018_idioms
)]
#![allow(
    clippy::module_name_repetitions,
    clippy::must_use_candidate,
    clippy::missing_errors_doc,
    clippy::missing_panics_doc
)]

pub mod config;
pub mod errors;
pub mod notify;
pub mod pipeline;
pub mod scripts;
pub mod testing;

/// Initializes a process-wide tracing subscriber honoring `RUST_LOG`.
///
/// Opt-in convenience for binaries; embedding applications that configure
/// their own subscriber should skip it. Calling it twice is harmless.
pub fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::config::{Config, HookConfig};
    pub use crate::errors::{
        ConfigError, NotifyError, PipelineError, ScriptError, StageFailure,
    };
    pub use crate::notify::{
        BackoffStrategy, HttpProvider, JitterStrategy, KafkaProvider, KafkaPublisher,
        KafkaTarget, NotificationHub, Provider, RetryPolicy, ScopePattern, Subscriber,
    };
    pub use crate::pipeline::PipelineRunner;
    pub use crate::scripts::{
        PipelineRun, ScriptOutput, ScriptRegistry, ScriptStatus, Stage, StageExecutor,
        StageRun, StatusReport, SUCCEEDED_SCOPE,
    };
}
