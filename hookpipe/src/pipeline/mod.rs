//! Pipeline orchestration: Pre, Main, Post in fixed order, then one
//! terminal notification.

use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{error, info};
use uuid::Uuid;

use crate::errors::{PipelineError, StageFailure};
use crate::notify::NotificationHub;
use crate::scripts::{
    PipelineRun, ScriptRegistry, Stage, StageExecutor, StatusReport, SUCCEEDED_SCOPE,
};

/// Runs the three-stage script pipeline and reports its terminal state.
///
/// Execution is decoupled from its trigger: [`PipelineRunner::execute`]
/// returns a join handle immediately, and the only record of the run's
/// outcome an unrelated caller sees is the emitted notification (and logs).
/// Callers that do hold the handle can await the full [`PipelineRun`].
#[derive(Debug, Clone)]
pub struct PipelineRunner {
    scripts: Arc<ScriptRegistry>,
    hub: Arc<NotificationHub>,
    executor: StageExecutor,
}

impl PipelineRunner {
    /// Creates a runner over a script registry and a notification hub.
    #[must_use]
    pub fn new(scripts: Arc<ScriptRegistry>, hub: Arc<NotificationHub>) -> Self {
        Self {
            scripts,
            hub,
            executor: StageExecutor::new(),
        }
    }

    /// Replaces the stage executor.
    #[must_use]
    pub fn with_executor(mut self, executor: StageExecutor) -> Self {
        self.executor = executor;
        self
    }

    /// Starts a pipeline run as a detached task.
    ///
    /// Fails fast with [`PipelineError::NoMainScript`] before anything runs
    /// when no main script is registered. A missing `id` gets a fresh UUID.
    /// The extra `args` are forwarded to every script, after its path.
    ///
    /// # Errors
    ///
    /// Only the fail-fast configuration error; stage failures are recorded
    /// on the returned run and reported through the hub, never here.
    pub fn execute(
        &self,
        id: Option<String>,
        args: Vec<String>,
    ) -> Result<JoinHandle<PipelineRun>, PipelineError> {
        if !self.scripts.has_main() {
            return Err(PipelineError::NoMainScript);
        }
        let id = id
            .filter(|id| !id.is_empty())
            .unwrap_or_else(|| Uuid::new_v4().to_string());
        let scripts = Arc::clone(&self.scripts);
        let hub = Arc::clone(&self.hub);
        let executor = self.executor.clone();
        Ok(tokio::spawn(run_pipeline(scripts, hub, executor, id, args)))
    }
}

/// The detached pipeline body: stages in order, abort on first failure,
/// one terminal notification either way.
async fn run_pipeline(
    scripts: Arc<ScriptRegistry>,
    hub: Arc<NotificationHub>,
    executor: StageExecutor,
    id: String,
    args: Vec<String>,
) -> PipelineRun {
    info!(id = %id, "pipeline started");
    let mut run = PipelineRun::new();
    for stage in Stage::ORDER {
        let list = scripts.scripts(stage);
        info!(id = %id, stage = %stage, scripts = list.len(), "stage started");
        let stage_run = executor.run_stage(&list, &args).await;
        run.outputs.extend(stage_run.outputs);
        if let Some(err) = stage_run.error {
            let failure = StageFailure::new(stage, err);
            error!(id = %id, stage = %stage, code = failure.code, error = %failure.source, "stage failed");
            run.failure = Some(failure);
            break;
        }
    }

    let scope = run
        .failure
        .as_ref()
        .map_or(SUCCEEDED_SCOPE, |failure| failure.stage.failure_scope());
    let report = StatusReport::from_run(&id, &run);
    // Delivery is awaited so the handle resolves to a settled world; the
    // hub logs failures, nothing propagates from here.
    let _ = hub.send(&report, scope).await;

    info!(id = %id, success = run.is_success(), "pipeline finished");
    run
}
