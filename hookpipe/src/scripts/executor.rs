//! Stage execution: runs one ordered script list, aborting on first failure.

use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, error, info};

use super::report::ScriptOutput;
use crate::errors::ScriptError;

/// Result of running one stage's script list.
#[derive(Debug, Default)]
pub struct StageRun {
    /// One output per executed script, in order. Scripts after the first
    /// failure never execute and get no output.
    pub outputs: Vec<ScriptOutput>,
    /// The error that aborted the stage, if any.
    pub error: Option<ScriptError>,
}

/// Runs scripts as external processes through a shell.
///
/// Each script blocks the stage until it finishes; there is no timeout, a
/// hung script stalls its stage. Scripts in earlier positions that already
/// succeeded are never compensated.
#[derive(Debug, Clone)]
pub struct StageExecutor {
    shell: String,
}

impl Default for StageExecutor {
    fn default() -> Self {
        Self {
            shell: "sh".to_string(),
        }
    }
}

impl StageExecutor {
    /// Creates an executor using `sh` as the shell.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an executor using a custom shell binary.
    #[must_use]
    pub fn with_shell(shell: impl Into<String>) -> Self {
        Self {
            shell: shell.into(),
        }
    }

    /// Runs every script in registration order, stopping at the first
    /// failure.
    pub async fn run_stage(&self, scripts: &[PathBuf], args: &[String]) -> StageRun {
        let mut run = StageRun::default();
        for script in scripts {
            info!(script = %script.display(), "run script");
            let name = script_name(script);
            let (stdout, result) = self.run_script(script, args).await;
            match result {
                Ok(()) => {
                    debug!(script = %script.display(), "script succeeded");
                    run.outputs.push(ScriptOutput::succeeded(name, stdout));
                }
                Err(err) => {
                    error!(script = %script.display(), error = %err, "script failed");
                    run.outputs
                        .push(ScriptOutput::failed(name, stdout, err.detail()));
                    run.error = Some(err);
                    break;
                }
            }
        }
        run
    }

    /// Runs one script through the shell, returning whatever stdout was
    /// captured together with the outcome.
    async fn run_script(&self, script: &Path, args: &[String]) -> (String, Result<(), ScriptError>) {
        // The script path comes first, the run's extra arguments after it,
        // rebuilt fresh for every script. Going through the shell lets
        // operators rely on shebangs and PATH resolution.
        let mut command_line = script.display().to_string();
        for arg in args {
            command_line.push(' ');
            command_line.push_str(arg);
        }
        debug!(shell = %self.shell, command = %command_line, "exec");

        let result = Command::new(&self.shell)
            .arg("-c")
            .arg(&command_line)
            .output()
            .await;

        match result {
            Ok(output) => {
                let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
                if output.status.success() {
                    (stdout, Ok(()))
                } else {
                    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
                    let code = output.status.code().unwrap_or(-1);
                    (
                        stdout,
                        Err(ScriptError::failed(
                            script.display().to_string(),
                            code,
                            stderr,
                        )),
                    )
                }
            }
            Err(err) => (
                String::new(),
                Err(ScriptError::spawn(script.display().to_string(), err)),
            ),
        }
    }
}

/// The script identifier reported in outputs: the file name without its
/// folder.
fn script_name(script: &Path) -> String {
    script
        .file_name()
        .map_or_else(|| script.display().to_string(), |name| {
            name.to_string_lossy().into_owned()
        })
}
