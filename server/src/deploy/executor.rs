//! Deploy run executor

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use tracing::error;

use crate::config::ProjectConfig;
use crate::deploy::log_sink::RunLog;
use crate::deploy::run::{AbortCause, DeployRun, RunStatus};
use crate::deploy::step::{self, ExitStatus};

/// Executor options
#[derive(Debug, Clone)]
pub struct Options {
    /// Directory holding per-run log files
    pub logs_dir: PathBuf,

    /// Deadline for each individual step
    pub step_timeout: Duration,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            logs_dir: PathBuf::from("logs"),
            step_timeout: Duration::from_secs(300),
        }
    }
}

/// Runs one project's deploy steps in order, fail-fast
///
/// Owns the [`DeployRun`] it creates; the run is handed back once it has
/// reached a terminal state and is never reused.
pub struct DeployExecutor {
    run: DeployRun,
    config: Arc<ProjectConfig>,
    options: Options,
}

impl DeployExecutor {
    /// Create an executor with a pending run
    pub fn new(project: impl Into<String>, config: Arc<ProjectConfig>, options: Options) -> Self {
        Self {
            run: DeployRun::new(project),
            config,
            options,
        }
    }

    /// Execute all steps and return the terminal run
    ///
    /// The first failing step aborts the run at its index; later steps do
    /// not execute and nothing is rolled back. Step failures are logged,
    /// never propagated.
    pub async fn execute(mut self) -> DeployRun {
        self.run.status = RunStatus::Running;

        let log = match RunLog::open(
            &self.options.logs_dir,
            &self.run.project,
            self.run.started_at,
        )
        .await
        {
            Ok(log) => log,
            Err(e) => {
                error!("Unable to open deploy log for {}: {}", self.run.project, e);
                self.run.status = RunStatus::Aborted {
                    step: 0,
                    cause: AbortCause::LogSetup(e.to_string()),
                };
                return self.run;
            }
        };
        self.run.log_path = Some(log.path().to_path_buf());

        log.append(&format!("Starting deploy for {}", self.run.project))
            .await;
        log.append(&format!("Directory: {}", self.config.path.display()))
            .await;

        for (index, command) in self.config.steps.iter().enumerate() {
            log.append(&format!("Running: {}", command)).await;

            let result = step::run(command, &self.config.path, self.options.step_timeout).await;

            if result.status.is_success() {
                let output = result.stdout.trim_end();
                if !output.is_empty() {
                    log.append(output).await;
                }
                continue;
            }

            log.append(&format!("ERROR: {}", describe_failure(&result.status)))
                .await;
            let stdout = result.stdout.trim_end();
            if !stdout.is_empty() {
                log.append(&format!("stdout: {}", stdout)).await;
            }
            let stderr = result.stderr.trim_end();
            if !stderr.is_empty() {
                log.append(&format!("stderr: {}", stderr)).await;
            }

            self.run.status = RunStatus::Aborted {
                step: index,
                cause: AbortCause::Step(result.status),
            };
            return self.run;
        }

        log.append("Deploy complete").await;
        self.run.status = RunStatus::Completed;
        self.run
    }
}

fn describe_failure(status: &ExitStatus) -> String {
    match status {
        ExitStatus::Success => "command succeeded".to_string(),
        ExitStatus::NonZeroExit(code) => format!("command exited with status {}", code),
        ExitStatus::TimedOut => "command timed out".to_string(),
        ExitStatus::SpawnFailed(reason) => format!("failed to start command: {}", reason),
    }
}
