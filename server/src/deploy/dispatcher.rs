//! Background deploy dispatch

use std::sync::Arc;

use tokio::sync::Mutex;
use tokio::task::JoinHandle;
use tracing::{error, info};

use crate::config::ProjectConfig;
use crate::deploy::executor::{DeployExecutor, Options};
use crate::deploy::run::{DeployRun, RunStatus};

/// Spawns deploy runs as detached background tasks
///
/// The webhook handler acknowledges a delivery and hands the run off here;
/// the HTTP response never waits on a run. Outstanding runs are tracked so
/// that shutdown (and tests) can await their completion deterministically.
///
/// There is no mutual exclusion across runs of the same project: two pushes
/// in quick succession run concurrently against the same working directory,
/// each with its own log file.
pub struct Dispatcher {
    options: Options,
    handles: Mutex<Vec<JoinHandle<DeployRun>>>,
}

impl Dispatcher {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            handles: Mutex::new(Vec::new()),
        }
    }

    /// Spawn a deploy run for a project and return immediately
    pub async fn dispatch(&self, project: &str, config: Arc<ProjectConfig>) {
        let executor = DeployExecutor::new(project, config, self.options.clone());
        let project = project.to_string();

        let handle = tokio::spawn(async move {
            let run = executor.execute().await;
            match &run.status {
                RunStatus::Completed => {
                    info!("Deploy of {} completed (run {})", run.project, run.id);
                }
                RunStatus::Aborted { step, cause } => {
                    error!(
                        "Deploy of {} aborted at step {} (run {}): {:?}",
                        run.project, step, run.id, cause
                    );
                }
                status => {
                    error!(
                        "Deploy of {} ended in non-terminal state {:?} (run {})",
                        run.project, status, run.id
                    );
                }
            }
            run
        });

        self.handles.lock().await.push(handle);

        info!("Deploy of {} dispatched", project);
    }

    /// Await every outstanding run and return their terminal states
    ///
    /// Completion signal for shutdown and tests; new dispatches during the
    /// drain are picked up by the next call.
    pub async fn wait_idle(&self) -> Vec<DeployRun> {
        let drained: Vec<JoinHandle<DeployRun>> = {
            let mut handles = self.handles.lock().await;
            handles.drain(..).collect()
        };

        let mut runs = Vec::with_capacity(drained.len());
        for handle in drained {
            match handle.await {
                Ok(run) => runs.push(run),
                Err(e) => error!("Deploy task failed to join: {}", e),
            }
        }
        runs
    }
}
