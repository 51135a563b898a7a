//! Deploy run state

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::deploy::step::ExitStatus;
use crate::utils::generate_run_id;

/// Status of a deploy run
///
/// A run moves `Pending -> Running -> {Completed | Aborted}` and never
/// leaves a terminal state. A new push always creates a new run; runs are
/// never reused.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    /// Created, not yet started
    Pending,

    /// Steps are executing
    Running,

    /// Every step succeeded
    Completed,

    /// A step failed; later steps never ran
    Aborted { step: usize, cause: AbortCause },
}

impl RunStatus {
    /// Whether the run has reached a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunStatus::Completed | RunStatus::Aborted { .. })
    }
}

/// Why a run aborted
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AbortCause {
    /// A step exited non-zero, timed out, or failed to start
    Step(ExitStatus),

    /// The run log could not be created
    LogSetup(String),
}

/// One execution instance of a project's deploy steps
///
/// Owned exclusively by the executor that created it; observed by callers
/// only after it reaches a terminal state.
#[derive(Debug, Clone, Serialize)]
pub struct DeployRun {
    pub id: String,
    pub project: String,
    pub started_at: DateTime<Utc>,
    pub log_path: Option<PathBuf>,
    pub status: RunStatus,
}

impl DeployRun {
    /// Create a pending run for a project
    pub fn new(project: impl Into<String>) -> Self {
        Self {
            id: generate_run_id(),
            project: project.into(),
            started_at: Utc::now(),
            log_path: None,
            status: RunStatus::Pending,
        }
    }
}
