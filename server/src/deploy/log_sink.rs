//! Per-run deploy log

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::errors::ServerError;

/// Append-only log stream for one deploy run
///
/// Writes to a run-specific file and mirrors every line to the process
/// console. The file name is derived from the project name and the run's
/// start time, so concurrent runs never share a file. Each append opens,
/// writes, and syncs on its own; there is no close step.
pub struct RunLog {
    project: String,
    path: PathBuf,
}

impl RunLog {
    /// Create the log file for a run, bootstrapping the logs directory
    pub async fn open(
        logs_dir: &Path,
        project: &str,
        started_at: DateTime<Utc>,
    ) -> Result<Self, ServerError> {
        fs::create_dir_all(logs_dir).await?;

        let stamp = file_stamp(started_at);
        let path = logs_dir.join(format!("{}-{}.log", project, stamp));

        Ok(Self {
            project: project.to_string(),
            path,
        })
    }

    /// Path of the log file
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line, synced to disk before returning
    ///
    /// A file write failure is reported on the console and does not stop
    /// the run; the console mirror still carries the line.
    pub async fn append(&self, message: &str) {
        let line = format!(
            "[{}] {}\n",
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            message
        );

        if let Err(e) = self.write_line(&line).await {
            warn!("Failed to write deploy log {}: {}", self.path.display(), e);
        }

        info!("[{}] {}", self.project, message);
    }

    async fn write_line(&self, line: &str) -> Result<(), std::io::Error> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await
    }
}

/// Render a start timestamp in a filesystem-safe form
fn file_stamp(started_at: DateTime<Utc>) -> String {
    started_at
        .to_rfc3339_opts(SecondsFormat::Millis, true)
        .replace([':', '.'], "-")
}
