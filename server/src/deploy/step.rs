//! Bounded shell step execution

use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::task::JoinHandle;

/// How long to keep reading pipe output after the child has exited or been
/// killed. A step that leaves a background child holding the pipe open must
/// not stall the run.
const DRAIN_GRACE: Duration = Duration::from_secs(1);

/// How a step finished
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ExitStatus {
    /// Exit code zero
    Success,

    /// Non-zero exit code; -1 when the process was killed by a signal
    NonZeroExit(i32),

    /// Deadline expired and the process was killed
    TimedOut,

    /// The process could not be spawned at all
    SpawnFailed(String),
}

impl ExitStatus {
    pub fn is_success(&self) -> bool {
        matches!(self, ExitStatus::Success)
    }
}

/// Outcome of one shell step, consumed by the executor and its log
#[derive(Debug, Clone)]
pub struct StepResult {
    pub command: String,
    pub status: ExitStatus,
    pub stdout: String,
    pub stderr: String,
}

/// Run one shell command rooted at `working_dir` with a bounded deadline
///
/// The command runs under `sh -c` with no interactive input. Output is
/// captured up to completion or deadline expiry; a timed-out process is
/// killed and whatever output it produced so far is kept. Shell errors and
/// command-not-found surface as a failed [`StepResult`], never as an error
/// the caller has to unwind.
pub async fn run(command: &str, working_dir: &Path, deadline: Duration) -> StepResult {
    let mut child = match Command::new("sh")
        .arg("-c")
        .arg(command)
        .current_dir(working_dir)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
    {
        Ok(child) => child,
        Err(e) => {
            return StepResult {
                command: command.to_string(),
                status: ExitStatus::SpawnFailed(e.to_string()),
                stdout: String::new(),
                stderr: String::new(),
            };
        }
    };

    // Capture both pipes incrementally so a killed child still yields the
    // output it produced before the deadline.
    let stdout = PipeCapture::spawn(child.stdout.take());
    let stderr = PipeCapture::spawn(child.stderr.take());

    let status = match tokio::time::timeout(deadline, child.wait()).await {
        Ok(Ok(exit)) => {
            if exit.success() {
                ExitStatus::Success
            } else {
                ExitStatus::NonZeroExit(exit.code().unwrap_or(-1))
            }
        }
        Ok(Err(e)) => ExitStatus::SpawnFailed(e.to_string()),
        Err(_) => {
            let _ = child.kill().await;
            ExitStatus::TimedOut
        }
    };

    StepResult {
        command: command.to_string(),
        status,
        stdout: stdout.finish().await,
        stderr: stderr.finish().await,
    }
}

/// Incremental reader for one child pipe
struct PipeCapture {
    buf: Arc<Mutex<Vec<u8>>>,
    task: JoinHandle<()>,
}

impl PipeCapture {
    fn spawn<R>(pipe: Option<R>) -> Self
    where
        R: AsyncRead + Unpin + Send + 'static,
    {
        let buf = Arc::new(Mutex::new(Vec::new()));
        let task = match pipe {
            Some(mut pipe) => {
                let buf = buf.clone();
                tokio::spawn(async move {
                    let mut chunk = [0u8; 4096];
                    loop {
                        match pipe.read(&mut chunk).await {
                            Ok(0) | Err(_) => break,
                            Ok(n) => buf.lock().await.extend_from_slice(&chunk[..n]),
                        }
                    }
                })
            }
            None => tokio::spawn(async {}),
        };

        Self { buf, task }
    }

    /// Wait briefly for the pipe to close, then return whatever was read
    async fn finish(mut self) -> String {
        if tokio::time::timeout(DRAIN_GRACE, &mut self.task).await.is_err() {
            self.task.abort();
        }
        let buf = self.buf.lock().await;
        String::from_utf8_lossy(&buf).into_owned()
    }
}
