//! Deploy executor integration tests

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use chrono::DateTime;

use shipgate::config::ProjectConfig;
use shipgate::deploy::executor::{DeployExecutor, Options};
use shipgate::deploy::run::{AbortCause, DeployRun, RunStatus};
use shipgate::deploy::step::ExitStatus;

struct Scratch {
    _tmp: tempfile::TempDir,
    workdir: PathBuf,
    options: Options,
}

fn scratch() -> Scratch {
    let tmp = tempfile::tempdir().unwrap();
    let workdir = tmp.path().join("checkout");
    std::fs::create_dir_all(&workdir).unwrap();
    let options = Options {
        logs_dir: tmp.path().join("logs"),
        step_timeout: Duration::from_secs(5),
    };
    Scratch {
        _tmp: tmp,
        workdir,
        options,
    }
}

fn project(workdir: &PathBuf, steps: &[&str]) -> Arc<ProjectConfig> {
    Arc::new(ProjectConfig {
        path: workdir.clone(),
        branch: "main".to_string(),
        steps: steps.iter().map(|s| s.to_string()).collect(),
    })
}

async fn read_log(run: &DeployRun) -> Vec<String> {
    let path = run.log_path.as_ref().expect("run should have a log file");
    let contents = tokio::fs::read_to_string(path).await.unwrap();
    contents.lines().map(str::to_string).collect()
}

#[tokio::test]
async fn test_successful_run_logs_steps_in_order() {
    let scratch = scratch();
    let config = project(&scratch.workdir, &["echo one", "echo two"]);

    let run = DeployExecutor::new("site", config, scratch.options)
        .execute()
        .await;

    assert_eq!(run.status, RunStatus::Completed);

    let lines = read_log(&run).await;
    assert!(lines[0].ends_with("Starting deploy for site"));
    assert!(lines[1].contains("Directory:"));
    assert!(lines[2].ends_with("Running: echo one"));
    assert!(lines[3].ends_with("one"));
    assert!(lines[4].ends_with("Running: echo two"));
    assert!(lines[5].ends_with("two"));
    assert!(lines[6].ends_with("Deploy complete"));
    assert_eq!(lines.len(), 7);
}

#[tokio::test]
async fn test_log_timestamps_are_non_decreasing() {
    let scratch = scratch();
    let config = project(&scratch.workdir, &["echo one", "echo two"]);

    let run = DeployExecutor::new("site", config, scratch.options)
        .execute()
        .await;

    let stamps: Vec<_> = read_log(&run)
        .await
        .iter()
        .map(|line| {
            let end = line.find(']').expect("line should start with a timestamp");
            DateTime::parse_from_rfc3339(&line[1..end]).unwrap()
        })
        .collect();

    assert!(stamps.windows(2).all(|pair| pair[0] <= pair[1]));
}

#[tokio::test]
async fn test_failing_step_aborts_without_running_later_steps() {
    let scratch = scratch();
    let config = project(&scratch.workdir, &["echo one", "exit 7", "echo three"]);

    let run = DeployExecutor::new("site", config, scratch.options)
        .execute()
        .await;

    assert_eq!(
        run.status,
        RunStatus::Aborted {
            step: 1,
            cause: AbortCause::Step(ExitStatus::NonZeroExit(7)),
        }
    );

    let lines = read_log(&run).await;
    let text = lines.join("\n");
    assert!(text.contains("Running: echo one"));
    assert!(text.contains("ERROR: command exited with status 7"));
    assert!(!text.contains("three"));
    assert!(!text.contains("Deploy complete"));
}

#[tokio::test]
async fn test_failed_step_output_is_logged() {
    let scratch = scratch();
    let config = project(&scratch.workdir, &["echo partial; echo oops >&2; exit 1"]);

    let run = DeployExecutor::new("site", config, scratch.options)
        .execute()
        .await;

    assert!(matches!(run.status, RunStatus::Aborted { step: 0, .. }));

    let text = read_log(&run).await.join("\n");
    assert!(text.contains("stdout: partial"));
    assert!(text.contains("stderr: oops"));
}

#[tokio::test]
async fn test_timed_out_step_aborts_with_partial_output() {
    let scratch = scratch();
    let options = Options {
        step_timeout: Duration::from_millis(300),
        ..scratch.options
    };
    let config = project(&scratch.workdir, &["echo started; sleep 30", "echo never"]);

    let run = DeployExecutor::new("site", config, options).execute().await;

    assert_eq!(
        run.status,
        RunStatus::Aborted {
            step: 0,
            cause: AbortCause::Step(ExitStatus::TimedOut),
        }
    );

    let text = read_log(&run).await.join("\n");
    assert!(text.contains("ERROR: command timed out"));
    assert!(text.contains("stdout: started"));
    assert!(!text.contains("never"));
}

#[tokio::test]
async fn test_missing_working_directory_aborts_first_step() {
    let scratch = scratch();
    let config = project(&scratch.workdir.join("gone"), &["echo hi"]);

    let run = DeployExecutor::new("site", config, scratch.options)
        .execute()
        .await;

    match run.status {
        RunStatus::Aborted {
            step: 0,
            cause: AbortCause::Step(ExitStatus::SpawnFailed(_)),
        } => {}
        other => panic!("expected spawn failure abort, got {:?}", other),
    }
}

#[tokio::test]
async fn test_steps_without_output_log_no_extra_lines() {
    let scratch = scratch();
    let config = project(&scratch.workdir, &["true"]);

    let run = DeployExecutor::new("site", config, scratch.options)
        .execute()
        .await;

    assert_eq!(run.status, RunStatus::Completed);

    let lines = read_log(&run).await;
    // Start, directory, "Running: true", "Deploy complete"
    assert_eq!(lines.len(), 4);
}

#[tokio::test]
async fn test_steps_share_the_working_directory() {
    let scratch = scratch();
    let config = project(
        &scratch.workdir,
        &["echo payload > artifact.txt", "cat artifact.txt"],
    );

    let run = DeployExecutor::new("site", config, scratch.options)
        .execute()
        .await;

    assert_eq!(run.status, RunStatus::Completed);
    let text = read_log(&run).await.join("\n");
    assert!(text.contains("payload"));
    assert!(scratch.workdir.join("artifact.txt").exists());
}
