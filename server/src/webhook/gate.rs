//! Routing decisions for verified webhook deliveries

use std::sync::Arc;

use crate::config::{Config, ProjectConfig};
use crate::webhook::event::{PushPayload, PUSH_EVENT};

/// Outcome of filtering a verified webhook delivery
///
/// Only [`GateDecision::Accept`] creates a deploy run; every other decision
/// is acknowledged to the sender without side effects.
#[derive(Debug, Clone)]
pub enum GateDecision {
    /// Push to a configured project's deploy branch
    Accept {
        project: String,
        config: Arc<ProjectConfig>,
    },

    /// Event type other than push
    IgnoredEvent { event: String },

    /// Push payload that could not be parsed
    InvalidPayload { reason: String },

    /// Push to a repository with no configuration
    UnknownProject { repo: String },

    /// Push to a branch other than the configured deploy branch
    BranchMismatch { branch: String, configured: String },
}

/// Decide what to do with a verified webhook delivery
///
/// Assumes the signature has already been checked; the gate only filters by
/// event type, project, and branch.
pub fn evaluate(event_type: &str, payload: &[u8], config: &Config) -> GateDecision {
    if event_type != PUSH_EVENT {
        return GateDecision::IgnoredEvent {
            event: event_type.to_string(),
        };
    }

    let push = match PushPayload::from_bytes(payload) {
        Ok(push) => push,
        Err(e) => {
            return GateDecision::InvalidPayload {
                reason: e.to_string(),
            };
        }
    };

    let repo = push.repository.name.clone();
    let Some(project_config) = config.project(&repo) else {
        return GateDecision::UnknownProject { repo };
    };

    let branch = push.branch();
    if branch != project_config.branch {
        return GateDecision::BranchMismatch {
            branch: branch.to_string(),
            configured: project_config.branch.clone(),
        };
    }

    GateDecision::Accept {
        project: repo,
        config: project_config.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn config() -> Config {
        let mut projects = HashMap::new();
        projects.insert(
            "site".to_string(),
            ProjectConfig {
                path: PathBuf::from("/srv/site"),
                branch: "release".to_string(),
                steps: vec!["echo hi".to_string()],
            },
        );
        Config::from_projects(projects).unwrap()
    }

    fn push_body(repo: &str, git_ref: &str) -> Vec<u8> {
        format!(r#"{{"repository":{{"name":"{repo}"}},"ref":"{git_ref}"}}"#).into_bytes()
    }

    #[test]
    fn test_accepts_configured_branch() {
        let decision = evaluate(PUSH_EVENT, &push_body("site", "refs/heads/release"), &config());

        match decision {
            GateDecision::Accept { project, config } => {
                assert_eq!(project, "site");
                assert_eq!(config.steps, vec!["echo hi"]);
            }
            other => panic!("expected Accept, got {:?}", other),
        }
    }

    #[test]
    fn test_ignores_non_push_events() {
        let decision = evaluate(
            "pull_request",
            &push_body("site", "refs/heads/release"),
            &config(),
        );

        assert!(matches!(
            decision,
            GateDecision::IgnoredEvent { event } if event == "pull_request"
        ));
    }

    #[test]
    fn test_ignores_unknown_repository() {
        let decision = evaluate(
            PUSH_EVENT,
            &push_body("unknown-repo", "refs/heads/release"),
            &config(),
        );

        assert!(matches!(
            decision,
            GateDecision::UnknownProject { repo } if repo == "unknown-repo"
        ));
    }

    #[test]
    fn test_ignores_branch_mismatch() {
        let decision = evaluate(PUSH_EVENT, &push_body("site", "refs/heads/main"), &config());

        match decision {
            GateDecision::BranchMismatch { branch, configured } => {
                assert_eq!(branch, "main");
                assert_eq!(configured, "release");
            }
            other => panic!("expected BranchMismatch, got {:?}", other),
        }
    }

    #[test]
    fn test_rejects_malformed_payload() {
        let decision = evaluate(PUSH_EVENT, b"not json", &config());

        assert!(matches!(decision, GateDecision::InvalidPayload { .. }));
    }
}
