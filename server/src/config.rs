//! Project configuration loading

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tokio::fs;

use crate::errors::ServerError;

/// Deploy configuration for a single project
///
/// Immutable once loaded. Step order is significant: steps run in the
/// declared order and the first failure aborts the run.
#[derive(Debug, Clone, Deserialize)]
pub struct ProjectConfig {
    /// Working directory the deploy steps run in
    pub path: PathBuf,

    /// Branch that triggers a deploy
    pub branch: String,

    /// Ordered shell commands to run
    pub steps: Vec<String>,
}

/// On-disk configuration file shape
#[derive(Debug, Deserialize)]
struct ConfigFile {
    projects: HashMap<String, ProjectConfig>,
}

/// Loaded configuration, shared read-only across all requests and runs
#[derive(Debug, Clone, Default)]
pub struct Config {
    projects: HashMap<String, Arc<ProjectConfig>>,
}

impl Config {
    /// Load and validate the configuration file
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ServerError> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path).await.map_err(|e| {
            ServerError::ConfigError(format!("unable to read {}: {}", path.display(), e))
        })?;
        let file: ConfigFile = serde_json::from_str(&contents).map_err(|e| {
            ServerError::ConfigError(format!("unable to parse {}: {}", path.display(), e))
        })?;
        Self::from_projects(file.projects)
    }

    /// Build a validated config from a project map
    pub fn from_projects(
        projects: HashMap<String, ProjectConfig>,
    ) -> Result<Self, ServerError> {
        for (name, project) in &projects {
            if project.steps.is_empty() {
                return Err(ServerError::ConfigError(format!(
                    "project '{}' has no deploy steps",
                    name
                )));
            }
            if project.branch.is_empty() {
                return Err(ServerError::ConfigError(format!(
                    "project '{}' has no deploy branch",
                    name
                )));
            }
        }

        Ok(Self {
            projects: projects
                .into_iter()
                .map(|(name, project)| (name, Arc::new(project)))
                .collect(),
        })
    }

    /// Look up a project by repository name
    pub fn project(&self, name: &str) -> Option<&Arc<ProjectConfig>> {
        self.projects.get(name)
    }

    /// Names of all configured projects
    pub fn project_names(&self) -> Vec<&str> {
        self.projects.keys().map(String::as_str).collect()
    }

    /// Number of configured projects
    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }
}
