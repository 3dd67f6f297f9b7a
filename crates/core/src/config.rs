//! Board configuration.
//!
//! The configuration file is plain JSON. Loading it yields a
//! [`BoardConfig`]; validating that yields a [`Board`], the read-only
//! settings every replay and aggregation borrows.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Result;
use crate::stage::{StageDefinition, StageMap};

fn default_points() -> u32 {
    1
}

fn default_resolved_status() -> String {
    "resolved".to_string()
}

/// Board configuration as stored on disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoardConfig {
    /// Tracked pipeline stages
    pub stages: Vec<StageDefinition>,

    /// Effort assumed for tasks without an estimate
    #[serde(default = "default_points")]
    pub default_points: u32,

    /// Status value marking a task as resolved
    #[serde(default = "default_resolved_status")]
    pub resolved_status: String,

    /// Remote tracker connection
    #[serde(default)]
    pub conduit: Option<ConduitConfig>,
}

/// Connection settings for the Conduit API.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConduitConfig {
    /// Base URL, e.g. `https://phabricator.example.com`
    pub base_url: String,

    /// API token (may be overridden from the environment)
    #[serde(default)]
    pub api_token: Option<String>,

    /// PHID of the project whose board is tracked
    pub project_phid: String,
}

impl BoardConfig {
    /// Read a configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        debug!(path = %path.display(), "Loading board configuration");
        let content = std::fs::read_to_string(path)?;
        Ok(serde_json::from_str(&content)?)
    }

    /// Validate into run settings.
    pub fn board(&self) -> Result<Board> {
        Ok(Board {
            stages: StageMap::new(self.stages.clone())?,
            default_points: self.default_points,
            resolved_status: self.resolved_status.clone(),
        })
    }
}

/// Validated, immutable settings for one run.
#[derive(Debug, Clone)]
pub struct Board {
    /// Stage mapper
    pub stages: StageMap,

    /// Effort assumed for tasks without an estimate
    pub default_points: u32,

    /// Status value marking a task as resolved
    pub resolved_status: String,
}

impl Board {
    /// Settings with the default fallback effort and resolved status.
    pub fn new(stages: StageMap) -> Self {
        Self {
            stages,
            default_points: default_points(),
            resolved_status: default_resolved_status(),
        }
    }

    /// Set the fallback effort.
    pub fn with_default_points(mut self, points: u32) -> Self {
        self.default_points = points;
        self
    }

    /// Set the status value treated as resolution.
    pub fn with_resolved_status(mut self, status: impl Into<String>) -> Self {
        self.resolved_status = status.into();
        self
    }
}
