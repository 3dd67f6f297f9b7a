//! Task source abstraction.

use std::collections::HashMap;

use async_trait::async_trait;
use boardpulse_core::ingest::normalize_log;
use boardpulse_core::{Task, TaskId};
use serde_json::Value;
use tracing::debug;

/// Error type for task source operations.
pub type Result<T> = std::result::Result<T, SourceError>;

/// Errors that can occur while fetching tasks.
#[derive(Debug, thiserror::Error)]
pub enum SourceError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// HTTP transport error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with an error
    #[error("Conduit error {code}: {info}")]
    Conduit {
        /// Error code
        code: String,
        /// Error description
        info: String,
    },

    /// Missing or unusable settings
    #[error("{0}")]
    Config(String),
}

/// Where tracked tasks and their histories come from.
///
/// Implementations finish all I/O before returning; the engine never calls
/// back into a source.
#[async_trait]
pub trait TaskSource: Send + Sync {
    /// Fetch every tracked task with its newest-first event log.
    async fn fetch_tasks(&self) -> Result<Vec<Task>>;
}

/// A task as listed by the tracker, before its history is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskListing {
    /// Task id
    pub id: TaskId,

    /// Task title
    pub title: String,
}

/// Join listings with their raw transaction logs.
///
/// Tasks without a log are skipped: nothing is inferred about them.
pub fn assemble_tasks(
    listings: Vec<TaskListing>,
    mut logs: HashMap<TaskId, Vec<Value>>,
) -> Vec<Task> {
    listings
        .into_iter()
        .filter_map(|listing| match logs.remove(&listing.id) {
            Some(raw) => Some(Task::new(listing.id, listing.title, normalize_log(raw))),
            None => {
                debug!(task = %listing.id, "No transaction log, skipping task");
                None
            }
        })
        .collect()
}
