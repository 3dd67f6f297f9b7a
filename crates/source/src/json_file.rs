//! JSON dump task source.
//!
//! Reads a previously exported snapshot of the board:
//! `{"tasks": [{"id": 1, "title": "...", "transactions": [...]}]}`.
//! Transactions use the tracker's raw shape, newest first.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use boardpulse_core::{Task, TaskId};
use serde::Deserialize;
use serde_json::Value;
use tokio::fs;
use tracing::info;

use super::{assemble_tasks, Result, TaskListing, TaskSource};

/// One task entry of a dump file.
#[derive(Debug, Clone, Deserialize)]
pub struct DumpedTask {
    /// Task id
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Raw transactions, newest first (absent when unavailable)
    ///
    /// Kept as plain JSON so one unreadable record cannot fail the dump.
    #[serde(default)]
    pub transactions: Option<Vec<Value>>,
}

/// Dump file layout.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Dump {
    /// Tracked tasks
    pub tasks: Vec<DumpedTask>,
}

/// Task source backed by a JSON dump file.
pub struct JsonFileSource {
    path: PathBuf,
}

impl JsonFileSource {
    /// Create a source reading `path`.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl TaskSource for JsonFileSource {
    async fn fetch_tasks(&self) -> Result<Vec<Task>> {
        let content = fs::read_to_string(&self.path).await?;
        let dump: Dump = serde_json::from_str(&content)?;

        let mut listings = Vec::with_capacity(dump.tasks.len());
        let mut logs = HashMap::new();
        for entry in dump.tasks {
            if let Some(transactions) = entry.transactions {
                logs.insert(entry.id, transactions);
            }
            listings.push(TaskListing {
                id: entry.id,
                title: entry.title,
            });
        }

        let tasks = assemble_tasks(listings, logs);
        info!(path = %self.path.display(), tasks = tasks.len(), "Loaded tasks from dump");
        Ok(tasks)
    }
}
