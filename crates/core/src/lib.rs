//! boardpulse core data models.
//!
//! Tasks, their change logs, the board pipeline and the configuration
//! shared by every replay.

#![warn(missing_docs)]

mod id;
mod error;

// Pipeline
mod stage;
mod config;

// History
mod event;
mod task;
mod interval;
pub mod ingest;

// Re-exports
pub use id::TaskId;
pub use error::{ConfigError, Result};
pub use stage::{StageDefinition, StageMap, OUTSIDE_PIPELINE};
pub use config::{Board, BoardConfig, ConduitConfig};
pub use event::{Event, EventKind};
pub use task::Task;
pub use interval::Interval;
pub use ingest::RawTransaction;

/// Timestamp type
pub type Time = chrono::DateTime<chrono::Utc>;
