//! Event model - one recorded field change on a task.

use crate::Time;
use serde::{Deserialize, Serialize};

/// An immutable change record from a task's history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    /// When the change happened
    pub timestamp: Time,

    /// What changed
    pub kind: EventKind,
}

/// The canonical shape of a change, after ingestion normalization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EventKind {
    /// Task moved between board columns
    StageChange {
        /// Column left (None when outside any column)
        from: Option<String>,
        /// Column entered
        to: Option<String>,
    },

    /// Task status changed
    StatusChange {
        /// Previous status
        from: Option<String>,
        /// New status
        to: Option<String>,
    },

    /// Story points changed
    PointsChange {
        /// New value, None when cleared
        to: Option<u32>,
    },

    /// Anything the replay does not understand
    Unrecognized {
        /// Raw transaction type
        transaction_type: String,
    },
}

impl Event {
    /// Create a new event.
    pub fn new(timestamp: Time, kind: EventKind) -> Self {
        Self { timestamp, kind }
    }

    /// Stage move shorthand.
    pub fn stage_change(timestamp: Time, from: Option<&str>, to: Option<&str>) -> Self {
        Self::new(
            timestamp,
            EventKind::StageChange {
                from: from.map(str::to_string),
                to: to.map(str::to_string),
            },
        )
    }

    /// Status change shorthand.
    pub fn status_change(timestamp: Time, from: Option<&str>, to: &str) -> Self {
        Self::new(
            timestamp,
            EventKind::StatusChange {
                from: from.map(str::to_string),
                to: Some(to.to_string()),
            },
        )
    }

    /// Points change shorthand.
    pub fn points_change(timestamp: Time, to: Option<u32>) -> Self {
        Self::new(timestamp, EventKind::PointsChange { to })
    }
}
