//! Task model - a tracked work item and its change log.

use std::sync::OnceLock;

use crate::event::Event;
use crate::id::TaskId;

/// A tracked task with its full event history.
///
/// Events are kept exactly as delivered by the tracker: newest first.
/// The only state that changes after construction are the two derived
/// caches, each filled at most once.
#[derive(Debug, Clone)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// History, newest first
    events: Vec<Event>,

    effort_estimate: OnceLock<Option<u32>>,

    current_stage: OnceLock<u32>,
}

impl Task {
    /// Create a task from its id, title and newest-first event log.
    pub fn new(id: TaskId, title: impl Into<String>, events: Vec<Event>) -> Self {
        Self {
            id,
            title: title.into(),
            events,
            effort_estimate: OnceLock::new(),
            current_stage: OnceLock::new(),
        }
    }

    /// Events, newest first.
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Whether the log honours the newest-first ordering (ties allowed).
    pub fn is_newest_first(&self) -> bool {
        self.events
            .windows(2)
            .all(|pair| pair[0].timestamp >= pair[1].timestamp)
    }

    /// Cached effort estimate, computed by `compute` on first access.
    pub fn effort_estimate_or_init(&self, compute: impl FnOnce() -> Option<u32>) -> Option<u32> {
        *self.effort_estimate.get_or_init(compute)
    }

    /// Cached stage ordinal at replay time, computed by `compute` on first access.
    pub fn current_stage_or_init(&self, compute: impl FnOnce() -> u32) -> u32 {
        *self.current_stage.get_or_init(compute)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn at(secs: i64) -> crate::Time {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    #[test]
    fn test_newest_first_detection() {
        let ordered = Task::new(
            TaskId::new(1),
            "ordered",
            vec![
                Event::points_change(at(300), Some(2)),
                Event::points_change(at(200), Some(1)),
                Event::points_change(at(200), Some(1)),
            ],
        );
        assert!(ordered.is_newest_first());

        let reversed = Task::new(
            TaskId::new(2),
            "reversed",
            vec![
                Event::points_change(at(100), Some(2)),
                Event::points_change(at(200), Some(1)),
            ],
        );
        assert!(!reversed.is_newest_first());
    }

    #[test]
    fn test_caches_fill_once() {
        let task = Task::new(TaskId::new(3), "cached", vec![]);
        assert_eq!(task.effort_estimate_or_init(|| Some(5)), Some(5));
        assert_eq!(task.effort_estimate_or_init(|| Some(8)), Some(5));
        assert_eq!(task.current_stage_or_init(|| 2), 2);
        assert_eq!(task.current_stage_or_init(|| 0), 2);
    }

    #[test]
    fn test_empty_task_is_trivially_ordered() {
        let task = Task::new(TaskId::new(4), "empty", vec![]);
        assert!(task.is_newest_first());
        assert!(task.events().is_empty());
    }
}
