//! Point-in-time replay of one task's history.

use boardpulse_core::{Board, Event, EventKind, Interval, Task, Time};
use tracing::warn;

use crate::points;

/// Ordinal of a task before its first column move.
pub const ENTRY_ORDINAL: u32 = 0;

/// Instant a stage query refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AsOf {
    /// Replay time, no upper bound on events
    Now,

    /// A specific instant (events at exactly this time are included)
    At(Time),
}

impl From<Time> for AsOf {
    fn from(instant: Time) -> Self {
        AsOf::At(instant)
    }
}

/// Answers temporal questions about one task without mutating it.
///
/// The task log is newest first; the replayer keeps a chronological view
/// built once at construction.
pub struct TaskReplayer<'a> {
    task: &'a Task,
    board: &'a Board,
    chronological: Vec<&'a Event>,
}

impl<'a> TaskReplayer<'a> {
    /// Create a replayer for `task` against `board`.
    pub fn new(task: &'a Task, board: &'a Board) -> Self {
        if !task.is_newest_first() {
            warn!(task = %task.id, "Event log is not newest-first, replay may be wrong");
        }
        Self {
            task,
            board,
            chronological: task.events().iter().rev().collect(),
        }
    }

    /// Stage ordinal occupied at `as_of`.
    pub fn stage_at(&self, as_of: impl Into<AsOf>) -> u32 {
        let as_of = as_of.into();
        let mut current = ENTRY_ORDINAL;

        for event in &self.chronological {
            let EventKind::StageChange { to, .. } = &event.kind else {
                continue;
            };
            if let AsOf::At(instant) = as_of {
                if event.timestamp > instant {
                    break;
                }
            }
            current = self.board.stages.ordinal_of_opt(to.as_deref());
        }

        current
    }

    /// Stage ordinal at replay time, cached on the task.
    pub fn current_stage(&self) -> u32 {
        self.task.current_stage_or_init(|| self.stage_at(AsOf::Now))
    }

    /// Effort from the title marker, else the latest explicit points value.
    pub fn effort_estimate(&self) -> Option<u32> {
        self.task.effort_estimate_or_init(|| {
            points::from_title(&self.task.title).or_else(|| self.latest_points())
        })
    }

    /// Effort estimate, falling back to the board default.
    pub fn effort_or_default(&self) -> u32 {
        self.effort_estimate().unwrap_or(self.board.default_points)
    }

    fn latest_points(&self) -> Option<u32> {
        self.task.events().iter().find_map(|event| match event.kind {
            EventKind::PointsChange { to } => to,
            _ => None,
        })
    }

    /// Time of the most recent transition into the resolved status.
    pub fn resolved_at(&self) -> Option<Time> {
        let resolved = self.board.resolved_status.as_str();
        self.task
            .events()
            .iter()
            .find(|event| {
                matches!(
                    &event.kind,
                    EventKind::StatusChange { to: Some(status), .. } if status == resolved
                )
            })
            .map(|event| event.timestamp)
    }

    /// Whether the latest resolution falls in `[start, end)`.
    ///
    /// Earlier resolutions of a reopened task are ignored.
    pub fn resolved_between(&self, interval: &Interval) -> bool {
        self.resolved_at().is_some_and(|at| interval.contains(at))
    }

    /// Total stage distance travelled over the task's whole history.
    ///
    /// Every column move counts `|to - from|` steps in either direction.
    /// The interval is accepted but not applied; volatility covers the
    /// whole history.
    pub fn steps_between(&self, _interval: &Interval) -> u32 {
        let stages = &self.board.stages;
        self.chronological
            .iter()
            .filter_map(|event| match &event.kind {
                EventKind::StageChange { from, to } => Some(
                    stages
                        .ordinal_of_opt(to.as_deref())
                        .abs_diff(stages.ordinal_of_opt(from.as_deref())),
                ),
                _ => None,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use boardpulse_core::{StageDefinition, StageMap, TaskId};
    use chrono::{TimeZone, Utc};

    const BACKLOG: &str = "PHID-PCOL-backlog";
    const DOING: &str = "PHID-PCOL-doing";
    const REVIEW: &str = "PHID-PCOL-review";
    const DONE: &str = "PHID-PCOL-done";

    fn board() -> Board {
        let stages = StageMap::new(vec![
            StageDefinition::new(BACKLOG, "Backlog", 0),
            StageDefinition::new(DOING, "Doing", 1),
            StageDefinition::new(REVIEW, "Review", 2),
            StageDefinition::new(DONE, "Done", 3),
        ])
        .unwrap();
        Board::new(stages).with_default_points(3)
    }

    fn at(secs: i64) -> Time {
        Utc.timestamp_opt(secs, 0).unwrap()
    }

    fn interval(start: i64, end: i64) -> Interval {
        Interval::new(at(start), at(end)).unwrap()
    }

    /// Events given oldest first for readability, stored newest first.
    fn task(title: &str, mut chronological: Vec<Event>) -> Task {
        chronological.reverse();
        let task = Task::new(TaskId::new(1), title, chronological);
        assert!(task.is_newest_first());
        task
    }

    fn delivered_fix_bug() -> Task {
        task(
            "Fix bug [5 pts]",
            vec![
                Event::stage_change(at(100), Some(BACKLOG), Some(DOING)),
                Event::stage_change(at(200), Some(DOING), Some(REVIEW)),
                Event::stage_change(at(300), Some(REVIEW), Some(DONE)),
                Event::status_change(at(300), Some("open"), "resolved"),
            ],
        )
    }

    #[test]
    fn test_stage_at_walks_chronologically() {
        let board = board();
        let task = delivered_fix_bug();
        let replay = TaskReplayer::new(&task, &board);

        assert_eq!(replay.stage_at(at(50)), ENTRY_ORDINAL);
        assert_eq!(replay.stage_at(at(100)), 1);
        assert_eq!(replay.stage_at(at(199)), 1);
        assert_eq!(replay.stage_at(at(250)), 2);
        assert_eq!(replay.stage_at(at(10_000)), 3);
        assert_eq!(replay.stage_at(AsOf::Now), 3);
    }

    #[test]
    fn test_current_stage_matches_latest_move() {
        let board = board();
        let task = task(
            "Bounced",
            vec![
                Event::stage_change(at(100), Some(BACKLOG), Some(REVIEW)),
                Event::stage_change(at(200), Some(REVIEW), Some(DOING)),
                Event::status_change(at(250), None, "open"),
            ],
        );
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.current_stage(), 1);
    }

    #[test]
    fn test_unknown_column_maps_outside_pipeline() {
        let board = board();
        let task = task(
            "Moved to another board",
            vec![
                Event::stage_change(at(100), Some(BACKLOG), Some(DOING)),
                Event::stage_change(at(200), Some(DOING), Some("PHID-PCOL-elsewhere")),
            ],
        );
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.stage_at(AsOf::Now), 0);
        assert_eq!(replay.steps_between(&interval(0, 1_000)), 2);
    }

    #[test]
    fn test_effort_from_title() {
        let board = board();
        let task = delivered_fix_bug();
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.effort_estimate(), Some(5));
    }

    #[test]
    fn test_effort_from_latest_points_event() {
        let board = board();
        let task = task(
            "No marker",
            vec![
                Event::points_change(at(100), Some(2)),
                Event::points_change(at(200), Some(8)),
                Event::points_change(at(300), None),
            ],
        );
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.effort_estimate(), Some(8));
    }

    #[test]
    fn test_title_beats_points_event() {
        let board = board();
        let task = task("Marked [2 pts]", vec![Event::points_change(at(100), Some(8))]);
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.effort_estimate(), Some(2));
    }

    #[test]
    fn test_effort_none_falls_back_to_default() {
        let board = board();
        let task = task("Unsized", vec![]);
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.effort_estimate(), None);
        assert_eq!(replay.effort_or_default(), 3);
    }

    #[test]
    fn test_resolved_between_half_open() {
        let board = board();
        let task = delivered_fix_bug();
        let replay = TaskReplayer::new(&task, &board);

        assert!(replay.resolved_between(&interval(0, 1_000)));
        assert!(replay.resolved_between(&interval(300, 301)));
        assert!(!replay.resolved_between(&interval(0, 300)));
        assert!(!replay.resolved_between(&interval(301, 1_000)));
    }

    #[test]
    fn test_only_latest_resolution_counts() {
        let board = board();
        let task = task(
            "Reopened",
            vec![
                Event::status_change(at(100), Some("open"), "resolved"),
                Event::status_change(at(200), Some("resolved"), "open"),
                Event::status_change(at(900), Some("open"), "resolved"),
            ],
        );
        let replay = TaskReplayer::new(&task, &board);

        assert_eq!(replay.resolved_at(), Some(at(900)));
        assert!(!replay.resolved_between(&interval(50, 150)));
        assert!(replay.resolved_between(&interval(800, 1_000)));
    }

    #[test]
    fn test_reopened_without_second_resolution_keeps_old_timestamp() {
        let board = board();
        let task = task(
            "Reopened for good",
            vec![
                Event::status_change(at(100), Some("open"), "resolved"),
                Event::status_change(at(200), Some("resolved"), "open"),
            ],
        );
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.resolved_at(), Some(at(100)));
    }

    #[test]
    fn test_custom_resolved_status() {
        let board = board().with_resolved_status("closed");
        let task = task(
            "Closed",
            vec![
                Event::status_change(at(100), Some("open"), "resolved"),
                Event::status_change(at(200), Some("resolved"), "closed"),
            ],
        );
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.resolved_at(), Some(at(200)));
    }

    #[test]
    fn test_steps_count_jumps_and_regressions() {
        let board = board();
        let task = task(
            "Zigzag",
            vec![
                Event::stage_change(at(100), Some(BACKLOG), Some(REVIEW)),
                Event::stage_change(at(200), Some(REVIEW), Some(DOING)),
                Event::stage_change(at(300), Some(DOING), Some(DONE)),
            ],
        );
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.steps_between(&interval(0, 1)), 2 + 1 + 2);
    }

    #[test]
    fn test_steps_ignore_interval() {
        let board = board();
        let task = delivered_fix_bug();
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.steps_between(&interval(0, 1_000)), 3);
        assert_eq!(replay.steps_between(&interval(5_000, 6_000)), 3);
    }

    #[test]
    fn test_no_stage_changes_means_no_steps() {
        let board = board();
        let task = task(
            "Status only",
            vec![Event::status_change(at(100), Some("open"), "resolved")],
        );
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.steps_between(&interval(0, 1_000)), 0);
        assert_eq!(replay.stage_at(AsOf::Now), ENTRY_ORDINAL);
    }

    #[test]
    fn test_unrecognized_events_are_ignored() {
        let board = board();
        let task = task(
            "Noisy",
            vec![
                Event::new(
                    at(50),
                    EventKind::Unrecognized {
                        transaction_type: "core:comment".into(),
                    },
                ),
                Event::stage_change(at(100), None, Some(DOING)),
            ],
        );
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.stage_at(AsOf::Now), 1);
        assert_eq!(replay.steps_between(&interval(0, 1)), 1);
        assert_eq!(replay.resolved_at(), None);
    }

    #[test]
    fn test_oldest_first_log_is_replayed_as_delivered() {
        let board = board();
        let task = Task::new(
            TaskId::new(2),
            "Ascending",
            vec![
                Event::stage_change(at(100), Some(BACKLOG), Some(DOING)),
                Event::stage_change(at(200), Some(DOING), Some(DONE)),
            ],
        );
        assert!(!task.is_newest_first());

        // The log is trusted as given, so its first entry is taken as the latest move
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.stage_at(AsOf::Now), 1);
        assert_eq!(replay.stage_at(at(150)), ENTRY_ORDINAL);
        assert_eq!(replay.stage_at(at(250)), 1);
        assert_eq!(replay.current_stage(), 1);
    }

    #[test]
    fn test_empty_log_replays_to_entry() {
        let board = board();
        let task = task("Fresh [8 pts]", vec![]);
        let replay = TaskReplayer::new(&task, &board);
        assert_eq!(replay.stage_at(AsOf::Now), ENTRY_ORDINAL);
        assert_eq!(replay.effort_estimate(), Some(8));
        assert!(!replay.resolved_between(&interval(0, i64::from(u32::MAX))));
    }
}
