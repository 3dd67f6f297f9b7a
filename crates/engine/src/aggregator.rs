//! Reduction of replayed tasks into board metrics.

use boardpulse_core::{Board, Interval, Task, TaskId, Time};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::replayer::{AsOf, TaskReplayer};

/// Aggregate metrics for one interval.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    /// Points of tasks resolved in the interval
    pub effort_resolved: u64,

    /// Points-weighted stage progress across all tasks (may be negative)
    pub effort_advanced: f64,

    /// Mean lifetime stage steps of resolved tasks
    pub average_volatility: f64,

    /// Number of tasks resolved in the interval
    pub resolved_count: usize,
}

/// A task resolved inside the interval, for reporting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTask {
    /// Task id
    pub id: TaskId,

    /// Task title
    pub title: String,

    /// Effort counted for the task
    pub points: u32,

    /// Whether `points` is the board default rather than an estimate
    pub defaulted: bool,

    /// Latest resolution time
    pub resolved_at: Time,

    /// Lifetime stage steps
    pub steps: u32,

    /// Display name of the stage the task sits in now
    pub stage: Option<String>,
}

/// Computes board metrics over a task collection.
pub struct MetricsAggregator<'a> {
    board: &'a Board,
}

impl<'a> MetricsAggregator<'a> {
    /// Create an aggregator over `board`.
    pub fn new(board: &'a Board) -> Self {
        Self { board }
    }

    fn replay<'t>(&self, task: &'t Task) -> TaskReplayer<'t>
    where
        'a: 't,
    {
        TaskReplayer::new(task, self.board)
    }

    /// Compute all metrics for `[interval.start, interval.end)`.
    pub fn compute_metrics(&self, tasks: &[Task], interval: &Interval) -> Metrics {
        let metrics = self.fold(tasks, interval);

        info!(
            tasks = tasks.len(),
            resolved = metrics.resolved_count,
            effort_resolved = metrics.effort_resolved,
            effort_advanced = metrics.effort_advanced,
            average_volatility = metrics.average_volatility,
            "Computed board metrics"
        );

        metrics
    }

    /// Sum of effort over tasks resolved in the interval.
    pub fn effort_resolved(&self, tasks: &[Task], interval: &Interval) -> u64 {
        self.fold(tasks, interval).effort_resolved
    }

    /// Effort weighted by the fraction of the pipeline crossed in the interval.
    ///
    /// Crossing every stage counts a task's full points; moving backwards
    /// subtracts.
    pub fn effort_advanced(&self, tasks: &[Task], interval: &Interval) -> f64 {
        self.fold(tasks, interval).effort_advanced
    }

    /// Average lifetime steps of tasks resolved in the interval, 0 when none.
    pub fn average_volatility(&self, tasks: &[Task], interval: &Interval) -> f64 {
        self.fold(tasks, interval).average_volatility
    }

    /// Replay every task once and accumulate all metrics.
    fn fold(&self, tasks: &[Task], interval: &Interval) -> Metrics {
        let span = f64::from(self.board.stages.max_ordinal());
        let mut metrics = Metrics::default();
        let mut steps = 0u64;

        for task in tasks {
            let replay = self.replay(task);
            let points = replay.effort_or_default();

            let start = replay.stage_at(AsOf::At(interval.start));
            let end = replay.stage_at(AsOf::At(interval.end));
            let moved = f64::from(end) - f64::from(start);
            if moved != 0.0 {
                let advanced = moved / span * f64::from(points);
                debug!(task = %task.id, start, end, advanced, "Task moved");
                metrics.effort_advanced += advanced;
            }

            if replay.resolved_between(interval) {
                metrics.resolved_count += 1;
                metrics.effort_resolved += u64::from(points);
                steps += u64::from(replay.steps_between(interval));
            }
        }

        if metrics.resolved_count > 0 {
            metrics.average_volatility = steps as f64 / metrics.resolved_count as f64;
        }
        metrics
    }

    /// Tasks resolved in the interval, ordered by resolution time.
    pub fn resolved_tasks(&self, tasks: &[Task], interval: &Interval) -> Vec<ResolvedTask> {
        let mut resolved: Vec<ResolvedTask> = tasks
            .iter()
            .filter_map(|task| {
                let replay = self.replay(task);
                let resolved_at = replay.resolved_at().filter(|at| interval.contains(*at))?;
                let estimate = replay.effort_estimate();
                Some(ResolvedTask {
                    id: task.id,
                    title: task.title.clone(),
                    points: estimate.unwrap_or(self.board.default_points),
                    defaulted: estimate.is_none(),
                    resolved_at,
                    steps: replay.steps_between(interval),
                    stage: self
                        .board
                        .stages
                        .display_name(replay.current_stage())
                        .map(str::to_string),
                })
            })
            .collect();

        resolved.sort_by(|a, b| a.resolved_at.cmp(&b.resolved_at).then(a.id.cmp(&b.id)));
        resolved
    }
}

/// Compute metrics for `tasks` over `interval` with `board` settings.
pub fn compute_metrics(board: &Board, tasks: &[Task], interval: &Interval) -> Metrics {
    MetricsAggregator::new(board).compute_metrics(tasks, interval)
}
