//! Event-log replay engine.
//!
//! [`TaskReplayer`] reconstructs where a task stood at any instant from its
//! change log; [`MetricsAggregator`] reduces a task collection into effort
//! resolved, effort advanced and average volatility for an interval.

#![warn(missing_docs)]

pub mod aggregator;
pub mod points;
pub mod replayer;

pub use aggregator::{compute_metrics, Metrics, MetricsAggregator, ResolvedTask};
pub use replayer::{AsOf, TaskReplayer, ENTRY_ORDINAL};
