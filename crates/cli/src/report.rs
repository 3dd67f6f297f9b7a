//! Report assembly and rendering.

use std::fmt;

use anyhow::{bail, Result};
use boardpulse_core::{Interval, Time};
use boardpulse_engine::{Metrics, ResolvedTask};
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

/// Everything printed for one run.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    /// Reported interval
    pub interval: Interval,

    /// Aggregate metrics
    pub metrics: Metrics,

    /// Tasks resolved in the interval
    pub resolved: Vec<ResolvedTask>,
}

/// Plain text rendering: resolved tasks, then the aggregate line.
impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Resolved {} - {} ({})",
            self.interval.start.format("%Y-%m-%d %H:%M"),
            self.interval.end.format("%Y-%m-%d %H:%M"),
            self.resolved.len()
        )?;
        for task in &self.resolved {
            let marker = if task.defaulted { "*" } else { "" };
            writeln!(
                f,
                "  {:>6} | {:>3}{:<1} pts | {} | {:<10} | {}",
                task.id.to_string(),
                task.points,
                marker,
                task.resolved_at.format("%Y-%m-%d"),
                task.stage.as_deref().unwrap_or("-"),
                task.title
            )?;
        }
        writeln!(
            f,
            "Effort resolved: {} | Effort advanced: {:.2} | Average volatility: {:.2}",
            self.metrics.effort_resolved,
            self.metrics.effort_advanced,
            self.metrics.average_volatility
        )
    }
}

/// Parse `YYYY-MM-DD` (UTC midnight) or an RFC 3339 timestamp.
pub fn parse_instant(value: &str) -> Result<Time> {
    if let Ok(date) = NaiveDate::parse_from_str(value, "%Y-%m-%d") {
        if let Some(midnight) = date.and_hms_opt(0, 0, 0) {
            return Ok(midnight.and_utc());
        }
    }
    match DateTime::parse_from_rfc3339(value) {
        Ok(instant) => Ok(instant.with_timezone(&Utc)),
        Err(_) => bail!("Invalid date '{}': expected YYYY-MM-DD or RFC 3339", value),
    }
}

/// Resolve CLI date options into an interval.
pub fn select_interval(
    since: Option<&str>,
    until: Option<&str>,
    days: u32,
    now: Time,
) -> Result<Interval> {
    let end = until.map(parse_instant).transpose()?.unwrap_or(now);
    match since {
        Some(since) => Ok(Interval::new(parse_instant(since)?, end)?),
        None => Ok(Interval::days_before(end, days)?),
    }
}
