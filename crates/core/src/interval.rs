//! Half-open reporting interval.

use chrono::TimeDelta;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};
use crate::Time;

/// The instant range `[start, end)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Interval {
    /// Inclusive start
    pub start: Time,

    /// Exclusive end
    pub end: Time,
}

impl Interval {
    /// Create an interval; `start == end` yields an empty interval.
    pub fn new(start: Time, end: Time) -> Result<Self> {
        if end < start {
            return Err(ConfigError::InvertedInterval { start, end });
        }
        Ok(Self { start, end })
    }

    /// Interval of `days` days ending at `end`.
    pub fn days_before(end: Time, days: u32) -> Result<Self> {
        let start = TimeDelta::try_days(i64::from(days))
            .and_then(|span| end.checked_sub_signed(span))
            .ok_or(ConfigError::IntervalOutOfRange { days, end })?;
        Ok(Self { start, end })
    }

    /// Whether `instant` lies in `[start, end)`.
    pub fn contains(&self, instant: Time) -> bool {
        self.start <= instant && instant < self.end
    }
}
