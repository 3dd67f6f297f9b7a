//! Ingestion of raw tracker transactions.
//!
//! The tracker delivers transactions as loosely typed JSON: column
//! references arrive as a bare string, a list, or a keyed map depending on
//! the API version, and numbers are sometimes strings. Everything is
//! normalized here into [`EventKind`] so replay never branches on shape.

use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::event::{Event, EventKind};
use crate::Time;

/// Legacy column move.
pub const TX_PROJECT_COLUMN: &str = "projectcolumn";
/// Column move as reported by newer tracker versions.
pub const TX_CORE_COLUMNS: &str = "core:columns";
/// Status change.
pub const TX_STATUS: &str = "status";
/// Story points change.
pub const TX_POINTS: &str = "points";

/// One transaction as delivered by the tracker.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawTransaction {
    /// Transaction type tag
    #[serde(default)]
    pub transaction_type: String,

    /// Creation time in epoch seconds (number or numeric string)
    #[serde(default)]
    pub date_created: Value,

    /// Value before the change
    #[serde(default)]
    pub old_value: Value,

    /// Value after the change
    #[serde(default)]
    pub new_value: Value,
}

/// Column reference in any of the shapes the tracker emits.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum ColumnRef {
    One(String),
    Many(Vec<String>),
    Keyed(BTreeMap<String, String>),
}

impl ColumnRef {
    fn parse(value: &Value) -> Option<Self> {
        serde_json::from_value(value.clone()).ok()
    }

    /// First referenced column, if any.
    fn first(self) -> Option<String> {
        match self {
            ColumnRef::One(id) => Some(id),
            ColumnRef::Many(ids) => ids.into_iter().next(),
            ColumnRef::Keyed(ids) => ids.into_values().next(),
        }
    }
}

impl RawTransaction {
    /// Read one transaction record; `None` when it is not a transaction object.
    pub fn from_value(value: Value) -> Option<Self> {
        serde_json::from_value(value).ok()
    }

    /// Normalize into an [`Event`].
    ///
    /// Returns `None` only when the timestamp is unusable; every other
    /// oddity becomes [`EventKind::Unrecognized`].
    pub fn into_event(self) -> Option<Event> {
        let timestamp = parse_epoch(&self.date_created)?;
        let kind = self.normalize_kind().unwrap_or_else(|| {
            debug!(
                transaction_type = %self.transaction_type,
                "Unrecognized transaction payload"
            );
            EventKind::Unrecognized {
                transaction_type: self.transaction_type.clone(),
            }
        });
        Some(Event::new(timestamp, kind))
    }

    fn normalize_kind(&self) -> Option<EventKind> {
        match self.transaction_type.as_str() {
            TX_PROJECT_COLUMN => {
                let from = legacy_column_side(&self.old_value)?;
                let to = match &self.new_value {
                    Value::Null => return None,
                    other => legacy_column_side(other)?,
                };
                Some(EventKind::StageChange { from, to })
            }
            TX_CORE_COLUMNS => {
                let entry = self.new_value.as_array()?.first()?.as_object()?;
                let to = entry.get("columnPHID")?.as_str()?.to_string();
                let from = match entry.get("fromColumnPHIDs") {
                    None | Some(Value::Null) => None,
                    Some(refs) => ColumnRef::parse(refs)?.first(),
                };
                Some(EventKind::StageChange { from, to: Some(to) })
            }
            TX_STATUS => {
                let to = self.new_value.as_str()?.to_string();
                let from = self.old_value.as_str().map(str::to_string);
                Some(EventKind::StatusChange { from, to: Some(to) })
            }
            TX_POINTS => {
                let to = match &self.new_value {
                    Value::Null => None,
                    other => Some(parse_points(other)?),
                };
                Some(EventKind::PointsChange { to })
            }
            _ => None,
        }
    }
}

/// Normalize a newest-first transaction list, keeping its order.
///
/// Records that do not parse as a transaction, or carry no usable
/// timestamp, are dropped and counted.
pub fn normalize_log(raw: Vec<Value>) -> Vec<Event> {
    let total = raw.len();
    let events: Vec<Event> = raw
        .into_iter()
        .filter_map(RawTransaction::from_value)
        .filter_map(RawTransaction::into_event)
        .collect();
    if events.len() < total {
        warn!(
            skipped = total - events.len(),
            "Skipped malformed transactions"
        );
    }
    events
}

/// One side of a legacy column move: `null` or `{"columnPHIDs": ...}`.
///
/// Outer `None` means malformed, inner `None` means outside any column.
fn legacy_column_side(value: &Value) -> Option<Option<String>> {
    match value {
        Value::Null => Some(None),
        Value::Object(fields) => match fields.get("columnPHIDs") {
            None | Some(Value::Null) => Some(None),
            Some(refs) => Some(ColumnRef::parse(refs)?.first()),
        },
        _ => None,
    }
}

fn parse_epoch(value: &Value) -> Option<Time> {
    let secs = match value {
        Value::Number(n) => n.as_i64()?,
        Value::String(s) => s.trim().parse().ok()?,
        _ => return None,
    };
    Utc.timestamp_opt(secs, 0).single()
}

fn parse_points(value: &Value) -> Option<u32> {
    match value {
        Value::Number(n) => n.as_u64().and_then(|v| u32::try_from(v).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}
