//! Errors raised while setting up a run.

/// Result alias for configuration operations.
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Errors that can occur while loading or validating board configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// No stages configured
    #[error("no stages configured")]
    NoStages,

    /// Every stage sits at ordinal 0, so progress cannot be normalized
    #[error("pipeline needs at least two ordinals, highest ordinal is {max_ordinal}")]
    DegeneratePipeline {
        /// Highest configured ordinal
        max_ordinal: u32,
    },

    /// Two stages share an ordinal
    #[error("ordinal {ordinal} is used by both '{first}' and '{second}'")]
    DuplicateOrdinal {
        /// Shared ordinal
        ordinal: u32,
        /// First stage using it
        first: String,
        /// Second stage using it
        second: String,
    },

    /// Two stages share an identifier
    #[error("stage identifier '{0}' is configured twice")]
    DuplicateStage(String),

    /// Interval start falls outside the representable time range
    #[error("cannot go back {days} days from {end}")]
    IntervalOutOfRange {
        /// Requested length in days
        days: u32,
        /// Interval end
        end: crate::Time,
    },

    /// Interval ends before it starts
    #[error("interval end {end} is before start {start}")]
    InvertedInterval {
        /// Interval start
        start: crate::Time,
        /// Interval end
        end: crate::Time,
    },
}
