//! Stage definitions and the ordinal mapper.
//!
//! Raw events reference stages by opaque identifiers (board column PHIDs).
//! [`StageMap`] translates those into positions on the configured pipeline.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, Result};

/// Ordinal reported for any stage the pipeline does not track.
pub const OUTSIDE_PIPELINE: u32 = 0;

/// One configured stage of the pipeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StageDefinition {
    /// Opaque identifier as it appears in raw events
    pub identifier: String,

    /// Human readable name
    pub display_name: String,

    /// Position in the pipeline (entry = 0)
    pub ordinal: u32,
}

impl StageDefinition {
    /// Create a new stage definition.
    pub fn new(identifier: impl Into<String>, display_name: impl Into<String>, ordinal: u32) -> Self {
        Self {
            identifier: identifier.into(),
            display_name: display_name.into(),
            ordinal,
        }
    }
}

/// Validated lookup from stage identifier to ordinal.
#[derive(Debug, Clone)]
pub struct StageMap {
    stages: Vec<StageDefinition>,
    by_identifier: HashMap<String, u32>,
    max_ordinal: u32,
}

impl StageMap {
    /// Build a map from stage definitions.
    ///
    /// Rejects pipelines that cannot normalize progress: no stages, a highest
    /// ordinal of zero, or duplicated identifiers/ordinals.
    pub fn new(definitions: Vec<StageDefinition>) -> Result<Self> {
        if definitions.is_empty() {
            return Err(ConfigError::NoStages);
        }

        let mut by_identifier = HashMap::with_capacity(definitions.len());
        let mut by_ordinal: HashMap<u32, &str> = HashMap::with_capacity(definitions.len());

        for def in &definitions {
            if by_identifier.insert(def.identifier.clone(), def.ordinal).is_some() {
                return Err(ConfigError::DuplicateStage(def.identifier.clone()));
            }
            if let Some(first) = by_ordinal.insert(def.ordinal, &def.identifier) {
                return Err(ConfigError::DuplicateOrdinal {
                    ordinal: def.ordinal,
                    first: first.to_string(),
                    second: def.identifier.clone(),
                });
            }
        }

        let max_ordinal = definitions.iter().map(|d| d.ordinal).max().unwrap_or(0);
        if max_ordinal == 0 {
            return Err(ConfigError::DegeneratePipeline { max_ordinal });
        }

        let mut stages = definitions;
        stages.sort_by_key(|d| d.ordinal);

        Ok(Self {
            stages,
            by_identifier,
            max_ordinal,
        })
    }

    /// Ordinal of a stage identifier, or [`OUTSIDE_PIPELINE`] when unknown.
    pub fn ordinal_of(&self, identifier: &str) -> u32 {
        self.by_identifier
            .get(identifier)
            .copied()
            .unwrap_or(OUTSIDE_PIPELINE)
    }

    /// Ordinal of an optional identifier; a missing side counts as outside.
    pub fn ordinal_of_opt(&self, identifier: Option<&str>) -> u32 {
        identifier.map_or(OUTSIDE_PIPELINE, |id| self.ordinal_of(id))
    }

    /// Highest configured ordinal (always > 0).
    pub fn max_ordinal(&self) -> u32 {
        self.max_ordinal
    }

    /// Display name of the stage at `ordinal`.
    pub fn display_name(&self, ordinal: u32) -> Option<&str> {
        self.stages
            .iter()
            .find(|d| d.ordinal == ordinal)
            .map(|d| d.display_name.as_str())
    }

    /// Stages in pipeline order.
    pub fn stages(&self) -> &[StageDefinition] {
        &self.stages
    }
}
