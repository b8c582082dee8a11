//! Configuration for subprogram extraction.
//!
//! Loaded from a TOML file; every field has a default so a partial or
//! missing file still yields a usable config.

use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::warn;

use crate::error::Result;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    pub layout: LayoutConfig,
    pub extraction: ExtractionConfig,
}

/// Placement of the synthesized interface nodes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LayoutConfig {
    /// Distance of the group input left of the selection.
    pub input_offset: f32,
    /// Distance of the group output right of the selection.
    pub output_offset: f32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            input_offset: 250.0,
            output_offset: 250.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExtractionConfig {
    /// Undo already applied mutations when the rewrite fails midway.
    pub rollback_on_failure: bool,
    /// Select the inserted nodes so the editor can start moving them.
    pub select_inserted: bool,
    /// Name given to new subprograms.
    pub subprogram_name: String,
}

impl Default for ExtractionConfig {
    fn default() -> Self {
        Self {
            rollback_on_failure: true,
            select_inserted: true,
            subprogram_name: "Group".to_string(),
        }
    }
}

impl GroupConfig {
    /// Load config from a TOML file, falling back to defaults when the file
    /// is missing or invalid.
    pub fn load(path: &Path) -> Self {
        if !path.exists() {
            return Self::default();
        }
        match Self::try_load(path) {
            Ok(config) => config,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "invalid config, using defaults");
                Self::default()
            }
        }
    }

    /// Load config from a TOML file, reporting any error.
    pub fn try_load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }
}
