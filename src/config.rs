//! Run configuration.
//!
//! Settings can come from a JSON file; every field is optional:
//!
//! ```json
//! { "max_cycles": 1000, "trace": true, "interactive": false, "dump_format": "binary" }
//! ```
//!
//! Command-line flags are applied on top of the file.

use crate::cpu::DumpFormat;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

/// Settings for a simulator run.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RunConfig {
    /// Stop after this many instructions. `None` runs until a fault.
    pub max_cycles: Option<u64>,
    /// Print every executed instruction.
    pub trace: bool,
    /// Prompt for memory dumps after each cycle.
    pub interactive: bool,
    /// Format used when a dump prompt does not name one.
    pub dump_format: DumpFormat,
}

impl RunConfig {
    /// Parse a configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Load a configuration file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Self::from_json(&text)
    }
}

/// Errors that can occur while loading a configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {path}: {message}")]
    Io { path: String, message: String },

    #[error("invalid configuration: {0}")]
    Parse(#[from] serde_json::Error),
}
