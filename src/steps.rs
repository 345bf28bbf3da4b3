//! Step list loading.
//!
//! Step files are JSON arrays of named action groups. Every action is checked
//! for its required fields while the file is parsed, so a malformed step list
//! is rejected before any step runs.
use crate::actions::ActionSpec;
use crate::templates;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// A named, ordered group of actions.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Step {
    pub name: String,
    #[serde(default)]
    pub actions: Vec<ActionSpec>,
    #[serde(default)]
    pub skip: bool,
}

impl Step {
    /// Skipped steps and steps without actions produce no artifact.
    pub fn is_noop(&self) -> bool {
        self.skip || self.actions.is_empty()
    }
}

pub fn parse_steps(text: &str) -> Result<Vec<Step>> {
    serde_json::from_str(text).context("parse steps JSON")
}

/// Load a step list from a JSON file.
pub fn load_steps(path: &Path) -> Result<Vec<Step>> {
    let text = fs::read_to_string(path).with_context(|| format!("read steps {}", path.display()))?;
    parse_steps(&text).with_context(|| format!("load steps {}", path.display()))
}

/// The step list shipped with the binary.
pub fn default_steps() -> Result<Vec<Step>> {
    parse_steps(templates::DEFAULT_STEPS_JSON).context("load embedded default steps")
}

#[cfg(test)]
#[path = "steps_tests.rs"]
mod tests;
