//! Engine settings.
//!
//! Settings live in a small JSON file. Every key is optional; a missing file
//! yields the defaults.

use anyhow::{Context, Result};
use camino::Utf8Path;
use log::warn;
use serde::{Deserialize, Serialize};

use crate::grid::{PadTemplate, default_prefix_table};

pub const DEFAULT_MAX_UNDO_STEPS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Depth of the undo stack.
    pub max_undo_steps: usize,
    /// Row letters for quick-creation prefixes.
    pub quick_prefix_table: Vec<String>,
    /// Step used when an anchor is nudged with the arrow keys.
    pub anchor_nudge_step_mm: f64,
    /// Pad used by quick creation when a request does not name one.
    pub default_pad: PadTemplate,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_undo_steps: DEFAULT_MAX_UNDO_STEPS,
            quick_prefix_table: default_prefix_table(),
            anchor_nudge_step_mm: 0.2,
            default_pad: PadTemplate::default(),
        }
    }
}

impl EngineConfig {
    /// Load settings from `path`, using defaults when the file does not exist.
    pub fn load(path: &Utf8Path) -> Result<Self> {
        if !path.exists() {
            warn!("Settings file not found at '{path}'. Using default values.");
            return Ok(Self::default());
        }
        let text =
            std::fs::read_to_string(path).with_context(|| format!("Failed to read {path}"))?;
        Self::from_json(&text).with_context(|| format!("Malformed settings file {path}"))
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let config: EngineConfig = serde_json::from_str(text)?;
        Ok(config.sanitized())
    }

    /// Save settings as pretty JSON.
    pub fn save(&self, path: &Utf8Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("Failed to write {path}"))?;
        Ok(())
    }

    fn sanitized(mut self) -> Self {
        if self.max_undo_steps == 0 {
            warn!("max_undo_steps must be at least 1; using 1");
            self.max_undo_steps = 1;
        }
        if !(self.anchor_nudge_step_mm > 0.0 && self.anchor_nudge_step_mm.is_finite()) {
            warn!("anchor_nudge_step_mm must be positive; using 0.2");
            self.anchor_nudge_step_mm = 0.2;
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use camino::Utf8PathBuf;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let cfg = EngineConfig::from_json(r#"{ "max_undo_steps": 3 }"#).unwrap();
        assert_eq!(cfg.max_undo_steps, 3);
        assert_eq!(cfg.anchor_nudge_step_mm, 0.2);
        assert_eq!(cfg.quick_prefix_table[8], "J");
    }

    #[test]
    fn test_zero_depth_is_clamped() {
        let cfg = EngineConfig::from_json(r#"{ "max_undo_steps": 0 }"#).unwrap();
        assert_eq!(cfg.max_undo_steps, 1);
    }

    #[test]
    fn test_missing_file_gives_defaults() {
        let cfg = EngineConfig::load(&Utf8PathBuf::from("/definitely/not/here.json")).unwrap();
        assert_eq!(cfg, EngineConfig::default());
    }

    #[test]
    fn test_malformed_json_is_an_error() {
        assert!(EngineConfig::from_json("{ not json").is_err());
    }
}
