use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

use crate::EditorError;

pub const DEFAULT_CONFIG_NAME: &str = "inkpress.config.json";

/// Editor configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EditorConfig {
    /// Quiet interval after the last edit before autosave fires
    pub autosave_quiet_ms: u64,

    pub words_per_minute: u32,

    /// Readability score used while no remote analysis matches the content
    pub readability_fallback: f64,

    pub suggestion_timeout_ms: u64,

    /// Base URL of the article store, suggestion and analysis endpoints
    pub api_base_url: String,

    /// Character that opens the quick-insert palette
    pub trigger_char: char,

    pub undo_levels: usize,

    /// Author label attached to new comments
    pub author_label: String,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self {
            autosave_quiet_ms: 3000,
            words_per_minute: 200,
            readability_fallback: 60.0,
            suggestion_timeout_ms: 8000,
            api_base_url: "http://localhost:3000/api".to_string(),
            trigger_char: '/',
            undo_levels: 100,
            author_label: "Author".to_string(),
        }
    }
}

impl EditorConfig {
    /// Load config from a directory, defaults if there is no config file
    pub fn load(dir: &Path) -> Result<Self, EditorError> {
        let config_path = dir.join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            Self::from_json(&content)
        } else {
            Ok(Self::default())
        }
    }

    pub fn from_json(content: &str) -> Result<Self, EditorError> {
        Ok(serde_json::from_str(content)?)
    }

    pub fn autosave_quiet(&self) -> Duration {
        Duration::from_millis(self.autosave_quiet_ms)
    }

    pub fn suggestion_timeout(&self) -> Duration {
        Duration::from_millis(self.suggestion_timeout_ms)
    }
}
