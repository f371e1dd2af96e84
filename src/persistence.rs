//! Durable high score.
//!
//! The best score lives as a single integer under a fixed key in a small
//! JSON key/value file. Reading is forgiving: a missing file, a missing key
//! or a value that does not parse all count as 0. Other keys in the file are
//! left untouched on write.

use anyhow::{Context, Result};
use log::warn;
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Key the score is stored under
pub const HIGH_SCORE_KEY: &str = "snake-high-score";

#[derive(Debug, Clone)]
pub struct HighScoreStore {
    path: PathBuf,
}

impl HighScoreStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stored best score, or 0 if there is none
    pub fn load(&self) -> u32 {
        let Ok(json) = std::fs::read_to_string(&self.path) else {
            return 0;
        };

        match serde_json::from_str::<Map<String, Value>>(&json) {
            Ok(map) => map.get(HIGH_SCORE_KEY).map(parse_score).unwrap_or(0),
            Err(e) => {
                warn!("ignoring unreadable high score file {:?}: {e}", self.path);
                0
            }
        }
    }

    /// Write `score` under the high score key
    pub fn save(&self, score: u32) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {:?}", parent))?;
        }

        let mut map = std::fs::read_to_string(&self.path)
            .ok()
            .and_then(|json| serde_json::from_str::<Map<String, Value>>(&json).ok())
            .unwrap_or_default();
        map.insert(HIGH_SCORE_KEY.to_string(), Value::from(score));

        let json = serde_json::to_string_pretty(&map).context("Failed to serialize high score")?;

        // Write aside, then rename over the record
        let staging = self.staging_path();
        std::fs::write(&staging, json)
            .with_context(|| format!("Failed to write high score to {:?}", staging))?;
        std::fs::rename(&staging, &self.path)
            .with_context(|| format!("Failed to replace high score file {:?}", self.path))?;

        Ok(())
    }

    /// Sibling file the next record is written to before it replaces `path`
    fn staging_path(&self) -> PathBuf {
        let mut name = self.path.clone().into_os_string();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

/// Accepts both numbers and numeric strings
fn parse_score(value: &Value) -> u32 {
    match value {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()).unwrap_or(0),
        Value::String(s) => s.trim().parse().unwrap_or(0),
        _ => 0,
    }
}
