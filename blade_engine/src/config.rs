use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// Timing knobs for the runtime. Everything has a default so a partial JSON
/// file only overrides what it names.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Seconds a subtitle stays up per character of text.
    pub subtitle_time_per_char: f32,
    /// Lower bound for a subtitle's on-screen time.
    pub subtitle_min_time: f32,
    /// Duration used for animations the story didn't give a length.
    pub default_animation_time: f32,
    /// Fixed frame delta used by the CLI driver.
    pub frame_delta: f32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            subtitle_time_per_char: 0.1,
            subtitle_min_time: 1.5,
            default_animation_time: 0.0,
            frame_delta: 1.0 / 60.0,
        }
    }
}

impl EngineConfig {
    pub fn from_json_file(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let data = fs::read_to_string(path)
            .with_context(|| format!("reading engine config from {}", path.display()))?;
        let config = serde_json::from_str(&data)
            .with_context(|| format!("parsing engine config from {}", path.display()))?;
        Ok(config)
    }

    /// On-screen time for a subtitle of the given text.
    pub fn subtitle_duration(&self, text: &str) -> f32 {
        let chars = text.chars().count() as f32;
        (chars * self.subtitle_time_per_char).max(self.subtitle_min_time)
    }
}

#[cfg(test)]
mod tests {
    use super::EngineConfig;

    #[test]
    fn partial_json_keeps_defaults() {
        let config: EngineConfig =
            serde_json::from_str(r#"{ "subtitle_min_time": 0.5 }"#).expect("parse config");
        assert_eq!(config.subtitle_min_time, 0.5);
        assert_eq!(config.subtitle_time_per_char, 0.1);
    }

    #[test]
    fn subtitle_duration_has_floor() {
        let config = EngineConfig::default();
        assert_eq!(config.subtitle_duration("Hi"), 1.5);
        let long = "x".repeat(40);
        assert!((config.subtitle_duration(&long) - 4.0).abs() < 1e-5);
    }
}
