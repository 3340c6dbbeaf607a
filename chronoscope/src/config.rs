//! Engine configuration
//!
//! Every knob has a default matching the profiler's historical behavior; a
//! JSON file may override any subset of them.

use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::domain::ConfigError;

/// Vertical layout of the track stack, in world units
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackLayout {
    /// Height of one depth row of spans
    pub text_box_height: f32,
    /// Height of one core row in the scheduler track
    pub core_height: f32,
    /// Height of a graph (value) track
    pub graph_track_height: f32,
    pub space_between_tracks: f32,
    pub track_top_margin: f32,
    pub track_bottom_margin: f32,
}

impl Default for TrackLayout {
    fn default() -> Self {
        Self {
            text_box_height: 20.0,
            core_height: 10.0,
            graph_track_height: 20.0,
            space_between_tracks: 10.0,
            track_top_margin: 5.0,
            track_bottom_margin: 5.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TimeGraphConfig {
    /// Width of the window `zoom_to_fit` shows, ending at the capture end
    pub history_seconds: f64,
    /// Minimum delay between two track re-sorts while capturing
    #[serde(with = "millis")]
    pub reorder_interval: Duration,
    /// Records per chain block
    pub block_capacity: usize,
    /// Relative step applied by one wheel notch in `zoom_time`
    pub zoom_increment: f64,
    /// Default bias used when a selection is moved into view
    pub move_into_view_bias: f64,
    pub layout: TrackLayout,
}

impl Default for TimeGraphConfig {
    fn default() -> Self {
        Self {
            history_seconds: 2.0,
            reorder_interval: Duration::from_secs(1),
            block_capacity: 1024,
            zoom_increment: 0.1,
            move_into_view_bias: 0.3,
            layout: TrackLayout::default(),
        }
    }
}

impl TimeGraphConfig {
    /// Load a JSON config file; missing keys keep their defaults
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.history_seconds.is_finite() && self.history_seconds > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "history_seconds must be positive, got {}",
                self.history_seconds
            )));
        }
        if self.block_capacity == 0 {
            return Err(ConfigError::Invalid("block_capacity must be at least 1".to_string()));
        }
        if !(self.zoom_increment.is_finite() && self.zoom_increment > 0.0) {
            return Err(ConfigError::Invalid(format!(
                "zoom_increment must be positive, got {}",
                self.zoom_increment
            )));
        }
        if !(0.0..=1.0).contains(&self.move_into_view_bias) {
            return Err(ConfigError::Invalid(format!(
                "move_into_view_bias must be within [0, 1], got {}",
                self.move_into_view_bias
            )));
        }
        Ok(())
    }

    /// History window in microseconds
    #[must_use]
    pub fn history_us(&self) -> f64 {
        self.history_seconds * 1_000_000.0
    }
}

mod millis {
    use serde::{Deserialize, Deserializer};
    use std::time::Duration;

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = TimeGraphConfig::default();
        assert_eq!(config.history_us(), 2_000_000.0);
        assert_eq!(config.reorder_interval, Duration::from_secs(1));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config: TimeGraphConfig =
            serde_json::from_str(r#"{"history_seconds": 5.0, "reorder_interval": 250}"#).unwrap();
        assert_eq!(config.history_seconds, 5.0);
        assert_eq!(config.reorder_interval, Duration::from_millis(250));
        assert_eq!(config.block_capacity, 1024);
        assert_eq!(config.layout, TrackLayout::default());
    }

    #[test]
    fn test_validate_rejects_zero_capacity() {
        let config = TimeGraphConfig { block_capacity: 0, ..TimeGraphConfig::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, r#"{"layout": {"text_box_height": 12.0}}"#).unwrap();
        let config = TimeGraphConfig::from_file(&path).unwrap();
        assert_eq!(config.layout.text_box_height, 12.0);
        assert_eq!(config.layout.space_between_tracks, 10.0);
    }
}
