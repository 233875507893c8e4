//! Configuration for a trajectory animation run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::animation::RecorderConfig;
use crate::compute::{
    DEFAULT_WINDOW_MINUTES, PlaybackSettings, parse_instant, resolve_window, span_from_minutes,
};
use crate::schema::{TidySet, TimeWindow};

fn default_fps() -> u32 {
    10
}

fn default_dpi() -> u32 {
    150
}

fn default_window_minutes() -> f64 {
    DEFAULT_WINDOW_MINUTES
}

/// Top-level run configuration, loaded from JSON.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnimationConfig {
    /// Playback rate in frames per second.
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Render resolution handed to the sink.
    #[serde(default = "default_dpi")]
    pub dpi: u32,
    /// Window start as date-time text or epoch seconds.
    #[serde(default)]
    pub window_start: Option<String>,
    /// Window end as date-time text or epoch seconds. Defaults to the last timestamp.
    #[serde(default)]
    pub window_end: Option<String>,
    /// Span of the window when `window_start` is not given.
    #[serde(default = "default_window_minutes")]
    pub window_minutes: f64,
    /// Field delimiter. Sniffed from the header when absent.
    #[serde(default)]
    pub delimiter: Option<char>,
    /// Where to record the animation, if anywhere.
    #[serde(default)]
    pub output: Option<PathBuf>,
    #[serde(default)]
    pub recorder: RecorderConfig,
}

impl Default for AnimationConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            dpi: default_dpi(),
            window_start: None,
            window_end: None,
            window_minutes: default_window_minutes(),
            delimiter: None,
            output: None,
            recorder: RecorderConfig::default(),
        }
    }
}

impl AnimationConfig {
    pub fn playback(&self) -> PlaybackSettings {
        PlaybackSettings {
            fps: self.fps,
            dpi: self.dpi,
        }
    }

    /// Parse the configured window bounds.
    pub fn bounds(&self) -> Result<(Option<DateTime<Utc>>, Option<DateTime<Utc>>), ConfigError> {
        let parse = |which: &'static str, value: &Option<String>| {
            value
                .as_deref()
                .map(|v| {
                    parse_instant(v).ok_or_else(|| ConfigError::InvalidBound {
                        which,
                        value: v.to_string(),
                    })
                })
                .transpose()
        };
        Ok((
            parse("window_start", &self.window_start)?,
            parse("window_end", &self.window_end)?,
        ))
    }

    /// Resolve the window against normalized data.
    ///
    /// Returns `Ok(None)` only when no end is configured and `set` is empty.
    pub fn resolve_window(&self, set: &TidySet) -> Result<Option<TimeWindow>, ConfigError> {
        let (start, end) = self.bounds()?;
        Ok(resolve_window(
            set,
            start,
            end,
            span_from_minutes(self.window_minutes),
        ))
    }

    /// Validate configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(self.window_minutes.is_finite() && self.window_minutes > 0.0) {
            return Err(ConfigError::InvalidWindowSpan(self.window_minutes));
        }
        if self.dpi == 0 {
            return Err(ConfigError::InvalidDpi);
        }
        if let Some(d) = self.delimiter {
            if !d.is_ascii() || matches!(d, '"' | '\n' | '\r') {
                return Err(ConfigError::InvalidDelimiter(d));
            }
        }
        self.bounds()?;
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Window span must be a positive number of minutes, got {0}")]
    InvalidWindowSpan(f64),
    #[error("DPI must be non-zero")]
    InvalidDpi,
    #[error("Delimiter {0:?} cannot be used")]
    InvalidDelimiter(char),
    #[error("{which} {value:?} is neither a date-time nor epoch seconds")]
    InvalidBound { which: &'static str, value: String },
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::animation::CompressionType;
    use crate::schema::{EntityId, TidyRecord};
    use chrono::TimeZone;

    #[test]
    fn test_defaults_from_empty_json() {
        let config: AnimationConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.fps, 10);
        assert_eq!(config.dpi, 150);
        assert_eq!(config.window_minutes, 5.0);
        assert!(config.output.is_none());
        assert_eq!(config.recorder.compression, CompressionType::None);
        config.validate().unwrap();
    }

    #[test]
    fn test_full_json() {
        let json = r#"{
            "fps": 12,
            "window_start": "2024-01-01T00:00:00Z",
            "window_end": "1704067500",
            "delimiter": ";",
            "output": "out.trja",
            "recorder": { "compression": "lz4", "delta_encoding": true }
        }"#;
        let config: AnimationConfig = serde_json::from_str(json).unwrap();
        config.validate().unwrap();
        let (start, end) = config.bounds().unwrap();
        assert_eq!(start, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()));
        assert_eq!(end, Some(Utc.with_ymd_and_hms(2024, 1, 1, 0, 5, 0).unwrap()));
        assert_eq!(config.delimiter, Some(';'));
        assert!(config.recorder.delta_encoding);
        assert_eq!(config.playback().fps, 12);
    }

    #[test]
    fn test_validation_errors() {
        let config = AnimationConfig {
            window_minutes: 0.0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidWindowSpan(_))));

        let config = AnimationConfig {
            dpi: 0,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDpi)));

        let config = AnimationConfig {
            delimiter: Some('"'),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDelimiter('"'))));

        let config = AnimationConfig {
            delimiter: Some('§'),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ConfigError::InvalidDelimiter('§'))));

        let config = AnimationConfig {
            window_end: Some("tomorrow".into()),
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidBound {
                which: "window_end",
                ..
            })
        ));
    }

    #[test]
    fn test_huge_window_span_resolves() {
        let config: AnimationConfig = serde_json::from_str(r#"{"window_minutes": 1e12}"#).unwrap();
        config.validate().unwrap();

        let at = |secs| Utc.timestamp_opt(secs, 0).unwrap();
        let set = TidySet::from_unsorted(
            [0, 60]
                .into_iter()
                .map(|secs| TidyRecord {
                    timestamp: at(secs),
                    entity_id: EntityId::N0,
                    x: 0.0,
                    y: 0.0,
                    z: 0.0,
                })
                .collect(),
        );
        let window = config.resolve_window(&set).unwrap().unwrap();
        assert_eq!(window.start, DateTime::<Utc>::MIN_UTC);
        assert_eq!(window.end, at(60));
    }

    #[test]
    fn test_example_roundtrips_through_json() {
        let config = AnimationConfig::default();
        let json = serde_json::to_string_pretty(&config).unwrap();
        let back: AnimationConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.fps, config.fps);
        assert_eq!(back.window_minutes, config.window_minutes);
    }
}
