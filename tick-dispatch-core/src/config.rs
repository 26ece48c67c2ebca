//! Runner and frame-loop configuration
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```
//! use tick_dispatch_core::RunnerConfig;
//!
//! let config = RunnerConfig::from_json(r#"{ "name": "intro", "frame": { "frame_interval_ms": 33 } }"#)
//!     .expect("valid config");
//! assert_eq!(config.name, "intro");
//! assert_eq!(config.frame.frame_interval_ms, 33);
//! assert_eq!(config.frame.max_delta_ms, 250);
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::log::ActionLogConfig;

/// Configuration for a [`Runner`](crate::Runner).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RunnerConfig {
    /// Owner name passed to the sink with every report
    pub name: String,
    /// Mirror lifecycle reports to `tracing`
    pub tracing: bool,
    pub log: ActionLogConfig,
    pub frame: FrameConfig,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            name: "runner".to_string(),
            tracing: true,
            log: ActionLogConfig::default(),
            frame: FrameConfig::default(),
        }
    }
}

impl RunnerConfig {
    /// Parse and validate a JSON config.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json).map_err(ConfigError::Parse)?;
        config.validate()?;
        Ok(config)
    }

    /// Read, parse and validate a JSON config file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path).map_err(ConfigError::Io)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.name.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "name",
                reason: "must not be empty".to_string(),
            });
        }
        self.frame.validate()
    }
}

/// Timing of the frame loop in [`runtime::drive`](crate::runtime::drive).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Target time between ticks
    pub frame_interval_ms: u64,
    /// Upper bound on the delta handed to a single tick
    pub max_delta_ms: u64,
    /// Stop once the runner has nothing running or queued
    pub stop_when_idle: bool,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            frame_interval_ms: 16,
            max_delta_ms: 250,
            stop_when_idle: true,
        }
    }
}

impl FrameConfig {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_millis(self.frame_interval_ms)
    }

    pub fn max_delta(&self) -> Duration {
        Duration::from_millis(self.max_delta_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.frame_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "frame.frame_interval_ms",
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.max_delta_ms < self.frame_interval_ms {
            return Err(ConfigError::Invalid {
                field: "frame.max_delta_ms",
                reason: format!(
                    "must be at least frame_interval_ms ({})",
                    self.frame_interval_ms
                ),
            });
        }
        Ok(())
    }
}

/// Errors from loading a [`RunnerConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(serde_json::Error),
    Invalid { field: &'static str, reason: String },
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "Failed to read config: {}", e),
            ConfigError::Parse(e) => write!(f, "Invalid config JSON: {}", e),
            ConfigError::Invalid { field, reason } => write!(f, "Invalid `{}`: {}", field, reason),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(e) => Some(e),
            ConfigError::Parse(e) => Some(e),
            ConfigError::Invalid { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::log::LifecycleFilter;

    #[test]
    fn test_empty_object_is_default() {
        let config = RunnerConfig::from_json("{}").unwrap();
        assert_eq!(config, RunnerConfig::default());
    }

    #[test]
    fn test_nested_log_filter() {
        let json = r#"{
            "log": { "capacity": 8, "filter": { "exclude": ["Delay*"] } }
        }"#;
        let config = RunnerConfig::from_json(json).unwrap();
        assert_eq!(config.log.capacity, 8);
        assert_eq!(
            config.log.filter,
            LifecycleFilter::new(None, Some("Delay*"))
        );
    }

    #[test]
    fn test_parse_error() {
        let err = RunnerConfig::from_json("{ name: ").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
        assert!(err.to_string().starts_with("Invalid config JSON"));
    }

    #[test]
    fn test_zero_frame_interval_rejected() {
        let err = RunnerConfig::from_json(r#"{ "frame": { "frame_interval_ms": 0 } }"#).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Invalid {
                field: "frame.frame_interval_ms",
                ..
            }
        ));
    }

    #[test]
    fn test_max_delta_below_interval_rejected() {
        let json = r#"{ "frame": { "frame_interval_ms": 100, "max_delta_ms": 50 } }"#;
        let err = RunnerConfig::from_json(json).unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid `frame.max_delta_ms`: must be at least frame_interval_ms (100)"
        );
    }

    #[test]
    fn test_blank_name_rejected() {
        let err = RunnerConfig::from_json(r#"{ "name": "  " }"#).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { field: "name", .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = RunnerConfig::load("/nonexistent/tick-dispatch.json").unwrap_err();
        assert!(matches!(err, ConfigError::Io(_)));
    }

    #[test]
    fn test_durations() {
        let frame = FrameConfig::default();
        assert_eq!(frame.frame_interval(), Duration::from_millis(16));
        assert_eq!(frame.max_delta(), Duration::from_millis(250));
    }
}
