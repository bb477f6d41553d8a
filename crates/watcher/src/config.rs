//! Watch configuration

use crate::error::{Result, WatchError};
use semitia_core::DEFAULT_THRESHOLD;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Everything that affects how the core watches and classifies
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WatchConfig {
    /// Directories to watch (default: current directory)
    #[serde(default = "default_targets")]
    pub targets: Vec<PathBuf>,

    /// Watch subdirectories too (default: true)
    #[serde(default = "default_true")]
    pub recursive: bool,

    /// Debounce threshold (default: 4ms)
    #[serde(default = "default_threshold", rename = "threshold_ms", with = "millis")]
    pub threshold: Duration,
}

impl WatchConfig {
    /// Smallest accepted threshold
    pub const MIN_THRESHOLD: Duration = Duration::from_millis(1);
    /// Largest accepted threshold
    pub const MAX_THRESHOLD: Duration = Duration::from_secs(10);

    pub fn new(targets: Vec<PathBuf>) -> Self {
        Self {
            targets,
            ..Self::default()
        }
    }

    pub fn recursive(mut self, recursive: bool) -> Self {
        self.recursive = recursive;
        self
    }

    pub fn threshold(mut self, threshold: Duration) -> Self {
        self.threshold = threshold;
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.targets.is_empty() {
            return Err(WatchError::InvalidConfig(
                "at least one target path is required".to_string(),
            ));
        }

        if self.threshold < Self::MIN_THRESHOLD || self.threshold > Self::MAX_THRESHOLD {
            return Err(WatchError::InvalidConfig(format!(
                "threshold must be between {}ms and {}ms, got {}ms",
                Self::MIN_THRESHOLD.as_millis(),
                Self::MAX_THRESHOLD.as_millis(),
                self.threshold.as_millis()
            )));
        }

        Ok(())
    }

    /// Targets as absolute paths, resolved against the working directory
    pub fn resolved_targets(&self) -> Result<Vec<PathBuf>> {
        let cwd = std::env::current_dir()?;
        Ok(self
            .targets
            .iter()
            .map(|target| {
                if target.is_absolute() {
                    target.clone()
                } else {
                    cwd.join(target)
                }
            })
            .collect())
    }
}

impl Default for WatchConfig {
    fn default() -> Self {
        Self {
            targets: default_targets(),
            recursive: true,
            threshold: default_threshold(),
        }
    }
}

fn default_targets() -> Vec<PathBuf> {
    vec![PathBuf::from(".")]
}

fn default_true() -> bool {
    true
}

fn default_threshold() -> Duration {
    DEFAULT_THRESHOLD
}

mod millis {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
