//! Tracker configuration.
//!
//! Load order: defaults → TOML file → environment variables → command-line flags.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::scale::GradeScale;

pub const DEFAULT_DATA_FILE: &str = "students.json";
pub const DEFAULT_CONFIG_FILE: &str = "grade-tracker.toml";

/// Top-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// JSON file used by save/load when no other path is given.
    pub data_file: PathBuf,
    /// Score cut-offs for letter conversion.
    pub scale: GradeScale,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            scale: GradeScale::default(),
        }
    }
}

// Parse an env var into a config field, ignoring unparsable values
fn env_override<T: std::str::FromStr>(var: &str, target: &mut T) {
    if let Ok(v) = std::env::var(var) {
        if let Ok(parsed) = v.trim().parse() {
            *target = parsed;
        }
    }
}

impl TrackerConfig {
    /// Load the configuration.
    ///
    /// An explicit `config_path` must exist. Without one, `grade-tracker.toml`
    /// in the working directory is used when present.
    ///
    /// # Errors
    ///
    /// Returns an error if a config file cannot be read or parsed, or if the
    /// resulting grade scale is invalid.
    pub fn load(config_path: Option<&Path>) -> Result<Self> {
        let mut config = match config_path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_file(DEFAULT_CONFIG_FILE)?
            }
            None => Self::default(),
        };

        config.apply_env();
        config.scale.validate().context("invalid configuration")?;
        Ok(config)
    }

    /// Parse a TOML config file without environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_str = path.as_ref().to_string_lossy();
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("failed to read config from {path_str}"))?;
        Self::from_toml(&content).with_context(|| format!("failed to parse config {path_str}"))
    }

    /// # Errors
    ///
    /// Returns an error if the text is not valid TOML for this config.
    pub fn from_toml(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    pub fn apply_env(&mut self) {
        if let Ok(path) = std::env::var("GRADE_TRACKER_DATA_FILE") {
            if !path.trim().is_empty() {
                self.data_file = PathBuf::from(path.trim());
            }
        }
        env_override("GRADE_TRACKER_CUTOFF_A", &mut self.scale.a);
        env_override("GRADE_TRACKER_CUTOFF_B", &mut self.scale.b);
        env_override("GRADE_TRACKER_CUTOFF_C", &mut self.scale.c);
        env_override("GRADE_TRACKER_CUTOFF_D", &mut self.scale.d);
    }

    // Command-line flags win over everything else
    pub fn apply_cli(&mut self, data_file: Option<&Path>) {
        if let Some(path) = data_file {
            self.data_file = path.to_path_buf();
        }
    }
}
