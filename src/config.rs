//! Configuration file handling.
//!
//! This module handles loading and merging configuration from
//! `.attendbook.toml` files.

use anyhow::{Context, Result};
use attendbook::analysis::DEFAULT_MIN_DAYS;
use attendbook::report::OutputFormat;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Default configuration file name, looked up in the working directory.
pub const DEFAULT_CONFIG_FILE: &str = ".attendbook.toml";

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// General settings.
    #[serde(default)]
    pub general: GeneralConfig,

    /// Document locations.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Year-end award settings.
    #[serde(default)]
    pub awards: AwardsConfig,
}

/// General application settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GeneralConfig {
    /// Enable verbose logging by default.
    #[serde(default)]
    pub verbose: bool,

    /// Report output format.
    #[serde(default)]
    pub format: OutputFormat,
}

/// Where the roster and attendance documents live.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Roster document (class name -> student names).
    #[serde(default = "default_roster_path")]
    pub roster_path: PathBuf,

    /// Attendance document (date -> class -> student -> status).
    #[serde(default = "default_attendance_path")]
    pub attendance_path: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            roster_path: default_roster_path(),
            attendance_path: default_attendance_path(),
        }
    }
}

fn default_roster_path() -> PathBuf {
    PathBuf::from("attendance_students.json")
}

fn default_attendance_path() -> PathBuf {
    PathBuf::from("attendance_records.json")
}

/// Award eligibility settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AwardsConfig {
    /// Minimum recorded days in the year before a student can win an award.
    #[serde(default = "default_min_days")]
    pub min_days: usize,
}

impl Default for AwardsConfig {
    fn default() -> Self {
        Self {
            min_days: default_min_days(),
        }
    }
}

fn default_min_days() -> usize {
    DEFAULT_MIN_DAYS
}

impl Config {
    /// Load configuration from a file path.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))?;

        Ok(config)
    }

    /// Try to load configuration from the default location.
    ///
    /// Returns `Ok(None)` if the file doesn't exist, `Err` if it exists but can't be parsed.
    pub fn load_default() -> Result<Option<Self>> {
        let default_path = Path::new(DEFAULT_CONFIG_FILE);

        if default_path.exists() {
            Ok(Some(Self::load(default_path)?))
        } else {
            Ok(None)
        }
    }

    /// Merge this configuration with CLI arguments.
    ///
    /// CLI arguments take precedence over config file settings, but only when
    /// they were given explicitly.
    pub fn merge_with_args(&mut self, args: &crate::cli::Args) {
        if let Some(ref roster) = args.roster {
            self.storage.roster_path = roster.clone();
        }
        if let Some(ref attendance) = args.attendance {
            self.storage.attendance_path = attendance.clone();
        }
        if let Some(format) = args.format {
            self.general.format = format.into();
        }
        if let crate::cli::Command::Awards {
            min_days: Some(min_days),
            ..
        } = args.command
        {
            self.awards.min_days = min_days;
        }

        // Flags always override
        if args.verbose {
            self.general.verbose = true;
        }
    }

    /// Generate a default configuration file content.
    pub fn default_toml() -> String {
        let config = Config::default();
        toml::to_string_pretty(&config).unwrap_or_else(|_| String::new())
    }
}
