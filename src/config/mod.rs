// SPDX-License-Identifier: MPL-2.0
//! This module handles the diagnostics configuration, including loading and
//! saving it to a `diagnostics.toml` file.
//!
//! # Examples
//!
//! ```no_run
//! use diaglog::config::{self, DiagnosticsConfig, StackTraceMode};
//! use std::path::PathBuf;
//!
//! // Load existing configuration
//! let mut config = config::load().unwrap_or_default();
//!
//! // Modify a setting
//! config.stack_traces = StackTraceMode::All;
//!
//! // Save the modified configuration
//! config::save(&config).expect("Failed to save config");
//!
//! // To load/save from a specific path (e.g., for testing)
//! let temp_dir = PathBuf::from("./temp_config_dir");
//! std::fs::create_dir_all(&temp_dir).unwrap();
//! let temp_file = temp_dir.join("diagnostics.toml");
//! config::save_to_path(&config, &temp_file).expect("Failed to save to path");
//! let loaded = config::load_from_path(&temp_file).expect("Failed to load from path");
//! assert_eq!(loaded.stack_traces, StackTraceMode::All);
//! std::fs::remove_dir_all(&temp_dir).unwrap();
//! ```

pub mod defaults;

pub use defaults::*;

use crate::domain::diagnostics::{BufferCapacity, MirrorCapacity};
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILE: &str = "diagnostics.toml";

/// When a stack trace snapshot is attached to a recorded entry.
///
/// The call-site location is always recorded; a full backtrace is only
/// taken for the levels selected here.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StackTraceMode {
    /// Never capture a backtrace.
    Off,
    /// Capture a backtrace for error entries only.
    #[default]
    Errors,
    /// Capture a backtrace for every info, error and debug entry.
    All,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiagnosticsConfig {
    /// Entries kept per in-memory category.
    pub max_logs: usize,
    /// Error entries kept in durable storage.
    pub mirror_capacity: usize,
    pub stack_traces: StackTraceMode,
    /// Overrides the directory of the file-backed durable store.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub storage_dir: Option<PathBuf>,
    /// Overrides the directory exported log files are written to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub export_dir: Option<PathBuf>,
    pub http_timeout_secs: u64,
    /// Reported as the `environment` of the startup entry.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub environment: Option<String>,
}

impl Default for DiagnosticsConfig {
    fn default() -> Self {
        Self {
            max_logs: DEFAULT_MAX_LOGS,
            mirror_capacity: DEFAULT_MIRROR_CAPACITY,
            stack_traces: StackTraceMode::default(),
            storage_dir: None,
            export_dir: None,
            http_timeout_secs: DEFAULT_HTTP_TIMEOUT_SECS,
            environment: None,
        }
    }
}

impl DiagnosticsConfig {
    #[must_use]
    pub fn buffer_capacity(&self) -> BufferCapacity {
        BufferCapacity::new(self.max_logs)
    }

    #[must_use]
    pub fn mirror_capacity(&self) -> MirrorCapacity {
        MirrorCapacity::new(self.mirror_capacity)
    }

    #[must_use]
    pub fn http_timeout(&self) -> Duration {
        Duration::from_secs(self.http_timeout_secs)
    }

    /// Directory of the file-backed durable store, if one can be resolved.
    #[must_use]
    pub fn resolved_storage_dir(&self) -> Option<PathBuf> {
        self.storage_dir.clone().or_else(default_storage_dir)
    }
}

fn get_default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|mut path| {
        path.push(APP_DIR_NAME);
        path.push(CONFIG_FILE);
        path
    })
}

/// Default location of the durable store: `<data_local_dir>/diaglog/storage`.
#[must_use]
pub fn default_storage_dir() -> Option<PathBuf> {
    dirs::data_local_dir().map(|mut path| {
        path.push(APP_DIR_NAME);
        path.push(STORAGE_DIR_NAME);
        path
    })
}

pub fn load() -> Result<DiagnosticsConfig> {
    if let Some(path) = get_default_config_path() {
        if path.exists() {
            return load_from_path(&path);
        }
    }
    Ok(DiagnosticsConfig::default())
}

pub fn save(config: &DiagnosticsConfig) -> Result<()> {
    if let Some(path) = get_default_config_path() {
        return save_to_path(config, &path);
    }
    Ok(())
}

/// Loads a configuration file. Unparseable content yields the defaults.
pub fn load_from_path(path: &Path) -> Result<DiagnosticsConfig> {
    let content = fs::read_to_string(path)?;
    Ok(toml::from_str(&content).unwrap_or_else(|err| {
        tracing::warn!(path = %path.display(), error = %err, "invalid diagnostics config, using defaults");
        DiagnosticsConfig::default()
    }))
}

pub fn save_to_path(config: &DiagnosticsConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    let content = toml::to_string_pretty(config)?;
    fs::write(path, content)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn save_and_load_round_trip_preserves_settings() {
        let config = DiagnosticsConfig {
            max_logs: 250,
            mirror_capacity: 20,
            stack_traces: StackTraceMode::Off,
            storage_dir: Some(PathBuf::from("/var/lib/app")),
            export_dir: None,
            http_timeout_secs: 5,
            environment: Some("staging".to_string()),
        };
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("nested").join("diagnostics.toml");

        save_to_path(&config, &config_path).expect("failed to save config");
        let loaded = load_from_path(&config_path).expect("failed to load config");

        assert_eq!(loaded, config);
    }

    #[test]
    fn load_from_path_returns_default_on_invalid_toml() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("diagnostics.toml");
        fs::write(&config_path, "not = valid = toml").expect("failed to write invalid toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded, DiagnosticsConfig::default());
    }

    #[test]
    fn missing_fields_fall_back_to_defaults() {
        let temp_dir = tempdir().expect("failed to create temp dir");
        let config_path = temp_dir.path().join("diagnostics.toml");
        fs::write(&config_path, "stack_traces = \"all\"\n").expect("failed to write toml");

        let loaded = load_from_path(&config_path).expect("load should not error");
        assert_eq!(loaded.stack_traces, StackTraceMode::All);
        assert_eq!(loaded.max_logs, DEFAULT_MAX_LOGS);
        assert_eq!(loaded.mirror_capacity, DEFAULT_MIRROR_CAPACITY);
    }

    #[test]
    fn out_of_range_capacities_are_clamped() {
        let config = DiagnosticsConfig {
            max_logs: 0,
            mirror_capacity: 1_000_000,
            ..DiagnosticsConfig::default()
        };
        assert_eq!(config.buffer_capacity().value(), MIN_MAX_LOGS);
        assert_eq!(config.mirror_capacity().value(), MAX_MIRROR_CAPACITY);
    }

    #[test]
    fn default_config_uses_thirty_second_timeout() {
        let config = DiagnosticsConfig::default();
        assert_eq!(config.http_timeout(), Duration::from_secs(30));
        assert_eq!(config.stack_traces, StackTraceMode::Errors);
    }
}
