// SPDX-License-Identifier: MPL-2.0
//! Export of the in-memory logs to a JSON file.
//!
//! The artifact has the shape
//! `{timestamp, logs: {info, error, debug, network}, userAgent, url}` and is
//! written atomically under `debug-logs-<epoch millis>.json`. Exporting never
//! mutates the store.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::entry::timestamp_now;
use super::store::{LogSnapshot, LogStore};
use crate::config::EXPORT_FILE_PREFIX;
use crate::storage::write_atomic;

// =============================================================================
// Export Error
// =============================================================================

/// Errors that can occur while exporting logs.
#[derive(Debug, Error)]
pub enum ExportError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

// =============================================================================
// Environment
// =============================================================================

/// Host metadata attached to every export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Environment {
    /// Client identification string.
    pub user_agent: String,
    /// Where the application is running (a URL).
    pub location: String,
}

impl Environment {
    /// Detects the current process environment.
    #[must_use]
    pub fn detect() -> Self {
        Self {
            user_agent: default_user_agent(),
            location: default_location(),
        }
    }

    #[must_use]
    pub fn with_user_agent(mut self, user_agent: impl Into<String>) -> Self {
        self.user_agent = user_agent.into();
        self
    }

    #[must_use]
    pub fn with_location(mut self, location: impl Into<String>) -> Self {
        self.location = location.into();
        self
    }
}

impl Default for Environment {
    fn default() -> Self {
        Self::detect()
    }
}

/// `diaglog/<version> (<os>; <arch>)`
#[must_use]
pub fn default_user_agent() -> String {
    format!(
        "diaglog/{} ({}; {})",
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS,
        std::env::consts::ARCH
    )
}

fn default_location() -> String {
    match std::env::current_dir() {
        Ok(dir) => format!("file://{}", dir.display()),
        Err(_) => "file://".to_string(),
    }
}

// =============================================================================
// Report
// =============================================================================

/// The exported document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub timestamp: String,
    pub logs: LogSnapshot,
    pub user_agent: String,
    pub url: String,
}

// =============================================================================
// Exporter
// =============================================================================

pub struct Exporter {
    store: Arc<LogStore>,
    environment: Environment,
    export_dir: Option<PathBuf>,
}

impl Exporter {
    #[must_use]
    pub fn new(store: Arc<LogStore>, environment: Environment) -> Self {
        Self {
            store,
            environment,
            export_dir: None,
        }
    }

    /// Overrides the directory used by [`Exporter::export`].
    #[must_use]
    pub fn with_export_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.export_dir = Some(dir.into());
        self
    }

    #[must_use]
    pub fn environment(&self) -> &Environment {
        &self.environment
    }

    /// Snapshots the store into a report.
    #[must_use]
    pub fn build_report(&self) -> ExportReport {
        ExportReport {
            timestamp: timestamp_now(),
            logs: self.store.snapshot(),
            user_agent: self.environment.user_agent.clone(),
            url: self.environment.location.clone(),
        }
    }

    /// Renders the report as pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn export_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(&self.build_report())?)
    }

    /// Writes the report to `path`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization or the write fails.
    pub fn export_to_file(&self, path: &Path) -> Result<(), ExportError> {
        let json = self.export_json()?;
        write_atomic(path, &json)?;
        tracing::info!(path = %path.display(), "logs exported");
        Ok(())
    }

    /// Writes the report into `dir` under a generated file name.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory cannot be created or the write fails.
    pub fn export_to_dir(&self, dir: &Path) -> Result<PathBuf, ExportError> {
        std::fs::create_dir_all(dir)?;
        let path = dir.join(generate_default_filename());
        self.export_to_file(&path)?;
        Ok(path)
    }

    /// Writes the report into the configured export directory, or the
    /// user's download directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the write fails.
    pub fn export(&self) -> Result<PathBuf, ExportError> {
        let dir = self
            .export_dir
            .clone()
            .unwrap_or_else(default_export_directory);
        self.export_to_dir(&dir)
    }
}

impl std::fmt::Debug for Exporter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Exporter")
            .field("environment", &self.environment)
            .field("export_dir", &self.export_dir)
            .finish_non_exhaustive()
    }
}

// =============================================================================
// Filename Generation
// =============================================================================

/// Generates the export file name.
///
/// Format: `debug-logs-<epoch millis>.json`
#[must_use]
pub fn generate_default_filename() -> String {
    format!(
        "{EXPORT_FILE_PREFIX}-{}.json",
        Utc::now().timestamp_millis()
    )
}

/// Returns the default directory for exported logs.
///
/// Uses the Downloads folder, then Documents, then the current directory.
#[must_use]
pub fn default_export_directory() -> PathBuf {
    dirs::download_dir()
        .or_else(dirs::document_dir)
        .unwrap_or_else(|| std::env::current_dir().unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::entry::Category;
    use serde_json::json;
    use tempfile::tempdir;

    fn exporter_with_logs() -> (Arc<LogStore>, Exporter) {
        let store = Arc::new(LogStore::in_memory());
        store.info("info entry", Some(json!({"k": "v"})));
        store.error("error entry", None, None);
        store.debug("debug entry", None);
        store.record_network("GET", "/x", 200, 12, None);

        let environment = Environment::detect()
            .with_user_agent("test-agent")
            .with_location("app://tests");
        let exporter = Exporter::new(Arc::clone(&store), environment);
        (store, exporter)
    }

    // =========================================================================
    // ExportError Tests
    // =========================================================================

    #[test]
    fn export_error_io_displays_correctly() {
        let err = ExportError::Io(io::Error::new(io::ErrorKind::NotFound, "file not found"));
        let display = format!("{err}");
        assert!(display.contains("I/O error"));
        assert!(display.contains("file not found"));
    }

    #[test]
    fn export_error_from_io_error() {
        let io_err = io::Error::new(io::ErrorKind::PermissionDenied, "access denied");
        let export_err: ExportError = io_err.into();
        assert!(matches!(export_err, ExportError::Io(_)));
    }

    // =========================================================================
    // Filename Tests
    // =========================================================================

    #[test]
    fn generate_default_filename_has_correct_format() {
        let filename = generate_default_filename();

        assert!(filename.starts_with("debug-logs-"));
        assert!(Path::new(&filename)
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json")));

        let millis = &filename["debug-logs-".len()..filename.len() - ".json".len()];
        assert!(millis.parse::<i64>().is_ok(), "not a timestamp: {millis}");
    }

    #[test]
    fn default_user_agent_names_the_crate() {
        let agent = default_user_agent();
        assert!(agent.starts_with("diaglog/"));
        assert!(agent.contains(std::env::consts::OS));
    }

    #[test]
    fn detected_location_is_a_file_url() {
        assert!(Environment::detect().location.starts_with("file://"));
    }

    // =========================================================================
    // Report Tests
    // =========================================================================

    #[test]
    fn build_report_contains_every_category_and_environment() {
        let (_, exporter) = exporter_with_logs();

        let report = exporter.build_report();

        assert_eq!(report.logs.info.len(), 1);
        assert_eq!(report.logs.error.len(), 1);
        assert_eq!(report.logs.debug.len(), 1);
        assert_eq!(report.logs.network.len(), 1);
        assert_eq!(report.user_agent, "test-agent");
        assert_eq!(report.url, "app://tests");
    }

    #[test]
    fn export_json_uses_artifact_field_names() {
        let (_, exporter) = exporter_with_logs();

        let json = exporter.export_json().expect("export should succeed");
        let value: serde_json::Value = serde_json::from_str(&json).expect("valid JSON");

        assert!(value["timestamp"].is_string());
        assert_eq!(value["userAgent"], "test-agent");
        assert_eq!(value["url"], "app://tests");
        for category in Category::ALL {
            assert!(value["logs"][category.as_str()].is_array());
        }
        assert_eq!(value["logs"]["network"][0]["responseTimeMs"], 12);
    }

    #[test]
    fn export_does_not_mutate_store() {
        let (store, exporter) = exporter_with_logs();
        let before = store.snapshot();

        let _ = exporter.export_json().expect("export should succeed");

        assert_eq!(store.snapshot(), before);
    }

    #[test]
    fn export_to_file_round_trips_snapshot() {
        let (store, exporter) = exporter_with_logs();
        let dir = tempdir().expect("failed to create temp dir");
        let path = dir.path().join("report.json");

        exporter.export_to_file(&path).expect("export should succeed");

        let content = std::fs::read_to_string(&path).expect("file should exist");
        let report: ExportReport = serde_json::from_str(&content).expect("valid report");
        assert_eq!(report.logs, store.snapshot());
        assert!(!dir.path().join("report.json.tmp").exists());
    }

    #[test]
    fn export_to_dir_creates_directory_and_names_file() {
        let (_, exporter) = exporter_with_logs();
        let dir = tempdir().expect("failed to create temp dir");
        let nested = dir.path().join("exports").join("today");

        let path = exporter.export_to_dir(&nested).expect("export should succeed");

        assert!(path.starts_with(&nested));
        assert!(path.exists());
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .expect("file name should be UTF-8");
        assert!(name.starts_with("debug-logs-"));
    }

    #[test]
    fn export_uses_configured_directory() {
        let (_, exporter) = exporter_with_logs();
        let dir = tempdir().expect("failed to create temp dir");
        let exporter = exporter.with_export_dir(dir.path());

        let path = exporter.export().expect("export should succeed");

        assert_eq!(path.parent(), Some(dir.path()));
    }
}
