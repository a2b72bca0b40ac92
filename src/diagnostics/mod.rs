// SPDX-License-Identifier: MPL-2.0
//! Client-side diagnostics capture.
//!
//! This module keeps a bounded, categorized in-memory history of what the
//! application did, mirrors errors to durable storage so they survive a
//! crash, and exports everything to a JSON file for bug reports.
//!
//! # Architecture
//!
//! - [`LogStore`]: four bounded categories (info, error, debug, network)
//! - [`CircularBuffer`]: ring buffer backing each category
//! - [`ErrorMirror`]: durable copy of the most recent error entries
//! - [`SettingsGate`]: durable capture toggle
//! - [`Exporter`]: JSON export of the whole store
//! - [`Diagnostics`]: wires the above together with the instrumentors

mod buffer;
mod console;
mod entry;
mod export;
mod mirror;
mod settings;
mod store;

use std::sync::Arc;

use serde_json::json;

use crate::config::DiagnosticsConfig;
use crate::instrument::{ErrorSurface, HttpInstrumentor, InstrumentedClient};
use crate::storage::DurableStore;

pub use buffer::{BufferCapacity, CircularBuffer};
pub use console::{Severity, CONSOLE_TARGET};
pub use entry::{timestamp_now, Category, ErrorDetails, LogEntry, LogLevel, NetworkLogEntry};
pub use export::{
    default_export_directory, default_user_agent, generate_default_filename, Environment,
    ExportError, ExportReport, Exporter,
};
pub use mirror::ErrorMirror;
pub use settings::SettingsGate;
pub use store::{CategoryLogs, LogSnapshot, LogStore};

/// The assembled diagnostics subsystem.
///
/// All parts share one [`LogStore`].
#[derive(Debug)]
pub struct Diagnostics {
    store: Arc<LogStore>,
    http: HttpInstrumentor,
    surface: ErrorSurface,
    exporter: Exporter,
    config: DiagnosticsConfig,
}

impl Diagnostics {
    /// Builds every part without side effects.
    #[must_use]
    pub fn new(config: &DiagnosticsConfig, durable: Arc<dyn DurableStore>) -> Self {
        let store = Arc::new(LogStore::new(config, durable));

        let mut exporter = Exporter::new(Arc::clone(&store), Environment::detect());
        if let Some(dir) = &config.export_dir {
            exporter = exporter.with_export_dir(dir);
        }

        Self {
            http: HttpInstrumentor::new(Arc::clone(&store)),
            surface: ErrorSurface::new(Arc::clone(&store)),
            exporter,
            store,
            config: config.clone(),
        }
    }

    /// Builds every part, records the startup entry and installs the panic hook.
    #[must_use]
    pub fn start(config: &DiagnosticsConfig, durable: Arc<dyn DurableStore>) -> Self {
        let diagnostics = Self::new(config, durable);
        diagnostics.log_startup();
        if !diagnostics.surface.install() {
            tracing::debug!("panic hook was installed by an earlier start");
        }
        diagnostics
    }

    fn log_startup(&self) {
        let environment = self.config.environment.clone().unwrap_or_else(|| {
            if cfg!(debug_assertions) {
                "development".to_string()
            } else {
                "production".to_string()
            }
        });

        self.store.info(
            "Application starting",
            Some(json!({
                "userAgent": self.exporter.environment().user_agent,
                "timestamp": timestamp_now(),
                "environment": environment,
            })),
        );
    }

    #[must_use]
    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    #[must_use]
    pub fn http(&self) -> &HttpInstrumentor {
        &self.http
    }

    #[must_use]
    pub fn surface(&self) -> &ErrorSurface {
        &self.surface
    }

    #[must_use]
    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Builds an instrumented HTTP client using the configured timeout.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be initialized.
    pub fn http_client(&self) -> Result<InstrumentedClient, reqwest::Error> {
        InstrumentedClient::with_timeout(self.http.clone(), self.config.http_timeout())
    }
}
