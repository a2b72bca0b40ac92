// SPDX-License-Identifier: MPL-2.0
//! The bounded in-memory log store.
//!
//! [`LogStore`] keeps four independent sequences (info, error, debug and
//! network), each a [`CircularBuffer`] behind its own lock so that
//! append-then-evict is atomic per sequence. Error entries are also written
//! through to the [`ErrorMirror`].
//!
//! The store is an ordinary value: the application builds one at startup,
//! wraps it in an `Arc` and hands it to whatever needs to record.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::panic::Location;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::buffer::CircularBuffer;
use super::console;
use super::entry::{timestamp_now, Category, ErrorDetails, LogEntry, LogLevel, NetworkLogEntry};
use super::mirror::ErrorMirror;
use super::settings::SettingsGate;
use crate::config::{DiagnosticsConfig, StackTraceMode};
use crate::storage::{DurableStore, MemoryStore};

/// Copy of all four sequences at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LogSnapshot {
    pub info: Vec<LogEntry>,
    pub error: Vec<LogEntry>,
    pub debug: Vec<LogEntry>,
    pub network: Vec<NetworkLogEntry>,
}

impl LogSnapshot {
    /// Total number of entries across all categories.
    #[must_use]
    pub fn total(&self) -> usize {
        self.info.len() + self.error.len() + self.debug.len() + self.network.len()
    }
}

/// Contents of a single category.
#[derive(Debug, Clone, PartialEq)]
pub enum CategoryLogs {
    Entries(Vec<LogEntry>),
    Network(Vec<NetworkLogEntry>),
}

impl CategoryLogs {
    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            CategoryLogs::Entries(entries) => entries.len(),
            CategoryLogs::Network(entries) => entries.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

pub struct LogStore {
    info: Mutex<CircularBuffer<LogEntry>>,
    error: Mutex<CircularBuffer<LogEntry>>,
    debug: Mutex<CircularBuffer<LogEntry>>,
    network: Mutex<CircularBuffer<NetworkLogEntry>>,
    settings: SettingsGate,
    mirror: ErrorMirror,
    stack_traces: StackTraceMode,
}

impl LogStore {
    /// Builds a store from `config`, loading the capture toggle from `durable`.
    #[must_use]
    pub fn new(config: &DiagnosticsConfig, durable: Arc<dyn DurableStore>) -> Self {
        let capacity = config.buffer_capacity();
        Self {
            info: Mutex::new(CircularBuffer::new(capacity)),
            error: Mutex::new(CircularBuffer::new(capacity)),
            debug: Mutex::new(CircularBuffer::new(capacity)),
            network: Mutex::new(CircularBuffer::new(capacity)),
            settings: SettingsGate::load(Arc::clone(&durable)),
            mirror: ErrorMirror::new(durable, config.mirror_capacity()),
            stack_traces: config.stack_traces,
        }
    }

    /// Store with default settings and a process-local durable store.
    #[must_use]
    pub fn in_memory() -> Self {
        Self::new(&DiagnosticsConfig::default(), Arc::new(MemoryStore::new()))
    }

    // =========================================================================
    // Capture
    // =========================================================================

    /// Records an info, error or debug entry.
    ///
    /// Does nothing while capture is disabled. The caller's source location
    /// is stored with the entry; a backtrace is added according to the
    /// configured [`StackTraceMode`]. Error entries are also mirrored to
    /// durable storage.
    #[track_caller]
    pub fn record(&self, level: LogLevel, message: impl Into<String>, data: Option<Value>) {
        if !self.settings.is_enabled() {
            return;
        }

        let location = Location::caller();
        let entry = LogEntry {
            timestamp: timestamp_now(),
            message: message.into(),
            data: data.filter(|value| !value.is_null()),
            location: Some(location.to_string()),
            stack_trace: self
                .wants_stack_trace(level)
                .then(|| Backtrace::force_capture().to_string()),
        };

        let category = Category::from(level);
        console::emit_entry(category, &entry);

        if level == LogLevel::Error {
            self.buffer(level).lock().push(entry.clone());
            self.mirror.mirror(&entry);
        } else {
            self.buffer(level).lock().push(entry);
        }
    }

    #[track_caller]
    pub fn info(&self, message: impl Into<String>, data: Option<Value>) {
        self.record(LogLevel::Info, message, data);
    }

    #[track_caller]
    pub fn debug(&self, message: impl Into<String>, data: Option<Value>) {
        self.record(LogLevel::Debug, message, data);
    }

    /// Records an error entry whose payload carries `details` merged into `data`.
    #[track_caller]
    pub fn error(&self, message: impl Into<String>, details: Option<ErrorDetails>, data: Option<Value>) {
        let data = details.unwrap_or_default().merge_into(data);
        self.record(LogLevel::Error, message, Some(data));
    }

    /// Records an error entry caused by `err`.
    #[track_caller]
    pub fn record_error<E: StdError + 'static>(
        &self,
        message: impl Into<String>,
        err: &E,
        data: Option<Value>,
    ) {
        self.error(message, Some(ErrorDetails::from_error(err)), data);
    }

    /// Records a network exchange.
    ///
    /// Network telemetry is captured even while capture is disabled.
    pub fn record_network(
        &self,
        method: impl Into<String>,
        url: impl Into<String>,
        status: u16,
        response_time_ms: u64,
        data: Option<Value>,
    ) {
        let entry = NetworkLogEntry {
            method: method.into(),
            url: url.into(),
            status,
            response_time_ms,
            data: data.filter(|value| !value.is_null()),
            timestamp: timestamp_now(),
        };

        console::emit_network(&entry);
        self.network.lock().push(entry);
    }

    fn wants_stack_trace(&self, level: LogLevel) -> bool {
        match self.stack_traces {
            StackTraceMode::Off => false,
            StackTraceMode::Errors => level == LogLevel::Error,
            StackTraceMode::All => true,
        }
    }

    fn buffer(&self, level: LogLevel) -> &Mutex<CircularBuffer<LogEntry>> {
        match level {
            LogLevel::Info => &self.info,
            LogLevel::Error => &self.error,
            LogLevel::Debug => &self.debug,
        }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Returns a copy of one category's current contents.
    #[must_use]
    pub fn get(&self, category: Category) -> CategoryLogs {
        match category {
            Category::Info => CategoryLogs::Entries(self.entries(LogLevel::Info)),
            Category::Error => CategoryLogs::Entries(self.entries(LogLevel::Error)),
            Category::Debug => CategoryLogs::Entries(self.entries(LogLevel::Debug)),
            Category::Network => CategoryLogs::Network(self.network_entries()),
        }
    }

    #[must_use]
    pub fn entries(&self, level: LogLevel) -> Vec<LogEntry> {
        self.buffer(level).lock().snapshot()
    }

    #[must_use]
    pub fn network_entries(&self) -> Vec<NetworkLogEntry> {
        self.network.lock().snapshot()
    }

    /// Returns a copy of all four categories.
    #[must_use]
    pub fn snapshot(&self) -> LogSnapshot {
        LogSnapshot {
            info: self.entries(LogLevel::Info),
            error: self.entries(LogLevel::Error),
            debug: self.entries(LogLevel::Debug),
            network: self.network_entries(),
        }
    }

    #[must_use]
    pub fn len(&self, category: Category) -> usize {
        match category {
            Category::Info => self.info.lock().len(),
            Category::Error => self.error.lock().len(),
            Category::Debug => self.debug.lock().len(),
            Category::Network => self.network.lock().len(),
        }
    }

    /// Maximum number of entries kept per category.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.info.lock().capacity()
    }

    /// Error entries persisted by previous and current runs.
    #[must_use]
    pub fn persisted_errors(&self) -> Vec<LogEntry> {
        self.mirror.entries()
    }

    // =========================================================================
    // Clearing
    // =========================================================================

    /// Empties one category. Clearing `error` also removes the persisted mirror.
    pub fn clear(&self, category: Category) {
        match category {
            Category::Info => self.info.lock().clear(),
            Category::Error => {
                self.error.lock().clear();
                self.mirror.clear();
            }
            Category::Debug => self.debug.lock().clear(),
            Category::Network => self.network.lock().clear(),
        }
    }

    /// Empties every category and removes the persisted mirror.
    pub fn clear_all(&self) {
        for category in Category::ALL {
            self.clear(category);
        }
    }

    // =========================================================================
    // Capture Toggle
    // =========================================================================

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.settings.is_enabled()
    }

    pub fn enable(&self) {
        self.settings.enable();
    }

    pub fn disable(&self) {
        self.settings.disable();
    }

    #[must_use]
    pub fn settings(&self) -> &SettingsGate {
        &self.settings
    }

    #[must_use]
    pub fn mirror(&self) -> &ErrorMirror {
        &self.mirror
    }
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("info", &self.len(Category::Info))
            .field("error", &self.len(Category::Error))
            .field("debug", &self.len(Category::Debug))
            .field("network", &self.len(Category::Network))
            .field("enabled", &self.is_enabled())
            .field("stack_traces", &self.stack_traces)
            .finish_non_exhaustive()
    }
}
