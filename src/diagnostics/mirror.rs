// SPDX-License-Identifier: MPL-2.0
//! Persisted copy of error entries.
//!
//! Every recorded error is appended to a JSON array stored under
//! [`ERRORS_KEY`], keeping only the most recent entries. The mirror survives
//! restarts so the errors that preceded a crash can be inspected afterwards.
//!
//! Nothing in this module returns an error or panics: storage failures are
//! logged and dropped, corrupt content is treated as an empty array.

use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::Value;

use super::entry::LogEntry;
use crate::config::ERRORS_KEY;
use crate::domain::diagnostics::MirrorCapacity;
use crate::storage::{DurableStore, DurableWriteGuard};

pub struct ErrorMirror {
    store: Arc<dyn DurableStore>,
    capacity: MirrorCapacity,
    /// Serializes read-modify-write cycles within this process.
    write_lock: Mutex<()>,
}

impl ErrorMirror {
    #[must_use]
    pub fn new(store: Arc<dyn DurableStore>, capacity: MirrorCapacity) -> Self {
        Self {
            store,
            capacity,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn capacity(&self) -> usize {
        self.capacity.value()
    }

    /// Appends `entry` to the persisted array, trimming it to capacity.
    ///
    /// Skipped when called from a panic raised by a durable write on the
    /// same thread; the entry then stays in memory only.
    pub fn mirror(&self, entry: &LogEntry) {
        let Some(_reentry) = DurableWriteGuard::enter() else {
            return;
        };
        let _guard = self.write_lock.lock();

        let value = match serde_json::to_value(entry) {
            Ok(value) => value,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode error entry for the mirror");
                return;
            }
        };

        let mut persisted = self.load_raw();
        persisted.push(value);
        let excess = persisted.len().saturating_sub(self.capacity.value());
        persisted.drain(..excess);

        let encoded = match serde_json::to_string(&persisted) {
            Ok(encoded) => encoded,
            Err(err) => {
                tracing::error!(error = %err, "failed to encode error mirror");
                return;
            }
        };

        if let Err(err) = self.store.set(ERRORS_KEY, &encoded) {
            tracing::error!(error = %err, "failed to save error to durable storage");
        }
    }

    /// Returns the persisted entries, oldest first.
    ///
    /// Elements that no longer parse as entries are skipped.
    #[must_use]
    pub fn entries(&self) -> Vec<LogEntry> {
        self.load_raw()
            .into_iter()
            .filter_map(|value| serde_json::from_value(value).ok())
            .collect()
    }

    /// Removes the persisted array entirely.
    pub fn clear(&self) {
        let Some(_reentry) = DurableWriteGuard::enter() else {
            return;
        };
        let _guard = self.write_lock.lock();
        if let Err(err) = self.store.remove(ERRORS_KEY) {
            tracing::error!(error = %err, "failed to clear error mirror");
        }
    }

    /// Reads the stored array as raw JSON values so foreign or older
    /// elements are carried over untouched.
    fn load_raw(&self) -> Vec<Value> {
        let raw = match self.store.get(ERRORS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(err) => {
                tracing::warn!(error = %err, "failed to read error mirror, starting empty");
                return Vec::new();
            }
        };

        match serde_json::from_str::<Value>(&raw) {
            Ok(Value::Array(values)) => values,
            Ok(_) => {
                tracing::warn!("error mirror is not an array, starting empty");
                Vec::new()
            }
            Err(err) => {
                tracing::warn!(error = %err, "corrupt error mirror, starting empty");
                Vec::new()
            }
        }
    }
}

impl std::fmt::Debug for ErrorMirror {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ErrorMirror")
            .field("capacity", &self.capacity)
            .finish_non_exhaustive()
    }
}
