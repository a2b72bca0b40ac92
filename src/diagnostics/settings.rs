// SPDX-License-Identifier: MPL-2.0
//! Durable capture toggle.
//!
//! The toggle is read from storage once, when the gate is loaded, and then
//! served from memory. `enable`/`disable` persist `{"enabled": bool}` under
//! [`SETTINGS_KEY`] and then update memory, one writer at a time. Reads never
//! block, so the panic hook can consult the toggle while a write is stuck.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;
use serde_json::{json, Value};

use crate::config::SETTINGS_KEY;
use crate::storage::{DurableStore, DurableWriteGuard};

pub struct SettingsGate {
    enabled: AtomicBool,
    store: Arc<dyn DurableStore>,
    write_lock: Mutex<()>,
}

impl SettingsGate {
    /// Loads the toggle from `store`.
    ///
    /// A missing, unreadable or corrupt value means capture is enabled. Only
    /// a literal `"enabled": false` disables it.
    pub fn load(store: Arc<dyn DurableStore>) -> Self {
        let enabled = match store.get(SETTINGS_KEY) {
            Ok(Some(raw)) => parse_enabled(&raw),
            Ok(None) => true,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read capture settings, capture stays enabled");
                true
            }
        };

        Self {
            enabled: AtomicBool::new(enabled),
            store,
            write_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn is_enabled(&self) -> bool {
        self.enabled.load(Ordering::Acquire)
    }

    pub fn enable(&self) {
        self.set_enabled(true);
    }

    pub fn disable(&self) {
        self.set_enabled(false);
    }

    /// Persists and applies the toggle.
    ///
    /// A storage failure is logged; the in-process toggle still changes.
    /// Called from a panic raised by a durable write on the same thread, only
    /// the in-process toggle changes.
    pub fn set_enabled(&self, enabled: bool) {
        let Some(_reentry) = DurableWriteGuard::enter() else {
            self.enabled.store(enabled, Ordering::Release);
            return;
        };
        let _guard = self.write_lock.lock();
        let payload = json!({ "enabled": enabled }).to_string();
        if let Err(err) = self.store.set(SETTINGS_KEY, &payload) {
            tracing::error!(error = %err, enabled, "failed to persist capture settings");
        }
        self.enabled.store(enabled, Ordering::Release);
    }
}

impl std::fmt::Debug for SettingsGate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsGate")
            .field("enabled", &self.is_enabled())
            .finish_non_exhaustive()
    }
}

fn parse_enabled(raw: &str) -> bool {
    match serde_json::from_str::<Value>(raw) {
        Ok(value) => value.get("enabled") != Some(&Value::Bool(false)),
        Err(err) => {
            tracing::warn!(error = %err, "corrupt capture settings, capture stays enabled");
            true
        }
    }
}
