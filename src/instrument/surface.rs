// SPDX-License-Identifier: MPL-2.0
//! Uncaught failure channels routed into the error log.
//!
//! Three channels are covered:
//! - component errors reported by a UI framework's error handler
//! - fallible background tasks whose error nobody awaits
//! - panics, through a process-wide hook
//!
//! The panic hook is process-global state. [`ErrorSurface::install`]
//! registers it at most once per process and chains whatever hook was set
//! before.

use std::backtrace::Backtrace;
use std::error::Error as StdError;
use std::fmt::Display;
use std::future::Future;
use std::panic::{self, PanicHookInfo};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::json;
use tokio::task::JoinHandle;

use crate::diagnostics::{ErrorDetails, LogStore};

static HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Returns whether the panic hook has been installed in this process.
#[must_use]
pub fn is_installed() -> bool {
    HOOK_INSTALLED.load(Ordering::SeqCst)
}

#[derive(Debug, Clone)]
pub struct ErrorSurface {
    store: Arc<LogStore>,
}

impl ErrorSurface {
    #[must_use]
    pub fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }

    // =========================================================================
    // Component Errors
    // =========================================================================

    /// Records an error raised while rendering or updating a component.
    pub fn component_error(
        &self,
        err: &(dyn StdError + 'static),
        component: Option<&str>,
        info: &str,
    ) {
        self.store.error(
            "Framework Error",
            Some(ErrorDetails::from_dyn(err)),
            Some(json!({
                "componentInfo": info,
                "componentName": component.unwrap_or("Unknown"),
            })),
        );
    }

    /// Returns a handler suitable for a framework's error-handler slot.
    pub fn component_error_handler(
        &self,
    ) -> impl Fn(&(dyn StdError + 'static), Option<&str>, &str) + Send + Sync + 'static {
        let surface = self.clone();
        move |err: &(dyn StdError + 'static), component: Option<&str>, info: &str| {
            surface.component_error(err, component, info);
        }
    }

    // =========================================================================
    // Task Failures
    // =========================================================================

    /// Records a background operation that failed with nobody observing it.
    pub fn task_failure(&self, operation: &str, reason: &dyn Display) {
        record_task_failure(&self.store, operation, reason);
    }

    /// Spawns `future` on the current tokio runtime and records its error,
    /// if any. The result is still delivered through the handle.
    pub fn spawn_observed<F, T, E>(
        &self,
        operation: impl Into<String>,
        future: F,
    ) -> JoinHandle<Result<T, E>>
    where
        F: Future<Output = Result<T, E>> + Send + 'static,
        T: Send + 'static,
        E: Display + Send + 'static,
    {
        let store = Arc::clone(&self.store);
        let operation = operation.into();
        tokio::spawn(async move {
            let result = future.await;
            if let Err(reason) = &result {
                record_task_failure(&store, &operation, reason);
            }
            result
        })
    }

    // =========================================================================
    // Panic Hook
    // =========================================================================

    /// Installs the process-wide panic hook.
    ///
    /// Returns `false` without doing anything if a hook from this crate is
    /// already installed.
    pub fn install(&self) -> bool {
        if HOOK_INSTALLED
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            tracing::debug!("panic hook already installed");
            return false;
        }

        let store = Arc::clone(&self.store);
        let previous = panic::take_hook();
        panic::set_hook(Box::new(move |info| {
            record_panic(&store, info);
            previous(info);
        }));
        true
    }
}

fn record_task_failure(store: &LogStore, operation: &str, reason: &dyn Display) {
    let reason = reason.to_string();
    store.error(
        "Unhandled Promise Rejection",
        Some(ErrorDetails::from_message(reason.clone())),
        Some(json!({ "reason": reason, "operation": operation })),
    );
}

fn record_panic(store: &LogStore, info: &PanicHookInfo<'_>) {
    let message = panic_message(info);
    let details = ErrorDetails::from_message(message)
        .with_stack(Backtrace::force_capture().to_string())
        .with_type_name("panic");

    let location = info.location();
    let thread = std::thread::current();
    store.error(
        "Global Error",
        Some(details),
        Some(json!({
            "filename": location.map(|l| l.file()),
            "lineno": location.map(|l| l.line()),
            "colno": location.map(|l| l.column()),
            "thread": thread.name().unwrap_or("<unnamed>"),
        })),
    );
}

fn panic_message(info: &PanicHookInfo<'_>) -> String {
    let payload = info.payload();
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
