// SPDX-License-Identifier: MPL-2.0
//! Centralized default values for all configuration constants.
//!
//! This module serves as the single source of truth for default values
//! used across the crate. Constants are organized by category.
//!
//! # Categories
//!
//! - **Log Buffers**: Per-category in-memory capacity
//! - **Error Mirror**: Persisted error capacity
//! - **HTTP**: Instrumented client defaults
//! - **Storage**: Durable key names and locations

use crate::domain::diagnostics::{buffer_capacity_bounds, mirror_capacity_bounds};

// ==========================================================================
// Log Buffer Defaults
// ==========================================================================

/// Default number of entries kept per log category.
pub const DEFAULT_MAX_LOGS: usize = buffer_capacity_bounds::DEFAULT;

/// Minimum number of entries kept per log category.
pub const MIN_MAX_LOGS: usize = buffer_capacity_bounds::MIN;

/// Maximum number of entries kept per log category.
pub const MAX_MAX_LOGS: usize = buffer_capacity_bounds::MAX;

// ==========================================================================
// Error Mirror Defaults
// ==========================================================================

/// Default number of error entries kept in durable storage.
pub const DEFAULT_MIRROR_CAPACITY: usize = mirror_capacity_bounds::DEFAULT;

/// Minimum number of persisted error entries.
pub const MIN_MIRROR_CAPACITY: usize = mirror_capacity_bounds::MIN;

/// Maximum number of persisted error entries.
pub const MAX_MIRROR_CAPACITY: usize = mirror_capacity_bounds::MAX;

// ==========================================================================
// HTTP Defaults
// ==========================================================================

/// Default timeout applied by the instrumented HTTP client (in seconds).
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

/// Method and URL placeholder used when a failing request carries no context.
pub const UNKNOWN_REQUEST_FIELD: &str = "UNKNOWN";

// ==========================================================================
// Storage Defaults
// ==========================================================================

/// Durable key holding the capture toggle.
pub const SETTINGS_KEY: &str = "debugLogSettings";

/// Durable key holding the persisted error mirror.
pub const ERRORS_KEY: &str = "debugErrors";

/// Directory name used under the platform config and data directories.
pub const APP_DIR_NAME: &str = "diaglog";

/// Sub-directory of the data directory used by the file-backed store.
pub const STORAGE_DIR_NAME: &str = "storage";

/// Prefix of exported log files.
pub const EXPORT_FILE_PREFIX: &str = "debug-logs";
