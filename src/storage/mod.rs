// SPDX-License-Identifier: MPL-2.0
//! Durable key/value storage shared by the settings toggle and the error mirror.
//!
//! Values are JSON text. Keys are short identifiers (`debugLogSettings`,
//! `debugErrors`) and are disjoint between users of the store, so writes are
//! last-writer-wins without any cross-key coordination.
//!
//! - [`FileStore`]: one `<key>.json` file per key in an application directory
//! - [`MemoryStore`]: process-local map with an optional byte quota

mod file;
mod memory;

pub use file::{write_atomic, FileStore};
pub use memory::MemoryStore;

use std::cell::Cell;
use std::marker::PhantomData;

use thiserror::Error;

/// Errors raised by a [`DurableStore`].
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("I/O error on key `{key}`: {source}")]
    Io {
        key: String,
        #[source]
        source: std::io::Error,
    },
    #[error("storage quota exceeded: {required} bytes required, {quota} bytes allowed")]
    QuotaExceeded { required: usize, quota: usize },
    #[error("invalid storage key `{0}`")]
    InvalidKey(String),
}

/// A durable, origin-scoped key/value facility.
///
/// Implementations must be usable from any thread.
pub trait DurableStore: Send + Sync {
    /// Returns the stored value, or `None` if the key is absent.
    fn get(&self, key: &str) -> Result<Option<String>, StorageError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: &str) -> Result<(), StorageError>;

    /// Removes `key`. Removing an absent key succeeds.
    fn remove(&self, key: &str) -> Result<(), StorageError>;
}

/// Keys map to file names, so only a conservative character set is accepted.
pub(crate) fn validate_key(key: &str) -> Result<(), StorageError> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(StorageError::InvalidKey(key.to_string()))
    }
}

thread_local! {
    static IN_DURABLE_WRITE: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as inside a durable read-modify-write.
///
/// A panic raised by the store (or by a log subscriber) while the marker is
/// held runs the panic hook on the same thread; the hook then sees the
/// marker and skips durable storage instead of waiting on a lock this
/// thread already owns. The marker is cleared on drop, including unwinding.
#[derive(Debug)]
pub(crate) struct DurableWriteGuard {
    _not_send: PhantomData<*const ()>,
}

impl DurableWriteGuard {
    /// Returns `None` if this thread is already inside a durable write.
    pub(crate) fn enter() -> Option<Self> {
        if IN_DURABLE_WRITE.with(|flag| flag.replace(true)) {
            return None;
        }
        Some(Self {
            _not_send: PhantomData,
        })
    }
}

impl Drop for DurableWriteGuard {
    fn drop(&mut self) {
        IN_DURABLE_WRITE.with(|flag| flag.set(false));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn durable_write_guard_is_not_reentrant() {
        let outer = DurableWriteGuard::enter().expect("first enter succeeds");
        assert!(DurableWriteGuard::enter().is_none());

        drop(outer);
        assert!(DurableWriteGuard::enter().is_some());
    }

    #[test]
    fn durable_write_guard_is_released_by_unwinding() {
        let result = std::panic::catch_unwind(|| {
            let _guard = DurableWriteGuard::enter().expect("first enter succeeds");
            panic!("store failed mid-write");
        });

        assert!(result.is_err());
        assert!(DurableWriteGuard::enter().is_some());
    }

    #[test]
    fn durable_write_guard_is_per_thread() {
        let _guard = DurableWriteGuard::enter().expect("first enter succeeds");

        let other = std::thread::spawn(|| DurableWriteGuard::enter().is_some())
            .join()
            .expect("thread should finish");

        assert!(other);
    }

    #[test]
    fn validate_key_accepts_durable_keys() {
        assert!(validate_key("debugLogSettings").is_ok());
        assert!(validate_key("debugErrors").is_ok());
        assert!(validate_key("app-v2.state_1").is_ok());
    }

    #[test]
    fn validate_key_rejects_path_like_keys() {
        assert!(validate_key("").is_err());
        assert!(validate_key("../outside").is_err());
        assert!(validate_key("nested/key").is_err());
        assert!(validate_key(".hidden").is_err());
    }

    #[test]
    fn quota_error_displays_sizes() {
        let err = StorageError::QuotaExceeded {
            required: 2048,
            quota: 1024,
        };
        let display = format!("{err}");
        assert!(display.contains("2048"));
        assert!(display.contains("1024"));
    }
}
