// SPDX-License-Identifier: MPL-2.0
//! Crate-level error type for the fallible, non-capture APIs.
//!
//! Capture calls (`record`, `record_network`, mirroring, settings writes)
//! never return errors; they log and carry on. Errors surface only from
//! configuration, storage construction and export.

use thiserror::Error;

use crate::diagnostics::ExportError;
use crate::storage::StorageError;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O Error: {0}")]
    Io(String),
    #[error("Config Error: {0}")]
    Config(String),
    #[error("Storage Error: {0}")]
    Storage(#[from] StorageError),
    #[error("Export Error: {0}")]
    Export(#[from] ExportError),
    #[error("Usage Error: {0}")]
    Usage(String),
}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error::Io(err.to_string())
    }
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for Error {
    fn from(err: toml::ser::Error) -> Self {
        Error::Config(err.to_string())
    }
}

impl From<pico_args::Error> for Error {
    fn from(err: pico_args::Error) -> Self {
        Error::Usage(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, Error>;
