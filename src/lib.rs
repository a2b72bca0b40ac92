// SPDX-License-Identifier: MPL-2.0
//! `diaglog` captures client-side diagnostics: a bounded, categorized log of
//! what the application did, instrumented HTTP traffic, uncaught failures and
//! a durable copy of recent errors, exportable as a single JSON file.
//!
//! ```no_run
//! use std::sync::Arc;
//!
//! use diaglog::config::DiagnosticsConfig;
//! use diaglog::diagnostics::Diagnostics;
//! use diaglog::storage::FileStore;
//!
//! # fn main() -> diaglog::error::Result<()> {
//! let config = diaglog::config::load()?;
//! let dir = config.resolved_storage_dir().unwrap_or_else(|| "storage".into());
//! let diagnostics = Diagnostics::start(&config, Arc::new(FileStore::new(dir)?));
//!
//! diagnostics.store().info("user opened settings", None);
//! let exported = diagnostics.exporter().export()?;
//! println!("logs written to {}", exported.display());
//! # Ok(())
//! # }
//! ```

#![doc(html_root_url = "https://docs.rs/diaglog/0.1.0")]

pub mod config;
pub mod diagnostics;
pub mod domain;
pub mod error;
pub mod instrument;
pub mod storage;
