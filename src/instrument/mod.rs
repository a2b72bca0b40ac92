// SPDX-License-Identifier: MPL-2.0
//! Hooks that feed a [`LogStore`](crate::diagnostics::LogStore) from outside
//! the application's own logging calls.
//!
//! - [`HttpInstrumentor`] and [`InstrumentedClient`]: outbound HTTP traffic
//! - [`ErrorSurface`]: component errors, failed background tasks and panics

mod client;
mod http;
mod surface;

pub use client::InstrumentedClient;
pub use http::{HttpFailure, HttpInstrumentor, RequestContext};
pub use surface::{is_installed, ErrorSurface};
