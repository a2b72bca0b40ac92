// SPDX-License-Identifier: MPL-2.0
//! Transport-independent HTTP lifecycle observer.
//!
//! A client calls [`HttpInstrumentor::on_request`] before sending, which
//! stamps a [`RequestContext`] owned by that request, then reports the
//! outcome with [`HttpInstrumentor::on_response`] or
//! [`HttpInstrumentor::on_failure`]. Nothing here fails or alters the
//! outcome being reported.

use std::error::Error as StdError;
use std::sync::Arc;
use std::time::Instant;

use serde_json::{json, Value};

use crate::config::UNKNOWN_REQUEST_FIELD;
use crate::diagnostics::{ErrorDetails, LogStore};

/// Per-request metadata carried from send to completion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub url: String,
    started_at: Option<Instant>,
}

impl RequestContext {
    /// Creates an unstamped context.
    #[must_use]
    pub fn new(method: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            started_at: None,
        }
    }

    /// Records the current instant as the request start.
    #[must_use]
    pub fn started(mut self) -> Self {
        self.started_at = Some(Instant::now());
        self
    }

    #[must_use]
    pub fn started_at(&self) -> Option<Instant> {
        self.started_at
    }

    /// Milliseconds since the start instant, `0` if the context was never stamped.
    #[must_use]
    pub fn elapsed_ms(&self) -> u64 {
        self.started_at.map_or(0, |start| {
            u64::try_from(start.elapsed().as_millis()).unwrap_or(u64::MAX)
        })
    }
}

/// A failed exchange: transport error or non-2xx response.
#[derive(Debug, Clone, Default)]
pub struct HttpFailure {
    /// Response status, `None` when no response was received.
    pub status: Option<u16>,
    pub details: ErrorDetails,
    /// Response body, when one was read.
    pub response: Option<Value>,
}

impl HttpFailure {
    /// Failure with no response, built from the transport error.
    #[must_use]
    pub fn transport<E: StdError + 'static>(err: &E) -> Self {
        Self {
            status: None,
            details: ErrorDetails::from_error(err),
            response: None,
        }
    }

    /// Failure carried by a received non-2xx response.
    #[must_use]
    pub fn status(status: u16) -> Self {
        Self {
            status: Some(status),
            details: ErrorDetails::from_message(format!(
                "Request failed with status code {status}"
            )),
            response: None,
        }
    }

    #[must_use]
    pub fn with_response(mut self, response: Value) -> Self {
        self.response = Some(response);
        self
    }
}

#[derive(Debug, Clone)]
pub struct HttpInstrumentor {
    store: Arc<LogStore>,
}

impl HttpInstrumentor {
    #[must_use]
    pub fn new(store: Arc<LogStore>) -> Self {
        Self { store }
    }

    #[must_use]
    pub fn store(&self) -> &Arc<LogStore> {
        &self.store
    }

    /// Stamps a new context and records `API Request: <METHOD> <url>`.
    #[must_use]
    pub fn on_request(&self, method: &str, url: &str, headers: Value) -> RequestContext {
        let context = RequestContext::new(method.to_uppercase(), url).started();
        self.store.debug(
            format!("API Request: {} {}", context.method, context.url),
            Some(json!({ "headers": headers })),
        );
        context
    }

    /// Records a request that could not be built, so no context exists.
    pub fn on_request_error(&self, err: &(dyn StdError + 'static)) {
        let details = ErrorDetails::from_dyn(err);
        self.store.record_network(
            UNKNOWN_REQUEST_FIELD,
            UNKNOWN_REQUEST_FIELD,
            0,
            0,
            Some(json!({ "error": details.error_message })),
        );
        self.store.error("API Request Error", Some(details), None);
    }

    /// Records a successful exchange.
    pub fn on_response(&self, context: &RequestContext, status: u16, headers: Value) {
        self.store.record_network(
            context.method.as_str(),
            context.url.as_str(),
            status,
            context.elapsed_ms(),
            Some(json!({ "data": null, "headers": headers })),
        );
    }

    /// Records a failed exchange as a network entry plus an error entry.
    pub fn on_failure(&self, context: Option<&RequestContext>, failure: HttpFailure) {
        let method = context.map_or(UNKNOWN_REQUEST_FIELD, |c| c.method.as_str());
        let url = context.map_or(UNKNOWN_REQUEST_FIELD, |c| c.url.as_str());
        let elapsed = context.map_or(0, RequestContext::elapsed_ms);

        self.store.record_network(
            method,
            url,
            failure.status.unwrap_or(0),
            elapsed,
            Some(json!({
                "error": failure.details.error_message,
                "response": failure.response,
            })),
        );
        self.store.error(
            "API Response Error",
            Some(failure.details),
            Some(json!({
                "url": context.map(|c| c.url.as_str()),
                "status": failure.status,
            })),
        );
    }
}
