// SPDX-License-Identifier: MPL-2.0
//! Log entry types.
//!
//! This module defines the categories a captured event can belong to and
//! the immutable entries stored for them.

use std::error::Error as StdError;
use std::fmt::Write as _;

use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Returns the current UTC time as ISO 8601 with millisecond precision
/// (e.g. `2026-10-16T09:12:44.031Z`).
#[must_use]
pub fn timestamp_now() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

// =============================================================================
// Categories
// =============================================================================

/// Level accepted by [`LogStore::record`](super::LogStore::record).
///
/// Network telemetry has its own entry type and is recorded separately.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogLevel {
    Info,
    Error,
    Debug,
}

/// One of the four independent in-memory sequences.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Info,
    Error,
    Debug,
    Network,
}

impl Category {
    /// All categories, in export order.
    pub const ALL: [Category; 4] = [
        Category::Info,
        Category::Error,
        Category::Debug,
        Category::Network,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Info => "info",
            Category::Error => "error",
            Category::Debug => "debug",
            Category::Network => "network",
        }
    }

    /// Parses a lowercase category name.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|category| category.as_str() == name)
    }

    /// Tag printed in front of console output (`[INFO]`, `[NETWORK]`, ...).
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Category::Info => "[INFO]",
            Category::Error => "[ERROR]",
            Category::Debug => "[DEBUG]",
            Category::Network => "[NETWORK]",
        }
    }
}

impl From<LogLevel> for Category {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Info => Category::Info,
            LogLevel::Error => Category::Error,
            LogLevel::Debug => Category::Debug,
        }
    }
}

// =============================================================================
// Entries
// =============================================================================

/// An info, error or debug entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LogEntry {
    /// ISO 8601 capture time.
    pub timestamp: String,
    pub message: String,
    /// Structured payload supplied by the caller, `null` when absent.
    #[serde(default)]
    pub data: Option<Value>,
    /// `file:line:column` of the code that recorded the entry.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    /// Backtrace captured at the recording call site.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stack_trace: Option<String>,
}

/// A single outbound HTTP exchange.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NetworkLogEntry {
    pub method: String,
    pub url: String,
    /// HTTP status, `0` when no response was received.
    pub status: u16,
    pub response_time_ms: u64,
    #[serde(default)]
    pub data: Option<Value>,
    pub timestamp: String,
}

impl NetworkLogEntry {
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

// =============================================================================
// Error Details
// =============================================================================

/// Fields extracted from the failure that caused an error entry.
///
/// Every field is optional: the cause may be a typed error, a bare message
/// (panic payloads) or nothing at all.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    /// Source chain, or a backtrace when one was captured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_stack: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_type_name: Option<String>,
}

impl ErrorDetails {
    /// Extracts message, source chain and concrete type name from `err`.
    #[must_use]
    pub fn from_error<E: StdError + 'static>(err: &E) -> Self {
        Self {
            error_message: Some(err.to_string()),
            error_stack: source_chain(err.source()),
            error_type_name: Some(std::any::type_name::<E>().to_string()),
        }
    }

    /// Like [`ErrorDetails::from_error`] for trait objects, which carry no type name.
    #[must_use]
    pub fn from_dyn(err: &(dyn StdError + 'static)) -> Self {
        Self {
            error_message: Some(err.to_string()),
            error_stack: source_chain(err.source()),
            error_type_name: None,
        }
    }

    /// Synthesizes details from raw message text.
    #[must_use]
    pub fn from_message(message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_stack(mut self, stack: impl Into<String>) -> Self {
        self.error_stack = Some(stack.into());
        self
    }

    #[must_use]
    pub fn with_type_name(mut self, type_name: impl Into<String>) -> Self {
        self.error_type_name = Some(type_name.into());
        self
    }

    /// Merges these fields into the caller's payload.
    ///
    /// Object payloads receive the fields directly (error fields win on
    /// collision); any other non-null payload is kept under `context`.
    #[must_use]
    pub fn merge_into(self, data: Option<Value>) -> Value {
        let mut object = match data {
            Some(Value::Object(map)) => map,
            None | Some(Value::Null) => Map::new(),
            Some(other) => {
                let mut map = Map::new();
                map.insert("context".to_string(), other);
                map
            }
        };

        let fields = [
            ("errorMessage", self.error_message),
            ("errorStack", self.error_stack),
            ("errorTypeName", self.error_type_name),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                object.insert(key.to_string(), Value::String(value));
            }
        }

        Value::Object(object)
    }
}

/// Renders `caused by:` lines for each error in the chain.
fn source_chain(mut source: Option<&(dyn StdError + 'static)>) -> Option<String> {
    let mut chain = String::new();
    while let Some(err) = source {
        if !chain.is_empty() {
            chain.push('\n');
        }
        let _ = write!(chain, "caused by: {err}");
        source = err.source();
    }
    (!chain.is_empty()).then_some(chain)
}
