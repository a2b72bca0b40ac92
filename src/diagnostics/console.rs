// SPDX-License-Identifier: MPL-2.0
//! Console mirroring of captured entries.
//!
//! Every capture is echoed through `tracing` under the [`CONSOLE_TARGET`]
//! target. The severity used for each category comes from a fixed table.

use serde_json::Value;

use super::entry::{Category, LogEntry, NetworkLogEntry};

/// `tracing` target of console mirror events.
pub const CONSOLE_TARGET: &str = "diaglog::console";

/// Console severity of a mirrored entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    Error,
    Info,
    Debug,
}

/// Category to severity table. Errors go to error output, the rest to
/// regular output.
const SEVERITY_TABLE: [(Category, Severity); 4] = [
    (Category::Info, Severity::Info),
    (Category::Error, Severity::Error),
    (Category::Debug, Severity::Debug),
    (Category::Network, Severity::Info),
];

impl Category {
    #[must_use]
    pub fn console_severity(self) -> Severity {
        SEVERITY_TABLE
            .iter()
            .find(|(category, _)| *category == self)
            .map_or(Severity::Info, |(_, severity)| *severity)
    }
}

pub(crate) fn emit_entry(category: Category, entry: &LogEntry) {
    let data = render_data(entry.data.as_ref());
    emit(
        category.console_severity(),
        format_args!("{} {}", category.tag(), entry.message),
        &data,
    );
}

pub(crate) fn emit_network(entry: &NetworkLogEntry) {
    let data = render_data(entry.data.as_ref());
    emit(
        Category::Network.console_severity(),
        format_args!(
            "{} {} {} - {} ({}ms)",
            Category::Network.tag(),
            entry.method,
            entry.url,
            entry.status,
            entry.response_time_ms
        ),
        &data,
    );
}

fn emit(severity: Severity, line: std::fmt::Arguments<'_>, data: &str) {
    match severity {
        Severity::Error => tracing::error!(target: CONSOLE_TARGET, data, "{line}"),
        Severity::Info => tracing::info!(target: CONSOLE_TARGET, data, "{line}"),
        Severity::Debug => tracing::debug!(target: CONSOLE_TARGET, data, "{line}"),
    }
}

fn render_data(data: Option<&Value>) -> String {
    data.map_or_else(|| "null".to_string(), Value::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn severity_table_covers_every_category() {
        for category in Category::ALL {
            assert!(SEVERITY_TABLE.iter().any(|(c, _)| *c == category));
        }
    }

    #[test]
    fn only_errors_use_error_severity() {
        assert_eq!(Category::Error.console_severity(), Severity::Error);
        assert_eq!(Category::Info.console_severity(), Severity::Info);
        assert_eq!(Category::Debug.console_severity(), Severity::Debug);
        assert_eq!(Category::Network.console_severity(), Severity::Info);
    }

    #[test]
    fn render_data_prints_null_for_missing_payload() {
        assert_eq!(render_data(None), "null");
        assert_eq!(render_data(Some(&json!({"a": 1}))), r#"{"a":1}"#);
    }
}
