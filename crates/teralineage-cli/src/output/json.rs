//! JSON output formatting for both the success report and the soft-mode error envelope.

use serde::Serialize;

/// Serializes `value` as JSON; `compact` selects minified over pretty-printed output.
pub fn format_json<T: Serialize>(value: &T, compact: bool) -> String {
    if compact {
        serde_json::to_string(value).expect("report serialization cannot fail")
    } else {
        serde_json::to_string_pretty(value).expect("report serialization cannot fail")
    }
}
