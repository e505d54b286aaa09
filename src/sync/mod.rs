use serde_json::Value;

use crate::util::parse_leading_int;

mod recommendations;
mod retry;
mod summary;
#[cfg(test)]
mod tests;

pub use recommendations::failure_recommendations;
pub use retry::{
    build_retry_payload, extract_modules_from_payload, extract_project_ids_from_payload,
    parse_project_scope,
};
pub use summary::{SkippedModule, SyncSummary, extract_sync_summary};

pub const STATUS_QUEUED: &str = "queued";
pub const STATUS_RUNNING: &str = "running";
pub const STATUS_FINISHED: &str = "finished";
pub const STATUS_FAILED: &str = "failed";

pub fn is_terminal_status(status: &str) -> bool {
    matches!(status, STATUS_FINISHED | STATUS_FAILED)
}

/// Counter coercion shared by every numeric payload field: numbers truncate,
/// numeric-looking strings parse their integer prefix, everything else is 0.
fn coerce_count(value: &Value) -> i64 {
    coerce_number(value).unwrap_or(0)
}

fn coerce_number(value: &Value) -> Option<i64> {
    match value {
        Value::Number(number) => number.as_i64().or_else(|| {
            number
                .as_f64()
                .filter(|float| float.is_finite())
                .map(|float| float.trunc() as i64)
        }),
        Value::String(text) => parse_leading_int(text),
        _ => None,
    }
}

/// Display form of a payload value; strings are taken verbatim.
fn stringify(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}
