use anyhow::{Result, bail};
use serde_json::Value;

use crate::format::format_percent;
use crate::model::{HealthCheck, OpsBackupRequest};

pub const LLM_TELEMETRY_CHECK: &str = "llm_telemetry";

/// One-line rendering of the JSON blob the backend stores in the
/// `llm_telemetry` health check detail. Non-JSON details are shown verbatim.
pub fn summarize_llm_telemetry(detail: Option<&str>) -> String {
    let Some(detail) = detail.filter(|detail| !detail.is_empty()) else {
        return "Telemetry detail unavailable".to_string();
    };

    let Ok(payload) = serde_json::from_str::<Value>(detail) else {
        return detail.to_string();
    };

    let success_rate = payload
        .get("success_rate")
        .and_then(Value::as_f64)
        .map(format_percent)
        .unwrap_or_else(|| "-".to_string());
    let p95 = payload
        .get("p95_latency_ms")
        .and_then(Value::as_f64)
        .map(|latency| format!("{latency} ms"))
        .unwrap_or_else(|| "-".to_string());
    let circuit = payload
        .get("circuit")
        .and_then(|circuit| circuit.get("state"))
        .and_then(Value::as_str)
        .unwrap_or("unknown");

    format!("success={success_rate}, p95={p95}, circuit={circuit}")
}

/// Checks whose status equals `status`; `all` keeps every check.
pub fn filter_health_checks<'a>(checks: &'a [HealthCheck], status: &str) -> Vec<&'a HealthCheck> {
    checks
        .iter()
        .filter(|check| status == "all" || check.status == status)
        .collect()
}

/// Detail column for a health check row.
pub fn check_detail(check: &HealthCheck) -> String {
    if check.name == LLM_TELEMETRY_CHECK {
        return summarize_llm_telemetry(check.detail.as_deref());
    }
    check.detail.clone().unwrap_or_else(|| "-".to_string())
}

/// Latency column; a zero or missing latency is shown as `-`.
pub fn format_latency(latency_ms: Option<f64>) -> String {
    match latency_ms.filter(|latency| *latency != 0.0 && latency.is_finite()) {
        Some(latency) => format!("{latency} ms"),
        None => "-".to_string(),
    }
}

/// Ops runs only report `success` or an error state; the badge collapses
/// them onto the job vocabulary.
pub fn run_badge_status(status: &str) -> &'static str {
    if status == "success" { "finished" } else { "failed" }
}

/// Blank output directories defer to the backend's configured location.
pub fn backup_request(output_dir: &str) -> OpsBackupRequest {
    let output_dir = output_dir.trim();
    OpsBackupRequest {
        output_dir: (!output_dir.is_empty()).then(|| output_dir.to_string()),
    }
}

/// Applies 1-based check/uncheck toggles to the release checklist. A reset
/// clears every item before the toggles are applied.
pub fn apply_checklist_changes(
    current: &[bool],
    check: &[usize],
    uncheck: &[usize],
    reset: bool,
) -> Result<Vec<bool>> {
    let mut checklist = if reset {
        vec![false; current.len()]
    } else {
        current.to_vec()
    };

    for (items, value) in [(check, true), (uncheck, false)] {
        for &item in items {
            if item == 0 || item > checklist.len() {
                bail!(
                    "checklist item {item} is out of range; expected 1..={}",
                    checklist.len()
                );
            }
            checklist[item - 1] = value;
        }
    }

    Ok(checklist)
}
