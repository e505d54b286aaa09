use serde_json::Value;

use crate::model::SyncJob;

use super::{STATUS_FAILED, stringify};

const NETWORK_TERMS: [&str; 3] = ["connect", "timeout", "network"];
const SCHEMA_TERMS: [&str; 3] = ["keyerror", "schema", "json"];
const AUTH_TERMS: [&str; 3] = ["unauthorized", "forbidden", "401"];

const NETWORK_ADVICE: [&str; 2] = [
    "Check REDMINE_BASE_URL connectivity and retry the job.",
    "Verify REDMINE_API_KEY and outbound host policy in /healthz.",
];
const SCHEMA_ADVICE: &str =
    "Inspect payload schema mismatch in logs and confirm Redmine response shape.";
const AUTH_ADVICE: &str = "Rotate API key and verify account permissions for requested modules.";
const GENERIC_ADVICE: &str = "Inspect the backend logs for the job_id and retry after remediation.";

/// Operator advice for a failed job. Categories are matched independently,
/// so one error can yield several recommendations.
pub fn failure_recommendations(job: &SyncJob) -> Vec<String> {
    if job.status != STATUS_FAILED {
        return Vec::new();
    }

    let error_type = match job.payload.get("error_type") {
        None | Some(Value::Null) => String::new(),
        Some(value) => stringify(value),
    };
    let corpus = format!(
        "{} {}",
        job.error_message.as_deref().unwrap_or_default(),
        error_type
    )
    .to_lowercase();
    let mentions = |terms: &[&str]| terms.iter().any(|term| corpus.contains(term));

    let mut recommendations = Vec::new();
    if mentions(&NETWORK_TERMS) {
        recommendations.extend(NETWORK_ADVICE.iter().map(|advice| advice.to_string()));
    }
    if mentions(&SCHEMA_TERMS) {
        recommendations.push(SCHEMA_ADVICE.to_string());
    }
    if mentions(&AUTH_TERMS) {
        recommendations.push(AUTH_ADVICE.to_string());
    }

    if recommendations.is_empty() {
        recommendations.push(GENERIC_ADVICE.to_string());
    }
    recommendations
}
