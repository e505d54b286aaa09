use serde_json::{Map, Value};

use crate::model::{SyncJob, SyncRequest};
use crate::util::{parse_csv_ids, parse_leading_int};

use super::stringify;

/// Comma-separated project scope as typed by the operator.
pub fn parse_project_scope(value: &str) -> Vec<i64> {
    parse_csv_ids(value)
}

pub fn extract_modules_from_payload(payload: &Map<String, Value>) -> Vec<String> {
    payload
        .get("modules")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(stringify).collect())
        .unwrap_or_default()
}

/// Project ids recorded on a job, as displayed in the jobs table.
pub fn extract_project_ids_from_payload(payload: &Map<String, Value>) -> Vec<String> {
    payload
        .get("project_ids")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(stringify).collect())
        .unwrap_or_default()
}

/// Request that re-runs `job` with its original scope. Empty lists become
/// `None` so the backend applies its configured defaults.
pub fn build_retry_payload(job: &SyncJob) -> SyncRequest {
    let project_ids = job
        .payload
        .get("project_ids")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(|item| parse_leading_int(&stringify(item)))
                .filter(|id| *id > 0)
                .collect::<Vec<i64>>()
        })
        .unwrap_or_default();
    let modules = extract_modules_from_payload(&job.payload);

    SyncRequest {
        project_ids: (!project_ids.is_empty()).then_some(project_ids),
        modules: (!modules.is_empty()).then_some(modules),
    }
}
