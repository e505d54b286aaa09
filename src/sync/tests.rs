use serde_json::{Map, Value, json};

use super::*;
use crate::model::{SyncJob, SyncRequest};

fn payload(value: Value) -> Map<String, Value> {
    match value {
        Value::Object(map) => map,
        other => panic!("expected object payload, got {other}"),
    }
}

fn job(status: &str, error_message: Option<&str>, payload_value: Value) -> SyncJob {
    SyncJob {
        id: "job-1".to_string(),
        status: status.to_string(),
        payload: payload(payload_value),
        started_at: None,
        finished_at: None,
        error_message: error_message.map(ToOwned::to_owned),
        created_at: "2026-02-21T10:00:00Z".to_string(),
        updated_at: "2026-02-21T10:00:00Z".to_string(),
    }
}

#[test]
fn extract_sync_summary_fills_fixed_rows_with_defaults() {
    let summary = extract_sync_summary(&payload(json!({
        "summary": {
            "modules_enabled": ["issues"],
            "modules_skipped": [{"module": "wiki", "reason": "x"}],
            "issues_synced": 3
        }
    })))
    .expect("summary should be present");

    assert_eq!(summary.modules_enabled, vec!["issues".to_string()]);
    assert_eq!(
        summary.modules_skipped,
        vec![SkippedModule {
            module: "wiki".to_string(),
            reason: "x".to_string(),
            status_code: None,
        }]
    );

    assert_eq!(summary.entities.len(), 10);
    for row in &summary.entities {
        let expected = if row.label == "Issues" { 3 } else { 0 };
        assert_eq!(row.value, expected, "label {}", row.label);
    }
    assert_eq!(summary.entities[0].label, "Projects");
    assert_eq!(summary.entities[9].label, "Wiki pages");

    let labels = summary
        .indexing
        .iter()
        .map(|row| row.label)
        .collect::<Vec<&str>>();
    assert_eq!(
        labels,
        vec![
            "Sources reindexed",
            "Chunks updated",
            "Embeddings processed",
            "Vectors upserted",
            "Vectors removed"
        ]
    );
    assert!(summary.indexing.iter().all(|row| row.value == 0));
}

#[test]
fn extract_sync_summary_is_none_without_summary_object() {
    assert!(extract_sync_summary(&payload(json!({}))).is_none());
    assert!(extract_sync_summary(&payload(json!({"summary": null}))).is_none());
    assert!(extract_sync_summary(&payload(json!({"summary": "done"}))).is_none());
    assert!(extract_sync_summary(&payload(json!({"summary": [1, 2]}))).is_none());

    let empty = extract_sync_summary(&payload(json!({"summary": {}}))).expect("empty summary");
    assert!(empty.modules_enabled.is_empty());
    assert!(empty.modules_skipped.is_empty());
    assert!(empty.entities.iter().all(|row| row.value == 0));
}

#[test]
fn extract_sync_summary_coerces_counters() {
    let summary = extract_sync_summary(&payload(json!({
        "summary": {
            "projects_synced": 2.9,
            "users_synced": "17",
            "groups_synced": "12 groups",
            "issues_synced": "n/a",
            "journals_synced": true,
            "chunks_updated": -4,
            "vectors_upserted": 5
        }
    })))
    .expect("summary");

    let value_of = |label: &str| {
        summary
            .entities
            .iter()
            .chain(summary.indexing.iter())
            .find(|row| row.label == label)
            .map(|row| row.value)
    };
    assert_eq!(value_of("Projects"), Some(2));
    assert_eq!(value_of("Users"), Some(17));
    assert_eq!(value_of("Groups"), Some(12));
    assert_eq!(value_of("Issues"), Some(0));
    assert_eq!(value_of("Journals"), Some(0));
    assert_eq!(value_of("Chunks updated"), Some(-4));
    assert_eq!(value_of("Vectors upserted"), Some(5));
}

#[test]
fn skipped_modules_default_to_unknown_and_keep_status_codes() {
    let summary = extract_sync_summary(&payload(json!({
        "summary": {
            "modules_enabled": ["issues", 7],
            "modules_skipped": [
                {"module": "files", "reason": "forbidden", "status_code": 403},
                {"status_code": "404"},
                {"module": null, "reason": "disabled", "status_code": 0},
                "not-an-object",
                {"module": "boards", "reason": "x", "status_code": "abc"}
            ]
        }
    })))
    .expect("summary");

    assert_eq!(summary.modules_enabled, vec!["issues".to_string(), "7".to_string()]);
    assert_eq!(summary.modules_skipped.len(), 4);
    assert_eq!(summary.modules_skipped[0].status_code, Some(403));
    assert_eq!(summary.modules_skipped[1].module, "unknown");
    assert_eq!(summary.modules_skipped[1].reason, "unknown");
    assert_eq!(summary.modules_skipped[1].status_code, Some(404));
    assert_eq!(summary.modules_skipped[2].module, "unknown");
    assert_eq!(summary.modules_skipped[2].status_code, None);
    assert_eq!(summary.modules_skipped[3].status_code, None);
}

#[test]
fn build_retry_payload_keeps_original_scope() {
    let failed = job(
        "failed",
        Some("timeout"),
        json!({"project_ids": [1, 2], "modules": ["issues"]}),
    );

    assert_eq!(
        build_retry_payload(&failed),
        SyncRequest {
            project_ids: Some(vec![1, 2]),
            modules: Some(vec!["issues".to_string()]),
        }
    );
}

#[test]
fn build_retry_payload_maps_empty_lists_to_none() {
    let empty = job("failed", None, json!({"project_ids": [], "modules": []}));
    assert_eq!(build_retry_payload(&empty), SyncRequest::default());

    let junk = job(
        "failed",
        None,
        json!({"project_ids": ["3", "x", 0, -1, 4.7, null], "modules": "issues"}),
    );
    let retry = build_retry_payload(&junk);
    assert_eq!(retry.project_ids, Some(vec![3, 4]));
    assert_eq!(retry.modules, None);

    let missing = job("finished", None, json!({}));
    assert_eq!(build_retry_payload(&missing), SyncRequest::default());
}

#[test]
fn extract_modules_and_project_scope() {
    let modules = extract_modules_from_payload(&payload(json!({"modules": ["issues", "news"]})));
    assert_eq!(modules, vec!["issues".to_string(), "news".to_string()]);
    assert!(extract_modules_from_payload(&payload(json!({"modules": "issues"}))).is_empty());

    assert_eq!(parse_project_scope("1, 2,abc,0, 9"), vec![1, 2, 9]);

    let projects = extract_project_ids_from_payload(&payload(json!({"project_ids": [1, "2"]})));
    assert_eq!(projects, vec!["1".to_string(), "2".to_string()]);
    assert!(extract_project_ids_from_payload(&payload(json!({}))).is_empty());
}

#[test]
fn failure_recommendations_cover_network_errors() {
    let failed = job(
        "failed",
        Some("network timeout"),
        json!({"error_type": "ConnectError"}),
    );
    let recommendations = failure_recommendations(&failed);

    assert!(recommendations.len() >= 2);
    assert!(recommendations[0].contains("connectivity"));
}

#[test]
fn failure_recommendations_accumulate_categories() {
    let failed = job(
        "failed",
        Some("401 Unauthorized while decoding JSON"),
        json!({}),
    );
    let recommendations = failure_recommendations(&failed);

    assert_eq!(recommendations.len(), 2);
    assert!(recommendations[0].contains("schema"));
    assert!(recommendations[1].contains("Rotate API key"));
}

#[test]
fn failure_recommendations_fall_back_to_generic_advice() {
    let failed = job("failed", Some("boom"), json!({"error_type": null}));
    let recommendations = failure_recommendations(&failed);
    assert_eq!(recommendations.len(), 1);
    assert!(recommendations[0].contains("backend logs"));

    let no_message = job("failed", None, json!({}));
    assert_eq!(failure_recommendations(&no_message).len(), 1);
}

#[test]
fn failure_recommendations_empty_for_other_states() {
    for status in ["queued", "running", "finished"] {
        let other = job(status, Some("network timeout"), json!({}));
        assert!(failure_recommendations(&other).is_empty());
    }
    assert!(is_terminal_status("failed"));
    assert!(!is_terminal_status("running"));
}
