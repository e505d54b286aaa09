use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheck {
    pub name: String,
    pub status: String,
    #[serde(default)]
    pub detail: Option<String>,
    #[serde(default)]
    pub latency_ms: Option<f64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SyncJobCounts {
    #[serde(default)]
    pub queued: i64,
    #[serde(default)]
    pub running: i64,
    #[serde(default)]
    pub finished: i64,
    #[serde(default)]
    pub failed: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub app: String,
    pub version: String,
    pub utc_time: String,
    #[serde(default)]
    pub checks: Vec<HealthCheck>,
    #[serde(default)]
    pub sync_jobs: SyncJobCounts,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AskFilters {
    pub project_ids: Vec<i64>,
    pub tracker_ids: Vec<i64>,
    pub status_ids: Vec<i64>,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskRequest {
    pub query: String,
    pub filters: AskFilters,
    pub top_k: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Citation {
    pub id: i64,
    pub url: String,
    pub source_type: String,
    pub source_id: String,
    pub snippet: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AskResponse {
    pub answer_markdown: String,
    #[serde(default)]
    pub citations: Vec<Citation>,
    #[serde(default)]
    pub used_chunk_ids: Vec<i64>,
    #[serde(default)]
    pub confidence: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRequest {
    pub project_ids: Option<Vec<i64>>,
    pub modules: Option<Vec<String>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncResponse {
    pub job_id: String,
    pub accepted: bool,
    pub detail: String,
}

/// A backend-tracked ingestion job. `status` is kept as a string because the
/// backend may grow states beyond queued/running/finished/failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJob {
    pub id: String,
    pub status: String,
    #[serde(default)]
    pub payload: Map<String, Value>,
    #[serde(default)]
    pub started_at: Option<String>,
    #[serde(default)]
    pub finished_at: Option<String>,
    #[serde(default)]
    pub error_message: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncJobList {
    #[serde(default)]
    pub items: Vec<SyncJob>,
    #[serde(default)]
    pub total: i64,
    #[serde(default)]
    pub counts: SyncJobCounts,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractRequest {
    pub issue_ids: Option<Vec<i64>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub accepted: bool,
    pub processed_issues: i64,
    pub detail: String,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsByProject {
    pub project_id: i64,
    pub issues_total: i64,
    pub issues_with_first_response: i64,
    pub issues_with_resolution: i64,
    pub avg_first_response_s: Option<f64>,
    pub avg_resolution_s: Option<f64>,
    pub reopen_total: i64,
    pub touch_total: i64,
    pub handoff_total: i64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct MetricsSummary {
    pub generated_at: String,
    pub from_date: Option<String>,
    pub to_date: Option<String>,
    pub project_ids: Vec<i64>,
    pub extractor_version: String,
    pub issues_total: i64,
    pub issues_with_first_response: i64,
    pub issues_with_resolution: i64,
    pub avg_first_response_s: Option<f64>,
    pub avg_resolution_s: Option<f64>,
    pub reopen_total: i64,
    pub touch_total: i64,
    pub handoff_total: i64,
    pub by_project: Vec<MetricsByProject>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalMetricsSnapshot {
    pub query_count: i64,
    pub citation_coverage: f64,
    pub groundedness: f64,
    pub retrieval_hit_rate: f64,
    pub source_type_coverage: BTreeMap<String, i64>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalComparisonRow {
    pub metric: String,
    pub baseline: f64,
    pub current: f64,
    pub delta: f64,
    pub allowed_drop: f64,
    pub passed: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EvalArtifacts {
    pub generated_at: String,
    /// pass, fail or missing.
    pub status: String,
    pub current_report_path: Option<String>,
    pub baseline_path: Option<String>,
    pub regression_gate_path: Option<String>,
    pub current_metrics: Option<EvalMetricsSnapshot>,
    pub baseline_metrics: Option<EvalMetricsSnapshot>,
    pub comparisons: Vec<EvalComparisonRow>,
    pub failures: Vec<String>,
    pub llm_runtime_failures: Vec<String>,
    pub notes: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OpsEnvironment {
    pub generated_at: String,
    pub app: String,
    pub version: String,
    pub app_env: String,
    pub redmine_base_url: String,
    pub redmine_allowed_hosts: Vec<String>,
    pub llm_provider: String,
    pub llm_model: String,
    pub llm_extract_enabled: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsRunRecord {
    pub id: String,
    pub action: String,
    pub status: String,
    pub started_at: String,
    pub finished_at: String,
    pub detail: String,
    #[serde(default)]
    pub summary: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsActionResponse {
    pub accepted: bool,
    pub run: OpsRunRecord,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsRunList {
    #[serde(default)]
    pub items: Vec<OpsRunRecord>,
    #[serde(default)]
    pub total: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OpsBackupRequest {
    pub output_dir: Option<String>,
}

pub const SYNC_MODULES: [&str; 13] = [
    "projects",
    "users",
    "groups",
    "trackers",
    "issue_statuses",
    "issue_priorities",
    "issues",
    "time_entries",
    "news",
    "documents",
    "files",
    "boards",
    "wiki",
];
