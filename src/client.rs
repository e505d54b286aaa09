use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::blocking::{Client, RequestBuilder};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::debug;

use crate::cli::ConnectionArgs;
use crate::model::{
    AskRequest, AskResponse, EvalArtifacts, ExtractRequest, ExtractResponse, HealthResponse,
    MetricsSummary, OpsActionResponse, OpsBackupRequest, OpsEnvironment, OpsRunList,
    SyncJob, SyncJobList, SyncRequest, SyncResponse,
};
use crate::util::is_truthy;

const UNEXPECTED_ERROR_MESSAGE: &str =
    "Unexpected error. Retry the action or verify API availability.";

/// Refresh cadence per data kind.
pub mod poll {
    use std::time::Duration;

    pub const HEALTH: Duration = Duration::from_secs(30);
    pub const SYNC_JOBS: Duration = Duration::from_secs(5);
    pub const SYNC_JOB_DETAIL: Duration = Duration::from_secs(3);
    pub const METRICS: Duration = Duration::from_secs(60);
    pub const EVALS: Duration = Duration::from_secs(90);
    pub const OPS_ENVIRONMENT: Duration = Duration::from_secs(120);
    pub const OPS_RUNS: Duration = Duration::from_secs(5);
}

/// Non-success response, carrying the operator facing message alongside
/// the backend detail.
#[derive(Debug, Clone, thiserror::Error)]
#[error("API request failed with status {status}: {detail}")]
pub struct ApiError {
    pub status: u16,
    pub detail: String,
    pub actionable_message: String,
}

impl ApiError {
    pub fn new(status: u16, detail: String) -> Self {
        let actionable_message = to_actionable_message(status, &detail);
        Self {
            status,
            detail,
            actionable_message,
        }
    }
}

pub fn to_actionable_message(status: u16, detail: &str) -> String {
    if status >= 500 {
        return "Server-side failure. Verify /healthz and retry once the backend is healthy."
            .to_string();
    }
    if status == 404 {
        return "Requested resource was not found. Refresh data or check selected filters."
            .to_string();
    }
    if status == 422 {
        return "Invalid input. Adjust required fields and submit again.".to_string();
    }
    format!("Request failed: {detail}")
}

/// Message shown to the operator for any command failure.
pub fn to_user_message(err: &anyhow::Error) -> String {
    if let Some(api_error) = err
        .chain()
        .find_map(|cause| cause.downcast_ref::<ApiError>())
    {
        return api_error.actionable_message.clone();
    }

    let message = err.to_string();
    if message.trim().is_empty() {
        UNEXPECTED_ERROR_MESSAGE.to_string()
    } else {
        message
    }
}

/// `detail` from an error body, or `"<code> <reason>"` when the body has none.
fn error_detail(status: reqwest::StatusCode, body: &str) -> String {
    let from_body = serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|payload| payload.get("detail").cloned())
        .filter(is_truthy)
        .map(|detail| match detail {
            Value::String(text) => text,
            other => other.to_string(),
        });

    from_body.unwrap_or_else(|| {
        format!(
            "{} {}",
            status.as_u16(),
            status.canonical_reason().unwrap_or_default()
        )
        .trim_end()
        .to_string()
    })
}

fn sync_jobs_query(limit: usize, status: Option<&str>) -> Vec<(&'static str, String)> {
    let mut query = vec![("limit", limit.to_string())];
    if let Some(status) = status.filter(|status| !status.is_empty()) {
        query.push(("status", status.to_string()));
    }
    query
}

fn metrics_summary_query(
    project_ids: &[i64],
    from_date: Option<&str>,
    to_date: Option<&str>,
) -> Vec<(&'static str, String)> {
    let mut query = project_ids
        .iter()
        .map(|project_id| ("project_ids", project_id.to_string()))
        .collect::<Vec<_>>();
    if let Some(from_date) = from_date.filter(|value| !value.is_empty()) {
        query.push(("from_date", from_date.to_string()));
    }
    if let Some(to_date) = to_date.filter(|value| !value.is_empty()) {
        query.push(("to_date", to_date.to_string()));
    }
    query
}

pub struct ApiClient {
    base_url: String,
    http: Client,
}

impl ApiClient {
    pub fn new(connection: &ConnectionArgs) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_millis(connection.timeout_ms))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            base_url: connection.api_base_url.trim_end_matches('/').to_string(),
            http,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn get<T: DeserializeOwned>(&self, path: &str, query: &[(&str, String)]) -> Result<T> {
        let url = self.url(path);
        self.send(self.http.get(&url).query(query), &url)
    }

    fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let url = self.url(path);
        self.send(self.http.post(&url).json(body), &url)
    }

    fn send<T: DeserializeOwned>(&self, request: RequestBuilder, url: &str) -> Result<T> {
        debug!(url, "api request");
        let response = request
            .send()
            .with_context(|| format!("request to {url} failed"))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().unwrap_or_default();
            return Err(ApiError::new(status.as_u16(), error_detail(status, &body)).into());
        }

        response
            .json::<T>()
            .with_context(|| format!("failed to decode response from {url}"))
    }

    pub fn get_health(&self) -> Result<HealthResponse> {
        self.get("/healthz", &[])
    }

    pub fn run_ask(&self, payload: &AskRequest) -> Result<AskResponse> {
        self.post("/v1/ask", payload)
    }

    pub fn trigger_sync(&self, payload: &SyncRequest) -> Result<SyncResponse> {
        self.post("/v1/sync/redmine", payload)
    }

    pub fn list_sync_jobs(&self, limit: usize, status: Option<&str>) -> Result<SyncJobList> {
        self.get("/v1/sync/jobs", &sync_jobs_query(limit, status))
    }

    pub fn get_sync_job(&self, job_id: &str) -> Result<SyncJob> {
        self.get(&format!("/v1/sync/jobs/{job_id}"), &[])
    }

    pub fn run_extraction(&self, payload: &ExtractRequest) -> Result<ExtractResponse> {
        self.post("/v1/extract/properties", payload)
    }

    pub fn get_metrics_summary(
        &self,
        project_ids: &[i64],
        from_date: Option<&str>,
        to_date: Option<&str>,
    ) -> Result<MetricsSummary> {
        self.get(
            "/v1/metrics/summary",
            &metrics_summary_query(project_ids, from_date, to_date),
        )
    }

    pub fn get_eval_artifacts(&self) -> Result<EvalArtifacts> {
        self.get("/v1/evals/latest", &[])
    }

    pub fn get_ops_environment(&self) -> Result<OpsEnvironment> {
        self.get("/v1/ops/environment", &[])
    }

    pub fn list_ops_runs(&self, limit: usize) -> Result<OpsRunList> {
        self.get("/v1/ops/runs", &[("limit", limit.to_string())])
    }

    pub fn run_ops_backup(&self, payload: &OpsBackupRequest) -> Result<OpsActionResponse> {
        self.post("/v1/ops/backup", payload)
    }

    pub fn run_ops_maintenance(&self) -> Result<OpsActionResponse> {
        self.post("/v1/ops/maintenance", &serde_json::json!({}))
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Context;
    use reqwest::StatusCode;

    use std::time::Duration;

    use super::{
        ApiClient, ApiError, error_detail, metrics_summary_query, poll, sync_jobs_query,
        to_actionable_message, to_user_message,
    };
    use crate::cli::ConnectionArgs;

    #[test]
    fn actionable_message_depends_on_status_class() {
        assert!(to_actionable_message(503, "down").starts_with("Server-side failure."));
        assert!(to_actionable_message(500, "boom").contains("/healthz"));
        assert!(to_actionable_message(404, "missing").starts_with("Requested resource"));
        assert!(to_actionable_message(422, "bad").starts_with("Invalid input."));
        assert_eq!(
            to_actionable_message(409, "Sync already running"),
            "Request failed: Sync already running"
        );
    }

    #[test]
    fn error_detail_prefers_body_detail() {
        assert_eq!(
            error_detail(StatusCode::CONFLICT, r#"{"detail": "Job locked"}"#),
            "Job locked"
        );
        assert_eq!(
            error_detail(StatusCode::NOT_FOUND, r#"{"detail": ""}"#),
            "404 Not Found"
        );
        assert_eq!(
            error_detail(StatusCode::BAD_GATEWAY, "<html>gateway</html>"),
            "502 Bad Gateway"
        );
        assert!(
            error_detail(
                StatusCode::UNPROCESSABLE_ENTITY,
                r#"{"detail": [{"loc": ["body", "query"]}]}"#
            )
            .contains("\"loc\"")
        );
    }

    #[test]
    fn user_message_uses_api_error_through_context() {
        let err = Err::<(), _>(ApiError::new(404, "Sync job not found".to_string()))
            .context("failed to load sync job")
            .expect_err("error");
        assert!(to_user_message(&err).starts_with("Requested resource was not found."));

        let plain = anyhow::anyhow!("state db locked");
        assert_eq!(to_user_message(&plain), "state db locked");
    }

    #[test]
    fn query_builders_skip_empty_values() {
        assert_eq!(sync_jobs_query(20, None), vec![("limit", "20".to_string())]);
        assert_eq!(sync_jobs_query(5, Some("")), vec![("limit", "5".to_string())]);
        assert_eq!(
            sync_jobs_query(5, Some("failed")),
            vec![("limit", "5".to_string()), ("status", "failed".to_string())]
        );

        assert_eq!(
            metrics_summary_query(&[1, 2], Some("2026-01-01T00:00:00Z"), Some("")),
            vec![
                ("project_ids", "1".to_string()),
                ("project_ids", "2".to_string()),
                ("from_date", "2026-01-01T00:00:00Z".to_string()),
            ]
        );
        assert!(metrics_summary_query(&[], None, None).is_empty());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let connection = ConnectionArgs {
            api_base_url: "http://localhost:8000/".to_string(),
            timeout_ms: 1_000,
            state_db: ".cache/test.sqlite".into(),
        };
        let client = ApiClient::new(&connection).expect("client");
        assert_eq!(client.url("/healthz"), "http://localhost:8000/healthz");
    }

    #[test]
    fn poll_intervals_per_view() {
        assert_eq!(poll::HEALTH, Duration::from_secs(30));
        assert_eq!(poll::SYNC_JOBS, Duration::from_secs(5));
        assert_eq!(poll::SYNC_JOB_DETAIL, Duration::from_secs(3));
        assert_eq!(poll::METRICS, Duration::from_secs(60));
        assert_eq!(poll::EVALS, Duration::from_secs(90));
        assert_eq!(poll::OPS_ENVIRONMENT, Duration::from_secs(120));
        assert_eq!(poll::OPS_RUNS, Duration::from_secs(5));
    }
}
