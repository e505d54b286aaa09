use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use serde::Serialize;
use tracing::{info, warn};

use crate::cli::{
    ConnectionArgs, SyncArgs, SyncCommand, SyncJobArgs, SyncJobsArgs, SyncTriggerArgs,
    SyncWatchArgs,
};
use crate::client::{ApiClient, poll};
use crate::format::{format_duration, short_job_id, status_badge};
use crate::model::{SYNC_MODULES, SyncJob, SyncJobList, SyncRequest};
use crate::store::ViewStateStore;
use crate::sync::{
    STATUS_FAILED, STATUS_FINISHED, STATUS_QUEUED, STATUS_RUNNING, SyncSummary,
    build_retry_payload, extract_modules_from_payload, extract_project_ids_from_payload,
    extract_sync_summary, failure_recommendations, is_terminal_status, parse_project_scope,
};
use crate::view_state::{SYNC_PAGE, SyncPageState};

use super::{open_store, or_dash, refresh_every, write_json};

const STATUS_FILTERS: [&str; 5] = [
    "all",
    STATUS_QUEUED,
    STATUS_RUNNING,
    STATUS_FINISHED,
    STATUS_FAILED,
];

pub fn run(connection: &ConnectionArgs, args: SyncArgs) -> Result<()> {
    let client = ApiClient::new(connection)?;
    let store = open_store(connection)?;
    let mut state = SYNC_PAGE.load(&store);

    match args.command {
        SyncCommand::Trigger(args) => trigger(&client, &store, &mut state, args),
        SyncCommand::Jobs(args) => jobs(&client, &store, &mut state, args),
        SyncCommand::Show(args) => show(&client, &store, &mut state, args),
        SyncCommand::Retry(args) => retry(&client, &store, &mut state, args),
        SyncCommand::Watch(args) => watch(&client, &store, &mut state, args),
    }
}

fn trigger(
    client: &ApiClient,
    store: &ViewStateStore,
    state: &mut SyncPageState,
    args: SyncTriggerArgs,
) -> Result<()> {
    if let Some(project_scope) = args.project_scope {
        state.project_scope = project_scope;
    }
    if !args.modules.is_empty() {
        for module in &args.modules {
            if !SYNC_MODULES.contains(&module.as_str()) {
                bail!(
                    "unknown sync module '{module}'; expected one of: {}",
                    SYNC_MODULES.join(", ")
                );
            }
        }
        state.selected_modules = args.modules;
    }

    let project_ids = parse_project_scope(&state.project_scope);
    let request = SyncRequest {
        project_ids: (!project_ids.is_empty()).then_some(project_ids),
        modules: (!state.selected_modules.is_empty()).then(|| state.selected_modules.clone()),
    };

    submit(client, store, state, &request, args.json)
}

fn retry(
    client: &ApiClient,
    store: &ViewStateStore,
    state: &mut SyncPageState,
    args: SyncJobArgs,
) -> Result<()> {
    let job_id = resolve_job_id(state, args.job_id)?;
    let job = client
        .get_sync_job(&job_id)
        .with_context(|| format!("failed to load sync job {job_id}"))?;
    if job.status != STATUS_FAILED {
        warn!(job_id = %job.id, status = %job.status, "retrying a job that did not fail");
    }

    let request = build_retry_payload(&job);
    info!(job_id = %job.id, "retrying sync job with its original scope");
    submit(client, store, state, &request, args.json)
}

fn submit(
    client: &ApiClient,
    store: &ViewStateStore,
    state: &mut SyncPageState,
    request: &SyncRequest,
    json: bool,
) -> Result<()> {
    let response = client
        .trigger_sync(request)
        .context("failed to queue sync job")?;
    info!(
        job_id = %response.job_id,
        accepted = response.accepted,
        detail = %response.detail,
        "sync job queued"
    );

    state.selected_job_id = Some(response.job_id.clone());
    SYNC_PAGE.save(store, state)?;

    if json {
        return write_json(&response);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Queued sync job {}", response.job_id)?;
    writeln!(output, "Accepted: {}", response.accepted)?;
    writeln!(output, "Detail: {}", response.detail)?;
    output.flush()?;
    Ok(())
}

fn jobs(
    client: &ApiClient,
    store: &ViewStateStore,
    state: &mut SyncPageState,
    args: SyncJobsArgs,
) -> Result<()> {
    if let Some(status) = args.status {
        let status = status.trim().to_lowercase();
        if !STATUS_FILTERS.contains(&status.as_str()) {
            bail!(
                "unknown status filter '{status}'; expected one of: {}",
                STATUS_FILTERS.join(", ")
            );
        }
        state.status_filter = status;
    }

    refresh_every(poll::SYNC_JOBS, args.watch, || {
        let status = Some(state.status_filter.as_str()).filter(|status| *status != "all");
        let list = client
            .list_sync_jobs(args.limit, status)
            .context("failed to list sync jobs")?;
        info!(
            returned = list.items.len(),
            total = list.total,
            status_filter = %state.status_filter,
            "sync jobs loaded"
        );

        state.reconcile_selected_job(list.items.iter().map(|job| job.id.as_str()));
        SYNC_PAGE.save(store, state)?;

        if args.json {
            write_json(&list)
        } else {
            write_job_list(&list, state)
        }
    })
}

fn show(
    client: &ApiClient,
    store: &ViewStateStore,
    state: &mut SyncPageState,
    args: SyncJobArgs,
) -> Result<()> {
    let job_id = resolve_job_id(state, args.job_id)?;
    let job = client
        .get_sync_job(&job_id)
        .with_context(|| format!("failed to load sync job {job_id}"))?;

    state.selected_job_id = Some(job.id.clone());
    SYNC_PAGE.save(store, state)?;

    if args.json {
        return write_json(&JobDetail::new(&job));
    }
    write_job_detail(&job)
}

fn watch(
    client: &ApiClient,
    store: &ViewStateStore,
    state: &mut SyncPageState,
    args: SyncWatchArgs,
) -> Result<()> {
    let job_id = resolve_job_id(state, args.job_id)?;
    let interval = args
        .interval_ms
        .map(Duration::from_millis)
        .unwrap_or(poll::SYNC_JOB_DETAIL);

    state.selected_job_id = Some(job_id.clone());
    SYNC_PAGE.save(store, state)?;

    let mut last_status: Option<String> = None;
    for poll_index in 0..args.max_polls.max(1) {
        if poll_index > 0 {
            thread::sleep(interval);
        }

        let job = client
            .get_sync_job(&job_id)
            .with_context(|| format!("failed to poll sync job {job_id}"))?;
        if last_status.as_deref() != Some(job.status.as_str()) {
            info!(job_id = %job.id, status = %job.status, polls = poll_index + 1, "sync job status");
            last_status = Some(job.status.clone());
        }

        if is_terminal_status(&job.status) {
            return write_job_detail(&job);
        }
    }

    warn!(
        job_id = %job_id,
        status = %last_status.unwrap_or_default(),
        max_polls = args.max_polls,
        "sync job still in progress after polling limit"
    );
    Ok(())
}

fn resolve_job_id(state: &SyncPageState, explicit: Option<String>) -> Result<String> {
    match explicit.or_else(|| state.selected_job_id.clone()) {
        Some(job_id) => Ok(job_id),
        None => bail!("no sync job selected; pass a job id or run `sync jobs` first"),
    }
}

#[derive(Debug, Serialize)]
struct JobDetail<'a> {
    job: &'a SyncJob,
    summary: Option<SyncSummary>,
    recommendations: Vec<String>,
}

impl<'a> JobDetail<'a> {
    fn new(job: &'a SyncJob) -> Self {
        Self {
            job,
            summary: extract_sync_summary(&job.payload),
            recommendations: failure_recommendations(job),
        }
    }
}

fn projects_label(job: &SyncJob) -> String {
    let projects = extract_project_ids_from_payload(&job.payload);
    if projects.is_empty() {
        "default".to_string()
    } else {
        projects.join(", ")
    }
}

fn modules_label(job: &SyncJob) -> String {
    let modules = extract_modules_from_payload(&job.payload);
    if modules.is_empty() {
        "configured defaults".to_string()
    } else {
        modules.join(", ")
    }
}

fn write_job_list(list: &SyncJobList, state: &SyncPageState) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Jobs: {} of {} (queued={} running={} finished={} failed={}) filter={}",
        list.items.len(),
        list.total,
        list.counts.queued,
        list.counts.running,
        list.counts.finished,
        list.counts.failed,
        state.status_filter,
    )?;

    for job in &list.items {
        let marker = if state.selected_job_id.as_deref() == Some(job.id.as_str()) {
            '*'
        } else {
            ' '
        };
        writeln!(
            output,
            "{marker} {}\t{}\t{}\t{}\t{}\t{}",
            short_job_id(&job.id),
            status_badge(&job.status),
            projects_label(job),
            modules_label(job),
            format_duration(job.started_at.as_deref(), job.finished_at.as_deref()),
            job.updated_at,
        )?;
    }

    output.flush()?;
    Ok(())
}

fn write_job_detail(job: &SyncJob) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "Job {} {}", job.id, status_badge(&job.status))?;
    writeln!(output, "Created: {}", job.created_at)?;
    writeln!(output, "Started: {}", or_dash(job.started_at.as_deref()))?;
    writeln!(output, "Finished: {}", or_dash(job.finished_at.as_deref()))?;
    writeln!(
        output,
        "Duration: {}",
        format_duration(job.started_at.as_deref(), job.finished_at.as_deref())
    )?;
    writeln!(output, "Projects: {}", projects_label(job))?;
    writeln!(output, "Modules: {}", modules_label(job))?;
    if let Some(error_message) = job.error_message.as_deref() {
        writeln!(output, "Error: {error_message}")?;
    }

    match extract_sync_summary(&job.payload) {
        Some(summary) => {
            writeln!(
                output,
                "Modules enabled: {}",
                if summary.modules_enabled.is_empty() {
                    "-".to_string()
                } else {
                    summary.modules_enabled.join(", ")
                }
            )?;
            for skipped in &summary.modules_skipped {
                let status_code = skipped
                    .status_code
                    .map(|code| format!(" (HTTP {code})"))
                    .unwrap_or_default();
                writeln!(
                    output,
                    "Skipped: {}: {}{}",
                    skipped.module, skipped.reason, status_code
                )?;
            }
            writeln!(output, "Entities:")?;
            for row in &summary.entities {
                writeln!(output, "  {}\t{}", row.label, row.value)?;
            }
            writeln!(output, "Indexing:")?;
            for row in &summary.indexing {
                writeln!(output, "  {}\t{}", row.label, row.value)?;
            }
        }
        None => writeln!(output, "Summary: not available yet")?,
    }

    let recommendations = failure_recommendations(job);
    if !recommendations.is_empty() {
        writeln!(output, "Recommended actions:")?;
        for recommendation in recommendations {
            writeln!(output, "  - {recommendation}")?;
        }
    }

    output.flush()?;
    Ok(())
}
