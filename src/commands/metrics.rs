use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::cli::{
    ConnectionArgs, ExtractArgs, MetricsArgs, MetricsCommand, MetricsExportArgs,
    MetricsSummaryArgs, MetricsWindowArgs, ViewArgs,
};
use crate::client::{ApiClient, poll};
use crate::format::{
    format_duration_seconds, format_percent, metric_label, round_tenths, status_badge,
};
use crate::metrics::{
    MetricsExportInput, build_metrics_export_payload, parse_extraction_counters,
    parse_extraction_issue_ids,
};
use crate::model::{EvalArtifacts, EvalMetricsSnapshot, ExtractRequest, MetricsSummary};
use crate::util::{day_end, day_start, parse_csv_ids, write_json_pretty};

use super::{refresh_every, write_json};

pub fn run(connection: &ConnectionArgs, args: MetricsArgs) -> Result<()> {
    let client = ApiClient::new(connection)?;

    match args.command {
        MetricsCommand::Summary(args) => summary(&client, args),
        MetricsCommand::Evals(args) => evals(&client, args),
        MetricsCommand::Extract(args) => extract(&client, args),
        MetricsCommand::Export(args) => export(&client, args),
    }
}

struct Window {
    project_ids: Vec<i64>,
    from_date: Option<String>,
    to_date: Option<String>,
}

impl Window {
    fn from_args(args: &MetricsWindowArgs) -> Self {
        Self {
            project_ids: parse_csv_ids(&args.project_ids),
            from_date: args.from_date.as_deref().and_then(day_start),
            to_date: args.to_date.as_deref().and_then(day_end),
        }
    }
}

fn summary(client: &ApiClient, args: MetricsSummaryArgs) -> Result<()> {
    let window = Window::from_args(&args.window);
    refresh_every(poll::METRICS, args.watch, || {
        let summary = client
            .get_metrics_summary(
                &window.project_ids,
                window.from_date.as_deref(),
                window.to_date.as_deref(),
            )
            .context("failed to load metrics summary")?;
        info!(
            issues = summary.issues_total,
            projects = summary.by_project.len(),
            extractor = %summary.extractor_version,
            "metrics summary loaded"
        );

        if args.window.json {
            return write_json(&summary);
        }
        write_summary(&summary)
    })
}

fn write_summary(summary: &MetricsSummary) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Generated: {} (extractor {})",
        summary.generated_at, summary.extractor_version
    )?;
    writeln!(
        output,
        "Window: {} .. {}",
        summary.from_date.as_deref().unwrap_or("-"),
        summary.to_date.as_deref().unwrap_or("-")
    )?;
    writeln!(output, "Issues: {}", summary.issues_total)?;
    writeln!(
        output,
        "First response: {} issues, avg {}",
        summary.issues_with_first_response,
        format_duration_seconds(summary.avg_first_response_s)
    )?;
    writeln!(
        output,
        "Resolution: {} issues, avg {}",
        summary.issues_with_resolution,
        format_duration_seconds(summary.avg_resolution_s)
    )?;
    writeln!(
        output,
        "Reopens={} touches={} handoffs={}",
        summary.reopen_total, summary.touch_total, summary.handoff_total
    )?;

    if !summary.by_project.is_empty() {
        writeln!(output, "By project:")?;
        for project in &summary.by_project {
            writeln!(
                output,
                "  #{}\tissues={}\tfirst_response={}\tresolution={}\treopens={}\ttouches={}\thandoffs={}",
                project.project_id,
                project.issues_total,
                format_duration_seconds(project.avg_first_response_s),
                format_duration_seconds(project.avg_resolution_s),
                project.reopen_total,
                project.touch_total,
                project.handoff_total,
            )?;
        }
    }

    output.flush()?;
    Ok(())
}

fn evals(client: &ApiClient, args: ViewArgs) -> Result<()> {
    refresh_every(poll::EVALS, args.watch, || {
        let artifacts = client
            .get_eval_artifacts()
            .context("failed to load eval artifacts")?;
        info!(
            status = %artifacts.status,
            comparisons = artifacts.comparisons.len(),
            failures = artifacts.failures.len(),
            "eval artifacts loaded"
        );

        if args.json {
            return write_json(&artifacts);
        }
        write_evals(&artifacts)
    })
}

fn write_snapshot(
    output: &mut impl Write,
    title: &str,
    snapshot: Option<&EvalMetricsSnapshot>,
) -> Result<()> {
    let Some(snapshot) = snapshot else {
        writeln!(output, "{title}: missing")?;
        return Ok(());
    };

    writeln!(
        output,
        "{title}: queries={} citation_coverage={} groundedness={} retrieval_hit_rate={}",
        snapshot.query_count,
        format_percent(snapshot.citation_coverage),
        format_percent(snapshot.groundedness),
        format_percent(snapshot.retrieval_hit_rate),
    )?;
    if !snapshot.source_type_coverage.is_empty() {
        let coverage = snapshot
            .source_type_coverage
            .iter()
            .map(|(source_type, count)| format!("{source_type}={count}"))
            .collect::<Vec<String>>()
            .join(" ");
        writeln!(output, "  source types: {coverage}")?;
    }
    Ok(())
}

fn write_evals(artifacts: &EvalArtifacts) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "Eval gate {} generated {}",
        status_badge(&artifacts.status),
        artifacts.generated_at
    )?;
    write_snapshot(&mut output, "Current", artifacts.current_metrics.as_ref())?;
    write_snapshot(&mut output, "Baseline", artifacts.baseline_metrics.as_ref())?;

    if !artifacts.comparisons.is_empty() {
        writeln!(output, "Comparisons:")?;
        for row in &artifacts.comparisons {
            writeln!(
                output,
                "  {}\t{}\tbaseline={}\tcurrent={}\tdelta={:+.1}pp\tallowed_drop={}",
                if row.passed { "PASS" } else { "FAIL" },
                metric_label(&row.metric),
                format_percent(row.baseline),
                format_percent(row.current),
                round_tenths(row.delta * 100.0),
                format_percent(row.allowed_drop),
            )?;
        }
    }

    for (title, lines) in [
        ("Failures", &artifacts.failures),
        ("LLM runtime failures", &artifacts.llm_runtime_failures),
        ("Notes", &artifacts.notes),
    ] {
        if lines.is_empty() {
            continue;
        }
        writeln!(output, "{title}:")?;
        for line in lines {
            writeln!(output, "  - {line}")?;
        }
    }

    output.flush()?;
    Ok(())
}

fn extract(client: &ApiClient, args: ExtractArgs) -> Result<()> {
    let request = ExtractRequest {
        issue_ids: parse_extraction_issue_ids(&args.issue_ids),
    };
    info!(
        issues = %request
            .issue_ids
            .as_ref()
            .map(|ids| ids.len().to_string())
            .unwrap_or_else(|| "all".to_string()),
        "running property extraction"
    );

    let response = client
        .run_extraction(&request)
        .context("failed to run property extraction")?;

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(
        output,
        "Accepted: {} processed_issues={}",
        response.accepted, response.processed_issues
    )?;
    writeln!(output, "Detail: {}", response.detail)?;
    match parse_extraction_counters(&response.detail) {
        Some(counters) => writeln!(
            output,
            "LLM: ok={} failed={} skipped={} retries={}",
            counters.success, counters.failed, counters.skipped, counters.retries
        )?,
        None => writeln!(output, "LLM: no counters reported")?,
    }
    output.flush()?;
    Ok(())
}

fn export(client: &ApiClient, args: MetricsExportArgs) -> Result<()> {
    let window = Window::from_args(&args.window);
    let artifacts = client
        .get_eval_artifacts()
        .context("failed to load eval artifacts for export")?;
    if artifacts.current_metrics.is_none() {
        warn!(status = %artifacts.status, "no current eval metrics to export");
    }

    let payload = build_metrics_export_payload(&MetricsExportInput {
        generated_at: &artifacts.generated_at,
        project_ids: &window.project_ids,
        from_date: window.from_date.as_deref(),
        to_date: window.to_date.as_deref(),
        metrics: artifacts.current_metrics.as_ref(),
        comparisons: &artifacts.comparisons,
    });

    write_json_pretty(&args.output, &payload)?;
    info!(
        path = %args.output.display(),
        comparisons = artifacts.comparisons.len(),
        "metrics export written"
    );
    Ok(())
}
