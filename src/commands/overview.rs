use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{ConnectionArgs, OverviewArgs};
use crate::client::{ApiClient, poll};
use crate::format::status_badge;
use crate::model::HealthResponse;
use crate::ops::{check_detail, format_latency};

use super::{refresh_every, write_json};

pub fn run(connection: &ConnectionArgs, args: OverviewArgs) -> Result<()> {
    let client = ApiClient::new(connection)?;

    refresh_every(poll::HEALTH, args.watch, || {
        let health = client.get_health().context("failed to load runtime health")?;
        info!(
            status = %health.status,
            checks = health.checks.len(),
            queued = health.sync_jobs.queued,
            running = health.sync_jobs.running,
            "health loaded"
        );

        if args.json {
            write_json(&health)
        } else {
            write_overview(&health)
        }
    })
}

fn write_overview(health: &HealthResponse) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(
        output,
        "{} {} {}",
        status_badge(&health.status),
        health.app,
        health.version
    )?;
    writeln!(output, "Server time: {}", health.utc_time)?;
    writeln!(
        output,
        "Sync jobs: queued={} running={} finished={} failed={}",
        health.sync_jobs.queued,
        health.sync_jobs.running,
        health.sync_jobs.finished,
        health.sync_jobs.failed,
    )?;

    writeln!(output, "Checks: {}", health.checks.len())?;
    for check in &health.checks {
        writeln!(
            output,
            "  {}\t{}\t{}\t{}",
            status_badge(&check.status),
            check.name,
            format_latency(check.latency_ms),
            check_detail(check)
        )?;
    }

    output.flush()?;
    Ok(())
}
