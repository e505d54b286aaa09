use std::io::{self, Write};

use anyhow::{Context, Result};
use tracing::info;

use crate::cli::{
    ChecklistArgs, ConnectionArgs, OpsArgs, OpsBackupArgs, OpsCommand, OpsHealthArgs, OpsRunsArgs,
    ViewArgs,
};
use crate::client::{ApiClient, poll};
use crate::format::status_badge;
use crate::model::{HealthCheck, OpsActionResponse, OpsEnvironment, OpsRunRecord};
use crate::ops::{
    apply_checklist_changes, backup_request, check_detail, filter_health_checks, format_latency,
    run_badge_status,
};
use crate::view_state::{CHECKLIST_ITEMS, RELEASE_CHECKLIST};

use super::{open_store, refresh_every, write_json};

pub fn run(connection: &ConnectionArgs, args: OpsArgs) -> Result<()> {
    match args.command {
        OpsCommand::Health(args) => health(&ApiClient::new(connection)?, args),
        OpsCommand::Env(args) => environment(&ApiClient::new(connection)?, args),
        OpsCommand::Runs(args) => runs(&ApiClient::new(connection)?, args),
        OpsCommand::Backup(args) => backup(&ApiClient::new(connection)?, args),
        OpsCommand::Maintenance => maintenance(&ApiClient::new(connection)?),
        OpsCommand::Checklist(args) => checklist(connection, args),
    }
}

fn health(client: &ApiClient, args: OpsHealthArgs) -> Result<()> {
    let health = client.get_health().context("failed to load runtime health")?;
    let checks = filter_health_checks(&health.checks, args.status.as_str());
    info!(
        status = %health.status,
        filter = args.status.as_str(),
        shown = checks.len(),
        total = health.checks.len(),
        "health checks loaded"
    );

    if args.json {
        return write_json(&checks);
    }

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(
        output,
        "Runtime {} checks {}/{}",
        status_badge(&health.status),
        checks.len(),
        health.checks.len()
    )?;
    for check in checks {
        write_check(&mut output, check)?;
    }
    output.flush()?;
    Ok(())
}

fn write_check(output: &mut impl Write, check: &HealthCheck) -> Result<()> {
    writeln!(
        output,
        "  {}\t{}\t{}\t{}",
        check.name,
        status_badge(&check.status),
        format_latency(check.latency_ms),
        check_detail(check)
    )?;
    Ok(())
}

fn environment(client: &ApiClient, args: ViewArgs) -> Result<()> {
    refresh_every(poll::OPS_ENVIRONMENT, args.watch, || {
        let environment = client
            .get_ops_environment()
            .context("failed to load ops environment")?;
        info!(app_env = %environment.app_env, "ops environment loaded");

        if args.json {
            return write_json(&environment);
        }
        write_environment(&environment)
    })
}

fn write_environment(environment: &OpsEnvironment) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());

    writeln!(output, "App: {} {}", environment.app, environment.version)?;
    writeln!(output, "Environment: {}", environment.app_env)?;
    writeln!(output, "Redmine: {}", environment.redmine_base_url)?;
    writeln!(
        output,
        "Allowed hosts: {}",
        if environment.redmine_allowed_hosts.is_empty() {
            "-".to_string()
        } else {
            environment.redmine_allowed_hosts.join(", ")
        }
    )?;
    writeln!(
        output,
        "LLM: {} / {} (extraction {})",
        environment.llm_provider,
        environment.llm_model,
        if environment.llm_extract_enabled {
            "enabled"
        } else {
            "disabled"
        }
    )?;
    writeln!(output, "Generated: {}", environment.generated_at)?;

    output.flush()?;
    Ok(())
}

fn runs(client: &ApiClient, args: OpsRunsArgs) -> Result<()> {
    refresh_every(poll::OPS_RUNS, args.watch, || {
        let runs = client
            .list_ops_runs(args.limit)
            .context("failed to list ops runs")?;
        info!(returned = runs.items.len(), total = runs.total, "ops runs loaded");

        if args.json {
            return write_json(&runs);
        }

        let mut output = io::BufWriter::new(io::stdout().lock());
        writeln!(output, "Runs: {} of {}", runs.items.len(), runs.total)?;
        for run in &runs.items {
            write_run(&mut output, run)?;
        }
        output.flush()?;
        Ok(())
    })
}

fn write_run(output: &mut impl Write, run: &OpsRunRecord) -> Result<()> {
    writeln!(
        output,
        "  {}\t{}\t{}\t{}\t{}",
        run.action,
        status_badge(run_badge_status(&run.status)),
        run.started_at,
        run.finished_at,
        run.detail
    )?;
    Ok(())
}

fn backup(client: &ApiClient, args: OpsBackupArgs) -> Result<()> {
    let request = backup_request(&args.output_dir);
    let response = client
        .run_ops_backup(&request)
        .context("failed to run backup")?;
    report_action("Backup", &response)
}

fn maintenance(client: &ApiClient) -> Result<()> {
    let response = client
        .run_ops_maintenance()
        .context("failed to run maintenance")?;
    report_action("Maintenance", &response)
}

fn report_action(label: &str, response: &OpsActionResponse) -> Result<()> {
    info!(
        action = %response.run.action,
        run_id = %response.run.id,
        status = %response.run.status,
        accepted = response.accepted,
        "ops action completed"
    );

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(
        output,
        "{label} run {}: {}",
        response.run.status, response.run.detail
    )?;
    for (key, value) in &response.run.summary {
        writeln!(output, "  {key}: {value}")?;
    }
    output.flush()?;
    Ok(())
}

fn checklist(connection: &ConnectionArgs, args: ChecklistArgs) -> Result<()> {
    let store = open_store(connection)?;
    let current = RELEASE_CHECKLIST.load(&store);

    let changed = args.reset || !args.check.is_empty() || !args.uncheck.is_empty();
    let checklist = if changed {
        let updated = apply_checklist_changes(&current, &args.check, &args.uncheck, args.reset)?;
        RELEASE_CHECKLIST.save(&store, &updated)?;
        updated
    } else {
        current
    };

    let done = checklist.iter().filter(|done| **done).count();
    info!(done, total = CHECKLIST_ITEMS.len(), "release checklist");

    let mut output = io::BufWriter::new(io::stdout().lock());
    writeln!(output, "Completed {done}/{}", CHECKLIST_ITEMS.len())?;
    for (index, (label, item_done)) in CHECKLIST_ITEMS.iter().zip(&checklist).enumerate() {
        let mark = if *item_done { 'x' } else { ' ' };
        writeln!(output, "  [{mark}] {}. {label}", index + 1)?;
    }
    output.flush()?;
    Ok(())
}
