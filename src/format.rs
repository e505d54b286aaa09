use chrono::{DateTime, NaiveDateTime, Utc};

const MISSING: &str = "-";

pub fn format_duration_seconds(seconds: Option<f64>) -> String {
    let Some(seconds) = seconds.filter(|value| value.is_finite()) else {
        return MISSING.to_string();
    };

    if seconds < 60.0 {
        return format!("{}s", seconds.round());
    }
    let minutes = seconds / 60.0;
    if minutes < 60.0 {
        return format!("{:.1}m", round_tenths(minutes));
    }
    format!("{:.1}h", round_tenths(minutes / 60.0))
}

/// Halves round away from zero; `{:.1}` alone rounds them to even.
pub fn round_tenths(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

pub fn format_percent(value: f64) -> String {
    if !value.is_finite() {
        return "0%".to_string();
    }
    format!("{:.1}%", round_tenths(value * 100.0))
}

/// Wall-clock duration between two backend timestamps, in whole seconds.
pub fn format_duration(started_at: Option<&str>, finished_at: Option<&str>) -> String {
    let (Some(start), Some(end)) = (
        started_at.and_then(parse_timestamp),
        finished_at.and_then(parse_timestamp),
    ) else {
        return MISSING.to_string();
    };

    if end < start {
        return MISSING.to_string();
    }

    let elapsed_ms = (end - start).num_milliseconds() as f64;
    format!("{}s", (elapsed_ms / 1000.0).round() as i64)
}

/// RFC 3339, or a naive `YYYY-MM-DDTHH:MM:SS[.fff]` read as UTC.
pub fn parse_timestamp(raw: &str) -> Option<DateTime<Utc>> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }

    if let Ok(parsed) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(parsed.with_timezone(&Utc));
    }

    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .ok()
        .map(|naive| naive.and_utc())
}

pub fn metric_label(metric: &str) -> &str {
    match metric {
        "citation_coverage" => "Citation coverage",
        "groundedness" => "Groundedness",
        "retrieval_hit_rate" => "Retrieval hit rate",
        other => other,
    }
}

/// Badge tone for a job or check status.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StatusTone {
    Neutral,
    Warning,
    Success,
    Danger,
}

pub fn status_tone(status: &str) -> StatusTone {
    match status.trim().to_lowercase().as_str() {
        "running" | "warn" => StatusTone::Warning,
        "finished" | "ok" | "success" | "pass" => StatusTone::Success,
        "failed" | "fail" => StatusTone::Danger,
        _ => StatusTone::Neutral,
    }
}

/// Status rendered as an uppercase badge, e.g. `[FAILED]`.
pub fn status_badge(status: &str) -> String {
    let marker = match status_tone(status) {
        StatusTone::Neutral => ' ',
        StatusTone::Warning => '~',
        StatusTone::Success => '+',
        StatusTone::Danger => '!',
    };
    format!("[{}{}]", marker, status.trim().to_uppercase())
}

pub fn short_job_id(id: &str) -> String {
    id.chars().take(12).collect()
}
