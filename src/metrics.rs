use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use serde_json::{Value, json};

use crate::model::{EvalComparisonRow, EvalMetricsSnapshot};
use crate::util::{now_utc_string, parse_csv_ids};

const EXTRACTION_COUNTERS_PATTERN: &str =
    r"(?i)LLM ok=([0-9]+),\s*failed=([0-9]+),\s*skipped=([0-9]+),\s*retries=([0-9]+)";

static EXTRACTION_COUNTERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(EXTRACTION_COUNTERS_PATTERN).expect("valid extraction counters regex")
});

/// LLM extraction outcome counters embedded in an extract response detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionCounters {
    pub success: u64,
    pub failed: u64,
    pub skipped: u64,
    pub retries: u64,
}

pub fn parse_extraction_counters(detail: &str) -> Option<ExtractionCounters> {
    let captures = EXTRACTION_COUNTERS.captures(detail)?;
    let counter = |group: usize| -> Option<u64> { captures.get(group)?.as_str().parse().ok() };

    Some(ExtractionCounters {
        success: counter(1)?,
        failed: counter(2)?,
        skipped: counter(3)?,
        retries: counter(4)?,
    })
}

/// `None` means "every issue", which is what the backend expects for an
/// empty selection.
pub fn parse_extraction_issue_ids(value: &str) -> Option<Vec<i64>> {
    let parsed = parse_csv_ids(value);
    (!parsed.is_empty()).then_some(parsed)
}

#[derive(Debug, Clone)]
pub struct MetricsExportInput<'a> {
    pub generated_at: &'a str,
    pub project_ids: &'a [i64],
    pub from_date: Option<&'a str>,
    pub to_date: Option<&'a str>,
    pub metrics: Option<&'a EvalMetricsSnapshot>,
    pub comparisons: &'a [EvalComparisonRow],
}

pub fn build_metrics_export_payload(input: &MetricsExportInput<'_>) -> Value {
    json!({
        "exported_at": now_utc_string(),
        "generated_at": input.generated_at,
        "filters": {
            "project_ids": input.project_ids,
            "from_date": input.from_date,
            "to_date": input.to_date,
        },
        "metrics": input.metrics,
        "comparisons": input.comparisons,
    })
}

#[cfg(test)]
mod tests {
    use super::{
        ExtractionCounters, MetricsExportInput, build_metrics_export_payload,
        parse_extraction_counters, parse_extraction_issue_ids,
    };
    use crate::model::{EvalComparisonRow, EvalMetricsSnapshot};

    #[test]
    fn extraction_counters_parse_from_detail_sentence() {
        assert_eq!(
            parse_extraction_counters("LLM ok=3, failed=1, skipped=0, retries=2."),
            Some(ExtractionCounters {
                success: 3,
                failed: 1,
                skipped: 0,
                retries: 2,
            })
        );
        assert_eq!(
            parse_extraction_counters(
                "Deterministic extraction completed. llm OK=11,failed=2,  skipped=1, retries=4."
            ),
            Some(ExtractionCounters {
                success: 11,
                failed: 2,
                skipped: 1,
                retries: 4,
            })
        );
    }

    #[test]
    fn extraction_counters_absent_is_none_not_zero() {
        assert_eq!(parse_extraction_counters("no llm detail present"), None);
        assert_eq!(
            parse_extraction_counters("LLM ok=3, failed=1, skipped=0"),
            None
        );
    }

    #[test]
    fn extraction_issue_ids_empty_means_all() {
        assert_eq!(parse_extraction_issue_ids(""), None);
        assert_eq!(parse_extraction_issue_ids("0, x"), None);
        assert_eq!(parse_extraction_issue_ids("10, -1, 12"), Some(vec![10, 12]));
    }

    #[test]
    fn export_payload_carries_filters_and_metrics() {
        let metrics = EvalMetricsSnapshot {
            query_count: 10,
            citation_coverage: 0.9,
            ..EvalMetricsSnapshot::default()
        };
        let comparisons = vec![EvalComparisonRow {
            metric: "groundedness".to_string(),
            passed: true,
            ..EvalComparisonRow::default()
        }];

        let payload = build_metrics_export_payload(&MetricsExportInput {
            generated_at: "2026-02-21T10:00:00Z",
            project_ids: &[1, 2],
            from_date: Some("2026-02-01T00:00:00Z"),
            to_date: None,
            metrics: Some(&metrics),
            comparisons: &comparisons,
        });

        assert_eq!(payload["generated_at"], "2026-02-21T10:00:00Z");
        assert_eq!(payload["filters"]["project_ids"], serde_json::json!([1, 2]));
        assert!(payload["filters"]["to_date"].is_null());
        assert_eq!(payload["metrics"]["query_count"], 10);
        assert_eq!(payload["comparisons"][0]["metric"], "groundedness");
        assert!(payload["exported_at"].is_string());
    }
}
