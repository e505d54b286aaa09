use serde::Serialize;
use serde_json::{Map, Value};

use crate::util::is_truthy;

use super::{coerce_count, coerce_number, stringify};

const ENTITY_KEYS: [(&str, &str); 10] = [
    ("projects_synced", "Projects"),
    ("users_synced", "Users"),
    ("groups_synced", "Groups"),
    ("issues_synced", "Issues"),
    ("journals_synced", "Journals"),
    ("attachments_synced", "Attachments"),
    ("news_synced", "News"),
    ("documents_synced", "Documents"),
    ("files_synced", "Files"),
    ("wiki_pages_synced", "Wiki pages"),
];

const INDEX_KEYS: [(&str, &str); 5] = [
    ("chunk_sources_reindexed", "Sources reindexed"),
    ("chunks_updated", "Chunks updated"),
    ("embeddings_processed", "Embeddings processed"),
    ("vectors_upserted", "Vectors upserted"),
    ("vectors_removed", "Vectors removed"),
];

const UNKNOWN: &str = "unknown";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CountRow {
    pub label: &'static str,
    pub value: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SkippedModule {
    pub module: String,
    pub reason: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_code: Option<i64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncSummary {
    pub modules_enabled: Vec<String>,
    pub modules_skipped: Vec<SkippedModule>,
    pub entities: Vec<CountRow>,
    pub indexing: Vec<CountRow>,
}

/// `None` when the payload has no summary; a summary with missing counters
/// yields rows with value 0.
pub fn extract_sync_summary(payload: &Map<String, Value>) -> Option<SyncSummary> {
    let summary = payload.get("summary")?.as_object()?;

    let modules_enabled = summary
        .get("modules_enabled")
        .and_then(Value::as_array)
        .map(|items| items.iter().map(stringify).collect())
        .unwrap_or_default();

    let modules_skipped = summary
        .get("modules_skipped")
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_object)
                .map(skipped_module)
                .collect()
        })
        .unwrap_or_default();

    Some(SyncSummary {
        modules_enabled,
        modules_skipped,
        entities: count_rows(summary, &ENTITY_KEYS),
        indexing: count_rows(summary, &INDEX_KEYS),
    })
}

fn count_rows(summary: &Map<String, Value>, keys: &[(&str, &'static str)]) -> Vec<CountRow> {
    keys.iter()
        .map(|&(key, label)| CountRow {
            label,
            value: summary.get(key).map(coerce_count).unwrap_or(0),
        })
        .collect()
}

fn skipped_module(record: &Map<String, Value>) -> SkippedModule {
    SkippedModule {
        module: text_or_unknown(record.get("module")),
        reason: text_or_unknown(record.get("reason")),
        status_code: record
            .get("status_code")
            .filter(|value| is_truthy(value))
            .and_then(coerce_number),
    }
}

fn text_or_unknown(value: Option<&Value>) -> String {
    match value {
        None | Some(Value::Null) => UNKNOWN.to_string(),
        Some(value) => stringify(value),
    }
}
