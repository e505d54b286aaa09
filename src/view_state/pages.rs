use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::model::SYNC_MODULES;
use crate::util::is_truthy;

use super::PersistedField;

pub const ASK_HISTORY_LIMIT: usize = 12;

pub const CHECKLIST_ITEMS: [&str; 6] = [
    "Backend /healthz is stable and reports no hard failures.",
    "Sync -> Extract -> Ask -> Metrics journey validated in UI.",
    "Ops backup action executed and snapshot manifest verified.",
    "Ops maintenance action completed without errors.",
    "Eval regression gate status reviewed and accepted.",
    "Frontend /app bundle build validated for release.",
];

pub static SYNC_PAGE: PersistedField<SyncPageState> = PersistedField::new(
    "redmine-rag.sync.control-center.v1",
    SyncPageState::default_state,
    decode_sync_page,
);

pub static ASK_HISTORY: PersistedField<Vec<AskHistoryItem>> = PersistedField::new(
    "redmine-rag.ask-history.v2",
    Vec::new,
    decode_ask_history,
);

pub static RELEASE_CHECKLIST: PersistedField<Vec<bool>> = PersistedField::new(
    "redmine-rag.ops.release-checklist.v1",
    unchecked_checklist,
    decode_checklist,
);

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncPageState {
    pub project_scope: String,
    pub status_filter: String,
    pub selected_modules: Vec<String>,
    pub selected_job_id: Option<String>,
}

impl SyncPageState {
    fn default_state() -> Self {
        Self {
            project_scope: "1".to_string(),
            status_filter: "all".to_string(),
            selected_modules: SYNC_MODULES.iter().map(|module| module.to_string()).collect(),
            selected_job_id: None,
        }
    }

    /// Keeps the selection pointing at a listed job: the first one when
    /// nothing is selected or the selected job is no longer listed.
    pub fn reconcile_selected_job<'a>(&mut self, listed_ids: impl IntoIterator<Item = &'a str>) {
        let listed = listed_ids.into_iter().collect::<Vec<&str>>();
        let Some(first) = listed.first() else {
            return;
        };

        let still_listed = self
            .selected_job_id
            .as_deref()
            .is_some_and(|selected| listed.contains(&selected));
        if !still_listed {
            self.selected_job_id = Some((*first).to_string());
        }
    }
}

impl Default for SyncPageState {
    fn default() -> Self {
        Self::default_state()
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
struct StoredSyncPageState {
    project_scope: Option<String>,
    status_filter: Option<String>,
    selected_modules: Option<Vec<String>>,
    selected_job_id: Option<String>,
}

fn decode_sync_page(raw: &str) -> Option<SyncPageState> {
    let stored = serde_json::from_str::<StoredSyncPageState>(raw).ok()?;
    let fallback = SyncPageState::default_state();

    Some(SyncPageState {
        project_scope: stored.project_scope.unwrap_or(fallback.project_scope),
        status_filter: stored.status_filter.unwrap_or(fallback.status_filter),
        selected_modules: stored
            .selected_modules
            .filter(|modules| !modules.is_empty())
            .unwrap_or(fallback.selected_modules),
        selected_job_id: stored.selected_job_id.or(fallback.selected_job_id),
    })
}

/// Form inputs of a submitted question, kept verbatim so a replay restores
/// exactly what the operator typed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AskHistoryItem {
    pub query: String,
    pub project_ids: String,
    pub tracker_ids: String,
    pub status_ids: String,
    pub top_k: String,
    pub from_date: String,
    pub to_date: String,
    pub at: String,
}

fn decode_ask_history(raw: &str) -> Option<Vec<AskHistoryItem>> {
    let mut history = serde_json::from_str::<Vec<AskHistoryItem>>(raw).ok()?;
    history.truncate(ASK_HISTORY_LIMIT);
    Some(history)
}

/// Newest first, capped at [`ASK_HISTORY_LIMIT`].
pub fn push_history(history: &[AskHistoryItem], item: AskHistoryItem) -> Vec<AskHistoryItem> {
    std::iter::once(item)
        .chain(history.iter().cloned())
        .take(ASK_HISTORY_LIMIT)
        .collect()
}

fn unchecked_checklist() -> Vec<bool> {
    vec![false; CHECKLIST_ITEMS.len()]
}

fn decode_checklist(raw: &str) -> Option<Vec<bool>> {
    let Value::Array(items) = serde_json::from_str::<Value>(raw).ok()? else {
        return None;
    };

    Some(
        (0..CHECKLIST_ITEMS.len())
            .map(|index| items.get(index).is_some_and(is_truthy))
            .collect(),
    )
}
