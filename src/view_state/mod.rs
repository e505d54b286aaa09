use anyhow::Result;
use serde::Serialize;
use tracing::warn;

use crate::store::ViewStateStore;

mod pages;

pub use pages::{
    ASK_HISTORY, ASK_HISTORY_LIMIT, AskHistoryItem, CHECKLIST_ITEMS, RELEASE_CHECKLIST, SYNC_PAGE,
    SyncPageState, push_history,
};

/// A named, JSON-encoded value under a fixed storage key. Loading never
/// fails; a missing or malformed value resets to the default.
pub struct PersistedField<T> {
    key: &'static str,
    default: fn() -> T,
    decode: fn(&str) -> Option<T>,
}

impl<T: Serialize> PersistedField<T> {
    /// `decode` returning `None` selects the default.
    pub const fn new(
        key: &'static str,
        default: fn() -> T,
        decode: fn(&str) -> Option<T>,
    ) -> Self {
        Self {
            key,
            default,
            decode,
        }
    }

    pub fn key(&self) -> &'static str {
        self.key
    }

    pub fn default_value(&self) -> T {
        (self.default)()
    }

    pub fn load(&self, store: &ViewStateStore) -> T {
        let raw = match store.get_item(self.key) {
            Ok(Some(raw)) => raw,
            Ok(None) => return self.default_value(),
            Err(err) => {
                warn!(key = self.key, error = %err, "view state unreadable, using defaults");
                return self.default_value();
            }
        };

        match (self.decode)(&raw) {
            Some(value) => value,
            None => {
                warn!(key = self.key, "view state malformed, using defaults");
                self.default_value()
            }
        }
    }

    pub fn save(&self, store: &ViewStateStore, value: &T) -> Result<()> {
        let encoded = serde_json::to_string(value)?;
        store.set_item(self.key, &encoded)
    }

    pub fn clear(&self, store: &ViewStateStore) -> Result<()> {
        store.remove_item(self.key)
    }
}
