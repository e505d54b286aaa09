use std::path::Path;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use crate::util::{ensure_directory, now_utc_string};

/// One JSON document per key. Concurrent console processes are last writer wins.
pub struct ViewStateStore {
    connection: Connection,
}

impl ViewStateStore {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) {
            ensure_directory(parent)?;
        }

        let connection = Connection::open(path)
            .with_context(|| format!("failed to open view-state db {}", path.display()))?;
        configure_connection(&connection)?;
        Self::with_connection(connection)
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let connection =
            Connection::open_in_memory().context("failed to open in-memory view-state db")?;
        Self::with_connection(connection)
    }

    fn with_connection(connection: Connection) -> Result<Self> {
        ensure_schema(&connection)?;
        Ok(Self { connection })
    }

    pub fn get_item(&self, key: &str) -> Result<Option<String>> {
        self.connection
            .query_row(
                "SELECT value FROM view_state WHERE key = ?1",
                params![key],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .with_context(|| format!("failed to read view state '{key}'"))
    }

    pub fn set_item(&self, key: &str, value: &str) -> Result<()> {
        self.connection
            .execute(
                "
                INSERT INTO view_state (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                  value = excluded.value,
                  updated_at = excluded.updated_at
                ",
                params![key, value, now_utc_string()],
            )
            .with_context(|| format!("failed to write view state '{key}'"))?;
        Ok(())
    }

    pub fn remove_item(&self, key: &str) -> Result<()> {
        self.connection
            .execute("DELETE FROM view_state WHERE key = ?1", params![key])
            .with_context(|| format!("failed to remove view state '{key}'"))?;
        Ok(())
    }
}

fn configure_connection(connection: &Connection) -> Result<()> {
    connection
        .pragma_update(None, "journal_mode", "WAL")
        .context("failed to set journal_mode=WAL")?;
    connection
        .pragma_update(None, "synchronous", "NORMAL")
        .context("failed to set synchronous=NORMAL")?;
    Ok(())
}

fn ensure_schema(connection: &Connection) -> Result<()> {
    connection
        .execute_batch(
            "
            CREATE TABLE IF NOT EXISTS view_state (
              key TEXT PRIMARY KEY,
              value TEXT NOT NULL,
              updated_at TEXT NOT NULL
            );
            ",
        )
        .context("failed to create view_state table")
}

#[cfg(test)]
mod tests {
    use super::ViewStateStore;

    #[test]
    fn set_get_and_remove_round_trip() {
        let store = ViewStateStore::open_in_memory().expect("store");

        assert_eq!(store.get_item("missing").expect("read"), None);

        store.set_item("page.v1", r#"{"a":1}"#).expect("write");
        store.set_item("page.v1", r#"{"a":2}"#).expect("overwrite");
        assert_eq!(
            store.get_item("page.v1").expect("read").as_deref(),
            Some(r#"{"a":2}"#)
        );

        store.remove_item("page.v1").expect("remove");
        assert_eq!(store.get_item("page.v1").expect("read"), None);
    }
}
