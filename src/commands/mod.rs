pub mod ask;
pub mod metrics;
pub mod ops;
pub mod overview;
pub mod sync;

use std::io::{self, Write};
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;

use crate::cli::ConnectionArgs;
use crate::store::ViewStateStore;

fn open_store(connection: &ConnectionArgs) -> Result<ViewStateStore> {
    ViewStateStore::open(&connection.state_db)
}

fn write_json<T: Serialize>(value: &T) -> Result<()> {
    let mut output = io::BufWriter::new(io::stdout().lock());
    serde_json::to_writer_pretty(&mut output, value).context("failed to serialize json output")?;
    writeln!(output)?;
    output.flush()?;
    Ok(())
}

/// Renders once, or keeps re-rendering every `interval` when `watch` is set.
fn refresh_every(
    interval: Duration,
    watch: bool,
    mut render: impl FnMut() -> Result<()>,
) -> Result<()> {
    loop {
        render()?;
        if !watch {
            return Ok(());
        }
        thread::sleep(interval);
    }
}

fn or_dash(value: Option<&str>) -> &str {
    value.filter(|value| !value.is_empty()).unwrap_or("-")
}
