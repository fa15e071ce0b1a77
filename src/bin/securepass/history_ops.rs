use std::io;
use std::path::PathBuf;

use anyhow::Context;
use chrono::TimeZone;

use securepass::{HistoryHandle, PasswordRecord};

use crate::ProgError;

pub(crate) fn list_history(count: usize, data_dir: Option<PathBuf>) -> Result<(), ProgError> {
    let history = HistoryHandle::open_or_degraded(crate::history_path(data_dir)?);
    let records = history.recent(count);
    if records.is_empty() {
        eprintln!("No history yet");
        return Ok(());
    }
    render_history(&records)?;
    Ok(())
}

pub(crate) fn clear_history(data_dir: Option<PathBuf>, yes: bool) -> Result<(), ProgError> {
    if !yes {
        eprintln!("This will delete the entire password history.");
        let confirm_clear = dialoguer::Confirm::new()
            .with_prompt("Clear?")
            .default(false)
            .interact()
            .context("failed to prompt you, somehow")?;
        if !confirm_clear {
            return Err(ProgError::ClearAborted);
        }
    }
    // Storage trouble degrades to "no history" here too; either way the
    // history reads as empty afterwards.
    let mut history = HistoryHandle::open_or_degraded(crate::history_path(data_dir)?);
    history.clear();
    eprintln!("History cleared.");
    Ok(())
}

pub(crate) fn render_history(records: &[PasswordRecord]) -> Result<(), ProgError> {
    let rows: Vec<[String; 3]> = records
        .iter()
        .map(|record| {
            [
                record.id.to_string(),
                record.password.clone(),
                format_created(record.created),
            ]
        })
        .collect();
    crate::table::render(["Id", "Password", "Created"], &rows, io::stdout())
        .context("failed to output table")?;
    Ok(())
}

fn format_created(millis: u64) -> String {
    match chrono::Local.timestamp_millis_opt(millis as i64).single() {
        Some(created) => created.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}
