//! CSV export of daily records.
//!
//! The export is a derived view: the live day (if anything was logged)
//! followed by every archived record, one row per day.

use crate::{DailyData, Error, Result};
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// A row in the CSV output
#[derive(Debug, serde::Serialize)]
struct CsvRow {
    date: String,
    total_intake_ml: i64,
    entry_count: usize,
    goal_met: bool,
}

impl From<&DailyData> for CsvRow {
    fn from(day: &DailyData) -> Self {
        CsvRow {
            date: day.date.format("%Y-%m-%d").to_string(),
            // Whole milliliters; fractions are truncated
            total_intake_ml: day.total_intake as i64,
            entry_count: day.entry_count,
            goal_met: day.goal_met,
        }
    }
}

/// Write records as CSV (with header) to any writer
///
/// Returns the number of data rows written.
pub fn write_csv<W: Write>(records: &[DailyData], writer: W) -> Result<usize> {
    let mut writer = csv::WriterBuilder::new()
        .has_headers(true)
        .from_writer(writer);

    for day in records {
        writer.serialize(CsvRow::from(day))?;
    }

    // Header only appears with the first record, so force it for empty exports
    if records.is_empty() {
        writer.write_record(["date", "total_intake_ml", "entry_count", "goal_met"])?;
    }

    writer.flush()?;
    Ok(records.len())
}

/// Export records to a file, replacing it atomically
///
/// This function:
/// 1. Writes the CSV into a temp file beside the target
/// 2. Syncs it to disk
/// 3. Renames it over the target
pub fn export_to_path(records: &[DailyData], path: &Path) -> Result<usize> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(parent)?;

    let temp = NamedTempFile::new_in(parent)?;
    let count = write_csv(records, temp.as_file())?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::info!("Exported {} daily records to {:?}", count, path);
    Ok(count)
}
