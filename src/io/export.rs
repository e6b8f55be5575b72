//! CSV export for historical daily series.

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;

use crate::sim::DailyRecord;

/// Column header for the daily-history CSV layout.
const HEADER: &str = "date,production_kwh,consumption_kwh,battery_level,grid_usage_kwh";

/// Exports a daily history series to a CSV file at the given path.
///
/// Writes a header row followed by one data row per day. Produces
/// deterministic output for identical inputs.
///
/// # Errors
///
/// Returns an `io::Error` if file creation or writing fails.
pub fn export_csv(records: &[DailyRecord], path: &Path) -> io::Result<()> {
    let file = File::create(path)?;
    let buf = io::BufWriter::new(file);
    write_csv(records, buf)
}

/// Writes a daily history series as CSV to any writer.
///
/// # Errors
///
/// Returns an `io::Error` if writing fails.
pub fn write_csv(records: &[DailyRecord], writer: impl Write) -> io::Result<()> {
    let mut wtr = csv::WriterBuilder::new().from_writer(writer);

    wtr.write_record(HEADER.split(','))?;

    for r in records {
        wtr.write_record(&[
            r.date.format("%Y-%m-%d").to_string(),
            format!("{:.1}", r.production_kwh),
            format!("{:.1}", r.consumption_kwh),
            r.battery_level.to_string(),
            format!("{:.1}", r.grid_usage_kwh),
        ])?;
    }

    wtr.flush()?;
    Ok(())
}
