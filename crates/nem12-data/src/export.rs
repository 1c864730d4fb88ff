//! CSV export of the hourly table.

use std::io::Write;
use std::path::Path;

use nem12_core::error::Result;
use nem12_core::formatting::format_fixed6;
use nem12_core::models::HourlyAggregate;
use serde::Serialize;
use tracing::info;

/// One output line; field order is the column order of the file.
#[derive(Debug, Serialize)]
struct HourlyCsvRow<'a> {
    meter_id: &'a str,
    section: &'static str,
    date: String,
    hour: u32,
    weekday_name: &'a str,
    month: u32,
    year: i32,
    hourly_energy_kwh: String,
    avg_power_kw: String,
    min_power_kw: String,
    max_power_kw: String,
    interval_count: u32,
}

impl<'a> From<&'a HourlyAggregate> for HourlyCsvRow<'a> {
    fn from(row: &'a HourlyAggregate) -> Self {
        HourlyCsvRow {
            meter_id: &row.meter_id,
            section: row.section.as_str(),
            date: row.date.format("%Y-%m-%d").to_string(),
            hour: row.hour,
            weekday_name: &row.weekday_name,
            month: row.month,
            year: row.year,
            hourly_energy_kwh: format_fixed6(row.sum_kwh),
            avg_power_kw: format_fixed6(row.avg_power_kw),
            min_power_kw: format_fixed6(row.min_power_kw),
            max_power_kw: format_fixed6(row.max_power_kw),
            interval_count: row.sample_count,
        }
    }
}

/// Write `rows` to `path`, creating parent directories as needed.
///
/// Returns the number of data rows written.
pub fn write_hourly_csv(path: &Path, rows: &[HourlyAggregate]) -> Result<usize> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let file = std::fs::File::create(path)?;
    let written = write_hourly_csv_to(std::io::BufWriter::new(file), rows)?;
    info!("Wrote {} hourly rows to {}", written, path.display());
    Ok(written)
}

/// Write `rows` as CSV to any writer.
pub fn write_hourly_csv_to<W: Write>(writer: W, rows: &[HourlyAggregate]) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    for row in rows {
        wtr.serialize(HourlyCsvRow::from(row))?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

// ── Tests ─────────────────────────────────────────────────────────────────────
