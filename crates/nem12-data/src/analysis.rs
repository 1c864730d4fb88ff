//! End-to-end NEM12 → hourly pipeline.
//!
//! Runs the parser, expander, temporal filter and aggregator strictly in
//! sequence and returns either a populated [`HourlyReport`] or an explicit
//! no-data outcome.

use std::path::Path;
use std::time::Instant;

use nem12_core::error::Result;
use nem12_core::models::HourlyAggregate;
use tracing::{info, warn};

use crate::aggregator::HourlyAggregator;
use crate::expander::expand_records;
use crate::filter::{apply_window, WindowStats};
use crate::reader::{parse_file, parse_lines, ParseStats, ParsedFile};

// ── Public types ──────────────────────────────────────────────────────────────

/// Why a run produced no hourly rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoDataReason {
    /// The file held no valid `300` records.
    NoIntervalRecords,
    /// Interval records were found but every reading was missing.
    NoValidSamples,
    /// The trailing window removed every sample.
    WindowEmpty,
}

impl std::fmt::Display for NoDataReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let msg = match self {
            NoDataReason::NoIntervalRecords => "no valid data records found",
            NoDataReason::NoValidSamples => "no valid interval data found",
            NoDataReason::WindowEmpty => "no samples inside the retention window",
        };
        f.write_str(msg)
    }
}

/// Timings and counts gathered during a populated run.
#[derive(Debug, Clone, Default)]
pub struct AnalysisMetadata {
    /// Wall-clock seconds spent parsing.
    pub parse_time_seconds: f64,
    /// Wall-clock seconds spent expanding, filtering and aggregating.
    pub aggregate_time_seconds: f64,
    pub samples_expanded: usize,
    pub samples_retained: usize,
    pub hourly_rows: usize,
}

/// The populated result of a run.
#[derive(Debug, Clone)]
pub struct HourlyReport {
    /// One row per (meter, section, hour); ordered by meter, section, hour.
    pub rows: Vec<HourlyAggregate>,
    pub window: WindowStats,
    pub parse: ParseStats,
    pub metadata: AnalysisMetadata,
}

/// Terminal result of the pipeline.
#[derive(Debug, Clone)]
pub enum PipelineOutcome {
    NoData {
        reason: NoDataReason,
        parse: ParseStats,
    },
    Hourly(HourlyReport),
}

impl PipelineOutcome {
    /// The report, if the run produced any rows.
    pub fn report(&self) -> Option<&HourlyReport> {
        match self {
            PipelineOutcome::Hourly(report) => Some(report),
            PipelineOutcome::NoData { .. } => None,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, PipelineOutcome::NoData { .. })
    }
}

// ── Public functions ──────────────────────────────────────────────────────────

/// Run the full pipeline over a file on disk.
///
/// Only an unopenable file is an error; an input with nothing usable yields
/// [`PipelineOutcome::NoData`].
pub fn analyze_file(path: &Path, window_days: u32) -> Result<PipelineOutcome> {
    info!("Processing NEM12 file: {}", path.display());
    let parse_start = Instant::now();
    let parsed = parse_file(path)?;
    let parse_time = parse_start.elapsed().as_secs_f64();
    Ok(analyze_parsed(parsed, window_days, parse_time))
}

/// Run the full pipeline over in-memory lines.
pub fn analyze_lines<I, S>(lines: I, window_days: u32) -> PipelineOutcome
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let parse_start = Instant::now();
    let parsed = parse_lines(lines);
    let parse_time = parse_start.elapsed().as_secs_f64();
    analyze_parsed(parsed, window_days, parse_time)
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn analyze_parsed(parsed: ParsedFile, window_days: u32, parse_time: f64) -> PipelineOutcome {
    let ParsedFile { records, stats } = parsed;

    info!(
        "Processing complete: {} lines processed, {} valid data records",
        stats.lines_processed,
        records.len()
    );

    if records.is_empty() {
        return no_data(NoDataReason::NoIntervalRecords, stats);
    }

    let aggregate_start = Instant::now();

    let samples = expand_records(&records);
    drop(records);
    let samples_expanded = samples.len();

    let Some(windowed) = apply_window(samples, window_days) else {
        return no_data(NoDataReason::NoValidSamples, stats);
    };
    if windowed.samples.is_empty() {
        return no_data(NoDataReason::WindowEmpty, stats);
    }

    let rows = HourlyAggregator::aggregate(&windowed.samples);
    let aggregate_time = aggregate_start.elapsed().as_secs_f64();

    info!("Final hourly records: {}", rows.len());

    let metadata = AnalysisMetadata {
        parse_time_seconds: parse_time,
        aggregate_time_seconds: aggregate_time,
        samples_expanded,
        samples_retained: windowed.samples.len(),
        hourly_rows: rows.len(),
    };

    PipelineOutcome::Hourly(HourlyReport {
        rows,
        window: windowed.stats,
        parse: stats,
        metadata,
    })
}

fn no_data(reason: NoDataReason, parse: ParseStats) -> PipelineOutcome {
    warn!("No hourly data produced: {}", reason);
    PipelineOutcome::NoData { reason, parse }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
