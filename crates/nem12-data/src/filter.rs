//! Trailing-window temporal filter.

use chrono::NaiveDate;
use nem12_core::models::FiveMinuteSample;
use nem12_core::time_utils::window_cutoff;
use tracing::info;

/// Date range and counts observed while filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WindowStats {
    pub min_date: NaiveDate,
    pub max_date: NaiveDate,
    pub cutoff_date: NaiveDate,
    pub window_days: u32,
    pub samples_before: usize,
    pub samples_after: usize,
}

/// Samples retained by the window, plus what the window looked like.
#[derive(Debug, Clone)]
pub struct WindowedSamples {
    pub samples: Vec<FiveMinuteSample>,
    pub stats: WindowStats,
}

/// Keep samples whose `calendar_date` is on or after `max_date - window_days`.
///
/// Returns `None` for an empty input.
pub fn apply_window(samples: Vec<FiveMinuteSample>, window_days: u32) -> Option<WindowedSamples> {
    let (min_date, max_date) = date_range(&samples)?;
    let cutoff_date = window_cutoff(max_date, window_days);
    let samples_before = samples.len();

    let retained: Vec<FiveMinuteSample> = samples
        .into_iter()
        .filter(|s| s.calendar_date >= cutoff_date)
        .collect();

    info!("Original date range: {} to {}", min_date, max_date);
    info!(
        "Keeping data from {} to {} (last {} days): {} of {} 5-minute records",
        cutoff_date,
        max_date,
        window_days,
        retained.len(),
        samples_before
    );

    Some(WindowedSamples {
        stats: WindowStats {
            min_date,
            max_date,
            cutoff_date,
            window_days,
            samples_before,
            samples_after: retained.len(),
        },
        samples: retained,
    })
}

/// Earliest and latest `calendar_date`, or `None` when there are no samples.
pub fn date_range(samples: &[FiveMinuteSample]) -> Option<(NaiveDate, NaiveDate)> {
    let mut dates = samples.iter().map(|s| s.calendar_date);
    let first = dates.next()?;
    Some(dates.fold((first, first), |(lo, hi), d| (lo.min(d), hi.max(d))))
}

// ── Tests ─────────────────────────────────────────────────────────────────────
