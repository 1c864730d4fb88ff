//! Summaries over the hourly table.
//!
//! Dataset overview, per-meter section statistics, yearly row counts,
//! per-section energy totals and hour-of-day profiles.

use std::collections::{BTreeMap, BTreeSet};

use chrono::NaiveDate;
use nem12_core::formatting::round_to;
use nem12_core::models::{HourlyAggregate, SectionCategory};

/// Decimal places used for section summary statistics.
const SUMMARY_DECIMALS: u32 = 3;

// ── DatasetOverview ───────────────────────────────────────────────────────────

/// Headline figures for a whole hourly table.
#[derive(Debug, Clone, PartialEq)]
pub struct DatasetOverview {
    pub meters: usize,
    pub sections: usize,
    pub days: usize,
    pub hourly_rows: usize,
    pub first_date: Option<NaiveDate>,
    pub last_date: Option<NaiveDate>,
    /// Sections present, in presentation order.
    pub sections_found: Vec<SectionCategory>,
}

/// Count distinct meters, sections and days.
pub fn dataset_overview(rows: &[HourlyAggregate]) -> DatasetOverview {
    let meters: BTreeSet<&str> = rows.iter().map(|r| r.meter_id.as_str()).collect();
    let sections: BTreeSet<SectionCategory> = rows.iter().map(|r| r.section).collect();
    let days: BTreeSet<NaiveDate> = rows.iter().map(|r| r.date).collect();

    DatasetOverview {
        meters: meters.len(),
        sections: sections.len(),
        days: days.len(),
        hourly_rows: rows.len(),
        first_date: days.first().copied(),
        last_date: days.last().copied(),
        sections_found: sections.into_iter().collect(),
    }
}

// ── SectionSummary ────────────────────────────────────────────────────────────

/// Hourly-energy statistics for one (meter, section).
#[derive(Debug, Clone, PartialEq)]
pub struct SectionSummary {
    pub meter_id: String,
    pub section: SectionCategory,
    pub total_kwh: f64,
    pub mean_kwh: f64,
    pub min_kwh: f64,
    pub max_kwh: f64,
    pub hours: usize,
    pub first_date: NaiveDate,
    pub last_date: NaiveDate,
    pub distinct_days: usize,
}

#[derive(Default)]
struct SectionAccumulator {
    total: f64,
    min: Option<f64>,
    max: Option<f64>,
    hours: usize,
    days: BTreeSet<NaiveDate>,
}

/// One summary per (meter, section), ordered by meter then section.
pub fn section_summaries(rows: &[HourlyAggregate]) -> Vec<SectionSummary> {
    let mut groups: BTreeMap<(&str, SectionCategory), SectionAccumulator> = BTreeMap::new();

    for row in rows {
        let acc = groups
            .entry((row.meter_id.as_str(), row.section))
            .or_default();
        acc.total += row.sum_kwh;
        acc.min = Some(acc.min.map_or(row.sum_kwh, |m| m.min(row.sum_kwh)));
        acc.max = Some(acc.max.map_or(row.sum_kwh, |m| m.max(row.sum_kwh)));
        acc.hours += 1;
        acc.days.insert(row.date);
    }

    groups
        .into_iter()
        .filter_map(|((meter_id, section), acc)| {
            Some(SectionSummary {
                meter_id: meter_id.to_string(),
                section,
                total_kwh: round_to(acc.total, SUMMARY_DECIMALS),
                mean_kwh: round_to(acc.total / acc.hours as f64, SUMMARY_DECIMALS),
                min_kwh: round_to(acc.min?, SUMMARY_DECIMALS),
                max_kwh: round_to(acc.max?, SUMMARY_DECIMALS),
                hours: acc.hours,
                first_date: *acc.days.first()?,
                last_date: *acc.days.last()?,
                distinct_days: acc.days.len(),
            })
        })
        .collect()
}

// ── Yearly and per-section totals ─────────────────────────────────────────────

/// Number of hourly rows per calendar year, ascending by year.
pub fn yearly_row_counts(rows: &[HourlyAggregate]) -> BTreeMap<i32, usize> {
    let mut counts = BTreeMap::new();
    for row in rows {
        *counts.entry(row.year).or_insert(0) += 1;
    }
    counts
}

/// Energy total and mean average power for one section.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionEnergy {
    pub section: SectionCategory,
    pub total_kwh: f64,
    pub mean_avg_power_kw: f64,
}

/// Energy per section, in presentation order, for sections that appear.
pub fn section_energy_totals(rows: &[HourlyAggregate]) -> Vec<SectionEnergy> {
    SectionCategory::ALL
        .iter()
        .filter_map(|&section| {
            let (total, power_sum, n) = rows
                .iter()
                .filter(|r| r.section == section)
                .fold((0.0, 0.0, 0usize), |(t, p, n), r| {
                    (t + r.sum_kwh, p + r.avg_power_kw, n + 1)
                });
            (n > 0).then(|| SectionEnergy {
                section,
                total_kwh: total,
                mean_avg_power_kw: power_sum / n as f64,
            })
        })
        .collect()
}

// ── Hour-of-day profile ───────────────────────────────────────────────────────

/// Mean energy and power for one hour of the day.
#[derive(Debug, Clone, PartialEq)]
pub struct HourProfile {
    pub hour: u32,
    pub mean_energy_kwh: f64,
    pub mean_avg_power_kw: f64,
}

/// Headline metrics for a (section, year) selection.
#[derive(Debug, Clone, PartialEq)]
pub struct ProfileMetrics {
    pub total_kwh: f64,
    pub mean_avg_power_kw: f64,
    pub peak_power_kw: f64,
}

/// A section's typical day, optionally restricted to one year.
#[derive(Debug, Clone, PartialEq)]
pub struct DailyProfile {
    pub section: SectionCategory,
    pub year: Option<i32>,
    pub metrics: ProfileMetrics,
    /// Only hours that have data, ascending.
    pub hours: Vec<HourProfile>,
}

/// Average the rows of `section` (and `year`, if given) by hour of day.
///
/// Returns `None` when the selection is empty.
pub fn hour_of_day_profile(
    rows: &[HourlyAggregate],
    section: SectionCategory,
    year: Option<i32>,
) -> Option<DailyProfile> {
    let selected: Vec<&HourlyAggregate> = rows
        .iter()
        .filter(|r| r.section == section && year.map_or(true, |y| r.year == y))
        .collect();
    if selected.is_empty() {
        return None;
    }

    let mut by_hour: BTreeMap<u32, (f64, f64, usize)> = BTreeMap::new();
    for row in &selected {
        let slot = by_hour.entry(row.hour).or_insert((0.0, 0.0, 0));
        slot.0 += row.sum_kwh;
        slot.1 += row.avg_power_kw;
        slot.2 += 1;
    }

    let hours = by_hour
        .into_iter()
        .map(|(hour, (energy, power, n))| HourProfile {
            hour,
            mean_energy_kwh: energy / n as f64,
            mean_avg_power_kw: power / n as f64,
        })
        .collect();

    let n = selected.len() as f64;
    let metrics = ProfileMetrics {
        total_kwh: selected.iter().map(|r| r.sum_kwh).sum(),
        mean_avg_power_kw: selected.iter().map(|r| r.avg_power_kw).sum::<f64>() / n,
        peak_power_kw: selected
            .iter()
            .map(|r| r.max_power_kw)
            .fold(f64::NEG_INFINITY, f64::max),
    };

    Some(DailyProfile {
        section,
        year,
        metrics,
        hours,
    })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
