//! Hourly aggregation of 5-minute samples.
//!
//! Groups samples by (meter, section, hour bucket) and derives energy
//! statistics, equivalent power and calendar fields for each group.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDateTime, Timelike};
use nem12_core::formatting::round6;
use nem12_core::models::{FiveMinuteSample, HourlyAggregate, SectionCategory, POWER_FACTOR};
use nem12_core::time_utils::{floor_to_hour, weekday_name};

// ── HourlyStats ───────────────────────────────────────────────────────────────

/// Running energy statistics for one hour bucket.
#[derive(Debug, Clone, Copy)]
pub struct HourlyStats {
    pub sum: f64,
    pub min: f64,
    pub max: f64,
    pub count: u32,
}

impl Default for HourlyStats {
    fn default() -> Self {
        Self {
            sum: 0.0,
            min: f64::INFINITY,
            max: f64::NEG_INFINITY,
            count: 0,
        }
    }
}

impl HourlyStats {
    /// Add a single reading to the running totals.
    pub fn add(&mut self, energy_kwh: f64) {
        self.sum += energy_kwh;
        self.min = self.min.min(energy_kwh);
        self.max = self.max.max(energy_kwh);
        self.count += 1;
    }

    /// Arithmetic mean, or `0.0` for an empty bucket.
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.sum / f64::from(self.count)
        }
    }
}

/// Grouping key; ordering gives a deterministic output sequence.
type GroupKey = (String, SectionCategory, NaiveDateTime);

// ── HourlyAggregator ──────────────────────────────────────────────────────────

/// Stateless helper that rolls 5-minute samples up into hourly rows.
pub struct HourlyAggregator;

impl HourlyAggregator {
    /// Aggregate `samples` into one row per (meter, section, hour bucket).
    ///
    /// Rows come out ordered by meter id, section, then hour bucket.
    pub fn aggregate(samples: &[FiveMinuteSample]) -> Vec<HourlyAggregate> {
        let mut groups: BTreeMap<GroupKey, HourlyStats> = BTreeMap::new();

        for sample in samples {
            let key = (
                sample.meter_id.clone(),
                sample.section,
                floor_to_hour(sample.timestamp),
            );
            groups.entry(key).or_default().add(sample.energy_kwh);
        }

        groups
            .into_iter()
            .map(|((meter_id, section, hour_bucket), stats)| {
                build_row(meter_id, section, hour_bucket, &stats)
            })
            .collect()
    }

    /// Reorder rows for presentation: section rank, date, hour, then meter id.
    pub fn sort_for_presentation(rows: &mut [HourlyAggregate]) {
        rows.sort_by(|a, b| {
            a.section
                .cmp(&b.section)
                .then(a.date.cmp(&b.date))
                .then(a.hour.cmp(&b.hour))
                .then_with(|| a.meter_id.cmp(&b.meter_id))
        });
    }
}

// ── Private ───────────────────────────────────────────────────────────────────

fn build_row(
    meter_id: String,
    section: SectionCategory,
    hour_bucket: NaiveDateTime,
    stats: &HourlyStats,
) -> HourlyAggregate {
    let mean_kwh = round6(stats.mean());
    let min_kwh = round6(stats.min);
    let max_kwh = round6(stats.max);
    let date = hour_bucket.date();

    HourlyAggregate {
        meter_id,
        section,
        hour_bucket,
        sum_kwh: round6(stats.sum),
        mean_kwh,
        min_kwh,
        max_kwh,
        sample_count: stats.count,
        avg_power_kw: round6(mean_kwh * POWER_FACTOR),
        min_power_kw: round6(min_kwh * POWER_FACTOR),
        max_power_kw: round6(max_kwh * POWER_FACTOR),
        date,
        hour: hour_bucket.hour(),
        weekday_name: weekday_name(date).to_string(),
        month: date.month(),
        year: date.year(),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────
