use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Number of 5-minute interval slots in one NEM12 day.
pub const INTERVALS_PER_DAY: usize = 288;

/// Length of one interval slot in minutes.
pub const INTERVAL_MINUTES: i64 = 5;

/// Converts an energy-per-slot reading (kWh / 5 min) into average power (kW).
pub const POWER_FACTOR: f64 = 60.0 / INTERVAL_MINUTES as f64;

/// Default trailing window, in days, retained by the temporal filter.
pub const DEFAULT_WINDOW_DAYS: u32 = 730;

/// Business classification of a metering channel.
///
/// Declaration order is the presentation order used when sorting output rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum SectionCategory {
    Import,
    Export,
    #[serde(rename = "Controlled Load")]
    ControlledLoad,
    #[serde(rename = "Not Mapped")]
    NotMapped,
}

impl SectionCategory {
    /// All categories in presentation order.
    pub const ALL: [SectionCategory; 4] = [
        SectionCategory::Import,
        SectionCategory::Export,
        SectionCategory::ControlledLoad,
        SectionCategory::NotMapped,
    ];

    /// Map a raw 2-character AEMO section code onto a category.
    ///
    /// Unknown codes map to [`SectionCategory::NotMapped`]; this never fails.
    pub fn from_code(code: &str) -> Self {
        match code {
            "E5" | "E1" => SectionCategory::Import,
            "B5" | "B1" => SectionCategory::Export,
            "E2" => SectionCategory::ControlledLoad,
            _ => SectionCategory::NotMapped,
        }
    }

    /// Parse a display name (`"Import"`, `"Controlled Load"`, ...).
    ///
    /// Matching is case-insensitive and ignores spaces, dashes and underscores.
    pub fn from_name(name: &str) -> Option<Self> {
        let key: String = name
            .chars()
            .filter(|c| !matches!(c, ' ' | '-' | '_'))
            .flat_map(char::to_lowercase)
            .collect();
        match key.as_str() {
            "import" => Some(SectionCategory::Import),
            "export" => Some(SectionCategory::Export),
            "controlledload" => Some(SectionCategory::ControlledLoad),
            "notmapped" => Some(SectionCategory::NotMapped),
            _ => None,
        }
    }

    /// Human-readable label, also used in exported files.
    pub fn as_str(&self) -> &'static str {
        match self {
            SectionCategory::Import => "Import",
            SectionCategory::Export => "Export",
            SectionCategory::ControlledLoad => "Controlled Load",
            SectionCategory::NotMapped => "Not Mapped",
        }
    }
}

impl fmt::Display for SectionCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A `200` record: meter and channel context for the interval lines that follow.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeaderRecord {
    /// NMI (field 2 of the line).
    pub meter_id: String,
    /// Channel group as written in the file, e.g. `"E1B1E5B5"`.
    pub section_group_raw: String,
    /// Individual channel code, e.g. `"E5"`.
    pub section_code_raw: String,
    /// Category derived from `section_code_raw`.
    pub section: SectionCategory,
}

/// A `300` record: one day of interval readings for the current meter/section.
#[derive(Debug, Clone, PartialEq)]
pub struct IntervalRecord {
    pub meter_id: String,
    pub section: SectionCategory,
    pub date: NaiveDate,
    /// Exactly [`INTERVALS_PER_DAY`] slots; `None` marks a missing reading.
    pub values: Vec<Option<f64>>,
}

impl IntervalRecord {
    /// Number of slots carrying a reading.
    pub fn present_count(&self) -> usize {
        self.values.iter().filter(|v| v.is_some()).count()
    }
}

/// One non-missing 5-minute reading.
#[derive(Debug, Clone, PartialEq)]
pub struct FiveMinuteSample {
    pub meter_id: String,
    pub section: SectionCategory,
    /// Start of the 5-minute slot.
    pub timestamp: NaiveDateTime,
    /// Date of the originating interval record, not derived from `timestamp`.
    pub calendar_date: NaiveDate,
    pub hour: u32,
    pub minute: u32,
    pub energy_kwh: f64,
}

/// Summary statistics for one (meter, section, hour) group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyAggregate {
    pub meter_id: String,
    pub section: SectionCategory,
    /// Sample timestamp floored to the hour.
    pub hour_bucket: NaiveDateTime,
    pub sum_kwh: f64,
    pub mean_kwh: f64,
    pub min_kwh: f64,
    pub max_kwh: f64,
    pub sample_count: u32,
    pub avg_power_kw: f64,
    pub min_power_kw: f64,
    pub max_power_kw: f64,
    pub date: NaiveDate,
    pub hour: u32,
    pub weekday_name: String,
    pub month: u32,
    pub year: i32,
}

// ── Tests ─────────────────────────────────────────────────────────────────────
