//! Calendar arithmetic for interval slots and hour buckets.
//!
//! All timestamps are naive market-local time. Every day is assumed to hold
//! exactly [`INTERVALS_PER_DAY`] slots; daylight-saving days with a different
//! slot count are not handled.

use chrono::{Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Weekday};

use crate::models::{INTERVALS_PER_DAY, INTERVAL_MINUTES};

// ── Slot timestamps ───────────────────────────────────────────────────────────

/// Start of interval slot `index` on `date`.
///
/// Slot 0 covers `[00:00, 00:05)`, slot 287 covers `[23:55, 24:00)`.
/// Returns `None` when `index` is outside the day.
pub fn slot_start(date: NaiveDate, index: usize) -> Option<NaiveDateTime> {
    if index >= INTERVALS_PER_DAY {
        return None;
    }
    let midnight = date.and_time(NaiveTime::MIN);
    midnight.checked_add_signed(Duration::minutes(INTERVAL_MINUTES * index as i64))
}

/// Floor `ts` to the start of its hour.
pub fn floor_to_hour(ts: NaiveDateTime) -> NaiveDateTime {
    let time = NaiveTime::from_hms_opt(ts.hour(), 0, 0).unwrap_or(NaiveTime::MIN);
    ts.date().and_time(time)
}

// ── Calendar labels ───────────────────────────────────────────────────────────

/// Full English weekday name, e.g. `"Monday"`.
pub fn weekday_name(date: NaiveDate) -> &'static str {
    match date.weekday() {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Parse a NEM12 `YYYYMMDD` date.
///
/// The string must be exactly eight ASCII digits and form a valid calendar
/// date; anything else yields `None`.
pub fn parse_nem12_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let year: i32 = s[0..4].parse().ok()?;
    let month: u32 = s[4..6].parse().ok()?;
    let day: u32 = s[6..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

// ── Trailing window ───────────────────────────────────────────────────────────

/// First date retained by a trailing window of `window_days` ending at `max_date`.
///
/// The cutoff itself is inclusive: with a 730-day window a sample dated
/// `max_date - 730` is kept, one dated `max_date - 731` is not.
pub fn window_cutoff(max_date: NaiveDate, window_days: u32) -> NaiveDate {
    max_date
        .checked_sub_signed(Duration::days(i64::from(window_days)))
        .unwrap_or(NaiveDate::MIN)
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        date(y, m, d).and_hms_opt(h, min, 0).unwrap()
    }

    // ── slot_start ────────────────────────────────────────────────────────────

    #[test]
    fn test_slot_start_first_and_last() {
        assert_eq!(slot_start(date(2024, 1, 1), 0), Some(at(2024, 1, 1, 0, 0)));
        assert_eq!(
            slot_start(date(2024, 1, 1), 287),
            Some(at(2024, 1, 1, 23, 55))
        );
    }

    #[test]
    fn test_slot_start_mid_day() {
        // 13 slots = 65 minutes.
        assert_eq!(slot_start(date(2024, 1, 1), 13), Some(at(2024, 1, 1, 1, 5)));
    }

    #[test]
    fn test_slot_start_out_of_range() {
        assert_eq!(slot_start(date(2024, 1, 1), 288), None);
    }

    // ── floor_to_hour ─────────────────────────────────────────────────────────

    #[test]
    fn test_floor_to_hour() {
        assert_eq!(floor_to_hour(at(2024, 3, 5, 14, 55)), at(2024, 3, 5, 14, 0));
        assert_eq!(floor_to_hour(at(2024, 3, 5, 0, 0)), at(2024, 3, 5, 0, 0));
    }

    // ── weekday_name ──────────────────────────────────────────────────────────

    #[test]
    fn test_weekday_name() {
        assert_eq!(weekday_name(date(2024, 1, 1)), "Monday");
        assert_eq!(weekday_name(date(2024, 1, 7)), "Sunday");
    }

    // ── parse_nem12_date ──────────────────────────────────────────────────────

    #[test]
    fn test_parse_nem12_date_valid() {
        assert_eq!(parse_nem12_date("20240229"), Some(date(2024, 2, 29)));
    }

    #[test]
    fn test_parse_nem12_date_rejects_bad_input() {
        assert_eq!(parse_nem12_date("20230229"), None);
        assert_eq!(parse_nem12_date("2024011"), None);
        assert_eq!(parse_nem12_date("202401011"), None);
        assert_eq!(parse_nem12_date("2024-1-1"), None);
        assert_eq!(parse_nem12_date("20241301"), None);
        assert_eq!(parse_nem12_date(""), None);
    }

    // ── window_cutoff ─────────────────────────────────────────────────────────

    #[test]
    fn test_window_cutoff_730_days() {
        // 2024 is a leap year: 2025-12-31 minus 730 days lands on 2024-01-01.
        assert_eq!(window_cutoff(date(2025, 12, 31), 730), date(2024, 1, 1));
    }

    #[test]
    fn test_window_cutoff_small_window() {
        assert_eq!(window_cutoff(date(2024, 3, 1), 1), date(2024, 2, 29));
    }
}
