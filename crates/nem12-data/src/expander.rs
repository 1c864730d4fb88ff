//! Expansion of per-day interval records into timestamped 5-minute samples.

use chrono::Timelike;
use nem12_core::models::{FiveMinuteSample, IntervalRecord};
use nem12_core::time_utils::slot_start;

/// Expand every record into one sample per present reading.
///
/// Missing slots produce nothing. Output order follows record order, then
/// slot order within each record.
pub fn expand_records(records: &[IntervalRecord]) -> Vec<FiveMinuteSample> {
    let capacity = records.iter().map(IntervalRecord::present_count).sum();
    let mut samples = Vec::with_capacity(capacity);
    for record in records {
        samples.extend(expand_record(record));
    }
    samples
}

/// Expand a single record.
pub fn expand_record(record: &IntervalRecord) -> impl Iterator<Item = FiveMinuteSample> + '_ {
    record
        .values
        .iter()
        .enumerate()
        .filter_map(move |(index, value)| {
            let energy_kwh = (*value)?;
            let timestamp = slot_start(record.date, index)?;
            Some(FiveMinuteSample {
                meter_id: record.meter_id.clone(),
                section: record.section,
                timestamp,
                calendar_date: record.date,
                hour: timestamp.hour(),
                minute: timestamp.minute(),
                energy_kwh,
            })
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use nem12_core::models::{SectionCategory, INTERVALS_PER_DAY};

    fn record(date: NaiveDate, values: Vec<Option<f64>>) -> IntervalRecord {
        let mut values = values;
        values.resize(INTERVALS_PER_DAY, None);
        IntervalRecord {
            meter_id: "NMI001".to_string(),
            section: SectionCategory::Import,
            date,
            values,
        }
    }

    fn jan1() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()
    }

    #[test]
    fn test_full_day_yields_288_samples() {
        let samples = expand_records(&[record(jan1(), vec![Some(0.5); INTERVALS_PER_DAY])]);
        assert_eq!(samples.len(), INTERVALS_PER_DAY);
        let last = samples.last().unwrap();
        assert_eq!((last.hour, last.minute), (23, 55));
        assert_eq!(last.calendar_date, jan1());
    }

    #[test]
    fn test_missing_slots_are_dropped_not_zeroed() {
        let rec = record(jan1(), vec![Some(1.0), None, Some(0.0), None, Some(2.0)]);
        let samples = expand_records(std::slice::from_ref(&rec));
        assert_eq!(samples.len(), rec.present_count());
        let minutes: Vec<u32> = samples.iter().map(|s| s.minute).collect();
        assert_eq!(minutes, vec![0, 10, 20]);
        assert_eq!(samples[1].energy_kwh, 0.0);
    }

    #[test]
    fn test_timestamps_follow_slot_index() {
        let mut values = vec![None; INTERVALS_PER_DAY];
        values[13] = Some(0.1);
        let samples = expand_records(&[record(jan1(), values)]);
        assert_eq!(samples.len(), 1);
        assert_eq!(
            samples[0].timestamp,
            jan1().and_hms_opt(1, 5, 0).unwrap()
        );
        assert_eq!((samples[0].hour, samples[0].minute), (1, 5));
    }

    #[test]
    fn test_carries_meter_and_section() {
        let mut rec = record(jan1(), vec![Some(1.0)]);
        rec.meter_id = "NMI777".to_string();
        rec.section = SectionCategory::ControlledLoad;
        let samples = expand_records(&[rec]);
        assert_eq!(samples[0].meter_id, "NMI777");
        assert_eq!(samples[0].section, SectionCategory::ControlledLoad);
    }

    #[test]
    fn test_empty_input() {
        assert!(expand_records(&[]).is_empty());
    }
}
