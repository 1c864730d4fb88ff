//! NEM12 record parsing.
//!
//! Reads a NEM12 file line by line, tracks the meter/section context set by
//! `200` header records and turns each `300` interval record into an
//! [`IntervalRecord`] of exactly 288 optional readings.

use std::io::{BufRead, ErrorKind};
use std::path::Path;

use nem12_core::error::{Nem12Error, Result};
use nem12_core::models::{HeaderRecord, IntervalRecord, SectionCategory, INTERVALS_PER_DAY};
use nem12_core::time_utils::parse_nem12_date;
use tracing::{debug, info, warn};

/// Minimum field count for a `200` header line.
const HEADER_MIN_FIELDS: usize = 6;

/// Minimum field count for a `300` interval line.
const INTERVAL_MIN_FIELDS: usize = 3;

/// Index of the first reading on a `300` line.
const FIRST_VALUE_FIELD: usize = 2;

// ── Record types ──────────────────────────────────────────────────────────────

/// Record kind named by the leading field of a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordType {
    /// `200` – NMI data details.
    Header,
    /// `300` – interval data.
    Interval,
    /// Any other code, including `100`, `400`, `500`, `900` and blank lines.
    Unrecognized,
}

impl RecordType {
    pub fn from_code(code: &str) -> Self {
        match code {
            "200" => RecordType::Header,
            "300" => RecordType::Interval,
            _ => RecordType::Unrecognized,
        }
    }
}

/// Why a header or interval line was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineIssue {
    /// `200` line with fewer than six fields; prior context is kept.
    MalformedHeader,
    /// `300` line seen before any valid header.
    OrphanInterval,
    /// `300` line with fewer than three fields.
    TooFewFields,
    /// `300` line whose date is not an eight-digit `YYYYMMDD` calendar date.
    InvalidDate,
}

/// What a single line contributed.
#[derive(Debug, Clone, PartialEq)]
pub enum LineOutcome {
    Header(HeaderRecord),
    Interval {
        record: IntervalRecord,
        /// Readings that were present but could not be parsed.
        unparseable: usize,
    },
    Rejected(LineIssue),
    Ignored,
}

// ── Parser state ──────────────────────────────────────────────────────────────

/// Header context carried from one line to the next.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParserState {
    pub current_meter_id: Option<String>,
    pub current_section: Option<SectionCategory>,
}

impl ParserState {
    /// Consume one line, returning the next state and what the line produced.
    pub fn advance(self, line: &str) -> (ParserState, LineOutcome) {
        let fields: Vec<&str> = line.trim().split(',').collect();

        match RecordType::from_code(fields[0]) {
            RecordType::Header => match parse_header(&fields) {
                Some(header) => {
                    // An empty NMI leaves no meter context; following
                    // interval lines are orphans.
                    let next = ParserState {
                        current_meter_id: Some(header.meter_id.clone()).filter(|m| !m.is_empty()),
                        current_section: Some(header.section),
                    };
                    (next, LineOutcome::Header(header))
                }
                None => (self, LineOutcome::Rejected(LineIssue::MalformedHeader)),
            },
            RecordType::Interval => {
                let outcome = match (&self.current_meter_id, self.current_section) {
                    (Some(meter_id), Some(section)) => parse_interval(&fields, meter_id, section),
                    _ => LineOutcome::Rejected(LineIssue::OrphanInterval),
                };
                (self, outcome)
            }
            RecordType::Unrecognized => (self, LineOutcome::Ignored),
        }
    }
}

// ── Statistics ────────────────────────────────────────────────────────────────

/// Counters describing one parse run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseStats {
    pub lines_processed: usize,
    pub headers: usize,
    pub interval_records: usize,
    pub malformed_headers: usize,
    pub orphan_intervals: usize,
    pub short_intervals: usize,
    pub invalid_dates: usize,
    pub unparseable_values: usize,
    pub ignored_lines: usize,
    pub unreadable_lines: usize,
}

impl ParseStats {
    fn record(&mut self, outcome: &LineOutcome) {
        match outcome {
            LineOutcome::Header(_) => self.headers += 1,
            LineOutcome::Interval { unparseable, .. } => {
                self.interval_records += 1;
                self.unparseable_values += unparseable;
            }
            LineOutcome::Rejected(LineIssue::MalformedHeader) => self.malformed_headers += 1,
            LineOutcome::Rejected(LineIssue::OrphanInterval) => self.orphan_intervals += 1,
            LineOutcome::Rejected(LineIssue::TooFewFields) => self.short_intervals += 1,
            LineOutcome::Rejected(LineIssue::InvalidDate) => self.invalid_dates += 1,
            LineOutcome::Ignored => self.ignored_lines += 1,
        }
    }

    /// Total lines dropped for a structural reason.
    pub fn rejected_lines(&self) -> usize {
        self.malformed_headers + self.orphan_intervals + self.short_intervals + self.invalid_dates
    }
}

/// Parsed interval records in input order, plus parse counters.
#[derive(Debug, Clone, Default)]
pub struct ParsedFile {
    pub records: Vec<IntervalRecord>,
    pub stats: ParseStats,
}

// ── Public API ────────────────────────────────────────────────────────────────

/// Open and parse a NEM12 file.
///
/// Failure to open the file is the only error; malformed lines and values are
/// absorbed and counted in [`ParseStats`].
pub fn parse_file(path: &Path) -> Result<ParsedFile> {
    let file_read = |source: std::io::Error| Nem12Error::FileRead {
        path: path.to_path_buf(),
        source,
    };

    let file = std::fs::File::open(path).map_err(file_read)?;
    if file.metadata().map_err(file_read)?.is_dir() {
        return Err(file_read(std::io::Error::new(
            ErrorKind::InvalidInput,
            "path is a directory",
        )));
    }
    let reader = std::io::BufReader::new(file);

    // Invalid UTF-8 consumes its line and is skipped; any other read error
    // ends the file.
    let mut unreadable = 0usize;
    let mut read_error = None;
    let lines = reader
        .lines()
        .enumerate()
        .map_while(|(idx, line)| match line {
            Ok(l) => Some(Some(l)),
            Err(e) if e.kind() == ErrorKind::InvalidData => {
                warn!("Skipping unreadable line {} in {}: {}", idx + 1, path.display(), e);
                unreadable += 1;
                Some(None)
            }
            Err(e) => {
                read_error = Some(e);
                None
            }
        })
        .flatten();
    let mut parsed = parse_lines(lines);
    if let Some(e) = read_error {
        return Err(file_read(e));
    }
    parsed.stats.unreadable_lines = unreadable;
    parsed.stats.lines_processed += unreadable;

    info!(
        "Parsed {}: {} lines, {} interval records",
        path.display(),
        parsed.stats.lines_processed,
        parsed.stats.interval_records
    );

    Ok(parsed)
}

/// Parse an in-memory sequence of lines.
pub fn parse_lines<I, S>(lines: I) -> ParsedFile
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut state = ParserState::default();
    let mut parsed = ParsedFile::default();

    for (idx, line) in lines.into_iter().enumerate() {
        let line_no = idx + 1;
        parsed.stats.lines_processed += 1;

        let (next, outcome) = state.advance(line.as_ref());
        state = next;
        parsed.stats.record(&outcome);

        match outcome {
            LineOutcome::Header(header) => {
                info!(
                    "Found NMI: {}, Section: {} -> {}, Full section info: {}",
                    header.meter_id,
                    header.section_code_raw,
                    header.section,
                    header.section_group_raw
                );
            }
            LineOutcome::Interval { record, .. } => parsed.records.push(record),
            LineOutcome::Rejected(issue) => {
                debug!("Line {}: dropped ({:?})", line_no, issue);
            }
            LineOutcome::Ignored => {}
        }
    }

    parsed
}

// ── Internal helpers ──────────────────────────────────────────────────────────

fn parse_header(fields: &[&str]) -> Option<HeaderRecord> {
    if fields.len() < HEADER_MIN_FIELDS {
        return None;
    }
    let section_code_raw = fields[3].to_string();
    Some(HeaderRecord {
        meter_id: fields[1].to_string(),
        section_group_raw: fields[2].to_string(),
        section: SectionCategory::from_code(&section_code_raw),
        section_code_raw,
    })
}

fn parse_interval(fields: &[&str], meter_id: &str, section: SectionCategory) -> LineOutcome {
    if fields.len() < INTERVAL_MIN_FIELDS {
        return LineOutcome::Rejected(LineIssue::TooFewFields);
    }
    let Some(date) = parse_nem12_date(fields[1].trim()) else {
        return LineOutcome::Rejected(LineIssue::InvalidDate);
    };

    let last = fields.len().min(FIRST_VALUE_FIELD + INTERVALS_PER_DAY);
    let mut unparseable = 0usize;
    let mut values: Vec<Option<f64>> = fields[FIRST_VALUE_FIELD..last]
        .iter()
        .map(|raw| {
            let cleaned = clean_value(raw);
            if cleaned.is_empty() {
                return None;
            }
            let value = parse_reading(&cleaned);
            if value.is_none() {
                unparseable += 1;
            }
            value
        })
        .collect();
    values.resize(INTERVALS_PER_DAY, None);

    LineOutcome::Interval {
        record: IntervalRecord {
            meter_id: meter_id.to_string(),
            section,
            date,
            values,
        },
        unparseable,
    }
}

/// Strip surrounding whitespace and any quote characters.
fn clean_value(raw: &str) -> String {
    raw.trim()
        .chars()
        .filter(|c| *c != '"' && *c != '\'')
        .collect::<String>()
        .trim()
        .to_string()
}

/// Finite numeric reading, or `None` for anything else (including NaN/inf).
fn parse_reading(s: &str) -> Option<f64> {
    s.parse::<f64>().ok().filter(|v| v.is_finite())
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::io::Write;
    use tempfile::TempDir;

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn header(nmi: &str, code: &str) -> String {
        format!("200,{nmi},E1B1E5B5,{code},{code},N1,01009,kWh,5,")
    }

    fn interval(date: &str, values: &[&str]) -> String {
        let mut line = format!("300,{date}");
        for v in values {
            line.push(',');
            line.push_str(v);
        }
        line
    }

    fn full_day(date: &str, value: &str) -> String {
        let values = vec![value; INTERVALS_PER_DAY];
        // Quality flag and timestamps trail the readings in real files.
        format!("{},A,,,20240102120000,", interval(date, &values))
    }

    // ── RecordType ────────────────────────────────────────────────────────────

    #[test]
    fn test_record_type_from_code() {
        assert_eq!(RecordType::from_code("200"), RecordType::Header);
        assert_eq!(RecordType::from_code("300"), RecordType::Interval);
        assert_eq!(RecordType::from_code("100"), RecordType::Unrecognized);
        assert_eq!(RecordType::from_code(""), RecordType::Unrecognized);
    }

    // ── Header handling ───────────────────────────────────────────────────────

    #[test]
    fn test_header_sets_context() {
        let (state, outcome) = ParserState::default().advance(&header("NMI001", "E5"));
        assert_eq!(state.current_meter_id.as_deref(), Some("NMI001"));
        assert_eq!(state.current_section, Some(SectionCategory::Import));
        match outcome {
            LineOutcome::Header(h) => {
                assert_eq!(h.section_code_raw, "E5");
                assert_eq!(h.section_group_raw, "E1B1E5B5");
            }
            other => panic!("expected header, got {other:?}"),
        }
    }

    #[test]
    fn test_unmapped_section_falls_back() {
        let parsed = parse_lines([header("NMI001", "X1"), full_day("20240101", "1")]);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].section, SectionCategory::NotMapped);
    }

    #[test]
    fn test_malformed_header_preserves_context() {
        let parsed = parse_lines([
            header("NMI001", "E5"),
            "200,NMI999,B5".to_string(),
            full_day("20240101", "1"),
        ]);
        assert_eq!(parsed.stats.malformed_headers, 1);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].meter_id, "NMI001");
        assert_eq!(parsed.records[0].section, SectionCategory::Import);
    }

    #[test]
    fn test_empty_meter_id_clears_context() {
        let parsed = parse_lines([header("", "E1"), full_day("20240101", "1")]);
        assert_eq!(parsed.stats.headers, 1);
        assert_eq!(parsed.stats.orphan_intervals, 1);
        assert!(parsed.records.is_empty());
    }

    #[test]
    fn test_header_switches_section() {
        let parsed = parse_lines([
            header("NMI001", "E1"),
            full_day("20240101", "1"),
            header("NMI001", "B1"),
            full_day("20240101", "2"),
        ]);
        assert_eq!(parsed.records.len(), 2);
        assert_eq!(parsed.records[0].section, SectionCategory::Import);
        assert_eq!(parsed.records[1].section, SectionCategory::Export);
    }

    // ── Interval handling ─────────────────────────────────────────────────────

    #[test]
    fn test_orphan_interval_dropped() {
        let parsed = parse_lines([full_day("20240101", "1"), header("NMI001", "E5")]);
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.stats.orphan_intervals, 1);
    }

    #[test]
    fn test_short_interval_line_dropped() {
        let parsed = parse_lines([header("NMI001", "E5"), "300,20240101".to_string()]);
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.stats.short_intervals, 1);
    }

    #[test]
    fn test_invalid_date_dropped() {
        let parsed = parse_lines([
            header("NMI001", "E5"),
            interval("2024011", &["1"]),
            interval("20240230", &["1"]),
            interval("2024-01-01", &["1"]),
        ]);
        assert!(parsed.records.is_empty());
        assert_eq!(parsed.stats.invalid_dates, 3);
    }

    #[test]
    fn test_padding_to_288() {
        let parsed = parse_lines([header("NMI001", "E5"), interval("20240101", &["1.5", "2.5"])]);
        let record = &parsed.records[0];
        assert_eq!(record.values.len(), INTERVALS_PER_DAY);
        assert_eq!(record.values[0], Some(1.5));
        assert_eq!(record.values[1], Some(2.5));
        assert!(record.values[2..].iter().all(|v| v.is_none()));
        assert_eq!(record.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
    }

    #[test]
    fn test_truncation_to_288() {
        let values = vec!["1"; INTERVALS_PER_DAY + 5];
        let parsed = parse_lines([header("NMI001", "E5"), interval("20240101", &values)]);
        let record = &parsed.records[0];
        assert_eq!(record.values.len(), INTERVALS_PER_DAY);
        assert!(record.values.iter().all(|v| *v == Some(1.0)));
    }

    #[test]
    fn test_trailing_quality_fields_are_ignored() {
        let parsed = parse_lines([header("NMI001", "E5"), full_day("20240101", "0.5")]);
        let record = &parsed.records[0];
        assert_eq!(record.present_count(), INTERVALS_PER_DAY);
        assert_eq!(parsed.stats.unparseable_values, 0);
    }

    #[test]
    fn test_unparseable_values_become_missing() {
        let parsed = parse_lines([
            header("NMI001", "E5"),
            interval("20240101", &["1", "", "abc", "nan", "\"2.5\"", " '3' "]),
        ]);
        let values = &parsed.records[0].values;
        assert_eq!(values[0], Some(1.0));
        assert_eq!(values[1], None);
        assert_eq!(values[2], None);
        assert_eq!(values[3], None);
        assert_eq!(values[4], Some(2.5));
        assert_eq!(values[5], Some(3.0));
        assert_eq!(parsed.stats.unparseable_values, 2);
    }

    #[test]
    fn test_unrecognized_records_ignored() {
        let parsed = parse_lines([
            "100,NEM12,200405011135,MDA1,Ret1".to_string(),
            header("NMI001", "E5"),
            "400,1,288,A,,".to_string(),
            full_day("20240101", "1"),
            "".to_string(),
            "900".to_string(),
        ]);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.stats.ignored_lines, 4);
        assert_eq!(parsed.stats.lines_processed, 6);
    }

    #[test]
    fn test_output_order_matches_input() {
        let parsed = parse_lines([
            header("NMI001", "E5"),
            full_day("20240103", "1"),
            full_day("20240101", "1"),
            full_day("20240102", "1"),
        ]);
        let days: Vec<u32> = parsed
            .records
            .iter()
            .map(|r| chrono::Datelike::day(&r.date))
            .collect();
        assert_eq!(days, vec![3, 1, 2]);
    }

    #[test]
    fn test_crlf_line_endings() {
        let parsed = parse_lines([
            format!("{}\r", header("NMI001", "E5")),
            format!("{}\r", interval("20240101", &["1"])),
        ]);
        assert_eq!(parsed.records.len(), 1);
    }

    // ── parse_file ────────────────────────────────────────────────────────────

    #[test]
    fn test_parse_file_reads_from_disk() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nem12data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", header("NMI001", "E5")).unwrap();
        writeln!(file, "{}", full_day("20240101", "0.5")).unwrap();

        let parsed = parse_file(&path).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.stats.lines_processed, 2);
    }

    #[test]
    fn test_parse_file_missing_is_fatal() {
        let result = parse_file(Path::new("/tmp/does-not-exist-nem12-test-xyz.csv"));
        assert!(matches!(result, Err(Nem12Error::FileRead { .. })));
    }

    #[test]
    fn test_parse_file_directory_is_fatal() {
        let dir = TempDir::new().unwrap();
        let result = parse_file(dir.path());
        assert!(matches!(result, Err(Nem12Error::FileRead { .. })));
    }

    #[test]
    fn test_parse_file_skips_invalid_utf8_line() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nem12data.csv");
        let mut file = std::fs::File::create(&path).unwrap();
        writeln!(file, "{}", header("NMI001", "E5")).unwrap();
        file.write_all(b"300,2024\xff\xfe0101,1\n").unwrap();
        writeln!(file, "{}", full_day("20240101", "0.5")).unwrap();

        let parsed = parse_file(&path).unwrap();
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.stats.unreadable_lines, 1);
        assert_eq!(parsed.stats.lines_processed, 3);
    }

    #[test]
    fn test_parse_is_deterministic() {
        let lines = [header("NMI001", "E5"), full_day("20240101", "0.25")];
        let a = parse_lines(lines.clone());
        let b = parse_lines(lines);
        assert_eq!(a.records, b.records);
        assert_eq!(a.stats, b.stats);
    }
}
