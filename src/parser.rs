//! Record Parser
//!
//! Turns raw comma-separated text into validated, normalized records.
//!
//! Every line is handled independently: a line is either accepted whole or
//! rejected with a line-numbered message, and the parser itself never fails.
//! Two column layouts are understood (see [`SchemaVersion`]); the layout is
//! sniffed per line by [`detect_schema`] because the notes column may contain
//! unescaped commas and shift every later column to the right. Quoted fields,
//! as written by the CSV export, keep their commas.

use crate::models::*;
use crate::normalizer;
use anyhow::{Context, Result};
use lazy_static::lazy_static;
use regex::Regex;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info};

lazy_static! {
    static ref DATE_RE: Regex = Regex::new(r"^\d{2}/\d{2}/\d{4}$").unwrap();
    static ref TIME_RE: Regex = Regex::new(r"^\d{1,2}:\d{2}$").unwrap();
}

/// Why a single line was rejected
#[derive(Debug, Clone, PartialEq, Error)]
pub enum LineError {
    #[error("Line {line}: too few columns (expected at least {expected}, got {got})")]
    TooFewColumns {
        line: usize,
        expected: usize,
        got: usize,
    },

    #[error("Line {line}: invalid date '{value}' (expected DD/MM/YYYY)")]
    InvalidDate { line: usize, value: String },

    #[error("Line {line}: invalid time '{value}' (expected HH:MM)")]
    InvalidTime { line: usize, value: String },

    #[error("Line {line}: {field} must be a number between 1 and 10, got '{value}'")]
    MetricOutOfRange {
        line: usize,
        field: &'static str,
        value: String,
    },

    #[error("Line {line}: invalid time of day '{value}' (allowed: {allowed})")]
    InvalidTimeOfDay {
        line: usize,
        value: String,
        allowed: String,
    },
}

/// Result of parsing one block of input text
#[derive(Debug, Clone, Default)]
pub struct ParseOutcome {
    pub records: Vec<NormalizedRecord>,
    pub errors: Vec<String>,
    /// Header and blank lines plus rejected lines
    pub skipped: usize,
}

impl ParseOutcome {
    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    /// Fold the outcome of another input into this one
    pub fn merge(&mut self, other: ParseOutcome) {
        self.records.extend(other.records);
        self.errors.extend(other.errors);
        self.skipped += other.skipped;
    }
}

fn is_clock_time(value: &str) -> bool {
    TIME_RE.is_match(value.trim())
}

fn is_optional_time(value: &str) -> bool {
    is_absent(value) || is_clock_time(value)
}

fn is_substance_flag(value: &str) -> bool {
    is_absent(value) || is_affirmative(value) || is_negative(value)
}

/// Decide which column layout a split line follows.
///
/// A line is read as [`SchemaVersion::V2`] only when it has at least 17 parts,
/// its last two parts look like a substance entry and its time, and the two
/// medication time columns before them hold a clock time or a sentinel.
/// Anything else is [`SchemaVersion::V1`], with extra parts belonging to notes.
pub fn detect_schema(parts: &[&str]) -> SchemaVersion {
    let n = parts.len();
    if n < SchemaVersion::V2.column_count() {
        return SchemaVersion::V1;
    }

    let substance_shaped = is_substance_flag(parts[n - 2]) && is_optional_time(parts[n - 1]);
    // Medication text is free-form; only its administration times are checked
    let medication_times = is_optional_time(parts[n - 5]) && is_optional_time(parts[n - 3]);

    if substance_shaped && medication_times {
        SchemaVersion::V2
    } else {
        SchemaVersion::V1
    }
}

/// Whether a trimmed line is a column header
pub fn is_header(line: &str) -> bool {
    let upper = line.to_uppercase();
    upper.contains("DATA,CZAS")
        || upper.contains("DATA, CZAS")
        || (upper.contains("DATA") && upper.contains(SUBSTANCE_HEADER_MARKER))
}

fn is_blank(line: &str) -> bool {
    line.chars().all(|c| c == DELIMITER || c.is_whitespace())
}

/// Parser for the comma-separated import format
#[derive(Debug, Default, Clone)]
pub struct RecordParser;

impl RecordParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a whole block of input. Never fails; rejected lines are reported
    /// in [`ParseOutcome::errors`].
    pub fn parse(&self, raw_text: &str) -> ParseOutcome {
        let mut outcome = ParseOutcome::default();

        if raw_text.trim().is_empty() {
            outcome.errors.push("No data to process".to_string());
            return outcome;
        }

        for (index, raw_line) in raw_text.lines().enumerate() {
            let line_number = index + 1;
            let line = raw_line.trim();

            if is_blank(line) || is_header(line) {
                debug!(line = line_number, "Skipping header or blank line");
                outcome.skipped += 1;
                continue;
            }

            match self.parse_line(line, line_number) {
                Ok(validated) => outcome.records.push(normalizer::normalize(&validated)),
                Err(err) => {
                    debug!(line = line_number, error = %err, "Rejected line");
                    outcome.errors.push(err.to_string());
                    outcome.skipped += 1;
                }
            }
        }

        info!(
            records = outcome.records.len(),
            errors = outcome.errors.len(),
            skipped = outcome.skipped,
            "Parsed input"
        );

        outcome
    }

    /// Read and parse one file
    pub async fn parse_file(&self, path: &Path) -> Result<ParseOutcome> {
        let content = tokio::fs::read_to_string(path)
            .await
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Ok(self.parse(&content))
    }

    /// Validate one trimmed, non-header line
    pub fn parse_line(&self, line: &str, line_number: usize) -> Result<ValidatedRecord, LineError> {
        let split = split_fields(line);
        let parts: Vec<&str> = split.iter().map(String::as_str).collect();
        let minimum = SchemaVersion::V1.column_count();

        if parts.len() < minimum {
            return Err(LineError::TooFewColumns {
                line: line_number,
                expected: minimum,
                got: parts.len(),
            });
        }

        let schema = detect_schema(&parts);
        let fields = repair_columns(&parts, schema.column_count());

        let date = fields[0].clone();
        if !DATE_RE.is_match(&date) {
            return Err(LineError::InvalidDate {
                line: line_number,
                value: date,
            });
        }

        let time = fields[1].clone();
        if !TIME_RE.is_match(&time) {
            return Err(LineError::InvalidTime {
                line: line_number,
                value: time,
            });
        }

        for (offset, metric) in Metric::ALL.iter().enumerate() {
            if Metric::CLINICAL.contains(metric) {
                check_range(&fields[2 + offset], *metric, line_number)?;
            }
        }

        let time_of_day =
            TimeOfDay::from_token(&fields[9]).ok_or_else(|| LineError::InvalidTimeOfDay {
                line: line_number,
                value: fields[9].clone(),
                allowed: TimeOfDay::allowed_tokens(),
            })?;

        let (substance_use, substance_use_time) = match schema {
            SchemaVersion::V2 => (fields[15].clone(), fields[16].clone()),
            SchemaVersion::V1 => ("-".to_string(), "-".to_string()),
        };

        Ok(ValidatedRecord {
            date,
            time,
            sleep_quality: fields[2].clone(),
            sleep_hours: fields[3].clone(),
            anxiety: fields[4].clone(),
            tension: fields[5].clone(),
            brain_fog: fields[6].clone(),
            energy: fields[7].clone(),
            focus: fields[8].clone(),
            time_of_day,
            notes: fields[10].clone(),
            medication_a: fields[11].clone(),
            medication_a_time: fields[12].clone(),
            medication_b: fields[13].clone(),
            medication_b_time: fields[14].clone(),
            substance_use,
            substance_use_time,
            schema,
        })
    }
}

/// Split a line on commas. A field that opens with a double quote runs to its
/// closing quote and keeps any commas inside it, with `""` standing for one
/// quote. A line with an unterminated quote is split on every comma.
fn split_fields(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut at_field_start = true;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        if at_field_start && c == '"' {
            at_field_start = false;
            let mut closed = false;
            while let Some(q) = chars.next() {
                if q != '"' {
                    current.push(q);
                } else if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    closed = true;
                    break;
                }
            }
            if !closed {
                return line.split(DELIMITER).map(str::to_string).collect();
            }
        } else if c == DELIMITER {
            fields.push(std::mem::take(&mut current));
            at_field_start = true;
        } else {
            current.push(c);
            at_field_start = false;
        }
    }

    fields.push(current);
    fields
}

/// Fold surplus parts back into the notes column so exactly `expected`
/// trimmed fields remain.
fn repair_columns(parts: &[&str], expected: usize) -> Vec<String> {
    let excess = parts.len().saturating_sub(expected);
    let notes_end = NOTES_INDEX + excess;

    let mut fields: Vec<String> = parts[..NOTES_INDEX]
        .iter()
        .map(|p| p.trim().to_string())
        .collect();
    fields.push(parts[NOTES_INDEX..=notes_end].join(", ").trim().to_string());
    fields.extend(parts[notes_end + 1..].iter().map(|p| p.trim().to_string()));
    fields
}

fn check_range(value: &str, metric: Metric, line: usize) -> Result<(), LineError> {
    if is_absent(value) {
        return Ok(());
    }
    let in_range = value
        .parse::<f64>()
        .map(|v| (METRIC_MIN..=METRIC_MAX).contains(&v))
        .unwrap_or(false);

    if in_range {
        Ok(())
    } else {
        Err(LineError::MetricOutOfRange {
            line,
            field: metric.column(),
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const V1_LINE: &str = "01/01/2024,08:00,7,8,3,2,4,6,7,RANO,ok,TAK(70MG),07:30,-,-";

    #[test]
    fn test_detect_schema_v1_and_v2() {
        let v1: Vec<&str> = V1_LINE.split(',').collect();
        assert_eq!(detect_schema(&v1), SchemaVersion::V1);

        let v2_line = format!("{},TAK(piwo),20:00", V1_LINE);
        let v2: Vec<&str> = v2_line.split(',').collect();
        assert_eq!(detect_schema(&v2), SchemaVersion::V2);
    }

    #[test]
    fn test_detect_schema_notes_with_commas_stay_v1() {
        let line = "01/01/2024,08:00,7,8,3,2,4,6,7,RANO,a, b, c,-,-,-,-";
        let parts: Vec<&str> = line.split(',').collect();
        assert_eq!(parts.len(), 17);
        assert_eq!(detect_schema(&parts), SchemaVersion::V1);
    }

    #[test]
    fn test_detect_schema_free_text_medication() {
        let line = "01/01/2024,08:00,7,8,3,2,4,6,7,RANO,note,Elvanse 70,08:00,-,-,NIE,-";
        let parts: Vec<&str> = line.split(',').collect();
        assert_eq!(detect_schema(&parts), SchemaVersion::V2);
    }

    #[test]
    fn test_header_detection() {
        assert!(is_header("Data,Czas,JakośćSnu"));
        assert!(is_header("data, czas, x"));
        assert!(is_header("Data;Substancje"));
        assert!(!is_header(V1_LINE));
    }

    #[test]
    fn test_parse_line_trims_time() {
        let parser = RecordParser::new();
        let line = "01/01/2024, 8:00,7,8,3,2,4,6,7,RANO,ok,-,-,-,-";
        let record = parser.parse_line(line, 1).unwrap();
        assert_eq!(record.time, "8:00");
        assert_eq!(record.substance_use, "-");
        assert_eq!(record.schema, SchemaVersion::V1);
    }

    #[test]
    fn test_split_fields_quoted() {
        assert_eq!(split_fields("a,\"b, c\",d"), vec!["a", "b, c", "d"]);
        assert_eq!(split_fields("\"say \"\"hi\"\"\",x"), vec!["say \"hi\"", "x"]);
        assert_eq!(split_fields("a,b \"c\",d"), vec!["a", "b \"c\"", "d"]);
        assert_eq!(split_fields("a,\"open, end"), vec!["a", "\"open", " end"]);
        assert_eq!(split_fields("a,,"), vec!["a", "", ""]);
    }

    #[test]
    fn test_quoted_notes_keep_commas() {
        let parser = RecordParser::new();
        let line = "01/01/2024,08:00,7,8,3,2,4,6,7,RANO,\"tired, then fine\",TAK(70MG),07:30,-,-";
        let record = parser.parse_line(line, 1).unwrap();
        assert_eq!(record.notes, "tired, then fine");
        assert_eq!(record.medication_a, "TAK(70MG)");
        assert_eq!(record.schema, SchemaVersion::V1);
    }

    #[test]
    fn test_rejects_bad_time_of_day() {
        let parser = RecordParser::new();
        let line = "01/01/2024,08:00,7,8,3,2,4,6,7,NOC,ok,-,-,-,-";
        let err = parser.parse_line(line, 4).unwrap_err();
        assert!(err.to_string().starts_with("Line 4:"));
        assert!(err.to_string().contains("RANO"));
    }

    #[test]
    fn test_rejects_non_numeric_metric() {
        let parser = RecordParser::new();
        let line = "01/01/2024,08:00,7,8,abc,2,4,6,7,RANO,ok,-,-,-,-";
        let err = parser.parse_line(line, 2).unwrap_err();
        assert!(matches!(err, LineError::MetricOutOfRange { field: "Lęk", .. }));
    }

    #[test]
    fn test_empty_input() {
        let outcome = RecordParser::new().parse("   \n");
        assert_eq!(outcome.errors, vec!["No data to process".to_string()]);
        assert!(outcome.records.is_empty());
    }
}
