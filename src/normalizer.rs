//! Record Normalization
//!
//! Converts the string fields of a [`ValidatedRecord`] into typed values.
//! Normalization is pure and infallible: anything that does not convert
//! cleanly becomes `None` (or `false` for the substance flag).

use crate::models::{is_absent, is_affirmative, is_negative, NormalizedRecord, ValidatedRecord};
use crate::timestamp_parser::TimestampParser;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref DOSE_RE: Regex = Regex::new(r"(?i)(\d+)\s*MG").unwrap();
}

/// Numeric-or-sentinel field to an optional finite number
pub fn parse_number(value: &str) -> Option<f64> {
    if is_absent(value) {
        return None;
    }
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// Optional free text: sentinels become `None`
pub fn parse_text(value: &str) -> Option<String> {
    if is_absent(value) {
        None
    } else {
        Some(value.trim().to_string())
    }
}

/// Milligram dose embedded in a medication field, e.g. `TAK(75MG)` -> 75
pub fn extract_dose(value: &str) -> Option<u32> {
    if is_absent(value) || is_negative(value) {
        return None;
    }
    DOSE_RE
        .captures(value)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// Whether a substance column records use
pub fn substance_flag(value: &str) -> bool {
    !is_absent(value) && !is_negative(value) && is_affirmative(value)
}

/// Convert a validated record into its typed form
pub fn normalize(record: &ValidatedRecord) -> NormalizedRecord {
    NormalizedRecord {
        date: record.date.clone(),
        time: record.time.clone(),
        sleep_quality: parse_number(&record.sleep_quality),
        sleep_hours: parse_number(&record.sleep_hours),
        anxiety: parse_number(&record.anxiety),
        tension: parse_number(&record.tension),
        brain_fog: parse_number(&record.brain_fog),
        energy: parse_number(&record.energy),
        focus: parse_number(&record.focus),
        time_of_day: record.time_of_day,
        notes: parse_text(&record.notes),
        medication_a: parse_text(&record.medication_a),
        medication_a_time: parse_text(&record.medication_a_time),
        medication_a_mg: extract_dose(&record.medication_a),
        medication_b: parse_text(&record.medication_b),
        medication_b_time: parse_text(&record.medication_b_time),
        medication_b_mg: extract_dose(&record.medication_b),
        substance_use: parse_text(&record.substance_use),
        substance_use_time: parse_text(&record.substance_use_time),
        substance_flag: substance_flag(&record.substance_use),
        timestamp: TimestampParser::parse(&record.date, &record.time).ok(),
        schema: record.schema,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{SchemaVersion, TimeOfDay};

    fn validated() -> ValidatedRecord {
        ValidatedRecord {
            date: "01/02/2024".to_string(),
            time: "8:30".to_string(),
            sleep_quality: "7".to_string(),
            sleep_hours: "6.5".to_string(),
            anxiety: "4".to_string(),
            tension: "-".to_string(),
            brain_fog: "N/A".to_string(),
            energy: "BRAK".to_string(),
            focus: "".to_string(),
            time_of_day: TimeOfDay::Morning,
            notes: "-".to_string(),
            medication_a: "TAK(70mg)".to_string(),
            medication_a_time: "08:00".to_string(),
            medication_b: "NIE".to_string(),
            medication_b_time: "-".to_string(),
            substance_use: "TAK(kawa)".to_string(),
            substance_use_time: "10:00".to_string(),
            schema: SchemaVersion::V2,
        }
    }

    #[test]
    fn test_sentinels_become_none() {
        let record = normalize(&validated());
        assert_eq!(record.sleep_quality, Some(7.0));
        assert_eq!(record.sleep_hours, Some(6.5));
        assert_eq!(record.tension, None);
        assert_eq!(record.brain_fog, None);
        assert_eq!(record.energy, None);
        assert_eq!(record.focus, None);
        assert_eq!(record.notes, None);
    }

    #[test]
    fn test_doses_and_flags() {
        let record = normalize(&validated());
        assert_eq!(record.medication_a_mg, Some(70));
        assert_eq!(record.medication_b_mg, None);
        assert_eq!(record.medication_b.as_deref(), Some("NIE"));
        assert!(record.substance_flag);
        assert_eq!(record.timestamp.map(|t| t.to_string()).as_deref(), Some("2024-02-01 08:30:00"));
    }

    #[test]
    fn test_extract_dose() {
        assert_eq!(extract_dose("TAK(75MG)"), Some(75));
        assert_eq!(extract_dose("150 mg"), Some(150));
        assert_eq!(extract_dose("TAK"), None);
        assert_eq!(extract_dose("NIE"), None);
        assert_eq!(extract_dose("-"), None);
    }

    #[test]
    fn test_non_finite_numbers_are_absent() {
        assert_eq!(parse_number("NaN"), None);
        assert_eq!(parse_number("inf"), None);
        assert_eq!(parse_number("abc"), None);
        assert_eq!(parse_number(" 3 "), Some(3.0));
    }

    #[test]
    fn test_normalization_is_idempotent() {
        let record = normalize(&validated());
        assert_eq!(normalize(&record.to_validated()), record);
    }
}
