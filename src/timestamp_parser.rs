use anyhow::{Context, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use std::cmp::Ordering;

/// Handles parsing the `DD/MM/YYYY` dates and `H:MM` times of the import format
pub struct TimestampParser;

impl TimestampParser {
    /// Parse a `DD/MM/YYYY` date
    pub fn parse_date(date_str: &str) -> Result<NaiveDate> {
        NaiveDate::parse_from_str(date_str.trim(), "%d/%m/%Y")
            .with_context(|| format!("Failed to parse date: {}", date_str))
    }

    /// Parse an `H:MM` or `HH:MM` wall-clock time
    pub fn parse_time(time_str: &str) -> Result<NaiveTime> {
        NaiveTime::parse_from_str(time_str.trim(), "%H:%M")
            .with_context(|| format!("Failed to parse time: {}", time_str))
    }

    /// Combine a date and a time into one naive local timestamp
    pub fn parse(date_str: &str, time_str: &str) -> Result<NaiveDateTime> {
        let date = Self::parse_date(date_str)?;
        let time = Self::parse_time(time_str)?;
        Ok(date.and_time(time))
    }

    /// Chronological ordering of two date strings. Unparsable dates sort
    /// after parsable ones and among themselves by string.
    pub fn compare_dates(a: &str, b: &str) -> Ordering {
        match (Self::parse_date(a).ok(), Self::parse_date(b).ok()) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }

    /// Wall-clock ordering of two time strings, with the same fallback as
    /// [`TimestampParser::compare_dates`]
    pub fn compare_times(a: &str, b: &str) -> Ordering {
        match (Self::parse_time(a).ok(), Self::parse_time(b).ok()) {
            (Some(x), Some(y)) => x.cmp(&y).then_with(|| a.cmp(b)),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => a.cmp(b),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_date_and_time() {
        let ts = TimestampParser::parse("05/03/2024", "8:05").unwrap();
        assert_eq!(ts.to_string(), "2024-03-05 08:05:00");
    }

    #[test]
    fn test_parse_two_digit_hour() {
        let ts = TimestampParser::parse("31/12/2023", "23:59").unwrap();
        assert_eq!(ts.to_string(), "2023-12-31 23:59:00");
    }

    #[test]
    fn test_parse_invalid() {
        assert!(TimestampParser::parse("31/02/2024", "08:00").is_err());
        assert!(TimestampParser::parse("01/01/2024", "25:00").is_err());
        assert!(TimestampParser::parse_date("2024-01-01").is_err());
    }

    #[test]
    fn test_compare_times() {
        assert_eq!(TimestampParser::compare_times("8:00", "10:00"), Ordering::Less);
        assert_eq!(TimestampParser::compare_times("1:99", "8:00"), Ordering::Greater);
        assert_eq!(TimestampParser::compare_times("08:00", "8:00"), Ordering::Less);
    }

    #[test]
    fn test_compare_dates_is_chronological() {
        assert_eq!(
            TimestampParser::compare_dates("02/01/2024", "10/12/2023"),
            Ordering::Greater
        );
        assert_eq!(
            TimestampParser::compare_dates("bogus", "01/01/2024"),
            Ordering::Greater
        );
    }
}
