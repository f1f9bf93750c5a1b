//! Deduplication Engine
//!
//! Prevents the same measurement from being stored twice when overlapping
//! exports are imported. A record's identity is its date and time
//! (`"{date}_{time}"`); the first occurrence wins, whether it is already in
//! the store or earlier in the same import.
//!
//! ## Key Types
//!
//! - [`DeduplicationEngine`] - tracks seen keys
//! - [`MergeOutcome`] - merged record list plus counts
//!
//! ## Ordering
//!
//! Merged records are sorted by calendar date and then wall-clock time. A date
//! or time that does not parse sorts after the valid ones, by its text.

use crate::models::NormalizedRecord;
use crate::timestamp_parser::TimestampParser;
use std::cmp::Ordering;
use std::collections::HashSet;
use tracing::debug;

#[derive(Debug, Default)]
pub struct DeduplicationEngine {
    seen_keys: HashSet<String>,
}

impl DeduplicationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine pre-seeded with the keys of already stored records
    pub fn with_existing(records: &[NormalizedRecord]) -> Self {
        Self {
            seen_keys: records.iter().map(NormalizedRecord::dedup_key).collect(),
        }
    }

    pub fn is_duplicate(&self, record: &NormalizedRecord) -> bool {
        self.seen_keys.contains(&record.dedup_key())
    }

    /// Record the key; returns `false` if it was already known
    pub fn insert(&mut self, record: &NormalizedRecord) -> bool {
        self.seen_keys.insert(record.dedup_key())
    }

    pub fn len(&self) -> usize {
        self.seen_keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen_keys.is_empty()
    }
}

#[derive(Debug, Clone, Default)]
pub struct MergeOutcome {
    pub records: Vec<NormalizedRecord>,
    pub added: usize,
    pub duplicates: usize,
}

/// Append `incoming` to `existing`, skipping known keys, and sort the result
pub fn merge_records(existing: Vec<NormalizedRecord>, incoming: Vec<NormalizedRecord>) -> MergeOutcome {
    let mut engine = DeduplicationEngine::with_existing(&existing);
    let mut records = existing;
    let mut added = 0;
    let mut duplicates = 0;

    for record in incoming {
        if engine.is_duplicate(&record) {
            debug!(key = %record.dedup_key(), "Skipping duplicate record");
            duplicates += 1;
            continue;
        }
        engine.insert(&record);
        records.push(record);
        added += 1;
    }

    sort_records(&mut records);

    debug!(added, duplicates, total = records.len(), "Merged records");

    MergeOutcome {
        records,
        added,
        duplicates,
    }
}

/// Total order on (date, time); each part compares parsed values first and
/// puts unparsable text after them, ordered by string
pub fn compare_records(a: &NormalizedRecord, b: &NormalizedRecord) -> Ordering {
    TimestampParser::compare_dates(&a.date, &b.date)
        .then_with(|| TimestampParser::compare_times(&a.time, &b.time))
}

/// Stable chronological sort
pub fn sort_records(records: &mut [NormalizedRecord]) {
    records.sort_by(compare_records);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::RecordParser;

    fn records(text: &str) -> Vec<NormalizedRecord> {
        RecordParser::new().parse(text).records
    }

    #[test]
    fn test_engine_tracks_keys() {
        let batch = records("01/01/2024,08:00,7,8,3,2,4,6,7,RANO,-,-,-,-,-");
        let mut engine = DeduplicationEngine::new();
        assert!(engine.is_empty());
        assert!(engine.insert(&batch[0]));
        assert!(engine.is_duplicate(&batch[0]));
        assert!(!engine.insert(&batch[0]));
        assert_eq!(engine.len(), 1);
    }

    #[test]
    fn test_unparsable_time_sorts_consistently() {
        let mut batch = records(
            "01/01/2024,10:00,7,8,3,2,4,6,7,RANO,-,-,-,-,-\n\
             01/01/2024,1:99,7,8,3,2,4,6,7,RANO,-,-,-,-,-\n\
             01/01/2024,8:00,7,8,3,2,4,6,7,RANO,-,-,-,-,-",
        );
        assert_eq!(batch[1].timestamp, None);

        for a in &batch {
            for b in &batch {
                for c in &batch {
                    if compare_records(a, b) == Ordering::Less && compare_records(b, c) == Ordering::Less {
                        assert_eq!(compare_records(a, c), Ordering::Less);
                    }
                }
            }
        }

        sort_records(&mut batch);
        let times: Vec<&str> = batch.iter().map(|r| r.time.as_str()).collect();
        assert_eq!(times, vec!["8:00", "10:00", "1:99"]);
    }

    #[test]
    fn test_duplicates_within_one_import() {
        let incoming = records(
            "02/01/2024,08:00,7,8,3,2,4,6,7,RANO,-,-,-,-,-\n\
             01/01/2024,08:00,7,8,3,2,4,6,7,RANO,-,-,-,-,-\n\
             02/01/2024,08:00,1,1,1,1,1,1,1,RANO,-,-,-,-,-",
        );
        let outcome = merge_records(Vec::new(), incoming);
        assert_eq!(outcome.added, 2);
        assert_eq!(outcome.duplicates, 1);
        assert_eq!(outcome.records[0].date, "01/01/2024");
        assert_eq!(outcome.records[1].anxiety, Some(3.0));
    }
}
