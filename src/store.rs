//! Record Store
//!
//! Persists normalized records as a JSON array in a single file. Every
//! operation is load-modify-save; the last writer wins.

use crate::config::get_config;
use crate::dedup::{merge_records, sort_records};
use crate::models::{NormalizedRecord, BASE_COLUMNS, EXTENDED_COLUMNS};
use crate::stats::aggregation::sorted_dates;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

/// Message returned by CSV export when the store is empty
pub const EMPTY_EXPORT_MESSAGE: &str = "No data to export";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct AppendOutcome {
    pub added: usize,
    pub duplicates: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct StoreSummary {
    pub count: usize,
    pub start: Option<String>,
    pub end: Option<String>,
    pub days: usize,
    pub avg_per_day: f64,
}

#[derive(Debug, Clone)]
pub struct RecordStore {
    path: PathBuf,
}

impl RecordStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Store at the configured data file
    pub fn from_config() -> Self {
        Self::new(get_config().storage.data_file.clone())
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All stored records; a missing file is an empty store
    pub async fn load(&self) -> Result<Vec<NormalizedRecord>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "No data file yet");
                return Ok(Vec::new());
            }
            Err(err) => {
                return Err(err).with_context(|| format!("Failed to read {}", self.path.display()))
            }
        };

        if content.trim().is_empty() {
            return Ok(Vec::new());
        }

        let records: Vec<NormalizedRecord> = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse data file: {}", self.path.display()))?;

        debug!(path = %self.path.display(), records = records.len(), "Loaded records");
        Ok(records)
    }

    /// Overwrite the store
    pub async fn save(&self, records: &[NormalizedRecord]) -> Result<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .await
                .with_context(|| format!("Failed to create {}", parent.display()))?;
        }

        let json = serde_json::to_string(records).context("Failed to serialize records")?;
        fs::write(&self.path, json)
            .await
            .with_context(|| format!("Failed to write {}", self.path.display()))?;

        debug!(path = %self.path.display(), records = records.len(), "Saved records");
        Ok(())
    }

    /// Merge new records into the store, skipping known date/time keys
    pub async fn append(&self, incoming: Vec<NormalizedRecord>) -> Result<AppendOutcome> {
        let existing = self.load().await?;
        let merged = merge_records(existing, incoming);
        self.save(&merged.records).await?;

        Ok(AppendOutcome {
            added: merged.added,
            duplicates: merged.duplicates,
        })
    }

    /// Replace the store contents, deduplicated and sorted
    pub async fn replace(&self, records: Vec<NormalizedRecord>) -> Result<AppendOutcome> {
        let merged = merge_records(Vec::new(), records);
        self.save(&merged.records).await?;

        Ok(AppendOutcome {
            added: merged.added,
            duplicates: merged.duplicates,
        })
    }

    pub async fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path).await {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err).with_context(|| format!("Failed to remove {}", self.path.display())),
        }
    }

    pub async fn export_csv(&self) -> Result<String> {
        let mut records = self.load().await?;
        sort_records(&mut records);
        Ok(records_to_csv(&records))
    }

    pub async fn summary(&self) -> Result<StoreSummary> {
        let records = self.load().await?;
        Ok(summarize(&records))
    }
}

fn csv_field(value: &str) -> String {
    if value.contains(',') || value.contains('"') {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

/// CSV in the import column order; absent values are empty cells
pub fn records_to_csv(records: &[NormalizedRecord]) -> String {
    if records.is_empty() {
        return EMPTY_EXPORT_MESSAGE.to_string();
    }

    let extended = records
        .iter()
        .any(|r| r.substance_use.is_some() || r.substance_use_time.is_some());

    let mut header: Vec<&str> = BASE_COLUMNS.to_vec();
    if extended {
        header.extend(EXTENDED_COLUMNS);
    }

    let number = |v: Option<f64>| v.map(|v| v.to_string()).unwrap_or_default();
    let text = |v: &Option<String>| csv_field(v.as_deref().unwrap_or(""));

    let mut rows = vec![header.join(",")];
    for record in records {
        let mut row = vec![
            csv_field(&record.date),
            csv_field(&record.time),
            number(record.sleep_quality),
            number(record.sleep_hours),
            number(record.anxiety),
            number(record.tension),
            number(record.brain_fog),
            number(record.energy),
            number(record.focus),
            record.time_of_day.token().to_string(),
            text(&record.notes),
            text(&record.medication_a),
            text(&record.medication_a_time),
            text(&record.medication_b),
            text(&record.medication_b_time),
        ];
        if extended {
            row.push(text(&record.substance_use));
            row.push(text(&record.substance_use_time));
        }
        rows.push(row.join(","));
    }

    rows.join("\n")
}

pub fn summarize(records: &[NormalizedRecord]) -> StoreSummary {
    if records.is_empty() {
        return StoreSummary::default();
    }

    let dates = sorted_dates(records);
    StoreSummary {
        count: records.len(),
        start: dates.first().cloned(),
        end: dates.last().cloned(),
        days: dates.len(),
        avg_per_day: records.len() as f64 / dates.len() as f64,
    }
}
