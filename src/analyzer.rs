//! Symptom Analysis Engine
//!
//! This module provides the coordinator behind every CLI command. It wires
//! input discovery, parsing, the record store, the statistics engine and the
//! display layer together.
//!
//! ## Command Processing
//!
//! - **import**: parse files, directories, glob patterns or stdin and append
//!   to (or replace) the store
//! - **stats**: consolidated statistics as JSON
//! - **report**: clinical report in the terminal
//! - **correlations**: correlation matrix of daily aggregates
//! - **heatmap**: day x time-of-day matrix of one metric
//! - **export**: CSV export of the store
//! - **summary**: record count and date range
//! - **clear**: delete all stored records
//!
//! ## Import Semantics
//!
//! Lines that fail validation are reported but do not block the valid ones.
//! An import in which no line is valid fails as a whole and leaves the store
//! untouched.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use symptom_tracker::analyzer::{CommandOptions, SymptomAnalyzer};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let analyzer = SymptomAnalyzer::new();
//! let options = CommandOptions {
//!     inputs: vec!["diary.csv".to_string()],
//!     ..CommandOptions::default()
//! };
//! analyzer.run_command("import", options).await?;
//! analyzer.run_command("report", CommandOptions::default()).await?;
//! # Ok(())
//! # }
//! ```

use crate::config::get_config;
use crate::display::DisplayManager;
use crate::file_discovery::{FileDiscovery, InputSource};
use crate::models::Metric;
use crate::parser::{ParseOutcome, RecordParser};
use crate::stats::{
    compute_all, correlation_matrix, prepare_day_time_matrix, AnalysisSettings, ConsolidatedStats,
    CorrelationMatrix, DayTimeMatrix,
};
use crate::store::{RecordStore, EMPTY_EXPORT_MESSAGE};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;
use tracing::{info, warn};

/// Options shared by all commands; each command reads the fields it needs
#[derive(Debug, Clone, Default)]
pub struct CommandOptions {
    pub json_output: bool,
    /// Import inputs: paths, directories, glob patterns or `-`
    pub inputs: Vec<String>,
    /// Import replaces the store instead of appending
    pub replace: bool,
    /// Correlation variables; `None` uses the configured list
    pub variables: Option<Vec<String>>,
    /// Heatmap metric
    pub metric: Option<String>,
    /// Export destination; stdout when `None`
    pub output: Option<PathBuf>,
}

/// What an import did
#[derive(Debug, Clone, PartialEq, Serialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ImportReport {
    pub inputs: usize,
    /// Valid records read from the inputs
    pub parsed: usize,
    pub added: usize,
    pub duplicates: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub replaced: bool,
}

pub struct SymptomAnalyzer {
    store: RecordStore,
    parser: RecordParser,
    discovery: FileDiscovery,
    display_manager: DisplayManager,
    settings: AnalysisSettings,
    max_errors_shown: usize,
}

impl Default for SymptomAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl SymptomAnalyzer {
    /// Analyzer over the configured store and analysis settings
    pub fn new() -> Self {
        let config = get_config();
        Self {
            store: RecordStore::from_config(),
            parser: RecordParser::new(),
            discovery: FileDiscovery::new(),
            display_manager: DisplayManager::with_pretty_json(config.output.json_pretty),
            settings: config.analysis.settings(),
            max_errors_shown: config.output.max_errors_shown,
        }
    }

    /// Analyzer over an explicit store with default settings
    pub fn with_store(store: RecordStore) -> Self {
        Self {
            store,
            parser: RecordParser::new(),
            discovery: FileDiscovery::new(),
            display_manager: DisplayManager::new(),
            settings: AnalysisSettings::default(),
            max_errors_shown: 10,
        }
    }

    pub fn with_settings(mut self, settings: AnalysisSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Parse every input and commit the valid records
    pub async fn import(&self, inputs: &[String], replace: bool) -> Result<ImportReport> {
        let sources = self.discovery.resolve_inputs(inputs)?;
        let label_errors = sources.len() > 1;
        let mut outcome = ParseOutcome::default();

        for source in &sources {
            let (label, mut parsed) = match source {
                InputSource::Stdin => {
                    let mut text = String::new();
                    tokio::io::stdin()
                        .read_to_string(&mut text)
                        .await
                        .context("Failed to read stdin")?;
                    ("stdin".to_string(), self.parser.parse(&text))
                }
                InputSource::File(path) => {
                    (path.display().to_string(), self.parser.parse_file(path).await?)
                }
            };

            if label_errors {
                parsed.errors = parsed
                    .errors
                    .into_iter()
                    .map(|e| format!("{}: {}", label, e))
                    .collect();
            }
            outcome.merge(parsed);
        }

        self.commit(outcome, sources.len(), replace).await
    }

    /// Import already-read text
    pub async fn import_text(&self, text: &str, replace: bool) -> Result<ImportReport> {
        let outcome = self.parser.parse(text);
        self.commit(outcome, 1, replace).await
    }

    async fn commit(&self, outcome: ParseOutcome, inputs: usize, replace: bool) -> Result<ImportReport> {
        if outcome.records.is_empty() {
            if outcome.errors.is_empty() {
                anyhow::bail!("No valid records found");
            }
            anyhow::bail!(
                "No valid records found ({} error(s)):\n{}",
                outcome.errors.len(),
                outcome.errors.join("\n")
            );
        }

        let parsed = outcome.records.len();
        let appended = if replace {
            self.store.replace(outcome.records).await?
        } else {
            self.store.append(outcome.records).await?
        };

        if outcome.errors.is_empty() {
            info!(added = appended.added, duplicates = appended.duplicates, "Import complete");
        } else {
            warn!(
                added = appended.added,
                rejected = outcome.errors.len(),
                "Import complete with rejected lines"
            );
        }

        Ok(ImportReport {
            inputs,
            parsed,
            added: appended.added,
            duplicates: appended.duplicates,
            skipped: outcome.skipped,
            errors: outcome.errors,
            replaced: replace,
        })
    }

    pub async fn stats(&self) -> Result<ConsolidatedStats> {
        let records = self.store.load().await?;
        Ok(compute_all(&records, &self.settings))
    }

    pub async fn correlations(&self, variables: Option<&[String]>) -> Result<CorrelationMatrix> {
        let records = self.store.load().await?;
        let variables = variables.unwrap_or(&get_config().analysis.correlation_variables);
        Ok(correlation_matrix(&records, variables))
    }

    pub async fn heatmap(&self, metric_name: &str) -> Result<DayTimeMatrix> {
        let metric = Metric::from_key(metric_name).with_context(|| {
            let known: Vec<&str> = Metric::ALL.iter().map(|m| m.key()).collect();
            format!("Unknown metric '{}' (expected one of: {})", metric_name, known.join(", "))
        })?;
        let records = self.store.load().await?;
        Ok(prepare_day_time_matrix(&records, metric))
    }

    pub async fn run_command(&self, command: &str, options: CommandOptions) -> Result<()> {
        let display = &self.display_manager;

        match command {
            "import" => {
                let report = self.import(&options.inputs, options.replace).await?;
                if options.json_output {
                    display.display_json(&report)?;
                } else {
                    display.display_import(&report, self.max_errors_shown);
                }
            }
            "stats" => {
                let stats = self.stats().await?;
                if options.json_output {
                    display.display_json(&stats)?;
                } else {
                    display.display_report(&stats);
                }
            }
            "report" => {
                let stats = self.stats().await?;
                display.display_report(&stats);
            }
            "correlations" => {
                let matrix = self.correlations(options.variables.as_deref()).await?;
                if options.json_output {
                    display.display_json(&matrix)?;
                } else {
                    display.display_correlations(&matrix);
                }
            }
            "heatmap" => {
                let metric = options.metric.as_deref().unwrap_or("anxiety");
                let matrix = self.heatmap(metric).await?;
                if options.json_output {
                    display.display_json(&matrix)?;
                } else {
                    display.display_heatmap(&matrix);
                }
            }
            "export" => {
                let csv = self.store.export_csv().await?;
                match options.output {
                    Some(path) if csv != EMPTY_EXPORT_MESSAGE => {
                        tokio::fs::write(&path, format!("{}\n", csv))
                            .await
                            .with_context(|| format!("Failed to write {}", path.display()))?;
                        // one header line precedes the rows
                        let rows = csv.lines().count().saturating_sub(1);
                        println!("Exported {} record(s) to {}", rows, path.display());
                    }
                    _ => println!("{}", csv),
                }
            }
            "summary" => {
                let summary = self.store.summary().await?;
                if options.json_output {
                    display.display_json(&summary)?;
                } else {
                    display.display_summary(&summary);
                }
            }
            "clear" => {
                self.store.clear().await?;
                if options.json_output {
                    println!("{{\"cleared\": true}}");
                } else {
                    println!("Cleared all records from {}", self.store.path().display());
                }
            }
            _ => {
                anyhow::bail!("Unknown command: {}", command);
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "Data,Czas,JakośćSnu,GodzinySnu,Lęk,Napięcie,BrainFog,Energia,Fokus,PoraDnia,Notatki,Elvanse,ElvanseGodzina,Pregabalina,PregabalinaGodzina\n\
        01/01/2024,08:00,7,8,6,5,4,6,7,RANO,-,TAK(70MG),07:30,-,-\n\
        01/01/2024,20:00,7,8,5,4,4,6,7,WIECZÓR,-,-,-,TAK(150MG),20:00\n\
        02/01/2024,08:00,6,7,4,3,3,6,7,RANO,-,TAK(70MG),07:30,-,-\n";

    #[tokio::test]
    async fn test_import_then_stats() {
        let dir = TempDir::new().unwrap();
        let analyzer = SymptomAnalyzer::with_store(RecordStore::new(dir.path().join("records.json")));

        let report = analyzer.import_text(SAMPLE, false).await.unwrap();
        assert_eq!(report.added, 3);
        assert_eq!(report.skipped, 1);

        let again = analyzer.import_text(SAMPLE, false).await.unwrap();
        assert_eq!(again.added, 0);
        assert_eq!(again.duplicates, 3);

        let stats = analyzer.stats().await.unwrap();
        assert_eq!(stats.period.days, 2);
        assert_eq!(stats.period.measurements, 3);
        assert_eq!(stats.daily[0].dose_a_mg, Some(70.0));
        assert_eq!(stats.daily[0].dose_b_mg, Some(150.0));
    }

    #[tokio::test]
    async fn test_import_with_only_errors_fails() {
        let dir = TempDir::new().unwrap();
        let analyzer = SymptomAnalyzer::with_store(RecordStore::new(dir.path().join("records.json")));

        let err = analyzer
            .import_text("01/01/2024,08:00,7,8,11,5,4,6,7,RANO,-,-,-,-,-", false)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("Line 1"));
        assert!(analyzer.store().load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_export_command_round_trips_notes() {
        let dir = TempDir::new().unwrap();
        let analyzer = SymptomAnalyzer::with_store(RecordStore::new(dir.path().join("records.json")));
        analyzer
            .import_text(
                "01/01/2024,08:00,7,8,6,5,4,6,7,RANO,slept badly,woke at \"3\",TAK(70MG),07:30,-,-\n\
                 01/01/2024,20:00,7,8,5,4,4,6,7,WIECZÓR,-,-,-,TAK(150MG),20:00",
                false,
            )
            .await
            .unwrap();
        let stored = analyzer.store().load().await.unwrap();
        assert_eq!(stored[0].notes.as_deref(), Some("slept badly, woke at \"3\""));

        let out = dir.path().join("export.csv");
        let options = CommandOptions {
            output: Some(out.clone()),
            ..Default::default()
        };
        analyzer.run_command("export", options).await.unwrap();

        let exported = std::fs::read_to_string(&out).unwrap();
        assert_eq!(exported, format!("{}\n", analyzer.store().export_csv().await.unwrap()));
        assert!(exported.contains("\"slept badly, woke at \"\"3\"\"\""));

        let report = analyzer.import_text(&exported, true).await.unwrap();
        assert_eq!(report.added, 2);
        assert!(report.errors.is_empty());

        let reloaded = analyzer.store().load().await.unwrap();
        assert_eq!(reloaded[0].notes, stored[0].notes);
        assert_eq!(reloaded[0].medication_a, stored[0].medication_a);
        assert_eq!(reloaded[1].medication_b_mg, Some(150));
    }

    #[tokio::test]
    async fn test_unknown_heatmap_metric() {
        let dir = TempDir::new().unwrap();
        let analyzer = SymptomAnalyzer::with_store(RecordStore::new(dir.path().join("records.json")));
        assert!(analyzer.heatmap("weather").await.is_err());
        assert!(analyzer.heatmap("lek").await.is_ok());
    }
}
