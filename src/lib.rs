//! Symptom Tracker Library
//!
//! A Rust library for tracking daily mood, cognition, sleep and medication
//! measurements entered as comma-separated diary lines, and for turning them
//! into trend statistics and a clinical-style report.
//!
//! ## Core Features
//!
//! - **Tolerant parsing**: two column layouts, notes that contain commas,
//!   per-line validation with line-numbered errors
//! - **Typed normalization**: absent measurements are `None`, never zero;
//!   medication doses are extracted from free text
//! - **Statistics engine**: daily and time-of-day aggregation, OLS trends with
//!   Student's t p-values, Pearson correlation matrices, half-period
//!   comparison and fixed-size period summaries
//! - **Local store**: JSON file with date/time deduplication and CSV export
//! - **Flexible output formats**: coloured terminal report and JSON
//!
//! ## Architecture Overview
//!
//! - [`models`] - Record types and the constants table (sentinels, tokens, field aliases)
//! - [`parser`] - Line splitting, schema detection, column repair and validation
//! - [`normalizer`] - String fields to typed values
//! - [`stats`] - Aggregation, regression, periods, daily series and the [`stats::compute_all`] facade
//! - [`dedup`] - Key-based deduplication and chronological ordering
//! - [`store`] - Async JSON persistence
//! - [`file_discovery`] - Resolution of import paths and glob patterns
//! - [`display`] - Terminal and JSON rendering
//! - [`analyzer`] - Command coordinator used by the CLI
//! - [`config`] - Configuration management with environment variable support
//! - [`logging`] - Structured logging with JSON and pretty-print formats
//!
//! ## Main Entry Point
//!
//! ```rust
//! use symptom_tracker::parser::RecordParser;
//! use symptom_tracker::stats::{compute_all, AnalysisSettings};
//!
//! let text = "01/01/2024,08:00,7,8,6,5,4,6,7,RANO,-,TAK(70MG),07:30,-,-\n\
//!             02/01/2024,08:00,7,8,4,3,4,6,7,RANO,-,TAK(70MG),07:30,-,-";
//! let outcome = RecordParser::new().parse(text);
//! assert!(outcome.errors.is_empty());
//!
//! let stats = compute_all(&outcome.records, &AnalysisSettings::default());
//! assert_eq!(stats.period.days, 2);
//! assert!(stats.trends.anxiety.slope() < 0.0);
//! ```

pub mod analyzer;
pub mod config;
pub mod dedup;
pub mod display;
pub mod file_discovery;
pub mod logging;
pub mod models;
pub mod normalizer;
pub mod parser;
pub mod stats;
pub mod store;
pub mod timestamp_parser;

pub use analyzer::SymptomAnalyzer;
pub use models::*;
