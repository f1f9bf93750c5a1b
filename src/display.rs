//! Output Formatting and Display Management
//!
//! This module handles all output of the symptom tracker. It provides both
//! human-readable terminal output with colors and structured JSON output for
//! programmatic consumption.
//!
//! ## Report Types
//!
//! - **Clinical Report**: observation period, period table, anxiety/tension
//!   trends with a response assessment, focus/energy stability, intraday
//!   patterns, 3-day moving averages, weekly means, sleep against next-day
//!   symptoms, the positive/negative symptom balance and conclusions
//! - **Correlation Table**: pairwise Pearson r between daily aggregates
//! - **Heatmap**: day x time-of-day means of one metric
//! - **Import Feedback**: added/duplicate counts and rejected lines
//! - **JSON Output**: any of the above as serialized data
//!
//! ## Conventions
//!
//! Brain fog is shown as *clarity* (`11 - x`) in the period table so that a
//! higher number is better in every column; its trend is negated to match.
//! Period trends are coloured green below -0.1 (improving for symptoms) and
//! red above 0.1.
//!
//! Every `render_*` method returns the text; the matching `display_*` method
//! prints it.

use crate::analyzer::ImportReport;
use crate::models::{Metric, TimeOfDay};
use crate::stats::{
    ConsolidatedStats, CorrelationMatrix, DayTimeMatrix, MovingAverages, PValueMethod, Period,
    RegressionResult, StabilityTrend, TrendSummary, WeeklySummary,
};
use crate::stats::aggregation::present_mean;
use crate::store::StoreSummary;
use anyhow::{Context, Result};
use colored::Colorize;
use serde::Serialize;
use std::fmt::Write as _;

const RULE_WIDTH: usize = 80;

/// Overall reading of the anxiety and tension trends
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum ResponseAssessment {
    /// Both slopes below -0.05 per day
    Positive,
    /// At least one slope below zero
    PartiallyPositive,
    Inconclusive,
}

impl ResponseAssessment {
    pub fn from_trends(trends: &TrendSummary) -> Self {
        let anxiety = trends.anxiety.slope();
        let tension = trends.tension.slope();

        if anxiety < -0.05 && tension < -0.05 {
            Self::Positive
        } else if anxiety < 0.0 || tension < 0.0 {
            Self::PartiallyPositive
        } else {
            Self::Inconclusive
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Positive => "POSITIVE",
            Self::PartiallyPositive => "PARTIALLY POSITIVE",
            Self::Inconclusive => "INCONCLUSIVE / NEGATIVE",
        }
    }
}

/// `0.0123 (significant)`; approximate p-values are prefixed with `~`
pub fn format_p_value(result: &RegressionResult, level: f64) -> String {
    if result.p_value.is_nan() {
        return "N/A".to_string();
    }
    let marker = match result.p_value_method {
        PValueMethod::Approximate => "~",
        PValueMethod::StudentT => "",
    };
    let verdict = if result.p_value < level {
        "significant"
    } else {
        "not significant"
    };
    format!("{}{:.4} ({})", marker, result.p_value, verdict)
}

fn format_value(value: Option<f64>) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{:.2}", v))
}

fn format_trend(trend: f64) -> String {
    let text = format!("{:+.3}", trend);
    if trend < -0.1 {
        text.green().to_string()
    } else if trend > 0.1 {
        text.red().to_string()
    } else {
        text.dimmed().to_string()
    }
}

pub struct DisplayManager {
    json_pretty: bool,
}

impl Default for DisplayManager {
    fn default() -> Self {
        Self::new()
    }
}

impl DisplayManager {
    pub fn new() -> Self {
        Self { json_pretty: false }
    }

    pub fn with_pretty_json(json_pretty: bool) -> Self {
        Self { json_pretty }
    }

    pub fn to_json<T: Serialize>(&self, value: &T) -> Result<String> {
        let json = if self.json_pretty {
            serde_json::to_string_pretty(value)
        } else {
            serde_json::to_string(value)
        };
        json.context("Failed to serialize output")
    }

    pub fn display_json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", self.to_json(value)?);
        Ok(())
    }

    fn header(out: &mut String, title: &str) {
        let _ = writeln!(out, "\n{}", "=".repeat(RULE_WIDTH).bright_cyan());
        let _ = writeln!(out, "{}", title.bright_white().bold());
        let _ = writeln!(out, "{}", "=".repeat(RULE_WIDTH).bright_cyan());
    }

    fn section(out: &mut String, title: &str) {
        let _ = writeln!(out, "\n{}", title.bright_yellow().bold());
        let _ = writeln!(out, "{}", "-".repeat(title.chars().count()).bright_black());
    }

    pub fn display_report(&self, stats: &ConsolidatedStats) {
        print!("{}", self.render_report(stats));
    }

    /// The full clinical report
    pub fn render_report(&self, stats: &ConsolidatedStats) -> String {
        let mut out = String::new();
        Self::header(&mut out, "Symptom Tracker - Clinical Report");

        if stats.is_empty() {
            let _ = writeln!(
                out,
                "{}",
                "No data. Import records first with `symptom-tracker import <FILE>`.".yellow()
            );
            return out;
        }

        self.render_period_info(&mut out, stats);
        self.render_period_table(&mut out, &stats.periods);
        self.render_trends(&mut out, stats);
        self.render_stability(&mut out, stats);
        self.render_intraday(&mut out, stats);
        self.render_moving_averages(&mut out, &stats.moving_averages);
        self.render_weekly(&mut out, &stats.weekly);
        self.render_sleep_next_day(&mut out, stats);
        self.render_symptom_balance(&mut out, stats);
        self.render_conclusions(&mut out, stats);
        out
    }

    fn render_period_info(&self, out: &mut String, stats: &ConsolidatedStats) {
        let period = &stats.period;
        Self::section(out, "Observation Period");
        let _ = writeln!(
            out,
            "Period:               {} - {}",
            period.start.as_deref().unwrap_or("-").bold(),
            period.end.as_deref().unwrap_or("-").bold()
        );
        let _ = writeln!(out, "Days:                 {}", period.days);
        let _ = writeln!(out, "Measurements:         {}", period.measurements);
        let per_day = if period.days > 0 {
            format!("{:.1}", period.measurements as f64 / period.days as f64)
        } else {
            "-".to_string()
        };
        let _ = writeln!(out, "Measurements per day: {}", per_day);
    }

    fn render_period_table(&self, out: &mut String, periods: &[Period]) {
        if periods.is_empty() {
            return;
        }

        Self::section(out, "Period Analysis (mean / trend per day)");
        let columns = [
            (Metric::Anxiety, "Anxiety"),
            (Metric::Tension, "Tension"),
            (Metric::Focus, "Focus"),
            (Metric::Energy, "Energy"),
            (Metric::BrainFog, "Clarity"),
            (Metric::SleepQuality, "Sleep"),
        ];

        let _ = write!(out, "{:<26}", "Period".bold());
        for (_, label) in &columns {
            let _ = write!(out, "{:>16}", label.bold());
        }
        out.push('\n');

        for period in periods {
            let label = format!("#{} {} - {}", period.number, period.start_date, period.end_date);
            let _ = write!(out, "{:<26}", label);
            for (metric, _) in &columns {
                let (value, trend) = if *metric == Metric::BrainFog {
                    (
                        period.average(*metric).map(|v| 11.0 - v),
                        -period.trend(*metric),
                    )
                } else {
                    (period.average(*metric), period.trend(*metric))
                };
                // pad before colouring so ANSI codes don't break alignment
                let cell = format!("{} / {}", format_value(value), format_trend(trend));
                let visible = format!("{} / {:+.3}", format_value(value), trend).chars().count();
                let _ = write!(out, "{}{}", " ".repeat(16usize.saturating_sub(visible)), cell);
            }
            out.push('\n');
        }
        let _ = writeln!(
            out,
            "{}",
            "Trend: negative = symptoms easing, positive = worsening (clarity shown inverted)".dimmed()
        );
    }

    fn render_trends(&self, out: &mut String, stats: &ConsolidatedStats) {
        let assessment = ResponseAssessment::from_trends(&stats.trends);
        Self::section(out, "Anxiety and Tension Trends");

        let label = match assessment {
            ResponseAssessment::Positive => assessment.label().green().bold(),
            ResponseAssessment::PartiallyPositive => assessment.label().yellow().bold(),
            ResponseAssessment::Inconclusive => assessment.label().red().bold(),
        };
        let _ = writeln!(out, "Treatment response: {}", label);

        for (metric, trend) in [
            (Metric::Anxiety, &stats.trends.anxiety),
            (Metric::Tension, &stats.trends.tension),
        ] {
            let result = &trend.regression;
            let _ = writeln!(out, "\n{}:", metric.label().bold());
            let _ = writeln!(out, "  Slope:        {:.4} points/day", result.slope);
            let _ = writeln!(out, "  r (vs time):  {:.3}", result.r);
            let _ = writeln!(
                out,
                "  p-value:      {}",
                format_p_value(result, stats.significance_level)
            );
            let _ = writeln!(
                out,
                "  First half:   {} -> second half: {}",
                format_value(stats.comparison.first_half.get(&metric).copied()),
                format_value(stats.comparison.second_half.get(&metric).copied())
            );
            let change = stats
                .comparison
                .change
                .get(&metric)
                .map_or_else(|| "-".to_string(), |c| format!("{:+.1}%", c));
            let _ = writeln!(out, "  Change:       {}", change);
        }

        if stats.trends.anxiety.regression.p_value_method == PValueMethod::Approximate {
            let _ = writeln!(out, "{}", "~ approximate p-values (|t| > 2 rule)".dimmed());
        }
    }

    fn render_stability(&self, out: &mut String, stats: &ConsolidatedStats) {
        Self::section(out, "Focus and Energy Stability");
        for metric in [Metric::Focus, Metric::Energy] {
            let Some(stability) = stats.stability.get(&metric) else {
                continue;
            };
            let verdict = match stability.trend {
                StabilityTrend::Stable => "stable or rising".green(),
                StabilityTrend::Declining => "DECLINING".red().bold(),
            };
            let _ = writeln!(
                out,
                "{:<8} {} -> {}  {}",
                metric.label(),
                format_value(stability.first_half),
                format_value(stability.second_half),
                verdict
            );
        }
    }

    fn render_intraday(&self, out: &mut String, stats: &ConsolidatedStats) {
        let intraday = &stats.intraday;
        Self::section(out, "Intraday Patterns (anxiety)");
        let label = |t: Option<TimeOfDay>| t.map_or("-", TimeOfDay::label);
        let _ = writeln!(out, "Worst time of day: {}", label(intraday.worst_time).red());
        let _ = writeln!(out, "Best time of day:  {}", label(intraday.best_time).green());
        for (bucket, mean) in &intraday.anxiety_by_time {
            let _ = writeln!(out, "  {:<10} {:.2}", bucket.label(), mean);
        }
    }

    fn render_moving_averages(&self, out: &mut String, averages: &MovingAverages) {
        Self::section(out, &format!("{}-Day Moving Average", averages.window));
        for (label, series) in [("Anxiety", &averages.anxiety), ("Tension", &averages.tension)] {
            let first = series.iter().flatten().next().copied();
            let last = series.iter().flatten().last().copied();
            let _ = writeln!(
                out,
                "{:<8} {} -> {}",
                label,
                format_value(first),
                format_value(last)
            );
        }
    }

    fn render_weekly(&self, out: &mut String, weeks: &[WeeklySummary]) {
        if weeks.is_empty() {
            return;
        }

        Self::section(out, "Weekly Comparison (mean of daily values)");
        let _ = writeln!(
            out,
            "{:<14}{:>6}{:>10}{:>10}{:>10}{:>10}",
            "Week".bold(),
            "Days".bold(),
            "Anxiety".bold(),
            "Tension".bold(),
            "Focus".bold(),
            "Energy".bold()
        );
        for week in weeks {
            let _ = writeln!(
                out,
                "{:<14}{:>6}{:>10}{:>10}{:>10}{:>10}",
                format!("{} w{}", week.year, week.week),
                week.days,
                format_value(week.anxiety),
                format_value(week.tension),
                format_value(week.focus),
                format_value(week.energy)
            );
        }
    }

    fn render_regression_line(&self, out: &mut String, label: &str, result: &RegressionResult, level: f64) {
        if result.n < 2 {
            let _ = writeln!(out, "{:<22} {}", label, "not enough data".dimmed());
            return;
        }
        let _ = writeln!(
            out,
            "{:<22} slope {:+.3}  r {:+.3}  p {}  (n = {})",
            label,
            result.slope,
            result.r,
            format_p_value(result, level),
            result.n
        );
    }

    fn render_sleep_next_day(&self, out: &mut String, stats: &ConsolidatedStats) {
        Self::section(out, "Sleep Quality vs. Next-Day Symptoms");
        let level = stats.significance_level;
        self.render_regression_line(out, "Next-day anxiety:", &stats.sleep_next_day.anxiety, level);
        self.render_regression_line(out, "Next-day tension:", &stats.sleep_next_day.tension, level);
    }

    fn render_symptom_balance(&self, out: &mut String, stats: &ConsolidatedStats) {
        let balance = &stats.symptom_balance;
        Self::section(out, "Positive vs. Negative Symptoms");
        let positive: Vec<Option<f64>> = balance.points.iter().map(|p| Some(p.positive)).collect();
        let negative: Vec<Option<f64>> = balance.points.iter().map(|p| Some(p.negative)).collect();
        let _ = writeln!(
            out,
            "Mean positive (focus, energy, clarity): {}",
            format_value(present_mean(positive))
        );
        let _ = writeln!(
            out,
            "Mean negative (anxiety, tension):       {}",
            format_value(present_mean(negative))
        );
        self.render_regression_line(out, "Negative vs. positive:", &balance.regression, stats.significance_level);
    }

    fn render_conclusions(&self, out: &mut String, stats: &ConsolidatedStats) {
        Self::section(out, "Conclusions");
        let anxiety = &stats.trends.anxiety;
        let strength = if anxiety.significant {
            "a SIGNIFICANT"
        } else {
            "a MODERATE"
        };
        let _ = writeln!(
            out,
            "* The anxiety trend shows {} change over the observation period.",
            strength
        );

        let first = stats.comparison.first_half.get(&Metric::Anxiety);
        let second = stats.comparison.second_half.get(&Metric::Anxiety);
        let change = stats.comparison.change.get(&Metric::Anxiety);
        match (first, second, change) {
            (Some(first), Some(second), Some(change)) => {
                let direction = if change <= &0.0 { "fell" } else { "rose" };
                let _ = writeln!(
                    out,
                    "* Mean anxiety {} from {:.1} to {:.1} points (1-10 scale), a {:.0}% change.",
                    direction,
                    first,
                    second,
                    change.abs()
                );
            }
            _ => {
                let _ = writeln!(out, "* Not enough data to compare the two halves of the period.");
            }
        }

        let declining: Vec<&str> = stats
            .stability
            .iter()
            .filter(|(_, s)| s.trend == StabilityTrend::Declining)
            .map(|(m, _)| m.label())
            .collect();
        if declining.is_empty() {
            let _ = writeln!(out, "* No meaningful decline in focus or energy was observed.");
        } else {
            let _ = writeln!(
                out,
                "* Declining: {}. Worth monitoring.",
                declining.join(", ")
            );
        }

        let sleep = &stats.sleep_next_day.anxiety;
        if sleep.is_significant(stats.significance_level) && sleep.slope < 0.0 {
            let _ = writeln!(out, "* Better sleep was followed by lower anxiety the next day.");
        }
    }

    pub fn display_import(&self, report: &ImportReport, max_errors: usize) {
        print!("{}", self.render_import(report, max_errors));
    }

    pub fn render_import(&self, report: &ImportReport, max_errors: usize) -> String {
        let mut out = String::new();
        let verb = if report.replaced { "Replaced store with" } else { "Imported" };
        let _ = writeln!(
            out,
            "{} {} new record(s) from {} input(s)",
            verb.green().bold(),
            report.added.to_string().bold(),
            report.inputs
        );
        if report.duplicates > 0 {
            let _ = writeln!(out, "Skipped {} duplicate(s)", report.duplicates.to_string().yellow());
        }

        if !report.errors.is_empty() {
            let _ = writeln!(
                out,
                "{} {} line(s) rejected:",
                "Warning:".yellow().bold(),
                report.errors.len()
            );
            for error in report.errors.iter().take(max_errors) {
                let _ = writeln!(out, "  {}", error);
            }
            if report.errors.len() > max_errors {
                let _ = writeln!(out, "  ... and {} more", report.errors.len() - max_errors);
            }
        }
        out
    }

    pub fn display_correlations(&self, matrix: &CorrelationMatrix) {
        print!("{}", self.render_correlations(matrix));
    }

    pub fn render_correlations(&self, matrix: &CorrelationMatrix) -> String {
        let mut out = String::new();
        Self::header(&mut out, "Correlation Matrix (daily means, Pearson r)");
        if matrix.is_empty() {
            let _ = writeln!(out, "{}", "No data.".yellow());
            return out;
        }

        let width = matrix
            .labels
            .iter()
            .map(|l| l.chars().count())
            .max()
            .unwrap_or(0)
            .max(6)
            + 2;

        let _ = write!(out, "{:width$}", "", width = width);
        for label in &matrix.labels {
            let _ = write!(out, "{:>width$}", label, width = width);
        }
        out.push('\n');

        for (label, row) in matrix.labels.iter().zip(&matrix.matrix) {
            let _ = write!(out, "{:<width$}", label.bold(), width = width);
            for r in row {
                let cell = format!("{:>width$.2}", r, width = width);
                let coloured = if *r >= 0.5 {
                    cell.green()
                } else if *r <= -0.5 {
                    cell.red()
                } else {
                    cell.normal()
                };
                let _ = write!(out, "{}", coloured);
            }
            out.push('\n');
        }
        out
    }

    pub fn display_heatmap(&self, matrix: &DayTimeMatrix) {
        print!("{}", self.render_heatmap(matrix));
    }

    pub fn render_heatmap(&self, matrix: &DayTimeMatrix) -> String {
        let mut out = String::new();
        let title = if matrix.metric == Metric::BrainFog {
            "Heatmap: Clarity (11 - brain fog) by day and time of day".to_string()
        } else {
            format!("Heatmap: {} by day and time of day", matrix.metric.label())
        };
        Self::header(&mut out, &title);

        if matrix.dates.is_empty() {
            let _ = writeln!(out, "{}", "No data.".yellow());
            return out;
        }

        let _ = write!(out, "{:<12}", "");
        for date in &matrix.dates {
            let _ = write!(out, "{:>12}", date);
        }
        out.push('\n');

        for (bucket, row) in matrix.buckets.iter().zip(&matrix.cells) {
            let _ = write!(out, "{:<12}", bucket.label().bold());
            for cell in row {
                let _ = write!(out, "{:>12}", format_value(*cell));
            }
            out.push('\n');
        }
        out
    }

    pub fn display_summary(&self, summary: &StoreSummary) {
        print!("{}", self.render_summary(summary));
    }

    pub fn render_summary(&self, summary: &StoreSummary) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Records:      {}", summary.count.to_string().bold());
        let _ = writeln!(
            out,
            "Date range:   {} - {}",
            summary.start.as_deref().unwrap_or("-"),
            summary.end.as_deref().unwrap_or("-")
        );
        let _ = writeln!(out, "Days:         {}", summary.days);
        let _ = writeln!(out, "Avg per day:  {:.1}", summary.avg_per_day);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stats::{RegressionResult, Trend};

    fn trends(anxiety: f64, tension: f64) -> TrendSummary {
        let trend = |slope| Trend {
            regression: RegressionResult {
                slope,
                ..RegressionResult::default()
            },
            significant: false,
        };
        TrendSummary {
            anxiety: trend(anxiety),
            tension: trend(tension),
        }
    }

    #[test]
    fn test_response_assessment() {
        assert_eq!(ResponseAssessment::from_trends(&trends(-0.2, -0.1)), ResponseAssessment::Positive);
        assert_eq!(
            ResponseAssessment::from_trends(&trends(-0.01, 0.3)),
            ResponseAssessment::PartiallyPositive
        );
        assert_eq!(ResponseAssessment::from_trends(&trends(0.0, 0.1)), ResponseAssessment::Inconclusive);
    }

    #[test]
    fn test_format_p_value() {
        let mut result = RegressionResult {
            p_value: 0.01234,
            ..RegressionResult::default()
        };
        assert_eq!(format_p_value(&result, 0.05), "0.0123 (significant)");

        result.p_value = 1.0;
        result.p_value_method = PValueMethod::Approximate;
        assert_eq!(format_p_value(&result, 0.05), "~1.0000 (not significant)");
    }

    #[test]
    fn test_empty_report() {
        let report = DisplayManager::new().render_report(&ConsolidatedStats::empty());
        assert!(report.contains("No data"));
    }

    #[test]
    fn test_report_lists_daily_series_sections() {
        let stats = ConsolidatedStats {
            period: crate::stats::ObservationPeriod {
                days: 1,
                measurements: 1,
                ..Default::default()
            },
            moving_averages: MovingAverages {
                window: 3,
                dates: vec!["01/01/2024".into(), "02/01/2024".into(), "03/01/2024".into()],
                anxiety: vec![None, Some(4.5), Some(6.0)],
                tension: vec![None, None, None],
            },
            weekly: vec![WeeklySummary {
                year: 2024,
                week: 3,
                first_date: "15/01/2024".to_string(),
                days: 4,
                anxiety: Some(5.5),
                tension: None,
                focus: Some(6.0),
                energy: Some(7.25),
            }],
            ..ConsolidatedStats::empty()
        };
        let report = DisplayManager::new().render_report(&stats);
        assert!(report.contains("3-Day Moving Average"));
        assert!(report.contains("4.50 -> 6.00"));
        assert!(report.contains("2024 w3"));
        assert!(report.contains("7.25"));
        assert!(report.contains("Sleep Quality vs. Next-Day Symptoms"));
        assert!(report.contains("Positive vs. Negative Symptoms"));
        assert!(report.contains("not enough data"));
    }

    #[test]
    fn test_import_feedback_caps_errors() {
        let report = ImportReport {
            inputs: 1,
            parsed: 0,
            added: 0,
            duplicates: 0,
            skipped: 3,
            errors: vec!["Line 1: a".into(), "Line 2: b".into(), "Line 3: c".into()],
            replaced: false,
        };
        let text = DisplayManager::new().render_import(&report, 2);
        assert!(text.contains("Line 2: b"));
        assert!(!text.contains("Line 3: c"));
        assert!(text.contains("and 1 more"));
    }
}
