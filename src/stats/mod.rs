//! Statistics Engine
//!
//! Pure functions over normalized records. Nothing here fails: empty or
//! degenerate input produces neutral results, and absent measurements are
//! filtered out rather than counted as zero.
//!
//! ## Modules
//!
//! - [`aggregation`]: per-day and per-time-of-day grouping, heatmap matrix
//! - [`regression`]: OLS, Pearson correlation, correlation matrix
//! - [`distribution`]: Student's t p-values
//! - [`periods`]: half comparison and fixed-size period summaries
//! - [`series`]: moving averages, weekly means, sleep vs. next day, symptom balance
//!
//! [`compute_all`] combines them into one [`ConsolidatedStats`] value.

pub mod aggregation;
pub mod distribution;
pub mod periods;
pub mod regression;
pub mod series;

pub use aggregation::{
    aggregate_by_time_of_day, aggregate_daily, prepare_day_time_matrix, DayTimeMatrix, MetricStats,
    TimeOfDayStats,
};
pub use periods::{compare_halves, compute_3day_periods, compute_periods, HalfComparison, Period};
pub use regression::{
    correlation_matrix, linear_regression, linear_regression_with, pearson_correlation, sequential_trend,
    CorrelationMatrix, PValueMethod, RegressionResult,
};
pub use series::{
    moving_average, moving_averages, sleep_next_day, symptom_balance, weekly_comparison, BalancePoint,
    MovingAverages, SleepNextDay, SymptomBalance, WeeklySummary, MOVING_AVERAGE_WINDOW,
};

use crate::models::{DailySummary, Metric, NormalizedRecord, TimeOfDay};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use tracing::debug;

/// Tunables of one analysis pass
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnalysisSettings {
    pub period_days: usize,
    pub significance_level: f64,
    pub stability_tolerance: f64,
    pub p_value_method: PValueMethod,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            period_days: periods::DEFAULT_PERIOD_DAYS,
            significance_level: 0.05,
            stability_tolerance: 0.5,
            p_value_method: PValueMethod::StudentT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPeriod {
    pub start: Option<String>,
    pub end: Option<String>,
    /// Distinct days
    pub days: usize,
    pub measurements: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct Trend {
    #[serde(flatten)]
    pub regression: RegressionResult,
    pub significant: bool,
}

impl Trend {
    fn from_regression(regression: RegressionResult, level: f64) -> Self {
        Self {
            significant: regression.is_significant(level),
            regression,
        }
    }

    pub fn slope(&self) -> f64 {
        self.regression.slope
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct TrendSummary {
    pub anxiety: Trend,
    pub tension: Trend,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StabilityTrend {
    Stable,
    Declining,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Stability {
    pub trend: StabilityTrend,
    pub first_half: Option<f64>,
    pub second_half: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct IntradayPatterns {
    pub by_time_of_day: TimeOfDayStats,
    /// Mean anxiety per bucket, for buckets that have any
    pub anxiety_by_time: BTreeMap<TimeOfDay, f64>,
    /// Lowest mean anxiety
    pub best_time: Option<TimeOfDay>,
    /// Highest mean anxiety
    pub worst_time: Option<TimeOfDay>,
}

/// Everything the report and the JSON output need, computed in one pass
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct ConsolidatedStats {
    pub period: ObservationPeriod,
    pub trends: TrendSummary,
    pub comparison: HalfComparison,
    pub stability: BTreeMap<Metric, Stability>,
    pub intraday: IntradayPatterns,
    pub periods: Vec<Period>,
    pub moving_averages: MovingAverages,
    pub weekly: Vec<WeeklySummary>,
    pub sleep_next_day: SleepNextDay,
    pub symptom_balance: SymptomBalance,
    pub daily: Vec<DailySummary>,
    pub significance_level: f64,
}

impl ConsolidatedStats {
    pub fn empty() -> Self {
        Self {
            significance_level: AnalysisSettings::default().significance_level,
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.period.measurements == 0
    }
}

/// Run every analysis over the full record set
pub fn compute_all(records: &[NormalizedRecord], settings: &AnalysisSettings) -> ConsolidatedStats {
    if records.is_empty() {
        return ConsolidatedStats {
            significance_level: settings.significance_level,
            ..ConsolidatedStats::empty()
        };
    }

    let daily = aggregate_daily(records);
    let period = ObservationPeriod {
        start: daily.first().map(|d| d.date.clone()),
        end: daily.last().map(|d| d.date.clone()),
        days: daily.len(),
        measurements: records.len(),
    };

    let trend = |metric: Metric| {
        let values: Vec<Option<f64>> = daily.iter().map(|d| d.metric(metric)).collect();
        Trend::from_regression(
            sequential_trend(&values, settings.p_value_method),
            settings.significance_level,
        )
    };
    let trends = TrendSummary {
        anxiety: trend(Metric::Anxiety),
        tension: trend(Metric::Tension),
    };

    let comparison = compare_halves(&daily);
    let stability = [Metric::Focus, Metric::Energy]
        .into_iter()
        .map(|metric| (metric, stability_of(&comparison, metric, settings.stability_tolerance)))
        .collect();

    let intraday = intraday_patterns(records);
    let periods = compute_periods(&daily, settings.period_days);
    let moving_averages = moving_averages(&daily, MOVING_AVERAGE_WINDOW);
    let weekly = weekly_comparison(&daily);
    let sleep_next_day = sleep_next_day(&daily, settings.p_value_method);
    let symptom_balance = symptom_balance(&daily, settings.p_value_method);

    debug!(
        days = period.days,
        measurements = period.measurements,
        periods = periods.len(),
        weeks = weekly.len(),
        "Computed statistics"
    );

    ConsolidatedStats {
        period,
        trends,
        comparison,
        stability,
        intraday,
        periods,
        moving_averages,
        weekly,
        sleep_next_day,
        symptom_balance,
        daily,
        significance_level: settings.significance_level,
    }
}

/// Coarse stability; a half without data counts as 0
fn stability_of(comparison: &HalfComparison, metric: Metric, tolerance: f64) -> Stability {
    let first_half = comparison.first_half.get(&metric).copied();
    let second_half = comparison.second_half.get(&metric).copied();
    let first = first_half.unwrap_or(0.0);
    let second = second_half.unwrap_or(0.0);

    Stability {
        trend: if second >= first - tolerance {
            StabilityTrend::Stable
        } else {
            StabilityTrend::Declining
        },
        first_half,
        second_half,
    }
}

fn intraday_patterns(records: &[NormalizedRecord]) -> IntradayPatterns {
    let by_time_of_day = aggregate_by_time_of_day(records);
    let anxiety_by_time: BTreeMap<TimeOfDay, f64> = by_time_of_day
        .iter()
        .filter_map(|(bucket, metrics)| metrics.get(&Metric::Anxiety).map(|s| (*bucket, s.mean)))
        .collect();

    // BTreeMap iterates in bucket order, so strict comparisons keep the earliest on ties
    let mut best: Option<(TimeOfDay, f64)> = None;
    let mut worst: Option<(TimeOfDay, f64)> = None;
    for (&bucket, &mean) in &anxiety_by_time {
        if best.map_or(true, |(_, m)| mean < m) {
            best = Some((bucket, mean));
        }
        if worst.map_or(true, |(_, m)| mean > m) {
            worst = Some((bucket, mean));
        }
    }

    IntradayPatterns {
        by_time_of_day,
        anxiety_by_time,
        best_time: best.map(|(b, _)| b),
        worst_time: worst.map(|(b, _)| b),
    }
}
