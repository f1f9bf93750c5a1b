//! Day-level series analyses: smoothed anxiety and tension, weekly means,
//! sleep against the following day, and the balance between positive and
//! negative symptoms.
//!
//! All functions take the chronologically sorted output of
//! [`aggregate_daily`](super::aggregation::aggregate_daily).

use super::aggregation::present_mean;
use super::regression::{linear_regression_with, PValueMethod, RegressionResult};
use crate::models::{DailySummary, Metric};
use crate::timestamp_parser::TimestampParser;
use chrono::Datelike;
use serde::{Deserialize, Serialize};

pub const MOVING_AVERAGE_WINDOW: usize = 3;

/// Trailing moving averages of the daily anxiety and tension means
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct MovingAverages {
    pub window: usize,
    pub dates: Vec<String>,
    pub anxiety: Vec<Option<f64>>,
    pub tension: Vec<Option<f64>>,
}

/// Means of the daily values that fall into one calendar week
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WeeklySummary {
    pub year: i32,
    /// `ceil(days since 1 January / 7)`; 1 January itself is week 0
    pub week: u32,
    pub first_date: String,
    pub days: usize,
    pub anxiety: Option<f64>,
    pub tension: Option<f64>,
    pub focus: Option<f64>,
    pub energy: Option<f64>,
}

/// Sleep quality on one day regressed against symptoms on the next
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SleepNextDay {
    pub anxiety: RegressionResult,
    pub tension: RegressionResult,
}

/// One day's positive and negative composite scores
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalancePoint {
    pub date: String,
    /// Mean of focus, energy and clarity (`11 - brain fog`)
    pub positive: f64,
    /// Mean of anxiety and tension
    pub negative: f64,
    pub dose_b_mg: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct SymptomBalance {
    pub points: Vec<BalancePoint>,
    /// Negative score regressed on positive score
    pub regression: RegressionResult,
}

/// Trailing mean over `window` values ending at each index. Absent values are
/// skipped; a window with nothing present yields `None`.
pub fn moving_average(values: &[Option<f64>], window: usize) -> Vec<Option<f64>> {
    let window = window.max(1);
    (0..values.len())
        .map(|i| {
            let start = (i + 1).saturating_sub(window);
            present_mean(values[start..=i].iter().copied())
        })
        .collect()
}

pub fn moving_averages(daily: &[DailySummary], window: usize) -> MovingAverages {
    let series = |metric: Metric| {
        let values: Vec<Option<f64>> = daily.iter().map(|d| d.metric(metric)).collect();
        moving_average(&values, window)
    };

    MovingAverages {
        window: window.max(1),
        dates: daily.iter().map(|d| d.date.clone()).collect(),
        anxiety: series(Metric::Anxiety),
        tension: series(Metric::Tension),
    }
}

/// Year and week number of a `DD/MM/YYYY` date
pub fn week_of(date: &str) -> Option<(i32, u32)> {
    let parsed = TimestampParser::parse_date(date).ok()?;
    Some((parsed.year(), (parsed.ordinal0() + 6) / 7))
}

/// Weekly means in chronological order. Days whose date does not parse are
/// left out.
pub fn weekly_comparison(daily: &[DailySummary]) -> Vec<WeeklySummary> {
    let mut weeks: Vec<((i32, u32), Vec<&DailySummary>)> = Vec::new();
    for day in daily {
        let Some(key) = week_of(&day.date) else {
            continue;
        };
        match weeks.iter_mut().find(|(k, _)| *k == key) {
            Some((_, days)) => days.push(day),
            None => weeks.push((key, vec![day])),
        }
    }
    weeks.sort_by_key(|(key, _)| *key);

    weeks
        .into_iter()
        .map(|((year, week), days)| {
            let metric = |m: Metric| present_mean(days.iter().map(|d| d.metric(m)));
            WeeklySummary {
                year,
                week,
                first_date: days.first().map(|d| d.date.clone()).unwrap_or_default(),
                days: days.len(),
                anxiety: metric(Metric::Anxiety),
                tension: metric(Metric::Tension),
                focus: metric(Metric::Focus),
                energy: metric(Metric::Energy),
            }
        })
        .collect()
}

/// Pair each day's sleep quality with the next listed day's value of `metric`
fn next_day_pairs(daily: &[DailySummary], metric: Metric) -> (Vec<f64>, Vec<Option<f64>>) {
    daily
        .windows(2)
        .filter_map(|pair| match (pair[0].sleep_quality, pair[1].metric(metric)) {
            (Some(sleep), Some(value)) => Some((sleep, Some(value))),
            _ => None,
        })
        .unzip()
}

pub fn sleep_next_day(daily: &[DailySummary], method: PValueMethod) -> SleepNextDay {
    let regress = |metric: Metric| {
        let (sleep, next) = next_day_pairs(daily, metric);
        linear_regression_with(&sleep, &next, method)
    };

    SleepNextDay {
        anxiety: regress(Metric::Anxiety),
        tension: regress(Metric::Tension),
    }
}

/// Per-day positive/negative composites for days that have both
pub fn symptom_balance(daily: &[DailySummary], method: PValueMethod) -> SymptomBalance {
    let points: Vec<BalancePoint> = daily
        .iter()
        .filter_map(|day| {
            let positive = present_mean([day.focus, day.energy, day.brain_fog.map(|v| 11.0 - v)])?;
            let negative = present_mean([day.anxiety, day.tension])?;
            Some(BalancePoint {
                date: day.date.clone(),
                positive,
                negative,
                dose_b_mg: day.dose_b_mg,
            })
        })
        .collect();

    let x: Vec<f64> = points.iter().map(|p| p.positive).collect();
    let y: Vec<Option<f64>> = points.iter().map(|p| Some(p.negative)).collect();

    SymptomBalance {
        regression: linear_regression_with(&x, &y, method),
        points,
    }
}
