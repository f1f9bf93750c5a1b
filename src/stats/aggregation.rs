//! Grouping of normalized records by calendar day and by time of day.

use crate::models::{DailySummary, Metric, NormalizedRecord, TimeOfDay};
use crate::timestamp_parser::TimestampParser;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Descriptive statistics of one metric within one time-of-day bucket
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MetricStats {
    pub mean: f64,
    /// Population standard deviation (divides by n)
    pub std_dev: f64,
    pub count: usize,
    pub values: Vec<f64>,
}

impl MetricStats {
    /// `None` when there are no values
    pub fn from_values(values: Vec<f64>) -> Option<Self> {
        let mean = mean(&values)?;
        let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
        Some(Self {
            mean,
            std_dev: variance.sqrt(),
            count: values.len(),
            values,
        })
    }
}

pub type TimeOfDayStats = BTreeMap<TimeOfDay, BTreeMap<Metric, MetricStats>>;

/// Day x time-of-day matrix of one metric
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DayTimeMatrix {
    pub metric: Metric,
    /// Chronologically sorted distinct dates (columns)
    pub dates: Vec<String>,
    /// Rows, always the four buckets in order
    pub buckets: Vec<TimeOfDay>,
    /// `cells[bucket][date]`
    pub cells: Vec<Vec<Option<f64>>>,
}

pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        None
    } else {
        Some(values.iter().sum::<f64>() / values.len() as f64)
    }
}

/// Mean of the present values only
pub fn present_mean<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let present: Vec<f64> = values.into_iter().flatten().collect();
    mean(&present)
}

fn present_sum<I>(values: I) -> Option<f64>
where
    I: IntoIterator<Item = Option<f64>>,
{
    values
        .into_iter()
        .flatten()
        .fold(None, |acc, v| Some(acc.unwrap_or(0.0) + v))
}

/// Distinct record dates in chronological order
pub fn sorted_dates(records: &[NormalizedRecord]) -> Vec<String> {
    let mut dates: Vec<String> = records
        .iter()
        .map(|r| r.date.clone())
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect();
    dates.sort_by(|a, b| TimestampParser::compare_dates(a, b));
    dates
}

/// One summary per distinct date, oldest first
pub fn aggregate_daily(records: &[NormalizedRecord]) -> Vec<DailySummary> {
    let mut by_date: BTreeMap<&str, Vec<&NormalizedRecord>> = BTreeMap::new();
    for record in records {
        by_date.entry(record.date.as_str()).or_default().push(record);
    }

    let mut daily: Vec<DailySummary> = by_date
        .into_iter()
        .map(|(date, day)| {
            let metric = |m: Metric| present_mean(day.iter().map(|r| r.metric(m)));
            DailySummary {
                date: date.to_string(),
                sleep_quality: metric(Metric::SleepQuality),
                sleep_hours: metric(Metric::SleepHours),
                anxiety: metric(Metric::Anxiety),
                tension: metric(Metric::Tension),
                brain_fog: metric(Metric::BrainFog),
                energy: metric(Metric::Energy),
                focus: metric(Metric::Focus),
                dose_a_mg: present_sum(day.iter().map(|r| r.medication_a_mg.map(f64::from))),
                dose_b_mg: present_sum(day.iter().map(|r| r.medication_b_mg.map(f64::from))),
                record_count: day.len(),
            }
        })
        .collect();

    daily.sort_by(|a, b| TimestampParser::compare_dates(&a.date, &b.date));
    daily
}

/// Clinical metric statistics per time-of-day bucket. All four buckets are
/// present; metrics without values are left out of a bucket.
pub fn aggregate_by_time_of_day(records: &[NormalizedRecord]) -> TimeOfDayStats {
    TimeOfDay::ALL
        .into_iter()
        .map(|bucket| {
            let in_bucket: Vec<&NormalizedRecord> =
                records.iter().filter(|r| r.time_of_day == bucket).collect();

            let metrics: BTreeMap<Metric, MetricStats> = Metric::CLINICAL
                .into_iter()
                .filter_map(|metric| {
                    let values: Vec<f64> = in_bucket.iter().filter_map(|r| r.metric(metric)).collect();
                    MetricStats::from_values(values).map(|stats| (metric, stats))
                })
                .collect();

            (bucket, metrics)
        })
        .collect()
}

/// Mean of `metric` for every (bucket, date) pair. Brain fog is inverted to
/// clarity (`11 - x`) so that higher is better in every row.
pub fn prepare_day_time_matrix(records: &[NormalizedRecord], metric: Metric) -> DayTimeMatrix {
    let dates = sorted_dates(records);
    let invert = metric == Metric::BrainFog;

    let cells: Vec<Vec<Option<f64>>> = TimeOfDay::ALL
        .iter()
        .map(|bucket| {
            dates
                .iter()
                .map(|date| {
                    present_mean(
                        records
                            .iter()
                            .filter(|r| &r.date == date && r.time_of_day == *bucket)
                            .map(|r| r.metric(metric).map(|v| if invert { 11.0 - v } else { v })),
                    )
                })
                .collect()
        })
        .collect();

    DayTimeMatrix {
        metric,
        dates,
        buckets: TimeOfDay::ALL.to_vec(),
        cells,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_population_std_dev() {
        let stats = MetricStats::from_values(vec![2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]).unwrap();
        assert_eq!(stats.mean, 5.0);
        assert_eq!(stats.std_dev, 2.0);
        assert_eq!(stats.count, 8);
        assert!(MetricStats::from_values(Vec::new()).is_none());
    }

    #[test]
    fn test_present_mean_ignores_absent() {
        assert_eq!(present_mean([Some(2.0), None, Some(4.0)]), Some(3.0));
        assert_eq!(present_mean([None, None]), None);
    }

    #[test]
    fn test_present_sum() {
        assert_eq!(present_sum([Some(50.0), None, Some(20.0)]), Some(70.0));
        assert_eq!(present_sum([None]), None);
    }
}
