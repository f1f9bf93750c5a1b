//! Half-period comparison and fixed-size period segmentation of daily data.

use super::aggregation::present_mean;
use super::regression::{sequential_trend, PValueMethod};
use crate::models::{DailySummary, Metric};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Default number of days per period
pub const DEFAULT_PERIOD_DAYS: usize = 3;

/// Mean of each tracked metric in the first and the second half of the
/// observation, and the relative change between them in percent
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct HalfComparison {
    pub first_half: BTreeMap<Metric, f64>,
    pub second_half: BTreeMap<Metric, f64>,
    pub change: BTreeMap<Metric, f64>,
}

/// Summary of a run of consecutive days
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// 1-based
    pub number: usize,
    pub start_date: String,
    pub end_date: String,
    pub days: usize,
    pub averages: BTreeMap<Metric, Option<f64>>,
    /// Slope per day within the period; 0 with fewer than two values
    pub trends: BTreeMap<Metric, f64>,
}

impl Period {
    pub fn average(&self, metric: Metric) -> Option<f64> {
        self.averages.get(&metric).copied().flatten()
    }

    pub fn trend(&self, metric: Metric) -> f64 {
        self.trends.get(&metric).copied().unwrap_or(0.0)
    }
}

/// Split at `ceil(len / 2)`. Metrics lacking values in either half are left out.
pub fn compare_halves(daily: &[DailySummary]) -> HalfComparison {
    let mut comparison = HalfComparison::default();
    if daily.is_empty() {
        return comparison;
    }

    let mid = (daily.len() + 1) / 2;
    let (first, second) = daily.split_at(mid);

    for metric in Metric::TRACKED {
        let first_mean = present_mean(first.iter().map(|d| d.metric(metric)));
        let second_mean = present_mean(second.iter().map(|d| d.metric(metric)));

        if let (Some(a), Some(b)) = (first_mean, second_mean) {
            let change = if a == 0.0 { 0.0 } else { (b - a) / a * 100.0 };
            comparison.first_half.insert(metric, a);
            comparison.second_half.insert(metric, b);
            comparison.change.insert(metric, change);
        }
    }

    comparison
}

/// Consecutive non-overlapping chunks of `size` days (the last may be shorter)
pub fn compute_periods(daily: &[DailySummary], size: usize) -> Vec<Period> {
    let size = size.max(1);

    daily
        .chunks(size)
        .enumerate()
        .map(|(index, chunk)| {
            let mut averages = BTreeMap::new();
            let mut trends = BTreeMap::new();

            for metric in Metric::TRACKED {
                let values: Vec<Option<f64>> = chunk.iter().map(|d| d.metric(metric)).collect();
                let present = values.iter().flatten().count();

                averages.insert(metric, present_mean(values.iter().copied()));
                let slope = if present >= 2 {
                    sequential_trend(&values, PValueMethod::StudentT).slope
                } else {
                    0.0
                };
                trends.insert(metric, slope);
            }

            Period {
                number: index + 1,
                start_date: chunk[0].date.clone(),
                end_date: chunk[chunk.len() - 1].date.clone(),
                days: chunk.len(),
                averages,
                trends,
            }
        })
        .collect()
}

pub fn compute_3day_periods(daily: &[DailySummary]) -> Vec<Period> {
    compute_periods(daily, DEFAULT_PERIOD_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(date: &str, anxiety: Option<f64>) -> DailySummary {
        DailySummary {
            date: date.to_string(),
            sleep_quality: None,
            sleep_hours: None,
            anxiety,
            tension: None,
            brain_fog: None,
            energy: None,
            focus: None,
            dose_a_mg: None,
            dose_b_mg: None,
            record_count: 1,
        }
    }

    #[test]
    fn test_halves_split_at_ceiling() {
        let daily = vec![
            day("01/01/2024", Some(8.0)),
            day("02/01/2024", Some(6.0)),
            day("03/01/2024", Some(4.0)),
        ];
        let comparison = compare_halves(&daily);
        assert_eq!(comparison.first_half[&Metric::Anxiety], 7.0);
        assert_eq!(comparison.second_half[&Metric::Anxiety], 4.0);
        assert!((comparison.change[&Metric::Anxiety] + 42.857).abs() < 0.01);
        assert!(!comparison.first_half.contains_key(&Metric::Focus));
    }

    #[test]
    fn test_period_trend_numbers_present_days_only() {
        let daily = vec![
            day("01/01/2024", Some(8.0)),
            day("02/01/2024", None),
            day("03/01/2024", Some(7.0)),
            day("04/01/2024", Some(6.0)),
        ];
        let periods = compute_3day_periods(&daily);
        assert_eq!(periods.len(), 2);
        assert_eq!(periods[0].average(Metric::Anxiety), Some(7.5));
        // 8 then 7 on consecutive positions 1, 2
        assert!((periods[0].trend(Metric::Anxiety) + 1.0).abs() < 1e-12);
        assert_eq!(periods[1].trend(Metric::Anxiety), 0.0);
        assert_eq!(periods[0].average(Metric::Focus), None);
        assert_eq!(periods[0].trend(Metric::Focus), 0.0);
    }

    #[test]
    fn test_custom_period_size() {
        let daily: Vec<DailySummary> = (1..=5)
            .map(|d| day(&format!("{:02}/01/2024", d), Some(5.0)))
            .collect();
        let sizes: Vec<usize> = compute_periods(&daily, 2).iter().map(|p| p.days).collect();
        assert_eq!(sizes, vec![2, 2, 1]);
    }
}
