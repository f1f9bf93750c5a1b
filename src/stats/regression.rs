//! Ordinary least squares, Pearson correlation and the correlation matrix.

use super::aggregation::aggregate_daily;
use super::distribution::student_t_two_tailed;
use crate::models::{DailyField, NormalizedRecord};
use serde::{Deserialize, Serialize};
use tracing::trace;

/// How regression p-values are obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PValueMethod {
    /// Two-tailed Student's t with n-2 degrees of freedom
    #[default]
    StudentT,
    /// 0.05 when |t| > 2, otherwise 1
    Approximate,
}

impl std::str::FromStr for PValueMethod {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "student_t" | "studentt" | "exact" => Ok(Self::StudentT),
            "approximate" | "approx" => Ok(Self::Approximate),
            other => anyhow::bail!("Unknown p-value method: {}", other),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegressionResult {
    pub slope: f64,
    pub intercept: f64,
    pub r: f64,
    pub r_squared: f64,
    pub p_value: f64,
    pub standard_error: f64,
    /// Number of (x, y) pairs used
    pub n: usize,
    pub p_value_method: PValueMethod,
}

impl RegressionResult {
    /// Result reported for degenerate input
    pub fn neutral(method: PValueMethod) -> Self {
        Self {
            slope: 0.0,
            intercept: 0.0,
            r: 0.0,
            r_squared: 0.0,
            p_value: 1.0,
            standard_error: 0.0,
            n: 0,
            p_value_method: method,
        }
    }

    pub fn is_significant(&self, level: f64) -> bool {
        self.p_value < level
    }
}

impl Default for RegressionResult {
    fn default() -> Self {
        Self::neutral(PValueMethod::default())
    }
}

/// OLS fit of `y` on `x` with Student's t p-values
pub fn linear_regression(x: &[f64], y: &[Option<f64>]) -> RegressionResult {
    linear_regression_with(x, y, PValueMethod::StudentT)
}

/// OLS fit of `y` on `x`. Absent or non-finite `y` values drop their pair.
pub fn linear_regression_with(x: &[f64], y: &[Option<f64>], method: PValueMethod) -> RegressionResult {
    if x.len() != y.len() {
        trace!(x = x.len(), y = y.len(), "Regression input length mismatch");
        return RegressionResult::neutral(method);
    }

    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(&xi, yi)| yi.filter(|v| v.is_finite() && xi.is_finite()).map(|v| (xi, v)))
        .collect();

    let n = pairs.len();
    if n < 2 {
        trace!(n, "Too few pairs for regression");
        return RegressionResult::neutral(method);
    }

    let nf = n as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / nf;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / nf;

    let (sxx, syy, sxy) = pairs.iter().fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), &(xi, yi)| {
        let dx = xi - mean_x;
        let dy = yi - mean_y;
        (sxx + dx * dx, syy + dy * dy, sxy + dx * dy)
    });

    let slope = if sxx == 0.0 { 0.0 } else { sxy / sxx };
    let intercept = mean_y - slope * mean_x;
    let r = if sxx == 0.0 || syy == 0.0 {
        0.0
    } else {
        sxy / (sxx * syy).sqrt()
    };

    let standard_error = if n > 2 {
        let residual_ss: f64 = pairs
            .iter()
            .map(|&(xi, yi)| (yi - (intercept + slope * xi)).powi(2))
            .sum();
        (residual_ss / (nf - 2.0)).sqrt()
    } else {
        0.0
    };

    let p_value = if n <= 2 || standard_error == 0.0 || sxx == 0.0 {
        1.0
    } else {
        let t = slope.abs() / (standard_error / sxx.sqrt());
        match method {
            PValueMethod::StudentT => student_t_two_tailed(t, nf - 2.0),
            PValueMethod::Approximate => {
                if t > 2.0 {
                    0.05
                } else {
                    1.0
                }
            }
        }
    };

    RegressionResult {
        slope,
        intercept,
        r,
        r_squared: r * r,
        p_value,
        standard_error,
        n,
        p_value_method: method,
    }
}

/// Trend of a daily series: absent days are dropped and the remaining
/// values are numbered 1..=k without gaps before fitting.
pub fn sequential_trend(values: &[Option<f64>], method: PValueMethod) -> RegressionResult {
    let present: Vec<Option<f64>> = values.iter().flatten().map(|v| Some(*v)).collect();
    let index: Vec<f64> = (1..=present.len()).map(|i| i as f64).collect();
    linear_regression_with(&index, &present, method)
}

/// Pearson's r over the positions where both values are present
pub fn pearson_correlation(x: &[Option<f64>], y: &[Option<f64>]) -> f64 {
    if x.len() != y.len() {
        return 0.0;
    }

    let pairs: Vec<(f64, f64)> = x
        .iter()
        .zip(y)
        .filter_map(|(a, b)| match (a, b) {
            (Some(a), Some(b)) if a.is_finite() && b.is_finite() => Some((*a, *b)),
            _ => None,
        })
        .collect();

    if pairs.len() < 2 {
        return 0.0;
    }

    let n = pairs.len() as f64;
    let mean_x = pairs.iter().map(|p| p.0).sum::<f64>() / n;
    let mean_y = pairs.iter().map(|p| p.1).sum::<f64>() / n;

    let (sxx, syy, sxy) = pairs.iter().fold((0.0, 0.0, 0.0), |(sxx, syy, sxy), &(a, b)| {
        let dx = a - mean_x;
        let dy = b - mean_y;
        (sxx + dx * dx, syy + dy * dy, sxy + dx * dy)
    });

    if sxx == 0.0 || syy == 0.0 {
        0.0
    } else {
        sxy / (sxx * syy).sqrt()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
pub struct CorrelationMatrix {
    pub matrix: Vec<Vec<f64>>,
    pub labels: Vec<String>,
}

impl CorrelationMatrix {
    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    pub fn get(&self, a: &str, b: &str) -> Option<f64> {
        let i = self.labels.iter().position(|l| l == a)?;
        let j = self.labels.iter().position(|l| l == b)?;
        Some(self.matrix[i][j])
    }
}

/// Pairwise Pearson correlations between daily aggregates of the named fields.
/// Names go through the alias table; unknown names yield an absent column.
pub fn correlation_matrix<S: AsRef<str>>(records: &[NormalizedRecord], variable_names: &[S]) -> CorrelationMatrix {
    if records.is_empty() || variable_names.is_empty() {
        return CorrelationMatrix::default();
    }

    let daily = aggregate_daily(records);
    let columns: Vec<Vec<Option<f64>>> = variable_names
        .iter()
        .map(|name| match DailyField::resolve(name.as_ref()) {
            Some(field) => daily.iter().map(|d| d.field(field)).collect(),
            None => {
                trace!(name = name.as_ref(), "Unknown correlation variable");
                vec![None; daily.len()]
            }
        })
        .collect();

    let size = columns.len();
    let mut matrix = vec![vec![0.0; size]; size];
    for i in 0..size {
        matrix[i][i] = 1.0;
        for j in (i + 1)..size {
            let r = pearson_correlation(&columns[i], &columns[j]);
            matrix[i][j] = r;
            matrix[j][i] = r;
        }
    }

    CorrelationMatrix {
        matrix,
        labels: variable_names.iter().map(|n| n.as_ref().to_string()).collect(),
    }
}
