//! Descriptive summary of a batch of per-sample results.

use serde::Serialize;
use u_numflow::stats;

/// Count, moments, extremes and percentiles of a result column.
///
/// # Examples
///
/// ```
/// use u_integrity::BatchSummary;
///
/// let s = BatchSummary::from_values(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
/// assert_eq!(s.count, 5);
/// assert!((s.mean - 3.0).abs() < 1e-12);
/// assert!((s.p50 - 3.0).abs() < 1e-12);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BatchSummary {
    /// Number of values.
    pub count: usize,
    /// Arithmetic mean.
    pub mean: f64,
    /// Sample standard deviation (0 for a single value).
    pub std_dev: f64,
    /// Smallest value.
    pub min: f64,
    /// Largest value.
    pub max: f64,
    /// 5th percentile.
    pub p05: f64,
    /// Median.
    pub p50: f64,
    /// 95th percentile.
    pub p95: f64,
}

impl BatchSummary {
    /// Summarizes `values`.
    ///
    /// Returns `None` for empty input or any non-finite value.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        if values.is_empty() || values.iter().any(|v| !v.is_finite()) {
            return None;
        }
        let std_dev = if values.len() > 1 {
            stats::std_dev(values)?
        } else {
            0.0
        };
        Some(Self {
            count: values.len(),
            mean: stats::mean(values)?,
            std_dev,
            min: stats::min(values)?,
            max: stats::max(values)?,
            p05: stats::quantile(values, 0.05)?,
            p50: stats::quantile(values, 0.5)?,
            p95: stats::quantile(values, 0.95)?,
        })
    }
}
