// Copyright 2025 Umberto Gotti <umberto.gotti@umbertogotti.dev>
// Licensed under the Apache License, Version 2.0
// http://www.apache.org/licenses/LICENSE-2.0

//! Descriptive statistics over a history slice.
//!
//! Variance and standard deviation use the **sample** (N−1) formulation and
//! are defined as 0 for a single value. Percentiles interpolate linearly
//! between the closest ranks, so `p` maps to rank `p / 100 * (n - 1)` of the
//! sorted input.
//!
//! Every function returns `None` for an empty slice.

use serde::{Deserialize, Serialize};

/// Summary of one sensor's history.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Stats {
    pub mean: f64,
    pub median: f64,
    pub stdev: f64,
    pub variance: f64,
    pub range: f64,
    pub iqr: f64,
    pub min: f64,
    pub max: f64,
    pub p25: f64,
    pub p75: f64,
    /// Standard deviation as a percentage of the mean; `None` when the mean is 0.
    pub cv: Option<f64>,
}

impl Stats {
    /// Computes all statistics from one sorted copy of `values`.
    ///
    /// # Example
    ///
    /// ```
    /// use hydrowatch_core::Stats;
    ///
    /// let stats = Stats::compute(&[1.0, 2.0, 3.0, 4.0, 5.0]).unwrap();
    /// assert_eq!(stats.mean, 3.0);
    /// assert_eq!(stats.median, 3.0);
    /// assert_eq!(stats.range, 4.0);
    /// assert_eq!(stats.variance, 2.5);
    /// assert_eq!(stats.iqr, 2.0);
    /// assert_eq!((stats.min, stats.max), (1.0, 5.0));
    /// ```
    #[must_use]
    pub fn compute(values: &[f64]) -> Option<Self> {
        let sorted = sorted(values)?;
        let mean = mean(&sorted)?;
        let variance = variance_around(&sorted, mean);
        let stdev = variance.sqrt();
        let (min, max) = (sorted[0], sorted[sorted.len() - 1]);
        let (p25, p75) = (percentile_sorted(&sorted, 25.0), percentile_sorted(&sorted, 75.0));

        Some(Self {
            mean,
            median: percentile_sorted(&sorted, 50.0),
            stdev,
            variance,
            range: max - min,
            iqr: p75 - p25,
            min,
            max,
            p25,
            p75,
            cv: (mean != 0.0).then(|| stdev / mean * 100.0),
        })
    }
}

fn sorted(values: &[f64]) -> Option<Vec<f64>> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);
    Some(sorted)
}

fn variance_around(values: &[f64], mean: f64) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let sum_sq: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    sum_sq / (values.len() - 1) as f64
}

// Input must be sorted and non-empty.
fn percentile_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = (p.clamp(0.0, 100.0) / 100.0) * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    let weight = rank - lo as f64;
    sorted[lo] + (sorted[hi] - sorted[lo]) * weight
}

/// Arithmetic mean.
#[must_use]
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Middle value; the average of the two middle values for even counts.
#[must_use]
pub fn median(values: &[f64]) -> Option<f64> {
    percentile(values, 50.0)
}

/// Sample variance (N−1); 0 for a single value.
#[must_use]
pub fn variance(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    Some(variance_around(values, m))
}

/// Sample standard deviation; 0 for a single value.
#[must_use]
pub fn stdev(values: &[f64]) -> Option<f64> {
    variance(values).map(f64::sqrt)
}

#[must_use]
pub fn min(values: &[f64]) -> Option<f64> {
    values.iter().copied().min_by(f64::total_cmp)
}

#[must_use]
pub fn max(values: &[f64]) -> Option<f64> {
    values.iter().copied().max_by(f64::total_cmp)
}

/// `max - min`.
#[must_use]
pub fn range(values: &[f64]) -> Option<f64> {
    Some(max(values)? - min(values)?)
}

/// Linearly interpolated percentile, `p` in `[0, 100]` (clamped).
#[must_use]
pub fn percentile(values: &[f64], p: f64) -> Option<f64> {
    sorted(values).map(|s| percentile_sorted(&s, p))
}

/// `p75 - p25`.
#[must_use]
pub fn interquartile_range(values: &[f64]) -> Option<f64> {
    let s = sorted(values)?;
    Some(percentile_sorted(&s, 75.0) - percentile_sorted(&s, 25.0))
}

/// Standard deviation as a percentage of the mean; `None` when the mean is 0.
#[must_use]
pub fn coefficient_of_variation(values: &[f64]) -> Option<f64> {
    let m = mean(values)?;
    if m == 0.0 {
        return None;
    }
    Some(stdev(values)? / m * 100.0)
}
