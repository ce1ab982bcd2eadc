// Summary statistics over loudness series
//
// Mean, standard deviation, OLS trend slope and Pearson correlation of
// a series against its index axis. These four figures are both the
// statistics representation of a baseline profile and the live-window
// features the moment/trend scorer compares against it.
//
// Pearson correlation is undefined when either side has zero variance;
// every caller in this crate wants "no linear relationship" in that
// case, so it is guarded to 0.0 here rather than at each call site.

use serde::{Deserialize, Serialize};

/// Arithmetic mean. Returns 0.0 for an empty series.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation. Returns 0.0 for an empty series.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let m = mean(values);
    let var = values.iter().map(|v| (v - m) * (v - m)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}

/// Pearson correlation coefficient of two equal-length series,
/// NaN-guarded to 0.0 when either series has zero variance.
pub fn pearson(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "series lengths must match");
    if a.len() < 2 {
        return 0.0;
    }
    let mean_a = mean(a);
    let mean_b = mean(b);

    let mut cov = 0.0;
    let mut var_a = 0.0;
    let mut var_b = 0.0;
    for (&x, &y) in a.iter().zip(b.iter()) {
        let dx = x - mean_a;
        let dy = y - mean_b;
        cov += dx * dy;
        var_a += dx * dx;
        var_b += dy * dy;
    }

    let denom = (var_a * var_b).sqrt();
    if denom == 0.0 {
        return 0.0;
    }
    cov / denom
}

/// Slope of the ordinary-least-squares fit of value against index.
/// Returns 0.0 for series shorter than two samples.
pub fn trend_slope(values: &[f64]) -> f64 {
    let n = values.len();
    if n < 2 {
        return 0.0;
    }
    let mean_i = (n as f64 - 1.0) / 2.0;
    let mean_v = mean(values);

    let mut cov = 0.0;
    let mut var_i = 0.0;
    for (i, &v) in values.iter().enumerate() {
        let di = i as f64 - mean_i;
        cov += di * (v - mean_v);
        var_i += di * di;
    }
    cov / var_i
}

/// The four summary statistics of a loudness series, plus its length.
/// Serialized field names follow the on-disk stats record format.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SeriesStats {
    #[serde(rename = "number_of_records")]
    pub len: usize,
    #[serde(rename = "mean_volume")]
    pub mean: f64,
    #[serde(rename = "std_volume")]
    pub std_dev: f64,
    #[serde(rename = "trend")]
    pub trend_slope: f64,
    #[serde(rename = "corr")]
    pub corr_coefficient: f64,
}

impl SeriesStats {
    /// Compute all four statistics over a series. The correlation is
    /// taken between the index axis and the values.
    pub fn from_series(values: &[f64]) -> Self {
        let index_axis: Vec<f64> = (0..values.len()).map(|i| i as f64).collect();
        Self {
            len: values.len(),
            mean: mean(values),
            std_dev: std_dev(values),
            trend_slope: trend_slope(values),
            corr_coefficient: pearson(&index_axis, values),
        }
    }
}
