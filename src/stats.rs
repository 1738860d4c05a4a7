//! Shared numeric helpers for the analytics
//!
//! Thin wrappers over `statrs` that return `None` instead of `NaN` for inputs
//! too short to be meaningful, plus serde helpers that round on output.

use serde::Serializer;
use statrs::statistics::Statistics;

/// Arithmetic mean, `None` for an empty slice
pub fn mean(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().mean())
}

/// Sample standard deviation (n - 1), `None` for fewer than two values
pub fn stdev(values: &[f64]) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    Some(values.iter().std_dev())
}

/// Mean of the first `n` values; `None` unless the slice has at least `n`
pub fn head_mean(values: &[f64], n: usize) -> Option<f64> {
    if n == 0 || values.len() < n {
        return None;
    }
    mean(&values[..n])
}

/// Mean of the last `n` values; `None` unless the slice has at least `n`
pub fn tail_mean(values: &[f64], n: usize) -> Option<f64> {
    if n == 0 || values.len() < n {
        return None;
    }
    mean(&values[values.len() - n..])
}

/// Percent change from `baseline` to `value`; `None` for a non-positive baseline
pub fn percent_change(value: f64, baseline: f64) -> Option<f64> {
    if baseline <= 0.0 {
        return None;
    }
    Some((value - baseline) / baseline * 100.0)
}

/// Clamp a score into [0, 100]
pub fn clamp_score(value: f64) -> f64 {
    value.clamp(0.0, 100.0)
}

/// Round to one decimal place
pub fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Serialize an `f64` rounded to one decimal place
pub fn serialize_round1<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    serializer.serialize_f64(round1(*value))
}

/// Serialize an `Option<f64>` rounded to one decimal place
pub fn serialize_opt_round1<S>(value: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    match value {
        Some(v) => serializer.serialize_some(&round1(*v)),
        None => serializer.serialize_none(),
    }
}
