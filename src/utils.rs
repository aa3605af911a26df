//! Shared utilities for the wrangling pipeline.
//!
//! Common helpers used across multiple modules: dtype checks, numeric
//! extraction, and small statistics over sorted samples.

use polars::prelude::*;

// =============================================================================
// Data Type Utilities
// =============================================================================

/// Check if a DataType is numeric (integer or float).
#[inline]
pub fn is_numeric_dtype(dtype: &DataType) -> bool {
    matches!(
        dtype,
        DataType::Int8
            | DataType::Int16
            | DataType::Int32
            | DataType::Int64
            | DataType::UInt8
            | DataType::UInt16
            | DataType::UInt32
            | DataType::UInt64
            | DataType::Float32
            | DataType::Float64
    )
}

/// Check if a Series holds numeric data.
#[inline]
pub fn is_numeric_series(series: &Series) -> bool {
    is_numeric_dtype(series.dtype())
}

// =============================================================================
// Numeric Extraction
// =============================================================================

/// Extract a column as `Vec<Option<f64>>`, casting from any numeric dtype.
pub fn numeric_values(series: &Series) -> PolarsResult<Vec<Option<f64>>> {
    let float_series = series.cast(&DataType::Float64)?;
    Ok(float_series.f64()?.into_iter().collect())
}

/// Extract the non-null values of a column as a sorted `Vec<f64>`.
pub fn sorted_non_null(series: &Series) -> PolarsResult<Vec<f64>> {
    let mut values: Vec<f64> = numeric_values(series)?.into_iter().flatten().collect();
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    Ok(values)
}

/// Boolean mask marking the first occurrence of each value in a series.
/// Later occurrences are false. Nulls count as one shared value.
pub fn first_occurrence_mask(series: &Series) -> BooleanChunked {
    let mut seen = std::collections::HashSet::with_capacity(series.len());
    let mut mask = Vec::with_capacity(series.len());
    for i in 0..series.len() {
        let value = series
            .get(i)
            .map(|v| format!("{}", v))
            .unwrap_or_default();
        mask.push(seen.insert(value));
    }
    BooleanChunked::from_slice("mask".into(), &mask)
}

// =============================================================================
// Sample Statistics
// =============================================================================

/// Quantile of a sorted sample using linear interpolation between order
/// statistics. Returns `None` for an empty sample.
pub fn quantile_sorted(sorted: &[f64], q: f64) -> Option<f64> {
    if sorted.is_empty() {
        return None;
    }
    let q = q.clamp(0.0, 1.0);
    let pos = (sorted.len() - 1) as f64 * q;
    let lower = pos.floor() as usize;
    let upper = pos.ceil() as usize;
    if lower == upper {
        return Some(sorted[lower]);
    }
    let frac = pos - lower as f64;
    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * frac)
}

/// Mean of a sample. Returns `None` for an empty sample.
pub fn mean_of(values: &[f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    Some(values.iter().sum::<f64>() / values.len() as f64)
}

/// Sample standard deviation (n - 1 denominator). Zero for fewer than two
/// values.
pub fn sample_std(values: &[f64], mean: f64) -> f64 {
    let n = values.len() as f64;
    if n <= 1.0 {
        return 0.0;
    }
    let variance = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1.0);
    variance.sqrt()
}

// =============================================================================
// Tests
// =============================================================================
