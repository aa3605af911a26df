//! Descriptive statistics and outlier-threshold partitioning.
//!
//! The summarizer computes per-column descriptive statistics (count, mean,
//! standard deviation, min/max and quartile boundaries), quantile thresholds
//! for outlier flagging, and frequency tables for categorical columns.

pub mod plots;

pub use plots::PlotRenderer;

use crate::types::{ColumnStats, FrequencyEntry};
use crate::utils::{is_numeric_series, mean_of, numeric_values, quantile_sorted, sample_std, sorted_non_null};
use anyhow::{Context, Result, bail, ensure};
use polars::prelude::*;
use std::collections::HashMap;
use tracing::debug;

/// Computes descriptive statistics over a table.
pub struct Summarizer;

impl Summarizer {
    /// Descriptive statistics for the requested columns. An empty request
    /// means every numeric column. Explicitly requested columns must be
    /// numeric.
    pub fn describe(df: &DataFrame, columns: &[String]) -> Result<Vec<ColumnStats>> {
        let targets: Vec<String> = if columns.is_empty() {
            df.get_columns()
                .iter()
                .filter(|c| is_numeric_series(c.as_materialized_series()))
                .map(|c| c.name().to_string())
                .collect()
        } else {
            columns.to_vec()
        };

        let mut stats = Vec::with_capacity(targets.len());
        for name in &targets {
            let column = df
                .column(name)
                .with_context(|| format!("column '{name}' not found"))?;
            let series = column.as_materialized_series();
            if !is_numeric_series(series) {
                bail!("column '{name}' is not numeric");
            }
            stats.push(Self::describe_series(series)?);
        }

        debug!("Described {} columns", stats.len());
        Ok(stats)
    }

    /// Descriptive statistics for one numeric series.
    fn describe_series(series: &Series) -> Result<ColumnStats> {
        let sorted = sorted_non_null(series)?;
        let mean = mean_of(&sorted);
        let std = mean.map(|m| sample_std(&sorted, m));

        Ok(ColumnStats {
            name: series.name().to_string(),
            dtype: series.dtype().to_string(),
            count: sorted.len(),
            null_count: series.null_count(),
            mean,
            std,
            min: sorted.first().copied(),
            q1: quantile_sorted(&sorted, 0.25),
            median: quantile_sorted(&sorted, 0.5),
            q3: quantile_sorted(&sorted, 0.75),
            max: sorted.last().copied(),
        })
    }

    /// The value at quantile `q` of the column's non-null values.
    pub fn quantile_threshold(df: &DataFrame, column: &str, q: f64) -> Result<f64> {
        ensure!(
            q > 0.0 && q < 1.0,
            "quantile must be strictly between 0 and 1, got {q}"
        );
        let series = df
            .column(column)
            .with_context(|| format!("column '{column}' not found"))?
            .as_materialized_series();
        ensure!(
            is_numeric_series(series),
            "column '{column}' is not numeric"
        );
        let sorted = sorted_non_null(series)?;
        quantile_sorted(&sorted, q)
            .with_context(|| format!("no valid values in column '{column}'"))
    }

    /// Partition rows into (above threshold, at-or-below threshold) subsets.
    /// Rows with a null in `column` belong to neither subset.
    pub fn partition_by_threshold(
        df: &DataFrame,
        column: &str,
        threshold: f64,
    ) -> Result<(DataFrame, DataFrame)> {
        let series = df
            .column(column)
            .with_context(|| format!("column '{column}' not found"))?
            .as_materialized_series();
        ensure!(
            is_numeric_series(series),
            "column '{column}' is not numeric"
        );
        let values = numeric_values(series)?;

        let mut above = Vec::with_capacity(values.len());
        let mut at_or_below = Vec::with_capacity(values.len());
        for value in &values {
            match value {
                Some(v) => {
                    above.push(*v > threshold);
                    at_or_below.push(*v <= threshold);
                }
                None => {
                    above.push(false);
                    at_or_below.push(false);
                }
            }
        }

        let above_mask = BooleanChunked::from_slice("mask".into(), &above);
        let below_mask = BooleanChunked::from_slice("mask".into(), &at_or_below);

        Ok((df.filter(&above_mask)?, df.filter(&below_mask)?))
    }

    /// Most frequent values of a column with their counts, descending, ties
    /// broken by value.
    pub fn frequency_table(
        df: &DataFrame,
        column: &str,
        limit: usize,
    ) -> Result<Vec<FrequencyEntry>> {
        let series = df
            .column(column)
            .with_context(|| format!("column '{column}' not found"))?
            .as_materialized_series();
        let str_series = series.cast(&DataType::String)?;
        let ca = str_series.str()?;

        let mut counts: HashMap<String, usize> = HashMap::new();
        for value in ca.into_iter().flatten() {
            *counts.entry(value.to_string()).or_insert(0) += 1;
        }

        let mut entries: Vec<FrequencyEntry> = counts
            .into_iter()
            .map(|(value, count)| FrequencyEntry { value, count })
            .collect();
        entries.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.value.cmp(&b.value)));
        entries.truncate(limit);

        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== describe tests ====================

    #[test]
    fn test_describe_basic() {
        let df = df![
            "val" => [1.0, 2.0, 3.0, 4.0, 5.0],
        ]
        .unwrap();

        let stats = Summarizer::describe(&df, &[]).unwrap();
        assert_eq!(stats.len(), 1);

        let s = &stats[0];
        assert_eq!(s.count, 5);
        assert_eq!(s.null_count, 0);
        assert_eq!(s.mean, Some(3.0));
        assert_eq!(s.min, Some(1.0));
        assert_eq!(s.q1, Some(2.0));
        assert_eq!(s.median, Some(3.0));
        assert_eq!(s.q3, Some(4.0));
        assert_eq!(s.max, Some(5.0));
        // Sample std of 1..5 is sqrt(2.5)
        assert!((s.std.unwrap() - 2.5f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_describe_skips_non_numeric_by_default() {
        let df = df![
            "num" => [1.0, 2.0],
            "txt" => ["a", "b"],
        ]
        .unwrap();

        let stats = Summarizer::describe(&df, &[]).unwrap();
        assert_eq!(stats.len(), 1);
        assert_eq!(stats[0].name, "num");
    }

    #[test]
    fn test_describe_explicit_non_numeric_is_error() {
        let df = df![
            "txt" => ["a", "b"],
        ]
        .unwrap();

        let result = Summarizer::describe(&df, &["txt".to_string()]);
        assert!(result.is_err());
    }

    #[test]
    fn test_describe_counts_exclude_nulls() {
        let df = df![
            "val" => [Some(1.0), None, Some(3.0), None],
        ]
        .unwrap();

        let stats = Summarizer::describe(&df, &[]).unwrap();
        assert_eq!(stats[0].count, 2);
        assert_eq!(stats[0].null_count, 2);
        assert_eq!(stats[0].mean, Some(2.0));
    }

    #[test]
    fn test_describe_all_null_column() {
        let df = df![
            "val" => [Option::<f64>::None, None],
        ]
        .unwrap();

        let stats = Summarizer::describe(&df, &[]).unwrap();
        assert_eq!(stats[0].count, 0);
        assert_eq!(stats[0].mean, None);
        assert_eq!(stats[0].median, None);
    }

    // ==================== quantile_threshold tests ====================

    #[test]
    fn test_quantile_threshold_median() {
        let df = df![
            "val" => [1.0, 2.0, 3.0, 4.0, 5.0],
        ]
        .unwrap();

        let threshold = Summarizer::quantile_threshold(&df, "val", 0.5).unwrap();
        assert_eq!(threshold, 3.0);
    }

    #[test]
    fn test_quantile_threshold_ignores_nulls() {
        let df = df![
            "val" => [Some(1.0), None, Some(3.0)],
        ]
        .unwrap();

        let threshold = Summarizer::quantile_threshold(&df, "val", 0.5).unwrap();
        assert_eq!(threshold, 2.0);
    }

    #[test]
    fn test_quantile_threshold_empty_column_is_error() {
        let df = df![
            "val" => [Option::<f64>::None],
        ]
        .unwrap();

        let result = Summarizer::quantile_threshold(&df, "val", 0.99);
        assert!(result.is_err());
    }

    #[test]
    fn test_quantile_threshold_invalid_q() {
        let df = df!["val" => [1.0]].unwrap();
        assert!(Summarizer::quantile_threshold(&df, "val", 0.0).is_err());
        assert!(Summarizer::quantile_threshold(&df, "val", 1.5).is_err());
    }

    // ==================== partition_by_threshold tests ====================

    #[test]
    fn test_partition_disjoint_and_complete() {
        let values: Vec<f64> = (1..=100).map(f64::from).collect();
        let df = df!["val" => values].unwrap();

        let threshold = Summarizer::quantile_threshold(&df, "val", 0.99).unwrap();
        let (above, below) = Summarizer::partition_by_threshold(&df, "val", threshold).unwrap();

        assert_eq!(above.height() + below.height(), 100);
        assert!(above.height() >= 1);

        // Disjoint: everything above the threshold is strictly greater than
        // everything at or below it
        let min_above = above.column("val").unwrap().f64().unwrap().min().unwrap();
        let max_below = below.column("val").unwrap().f64().unwrap().max().unwrap();
        assert!(min_above > max_below);
    }

    #[test]
    fn test_partition_nulls_in_neither_subset() {
        let df = df![
            "val" => [Some(1.0), None, Some(10.0), None, Some(5.0)],
        ]
        .unwrap();

        let (above, below) = Summarizer::partition_by_threshold(&df, "val", 5.0).unwrap();

        // 3 non-null rows split between subsets; the 2 null rows vanish
        assert_eq!(above.height() + below.height(), 3);
        assert_eq!(above.height(), 1);
        assert_eq!(below.height(), 2);
    }

    // ==================== frequency_table tests ====================

    #[test]
    fn test_frequency_table_basic() {
        let df = df![
            "port" => ["S", "C", "S", "Q", "S", "C"],
        ]
        .unwrap();

        let freq = Summarizer::frequency_table(&df, "port", 10).unwrap();
        assert_eq!(freq[0].value, "S");
        assert_eq!(freq[0].count, 3);
        assert_eq!(freq[1].value, "C");
        assert_eq!(freq[1].count, 2);
        assert_eq!(freq.len(), 3);
    }

    #[test]
    fn test_frequency_table_limit_and_nulls() {
        let df = df![
            "port" => [Some("S"), None, Some("C"), Some("S")],
        ]
        .unwrap();

        let freq = Summarizer::frequency_table(&df, "port", 1).unwrap();
        assert_eq!(freq.len(), 1);
        assert_eq!(freq[0].value, "S");
        assert_eq!(freq[0].count, 2);
    }
}
