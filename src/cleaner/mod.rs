//! Data cleaning operations.
//!
//! This module provides the cleaning stage of the pipeline:
//! - Dropping rows with nulls in a named column
//! - Dropping columns
//! - Linear interpolation of interior nulls in numeric columns
//! - Duplicate removal (full rows, or first-per-key)
//! - Column renames
//!
//! Every operation mutates the frame in place and appends a human-readable
//! entry to the caller's audit trail.

mod encode;

pub use encode::CategoryEncoder;

use crate::utils::{first_occurrence_mask, is_numeric_series, numeric_values};
use anyhow::{Context, Result, ensure};
use polars::prelude::*;
use tracing::debug;

/// Cleaning operations over a single table.
pub struct DataCleaner;

impl DataCleaner {
    /// Drop rows where the named column is null.
    pub fn drop_null_rows(
        df: &mut DataFrame,
        column: &str,
        steps: &mut Vec<String>,
    ) -> Result<()> {
        let before = df.height();
        let mask = df
            .column(column)
            .with_context(|| format!("column '{column}' not found"))?
            .as_materialized_series()
            .is_not_null();
        *df = df.filter(&mask)?;
        let removed = before - df.height();

        steps.push(format!(
            "Dropped {removed} rows with missing '{column}'"
        ));
        debug!("Dropped {} rows with missing '{}'", removed, column);
        Ok(())
    }

    /// Drop the named column entirely.
    pub fn drop_column(df: &mut DataFrame, column: &str, steps: &mut Vec<String>) -> Result<()> {
        *df = df
            .drop(column)
            .with_context(|| format!("column '{column}' not found"))?;
        steps.push(format!("Dropped column '{column}'"));
        debug!("Dropped column '{}'", column);
        Ok(())
    }

    /// Linearly interpolate interior nulls of a numeric column, in current
    /// row order. Leading and trailing nulls remain null. The column dtype
    /// becomes Float64.
    pub fn interpolate_nulls(
        df: &mut DataFrame,
        column: &str,
        steps: &mut Vec<String>,
    ) -> Result<()> {
        let series = df
            .column(column)
            .with_context(|| format!("column '{column}' not found"))?
            .as_materialized_series()
            .clone();
        ensure!(
            is_numeric_series(&series),
            "column '{column}' is not numeric"
        );
        let values = numeric_values(&series)?;

        let mut result = values.clone();
        let mut filled = 0usize;
        let mut i = 0;
        while i < values.len() {
            if values[i].is_some() {
                i += 1;
                continue;
            }
            // Null run [i, j)
            let mut j = i;
            while j < values.len() && values[j].is_none() {
                j += 1;
            }
            let prev = if i > 0 { values[i - 1] } else { None };
            let next = if j < values.len() { values[j] } else { None };
            if let (Some(prev), Some(next)) = (prev, next) {
                let span = (j - i + 1) as f64;
                for (k, idx) in (i..j).enumerate() {
                    let frac = (k + 1) as f64 / span;
                    result[idx] = Some(prev + (next - prev) * frac);
                    filled += 1;
                }
            }
            i = j;
        }

        df.replace(column, Series::new(series.name().clone(), result))?;
        steps.push(format!(
            "Interpolated {filled} missing values in '{column}'"
        ));
        debug!("Interpolated {} missing values in '{}'", filled, column);
        Ok(())
    }

    /// Remove rows identical across all columns, keeping the first
    /// occurrence.
    pub fn dedup_rows(df: &mut DataFrame, steps: &mut Vec<String>) -> Result<()> {
        let before = df.height();
        *df = df.unique::<&str, &str>(None, UniqueKeepStrategy::First, None)?;
        let removed = before - df.height();

        if removed > 0 {
            let pct = (removed as f64 / before as f64) * 100.0;
            steps.push(format!("Removed {removed} duplicate rows ({pct:.1}%)"));
            debug!("Removed {} duplicate rows", removed);
        } else {
            steps.push("No duplicate rows found".to_string());
            debug!("No duplicate rows found");
        }
        Ok(())
    }

    /// Keep only the first row (original order) per value of the key column.
    pub fn dedup_by_key(df: &mut DataFrame, key: &str, steps: &mut Vec<String>) -> Result<()> {
        let series = df
            .column(key)
            .with_context(|| format!("key column '{key}' not found"))?
            .as_materialized_series();

        let before = df.height();
        let mask = first_occurrence_mask(series);
        *df = df.filter(&mask)?;
        let removed = before - df.height();

        steps.push(format!(
            "Removed {removed} rows duplicated on key '{key}' (kept first)"
        ));
        debug!("Removed {} rows duplicated on '{}'", removed, key);
        Ok(())
    }

    /// Rename columns via an explicit old-name -> new-name mapping. An
    /// unknown old name is an error.
    pub fn rename_columns(
        df: &mut DataFrame,
        renames: &[(String, String)],
        steps: &mut Vec<String>,
    ) -> Result<()> {
        for (old, new) in renames {
            df.rename(old, new.as_str().into())
                .with_context(|| format!("column '{old}' not found"))?;
            steps.push(format!("Renamed column '{old}' to '{new}'"));
            debug!("Renamed '{}' to '{}'", old, new);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==================== drop_null_rows tests ====================

    #[test]
    fn test_drop_null_rows_basic() {
        let mut df = df![
            "age" => [Some(22.0), None, Some(38.0), None],
            "name" => ["a", "b", "c", "d"],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::drop_null_rows(&mut df, "age", &mut steps).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("age").unwrap().null_count(), 0);
        assert!(steps[0].contains("2 rows"));
    }

    #[test]
    fn test_drop_null_rows_no_nulls() {
        let mut df = df![
            "age" => [22.0, 38.0],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::drop_null_rows(&mut df, "age", &mut steps).unwrap();

        assert_eq!(df.height(), 2);
        assert!(steps[0].contains("0 rows"));
    }

    #[test]
    fn test_drop_null_rows_missing_column() {
        let mut df = df!["a" => [1, 2]].unwrap();
        let mut steps = Vec::new();

        let result = DataCleaner::drop_null_rows(&mut df, "nope", &mut steps);
        assert!(result.is_err());
    }

    // ==================== drop_column tests ====================

    #[test]
    fn test_drop_column_basic() {
        let mut df = df![
            "keep" => [1, 2],
            "toss" => ["x", "y"],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::drop_column(&mut df, "toss", &mut steps).unwrap();

        assert_eq!(df.width(), 1);
        assert!(df.column("toss").is_err());
    }

    // ==================== interpolate_nulls tests ====================

    #[test]
    fn test_interpolate_single_gap() {
        let mut df = df![
            "val" => [Some(1.0), None, Some(3.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::interpolate_nulls(&mut df, "val", &mut steps).unwrap();

        let col = df.column("val").unwrap();
        assert_eq!(col.null_count(), 0);
        assert_eq!(col.get(1).unwrap().try_extract::<f64>().unwrap(), 2.0);
    }

    #[test]
    fn test_interpolate_longer_run() {
        let mut df = df![
            "val" => [Some(1.0), None, None, Some(4.0)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::interpolate_nulls(&mut df, "val", &mut steps).unwrap();

        let col = df.column("val").unwrap();
        assert_eq!(col.get(1).unwrap().try_extract::<f64>().unwrap(), 2.0);
        assert_eq!(col.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
    }

    #[test]
    fn test_interpolate_leading_and_trailing_stay_null() {
        let mut df = df![
            "val" => [None, Some(2.0), None, Some(4.0), None],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::interpolate_nulls(&mut df, "val", &mut steps).unwrap();

        let col = df.column("val").unwrap();
        assert!(col.get(0).unwrap().is_null());
        assert_eq!(col.get(2).unwrap().try_extract::<f64>().unwrap(), 3.0);
        assert!(col.get(4).unwrap().is_null());
        assert!(steps[0].contains("1 missing"));
    }

    #[test]
    fn test_interpolate_integer_column() {
        let mut df = df![
            "val" => [Some(10i64), None, Some(20)],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::interpolate_nulls(&mut df, "val", &mut steps).unwrap();

        let col = df.column("val").unwrap();
        assert!(matches!(col.dtype(), DataType::Float64));
        assert_eq!(col.get(1).unwrap().try_extract::<f64>().unwrap(), 15.0);
    }

    // ==================== dedup tests ====================

    #[test]
    fn test_dedup_rows_removes_exact_duplicates() {
        let mut df = df![
            "a" => [1, 1, 2, 1],
            "b" => ["x", "x", "y", "x"],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::dedup_rows(&mut df, &mut steps).unwrap();

        assert_eq!(df.height(), 2);
        assert!(steps[0].contains("2 duplicate rows"));
    }

    #[test]
    fn test_dedup_by_key_keeps_first_per_key() {
        let mut df = df![
            "hhid" => [10, 20, 10, 30, 20],
            "income" => [100, 200, 999, 300, 888],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::dedup_by_key(&mut df, "hhid", &mut steps).unwrap();

        assert_eq!(df.height(), 3);
        // Each key appears exactly once and the first row per key survives
        let keys = df.column("hhid").unwrap();
        let incomes = df.column("income").unwrap();
        assert_eq!(keys.get(0).unwrap().try_extract::<i64>().unwrap(), 10);
        assert_eq!(incomes.get(0).unwrap().try_extract::<i64>().unwrap(), 100);
        assert_eq!(keys.get(1).unwrap().try_extract::<i64>().unwrap(), 20);
        assert_eq!(incomes.get(1).unwrap().try_extract::<i64>().unwrap(), 200);
        assert_eq!(keys.get(2).unwrap().try_extract::<i64>().unwrap(), 30);
    }

    #[test]
    fn test_dedup_by_key_unique_keys_after() {
        let mut df = df![
            "hhid" => [1, 2, 1, 1, 3, 2],
            "v" => [0, 0, 0, 0, 0, 0],
        ]
        .unwrap();
        let mut steps = Vec::new();

        DataCleaner::dedup_by_key(&mut df, "hhid", &mut steps).unwrap();

        let n_unique = df.column("hhid").unwrap().as_materialized_series().n_unique().unwrap();
        assert_eq!(df.height(), n_unique);
    }

    #[test]
    fn test_dedup_by_key_missing_key() {
        let mut df = df!["a" => [1]].unwrap();
        let mut steps = Vec::new();

        let result = DataCleaner::dedup_by_key(&mut df, "hhid", &mut steps);
        assert!(result.is_err());
    }

    // ==================== rename tests ====================

    #[test]
    fn test_rename_columns_basic() {
        let mut df = df![
            "old_a" => [1],
            "old_b" => [2],
        ]
        .unwrap();
        let mut steps = Vec::new();

        let renames = vec![
            ("old_a".to_string(), "a".to_string()),
            ("old_b".to_string(), "b".to_string()),
        ];
        DataCleaner::rename_columns(&mut df, &renames, &mut steps).unwrap();

        assert!(df.column("a").is_ok());
        assert!(df.column("b").is_ok());
        assert!(df.column("old_a").is_err());
        assert_eq!(steps.len(), 2);
    }

    #[test]
    fn test_rename_unknown_column_is_error() {
        let mut df = df!["a" => [1]].unwrap();
        let mut steps = Vec::new();

        let renames = vec![("ghost".to_string(), "b".to_string())];
        let result = DataCleaner::rename_columns(&mut df, &renames, &mut steps);
        assert!(result.is_err());
    }
}
