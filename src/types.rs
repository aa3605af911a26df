use chrono::{DateTime, Utc};
use polars::prelude::DataFrame;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Descriptive statistics for a single numeric column.
///
/// Quantiles are computed by linear interpolation over the sorted non-null
/// sample. Statistics are `None` when the column has no valid values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ColumnStats {
    pub name: String,
    pub dtype: String,
    /// Count of non-null values.
    pub count: usize,
    pub null_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mean: Option<f64>,
    /// Sample standard deviation (n - 1 denominator).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub std: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q1: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub median: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub q3: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
}

/// One entry of a categorical frequency table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrequencyEntry {
    pub value: String,
    pub count: usize,
}

/// Result of partitioning rows around a quantile threshold.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutlierSplit {
    pub column: String,
    pub quantile: f64,
    pub threshold: f64,
    /// Rows strictly above the threshold.
    pub above_rows: usize,
    /// Rows at or below the threshold. Null rows belong to neither subset.
    pub at_or_below_rows: usize,
}

/// Serializable summary of a full pipeline run.
///
/// This is the machine-readable counterpart of the console summary and is
/// what `--json` prints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WrangleReport {
    /// When the report was generated.
    pub generated_at: DateTime<Utc>,

    /// Total execution time in milliseconds.
    pub duration_ms: u64,

    pub rows_before: usize,
    pub rows_after: usize,
    pub columns_before: usize,
    pub columns_after: usize,

    /// Fraction of non-null cells before processing (0.0 - 1.0).
    pub data_quality_before: f32,
    /// Fraction of non-null cells after processing (0.0 - 1.0).
    pub data_quality_after: f32,

    /// Audit trail of cleaning operations.
    pub cleaning_actions: Vec<String>,
    /// Audit trail of merge/derive/summary steps.
    pub processing_steps: Vec<String>,

    /// Descriptive statistics of the final table.
    pub column_stats: Vec<ColumnStats>,

    /// Outlier partition, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outlier_split: Option<OutlierSplit>,

    /// Paths of rendered plot files.
    pub plot_files: Vec<PathBuf>,
}

impl WrangleReport {
    /// Number of rows removed across the run.
    pub fn rows_removed(&self) -> usize {
        self.rows_before.saturating_sub(self.rows_after)
    }

    /// Data quality improvement as a percentage.
    pub fn quality_improvement(&self) -> f32 {
        (self.data_quality_after - self.data_quality_before) * 100.0
    }
}

/// Result of a pipeline run: the final table plus its report.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    pub df: DataFrame,
    pub report: WrangleReport,
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_report() -> WrangleReport {
        WrangleReport {
            generated_at: Utc::now(),
            duration_ms: 12,
            rows_before: 100,
            rows_after: 90,
            columns_before: 8,
            columns_after: 10,
            data_quality_before: 0.8,
            data_quality_after: 0.95,
            cleaning_actions: vec!["Removed 10 duplicate rows".to_string()],
            processing_steps: vec!["Left-joined 1 table on 'hhid'".to_string()],
            column_stats: Vec::new(),
            outlier_split: None,
            plot_files: Vec::new(),
        }
    }

    #[test]
    fn test_rows_removed() {
        let report = sample_report();
        assert_eq!(report.rows_removed(), 10);
    }

    #[test]
    fn test_quality_improvement() {
        let report = sample_report();
        assert!((report.quality_improvement() - 15.0).abs() < 0.01);
    }

    #[test]
    fn test_report_serialization_roundtrip() {
        let mut report = sample_report();
        report.outlier_split = Some(OutlierSplit {
            column: "income".to_string(),
            quantile: 0.99,
            threshold: 12_000.0,
            above_rows: 1,
            at_or_below_rows: 89,
        });

        let json = serde_json::to_string(&report).expect("Should serialize");
        let deserialized: WrangleReport = serde_json::from_str(&json).expect("Should deserialize");

        assert_eq!(report.rows_before, deserialized.rows_before);
        assert_eq!(report.cleaning_actions, deserialized.cleaning_actions);
        let split = deserialized.outlier_split.unwrap();
        assert_eq!(split.above_rows, 1);
        assert_eq!(split.at_or_below_rows, 89);
    }

    #[test]
    fn test_column_stats_skips_empty_fields() {
        let stats = ColumnStats {
            name: "empty".to_string(),
            dtype: "Float64".to_string(),
            count: 0,
            null_count: 3,
            mean: None,
            std: None,
            min: None,
            q1: None,
            median: None,
            q3: None,
            max: None,
        };
        let json = serde_json::to_string(&stats).unwrap();
        assert!(!json.contains("mean"));
        assert!(json.contains("null_count"));
    }
}
