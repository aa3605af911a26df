//! Configuration types for the wrangling pipeline.
//!
//! This module provides configuration options using the builder pattern
//! for flexible and ergonomic pipeline setup.

use crate::derive::DeriveOp;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;

/// Specification of a derived column: `name = left <op> right`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DerivedSpec {
    /// Name of the new column.
    pub name: String,
    /// Left operand column.
    pub left: String,
    /// Elementwise arithmetic operation.
    pub op: DeriveOp,
    /// Right operand column.
    pub right: String,
}

/// Configuration for the wrangling pipeline.
///
/// Use [`PipelineConfig::builder()`] to create a new configuration with a
/// fluent API.
///
/// # Example
///
/// ```rust,ignore
/// use wrangle::config::PipelineConfig;
///
/// let config = PipelineConfig::builder()
///     .drop_null_rows(["Embarked"])
///     .dummy_columns(["Sex"])
///     .dummy_drop_first(true)
///     .outlier_quantile(0.99)
///     .build()?;
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    /// Field separator for CSV parsing.
    /// Default: `b','`
    pub delimiter: u8,

    /// Whether input files carry a header row.
    /// Default: true
    pub has_header: bool,

    /// Skip malformed rows instead of failing the load.
    /// Default: false
    pub skip_bad_lines: bool,

    /// Number of rows used to infer the schema.
    /// Default: Some(100)
    pub infer_schema_length: Option<usize>,

    /// Columns to drop entirely.
    pub drop_columns: Vec<String>,

    /// Drop rows that hold a null in any of these columns.
    pub drop_null_rows: Vec<String>,

    /// Numeric columns whose interior nulls are linearly interpolated.
    pub interpolate_columns: Vec<String>,

    /// Per-column value -> numeric code lookups. Values absent from the
    /// lookup become null.
    pub codebooks: HashMap<String, HashMap<String, i64>>,

    /// Categorical columns replaced by 0/1 indicator columns.
    pub dummy_columns: Vec<String>,

    /// Omit the first (lexicographically) category when encoding dummies.
    /// Default: false
    pub dummy_drop_first: bool,

    /// Remove rows identical across all columns, keeping the first.
    /// Default: false
    pub dedup_rows: bool,

    /// Keep only the first row per value of this key column.
    pub dedup_key: Option<String>,

    /// Explicit old-name -> new-name column renames.
    pub renames: Vec<(String, String)>,

    /// Shared key column for left-joining auxiliary tables.
    pub join_key: Option<String>,

    /// Column removed from each auxiliary table before joining, if present.
    pub merge_drop_column: Option<String>,

    /// Derived feature columns.
    pub derived: Vec<DerivedSpec>,

    /// Columns to describe. Empty means all numeric columns.
    pub describe_columns: Vec<String>,

    /// Column used for the outlier-threshold partition.
    pub outlier_column: Option<String>,

    /// Quantile defining the outlier threshold (exclusive bounds 0..1).
    /// Default: 0.99
    pub outlier_quantile: f64,

    /// Number of histogram bins.
    /// Default: 20
    pub histogram_bins: usize,

    /// Numeric columns to plot (histogram + boxplot).
    pub plot_columns: Vec<String>,

    /// Output directory for rendered plots.
    /// Default: "output"
    pub output_dir: PathBuf,

    /// Whether to render plots at all.
    /// Default: true
    pub render_plots: bool,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            delimiter: b',',
            has_header: true,
            skip_bad_lines: false,
            infer_schema_length: Some(100),
            drop_columns: Vec::new(),
            drop_null_rows: Vec::new(),
            interpolate_columns: Vec::new(),
            codebooks: HashMap::new(),
            dummy_columns: Vec::new(),
            dummy_drop_first: false,
            dedup_rows: false,
            dedup_key: None,
            renames: Vec::new(),
            join_key: None,
            merge_drop_column: None,
            derived: Vec::new(),
            describe_columns: Vec::new(),
            outlier_column: None,
            outlier_quantile: 0.99,
            histogram_bins: 20,
            plot_columns: Vec::new(),
            output_dir: PathBuf::from("output"),
            render_plots: true,
        }
    }
}

impl PipelineConfig {
    /// Create a new configuration builder.
    pub fn builder() -> PipelineConfigBuilder {
        PipelineConfigBuilder::default()
    }

    /// Validate the configuration and return errors if invalid.
    pub fn validate(&self) -> Result<(), ConfigValidationError> {
        if !(self.outlier_quantile > 0.0 && self.outlier_quantile < 1.0) {
            return Err(ConfigValidationError::InvalidQuantile(
                self.outlier_quantile,
            ));
        }

        if self.histogram_bins == 0 {
            return Err(ConfigValidationError::InvalidBins(self.histogram_bins));
        }

        for spec in &self.derived {
            if spec.name.is_empty() || spec.left.is_empty() || spec.right.is_empty() {
                return Err(ConfigValidationError::EmptyDerivedSpec);
            }
        }

        Ok(())
    }
}

/// Errors that can occur during configuration validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigValidationError {
    #[error("Invalid outlier quantile: {0} (must be strictly between 0.0 and 1.0)")]
    InvalidQuantile(f64),

    #[error("Invalid histogram bin count: {0} (must be at least 1)")]
    InvalidBins(usize),

    #[error("Derived column spec has an empty name or operand")]
    EmptyDerivedSpec,
}

/// Builder for [`PipelineConfig`] with fluent API.
#[derive(Debug, Default)]
pub struct PipelineConfigBuilder {
    config: PipelineConfig,
}

impl PipelineConfigBuilder {
    /// Set the CSV field separator.
    pub fn delimiter(mut self, delimiter: u8) -> Self {
        self.config.delimiter = delimiter;
        self
    }

    /// Set whether input files carry a header row.
    pub fn has_header(mut self, has_header: bool) -> Self {
        self.config.has_header = has_header;
        self
    }

    /// Skip malformed rows instead of failing the load.
    pub fn skip_bad_lines(mut self, skip: bool) -> Self {
        self.config.skip_bad_lines = skip;
        self
    }

    /// Set the number of rows used for schema inference.
    pub fn infer_schema_length(mut self, length: Option<usize>) -> Self {
        self.config.infer_schema_length = length;
        self
    }

    /// Columns to drop entirely.
    pub fn drop_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.drop_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Drop rows holding a null in any of these columns.
    pub fn drop_null_rows<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.drop_null_rows = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Numeric columns whose interior nulls are interpolated.
    pub fn interpolate_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.interpolate_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Add a value -> code lookup for a column.
    pub fn codebook(
        mut self,
        column: impl Into<String>,
        mapping: HashMap<String, i64>,
    ) -> Self {
        self.config.codebooks.insert(column.into(), mapping);
        self
    }

    /// Categorical columns replaced by indicator columns.
    pub fn dummy_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.dummy_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Omit the first category when encoding dummies.
    pub fn dummy_drop_first(mut self, drop_first: bool) -> Self {
        self.config.dummy_drop_first = drop_first;
        self
    }

    /// Remove fully duplicated rows.
    pub fn dedup_rows(mut self, dedup: bool) -> Self {
        self.config.dedup_rows = dedup;
        self
    }

    /// Keep only the first row per value of this key column.
    pub fn dedup_key(mut self, key: impl Into<String>) -> Self {
        self.config.dedup_key = Some(key.into());
        self
    }

    /// Add an old-name -> new-name column rename.
    pub fn rename(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.config.renames.push((old.into(), new.into()));
        self
    }

    /// Shared key column for left-joining auxiliary tables.
    pub fn join_key(mut self, key: impl Into<String>) -> Self {
        self.config.join_key = Some(key.into());
        self
    }

    /// Column removed from each auxiliary table before joining.
    pub fn merge_drop_column(mut self, column: impl Into<String>) -> Self {
        self.config.merge_drop_column = Some(column.into());
        self
    }

    /// Add a derived feature column.
    pub fn derive(
        mut self,
        name: impl Into<String>,
        left: impl Into<String>,
        op: DeriveOp,
        right: impl Into<String>,
    ) -> Self {
        self.config.derived.push(DerivedSpec {
            name: name.into(),
            left: left.into(),
            op,
            right: right.into(),
        });
        self
    }

    /// Columns to describe (empty means all numeric columns).
    pub fn describe_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.describe_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Column used for the outlier-threshold partition.
    pub fn outlier_column(mut self, column: impl Into<String>) -> Self {
        self.config.outlier_column = Some(column.into());
        self
    }

    /// Quantile defining the outlier threshold.
    pub fn outlier_quantile(mut self, quantile: f64) -> Self {
        self.config.outlier_quantile = quantile;
        self
    }

    /// Number of histogram bins.
    pub fn histogram_bins(mut self, bins: usize) -> Self {
        self.config.histogram_bins = bins;
        self
    }

    /// Numeric columns to plot.
    pub fn plot_columns<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.config.plot_columns = columns.into_iter().map(Into::into).collect();
        self
    }

    /// Output directory for rendered plots.
    pub fn output_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.output_dir = path.into();
        self
    }

    /// Enable or disable plot rendering.
    pub fn render_plots(mut self, render: bool) -> Self {
        self.config.render_plots = render;
        self
    }

    /// Build the configuration.
    ///
    /// Returns a validated `PipelineConfig` or an error if validation fails.
    pub fn build(self) -> Result<PipelineConfig, ConfigValidationError> {
        self.config.validate()?;
        Ok(self.config)
    }
}
