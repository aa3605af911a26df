//! The wrangling pipeline.
//!
//! Orchestrates the stages over a base table (and optional auxiliary tables
//! for merging): clean -> merge -> derive -> summarize -> plot. Each run
//! produces the final table plus a serializable report with the full audit
//! trail.

use crate::cleaner::{CategoryEncoder, DataCleaner};
use crate::config::PipelineConfig;
use crate::derive::FeatureDeriver;
use crate::error::{Result, WrangleError};
use crate::merge::TableMerger;
use crate::summary::{PlotRenderer, Summarizer};
use crate::types::{OutlierSplit, PipelineResult, WrangleReport};
use chrono::Utc;
use polars::prelude::*;
use std::time::Instant;
use tracing::{debug, info};

/// The main wrangling pipeline.
///
/// # Example
///
/// ```rust,ignore
/// use wrangle::{Pipeline, PipelineConfig};
///
/// let config = PipelineConfig::builder()
///     .drop_null_rows(["Embarked"])
///     .dummy_columns(["Sex"])
///     .render_plots(false)
///     .build()?;
///
/// let result = Pipeline::builder().config(config).build()?.process(df)?;
/// println!("{} rows remain", result.df.height());
/// ```
pub struct Pipeline {
    config: PipelineConfig,
}

impl Pipeline {
    /// Create a new pipeline builder.
    pub fn builder() -> PipelineBuilder {
        PipelineBuilder::default()
    }

    /// Create a pipeline from a validated configuration.
    pub fn new(config: PipelineConfig) -> Result<Self> {
        config
            .validate()
            .map_err(|e| WrangleError::InvalidConfig(e.to_string()))?;
        Ok(Self { config })
    }

    /// The pipeline configuration.
    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Process a single table through the pipeline.
    pub fn process(&self, df: DataFrame) -> Result<PipelineResult> {
        self.process_with(df, Vec::new())
    }

    /// Process a base table, left-joining the auxiliary tables when a join
    /// key is configured.
    pub fn process_with(&self, df: DataFrame, aux: Vec<DataFrame>) -> Result<PipelineResult> {
        let start = Instant::now();
        info!("Starting wrangling pipeline...");

        let rows_before = df.height();
        let columns_before = df.width();
        let quality_before = Self::data_quality_score(&df);

        let mut cleaning_actions: Vec<String> = Vec::new();
        let mut processing_steps: Vec<String> = Vec::new();

        // Stage 1: clean
        info!("Step 1: Cleaning...");
        let mut df = self.clean(df, &mut cleaning_actions)?;

        // Stage 2: merge
        if let Some(key) = &self.config.join_key
            && !aux.is_empty()
        {
            info!("Step 2: Merging {} auxiliary tables on '{}'...", aux.len(), key);
            df = TableMerger::left_join_all(
                df,
                aux,
                key,
                self.config.merge_drop_column.as_deref(),
                &mut processing_steps,
            )
            .map_err(|e| WrangleError::MergeFailed(e.to_string()))?;
        } else if !aux.is_empty() {
            return Err(WrangleError::InvalidConfig(
                "auxiliary tables provided but no join key configured".to_string(),
            ));
        }

        // Stage 3: derive features
        if !self.config.derived.is_empty() {
            info!("Step 3: Deriving {} columns...", self.config.derived.len());
            for spec in &self.config.derived {
                FeatureDeriver::derive(
                    &mut df,
                    &spec.name,
                    &spec.left,
                    spec.op,
                    &spec.right,
                    &mut processing_steps,
                )
                .map_err(|e| WrangleError::DerivationFailed(e.to_string()))?;
            }
        }

        // Stage 4: summarize
        info!("Step 4: Summarizing...");
        let column_stats = Summarizer::describe(&df, &self.config.describe_columns)
            .map_err(|e| WrangleError::SummaryFailed(e.to_string()))?;
        processing_steps.push(format!(
            "Computed descriptive statistics for {} columns",
            column_stats.len()
        ));

        let outlier_split = if let Some(column) = &self.config.outlier_column {
            let series = df
                .column(column)
                .map_err(|_| WrangleError::ColumnNotFound(column.clone()))?;
            if series.null_count() == series.len() {
                return Err(WrangleError::NoValidValues(column.clone()));
            }
            let quantile = self.config.outlier_quantile;
            let threshold = Summarizer::quantile_threshold(&df, column, quantile)
                .map_err(|e| WrangleError::SummaryFailed(e.to_string()))?;
            let (above, at_or_below) = Summarizer::partition_by_threshold(&df, column, threshold)
                .map_err(|e| WrangleError::SummaryFailed(e.to_string()))?;
            processing_steps.push(format!(
                "Split '{column}' at the {:.0}th percentile ({threshold:.3}): {} above, {} at or below",
                quantile * 100.0,
                above.height(),
                at_or_below.height()
            ));
            Some(OutlierSplit {
                column: column.clone(),
                quantile,
                threshold,
                above_rows: above.height(),
                at_or_below_rows: at_or_below.height(),
            })
        } else {
            None
        };

        // Stage 5: plots
        let plot_files = if self.config.render_plots && !self.config.plot_columns.is_empty() {
            for column in &self.config.plot_columns {
                df.column(column)
                    .map_err(|_| WrangleError::ColumnNotFound(column.clone()))?;
            }
            info!(
                "Step 5: Rendering plots for {} columns...",
                self.config.plot_columns.len()
            );
            let renderer =
                PlotRenderer::new(&self.config.output_dir, self.config.histogram_bins);
            let paths = renderer
                .render_all(&df, &self.config.plot_columns)
                .map_err(|e| WrangleError::PlotFailed(e.to_string()))?;
            processing_steps.push(format!("Rendered {} plot files", paths.len()));
            paths
        } else {
            Vec::new()
        };

        let report = WrangleReport {
            generated_at: Utc::now(),
            duration_ms: start.elapsed().as_millis() as u64,
            rows_before,
            rows_after: df.height(),
            columns_before,
            columns_after: df.width(),
            data_quality_before: quality_before,
            data_quality_after: Self::data_quality_score(&df),
            cleaning_actions,
            processing_steps,
            column_stats,
            outlier_split,
            plot_files,
        };

        info!(
            "Pipeline complete: {} -> {} rows, {} -> {} columns in {}ms",
            report.rows_before,
            report.rows_after,
            report.columns_before,
            report.columns_after,
            report.duration_ms
        );

        Ok(PipelineResult { df, report })
    }

    /// Apply the configured cleaning operations in a fixed order.
    fn clean(&self, mut df: DataFrame, actions: &mut Vec<String>) -> Result<DataFrame> {
        let map_err = |e: anyhow::Error| WrangleError::CleaningFailed(e.to_string());

        for column in &self.config.drop_columns {
            DataCleaner::drop_column(&mut df, column, actions).map_err(map_err)?;
        }
        for column in &self.config.drop_null_rows {
            DataCleaner::drop_null_rows(&mut df, column, actions).map_err(map_err)?;
        }
        for column in &self.config.interpolate_columns {
            DataCleaner::interpolate_nulls(&mut df, column, actions).map_err(map_err)?;
        }

        // Deterministic order for codebook application
        let mut codebook_columns: Vec<&String> = self.config.codebooks.keys().collect();
        codebook_columns.sort();
        for column in codebook_columns {
            let codebook = &self.config.codebooks[column];
            CategoryEncoder::apply_codebook(&mut df, column, codebook, actions)
                .map_err(map_err)?;
        }

        for column in &self.config.dummy_columns {
            CategoryEncoder::encode_dummies(
                &mut df,
                column,
                self.config.dummy_drop_first,
                actions,
            )
            .map_err(map_err)?;
        }

        if self.config.dedup_rows {
            DataCleaner::dedup_rows(&mut df, actions).map_err(map_err)?;
        }
        if let Some(key) = &self.config.dedup_key {
            DataCleaner::dedup_by_key(&mut df, key, actions).map_err(map_err)?;
        }

        if !self.config.renames.is_empty() {
            DataCleaner::rename_columns(&mut df, &self.config.renames, actions)
                .map_err(map_err)?;
        }

        debug!("Cleaning complete: {} actions", actions.len());
        Ok(df)
    }

    /// Fraction of non-null cells (0.0 - 1.0).
    fn data_quality_score(df: &DataFrame) -> f32 {
        let total = df.height() * df.width();
        if total == 0 {
            return 1.0;
        }
        let nulls: usize = df.get_columns().iter().map(|col| col.null_count()).sum();
        1.0 - (nulls as f32 / total as f32)
    }
}

/// Builder for [`Pipeline`].
#[derive(Debug, Default)]
pub struct PipelineBuilder {
    config: Option<PipelineConfig>,
}

impl PipelineBuilder {
    /// Set the pipeline configuration.
    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = Some(config);
        self
    }

    /// Build the pipeline, validating the configuration.
    pub fn build(self) -> Result<Pipeline> {
        Pipeline::new(self.config.unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::derive::DeriveOp;

    fn passengers() -> DataFrame {
        df![
            "id" => [1, 2, 3, 4, 4],
            "sex" => ["male", "female", "female", "male", "male"],
            "age" => [Some(22.0), None, Some(26.0), Some(35.0), Some(35.0)],
            "fare" => [7.25, 71.28, 7.92, 53.1, 53.1],
        ]
        .unwrap()
    }

    #[test]
    fn test_pipeline_default_config_is_identity_on_rows() {
        let df = df!["a" => [1, 2, 3]].unwrap();
        let pipeline = Pipeline::builder().build().unwrap();

        let result = pipeline.process(df).unwrap();
        assert_eq!(result.df.height(), 3);
        assert_eq!(result.report.rows_before, 3);
        assert_eq!(result.report.rows_after, 3);
    }

    #[test]
    fn test_pipeline_full_run() {
        let config = PipelineConfig::builder()
            .drop_null_rows(["age"])
            .dummy_columns(["sex"])
            .dummy_drop_first(true)
            .dedup_key("id")
            .derive("fare_per_year", "fare", DeriveOp::Divide, "age")
            .render_plots(false)
            .build()
            .unwrap();

        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(passengers())
            .unwrap();

        // One null-age row and one duplicate id dropped
        assert_eq!(result.df.height(), 3);
        // sex replaced by sex_male, fare_per_year appended
        assert!(result.df.column("sex").is_err());
        assert!(result.df.column("sex_male").is_ok());
        assert!(result.df.column("fare_per_year").is_ok());

        let report = &result.report;
        assert_eq!(report.rows_before, 5);
        assert_eq!(report.rows_after, 3);
        assert!(!report.cleaning_actions.is_empty());
        assert!(!report.column_stats.is_empty());
    }

    #[test]
    fn test_pipeline_merge_requires_key() {
        let base = df!["a" => [1]].unwrap();
        let aux = df!["a" => [1]].unwrap();

        let pipeline = Pipeline::builder().build().unwrap();
        let result = pipeline.process_with(base, vec![aux]);

        assert!(matches!(result, Err(WrangleError::InvalidConfig(_))));
    }

    #[test]
    fn test_pipeline_merge_and_outlier_split() {
        let base = df![
            "hhid" => [1, 2, 3, 4],
            "fsize" => [2.0, 4.0, 3.0, 5.0],
        ]
        .unwrap();
        let aux = df![
            "hhid" => [1, 2, 3],
            "income" => [1000.0, 2000.0, 3000.0],
        ]
        .unwrap();

        let config = PipelineConfig::builder()
            .join_key("hhid")
            .derive("pc_income", "income", DeriveOp::Divide, "fsize")
            .outlier_column("income")
            .outlier_quantile(0.5)
            .render_plots(false)
            .build()
            .unwrap();

        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process_with(base, vec![aux])
            .unwrap();

        assert_eq!(result.df.height(), 4);
        let split = result.report.outlier_split.as_ref().unwrap();
        // 3 non-null income rows partitioned around their median
        assert_eq!(split.above_rows + split.at_or_below_rows, 3);

        // Join output order is not guaranteed; check the value multiset
        let pc = result.df.column("pc_income").unwrap();
        assert_eq!(pc.null_count(), 1);
        let mut values: Vec<f64> = pc.f64().unwrap().into_iter().flatten().collect();
        values.sort_by(|a, b| a.partial_cmp(b).unwrap());
        assert_eq!(values, vec![500.0, 500.0, 1000.0]);
    }

    #[test]
    fn test_pipeline_quality_score_improves_after_cleaning() {
        let df = df![
            "a" => [Some(1.0), None, Some(3.0)],
        ]
        .unwrap();

        let config = PipelineConfig::builder()
            .drop_null_rows(["a"])
            .render_plots(false)
            .build()
            .unwrap();

        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(df)
            .unwrap();

        assert!(result.report.data_quality_after > result.report.data_quality_before);
        assert_eq!(result.report.data_quality_after, 1.0);
    }

    #[test]
    fn test_pipeline_outlier_column_must_exist() {
        let df = df!["a" => [1.0]].unwrap();

        let config = PipelineConfig::builder()
            .outlier_column("ghost")
            .render_plots(false)
            .build()
            .unwrap();

        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(df);

        assert!(matches!(result, Err(WrangleError::ColumnNotFound(_))));
    }

    #[test]
    fn test_pipeline_outlier_column_needs_values() {
        let df = df!["a" => [Option::<f64>::None, None]].unwrap();

        let config = PipelineConfig::builder()
            .outlier_column("a")
            .render_plots(false)
            .build()
            .unwrap();

        let result = Pipeline::builder()
            .config(config)
            .build()
            .unwrap()
            .process(df);

        assert!(matches!(result, Err(WrangleError::NoValidValues(_))));
    }

    #[test]
    fn test_pipeline_invalid_config_rejected() {
        let config = PipelineConfig {
            outlier_quantile: 2.0,
            ..PipelineConfig::default()
        };
        assert!(Pipeline::new(config).is_err());
    }
}
